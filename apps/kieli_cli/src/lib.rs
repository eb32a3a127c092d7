//! Command logic for the `kieli` command-line tool.
//!
//! The binary is a thin wrapper around [`run_cli`]; all behavior lives
//! here for testability. Two modes:
//!
//! - `kieli <files>` checks each file and prints its diagnostics.
//! - `kieli --repl {lex|par|des|res}` runs an interactive loop piping
//!   each entered line through the lexer, the parser and formatter, the
//!   desugarer and AST printer, or the resolver.

use clap::{Parser, ValueEnum};
use kieli_compiler::db::{self, Database, DocumentId};
use kieli_compiler::lsp::Severity;
use std::error::Error;
use std::path::PathBuf;

pub mod repl;

#[derive(Parser)]
#[command(name = "kieli", version, about = "The kieli compiler")]
pub struct Cli {
    /// Disable colored output.
    #[arg(long)]
    pub nocolor: bool,

    /// Run the given debug REPL.
    #[arg(long, value_enum)]
    pub repl: Option<ReplPhase>,

    /// Source files to check.
    pub files: Vec<PathBuf>,
}

/// Which pipeline stage the debug REPL pipes input through.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
pub enum ReplPhase {
    /// Print the token stream.
    Lex,
    /// Parse and reformat.
    Par,
    /// Desugar and print the AST.
    Des,
    /// Resolve and print the HIR with diagnostics.
    Res,
}

/// ANSI severity colors, or plain text with `--nocolor`.
#[derive(Clone, Copy)]
pub struct Colors {
    enabled: bool,
}

impl Colors {
    pub fn new(enabled: bool) -> Self {
        Colors { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn severity(&self, severity: Severity) -> String {
        match severity {
            Severity::Error => self.paint("31", "error"),
            Severity::Warning => self.paint("33", "warning"),
            Severity::Information => self.paint("36", "info"),
            Severity::Hint => self.paint("90", "hint"),
        }
    }
}

/// Renders a document's diagnostics, one per line, sorted by position.
pub fn render_diagnostics(db: &Database, doc_id: DocumentId, colors: Colors) -> String {
    let mut diagnostics = db.documents[doc_id].info.diagnostics.clone();
    diagnostics.sort_by_key(|diagnostic| diagnostic.range.start);

    let mut out = String::new();
    for diagnostic in &diagnostics {
        out.push_str(&format!(
            "{}: {} [{}]\n",
            colors.severity(diagnostic.severity),
            diagnostic.message,
            diagnostic.range,
        ));
        for related in &diagnostic.related_info {
            out.push_str(&format!(
                "  note: {} [{}]\n",
                related.message, related.location.range,
            ));
        }
    }
    out
}

/// Checks one file: analyze it and print its diagnostics. Returns
/// `true` when the file has no error diagnostics.
pub fn check_file(path: PathBuf, colors: Colors) -> Result<bool, Box<dyn Error>> {
    let mut database = db::database(db::Configuration::default());
    let doc_id = db::read_document(&mut database, path.clone())
        .map_err(|failure| format!("{}: '{}'", failure, path.display()))?;
    kieli_resolve::analyze_document(&mut database, doc_id);

    print!("{}", render_diagnostics(&database, doc_id, colors));
    let clean = database.documents[doc_id]
        .info
        .diagnostics
        .iter()
        .all(|diagnostic| diagnostic.severity != Severity::Error);
    Ok(clean)
}

/// Parses the command line and runs the requested mode.
pub fn run_cli() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let colors = Colors::new(!cli.nocolor);

    if let Some(phase) = cli.repl {
        return repl::run(phase, colors);
    }

    let mut clean = true;
    for file in cli.files {
        clean &= check_file(file, colors)?;
    }
    if clean {
        Ok(())
    } else {
        Err("compilation failed".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn check_reports_clean_files_as_clean() {
        let mut file = tempfile::Builder::new().suffix(".ki").tempfile().unwrap();
        writeln!(file, "fn f(x: I32): I32 = x").unwrap();
        let clean = check_file(file.path().to_path_buf(), Colors::new(false)).unwrap();
        assert!(clean);
    }

    #[test]
    fn check_reports_errors_as_unclean() {
        let mut file = tempfile::Builder::new().suffix(".ki").tempfile().unwrap();
        writeln!(file, "fn f() = g()").unwrap();
        let clean = check_file(file.path().to_path_buf(), Colors::new(false)).unwrap();
        assert!(!clean);
    }

    #[test]
    fn missing_files_are_an_error() {
        let result = check_file(PathBuf::from("/no/such/file.ki"), Colors::new(false));
        assert!(result.is_err());
    }

    #[test]
    fn diagnostics_render_without_color_codes() {
        let mut database = db::database(db::Configuration::default());
        let doc_id = db::test_document(&mut database, "fn f() = g()".to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let rendered = render_diagnostics(&database, doc_id, Colors::new(false));
        assert!(rendered.contains("error: Undeclared identifier: 'g'"));
        assert!(!rendered.contains('\x1b'));
    }

    #[test]
    fn diagnostics_render_with_color_codes() {
        let mut database = db::database(db::Configuration::default());
        let doc_id = db::test_document(&mut database, "fn f() = g()".to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let rendered = render_diagnostics(&database, doc_id, Colors::new(true));
        assert!(rendered.contains("\x1b[31m"));
    }
}
