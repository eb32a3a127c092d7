//! The debug REPLs: one line in, one pipeline stage out.

use crate::{render_diagnostics, Colors, ReplPhase};
use kieli_compiler::db::{self, Database, DocumentId};
use kieli_compiler::{ast_display, hir_display};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::error::Error;

fn fresh_document(line: &str) -> (Database, DocumentId) {
    let mut database = db::database(db::Configuration::default());
    let doc_id = db::test_document(&mut database, line.to_string());
    (database, doc_id)
}

fn run_lex(line: &str) -> (Database, DocumentId, String) {
    let (mut database, doc_id) = fresh_document(line);
    let tokens = kieli_lex::lex(&mut database, doc_id);
    let rendered = tokens
        .iter()
        .map(|token| kieli_lex::display_token(&database.string_pool, token))
        .collect::<Vec<_>>()
        .join(" ");
    (database, doc_id, format!("{rendered}\n"))
}

fn run_parse(line: &str) -> (Database, DocumentId, String) {
    let (mut database, doc_id) = fresh_document(line);
    let tokens = kieli_lex::lex(&mut database, doc_id);
    let (arena, module) = kieli_parse::parse(&mut database, doc_id, &tokens);
    let formatted = kieli_format::format_module(&arena, &database.string_pool, &module);
    (database, doc_id, formatted)
}

fn run_desugar(line: &str) -> (Database, DocumentId, String) {
    let (mut database, doc_id) = fresh_document(line);
    let tokens = kieli_lex::lex(&mut database, doc_id);
    let (cst_arena, cst_module) = kieli_parse::parse(&mut database, doc_id, &tokens);
    let (ast_arena, ast_module) =
        kieli_desugar::desugar(&mut database, doc_id, &cst_arena, &cst_module);
    let printed = ast_display::module_to_string(&ast_arena, &database.string_pool, &ast_module);
    (database, doc_id, printed)
}

fn run_resolve(line: &str) -> (Database, DocumentId, String) {
    let (mut database, doc_id) = fresh_document(line);
    kieli_resolve::analyze_document(&mut database, doc_id);

    let arena = &database.documents[doc_id].arena;
    let mut printed = String::new();
    for (_, function) in arena.hir.functions.iter() {
        let name = database.string_pool.get(function.name.id);
        printed.push_str(&format!("fn {name}\n"));
        if let Some(&body) = function.body.resolved() {
            printed.push_str(&hir_display::expression_to_string(
                &arena.hir,
                &database.string_pool,
                body,
            ));
        }
    }
    (database, doc_id, printed)
}

/// Runs one input line through the chosen stage and returns what to
/// print.
pub fn evaluate(phase: ReplPhase, line: &str, colors: Colors) -> String {
    let (database, doc_id, mut output) = match phase {
        ReplPhase::Lex => run_lex(line),
        ReplPhase::Par => run_parse(line),
        ReplPhase::Des => run_desugar(line),
        ReplPhase::Res => run_resolve(line),
    };
    output.push_str(&render_diagnostics(&database, doc_id, colors));
    output
}

/// The interactive loop. `q` or end-of-input quits; blank lines are
/// skipped.
pub fn run(phase: ReplPhase, colors: Colors) -> Result<(), Box<dyn Error>> {
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline(">>> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "q" {
                    return Ok(());
                }
                if trimmed.is_empty() {
                    continue;
                }
                editor.add_history_entry(&line)?;
                print!("{}", evaluate(phase, &line, colors));
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(error) => return Err(Box::new(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(phase: ReplPhase, line: &str) -> String {
        evaluate(phase, line, Colors::new(false))
    }

    #[test]
    fn lex_prints_the_token_stream() {
        let output = plain(ReplPhase::Lex, "fn f() = 5");
        assert!(output.contains("fn f ( ) = 5"));
    }

    #[test]
    fn par_reformats_the_input() {
        let output = plain(ReplPhase::Par, "fn   f( )=5");
        assert!(output.starts_with("fn f() = 5\n"));
    }

    #[test]
    fn des_prints_the_desugared_tree() {
        let output = plain(ReplPhase::Des, "fn f() { while true { 1 } }");
        assert!(output.contains("function f"));
        assert!(output.contains("loop"));
        assert!(output.contains("Use 'loop' instead of 'while true'"));
    }

    #[test]
    fn res_prints_types_and_diagnostics() {
        let output = plain(ReplPhase::Res, "fn f(x: I32): I32 = x");
        assert!(output.contains("fn f"));
        assert!(output.contains("variable x: I32"));

        let output = plain(ReplPhase::Res, "fn f() = g()");
        assert!(output.contains("Undeclared identifier: 'g'"));
    }
}
