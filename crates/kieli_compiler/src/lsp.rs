//! Editor-protocol values.
//!
//! These are the protocol-shaped records the pipeline collects while
//! analyzing a document: diagnostics, semantic tokens, symbol
//! references, and locations. They deliberately mirror the Language
//! Server Protocol's data model but stay independent of any transport
//! crate; the server translates them at its boundary.

use crate::db::DocumentId;
use kieli_base::Range;

/// Diagnostic severity, from most to least severe.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// Extra presentation semantics attached to a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DiagnosticTag {
    #[default]
    None,
    /// The spanned code is unused or unreachable; clients fade it out.
    Unnecessary,
    Deprecated,
}

/// A document position range within a specific document.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Location {
    pub doc_id: DocumentId,
    pub range: Range,
}

/// A secondary location that explains a diagnostic, such as the first
/// of two duplicate definitions.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DiagnosticRelated {
    pub message: String,
    pub location: Location,
}

/// A single analysis finding attached to a document.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub range: Range,
    pub severity: Severity,
    pub related_info: Vec<DiagnosticRelated>,
    pub tag: DiagnosticTag,
}

fn diagnostic(range: Range, message: String, severity: Severity) -> Diagnostic {
    Diagnostic {
        message,
        range,
        severity,
        related_info: Vec::new(),
        tag: DiagnosticTag::None,
    }
}

/// An error diagnostic with no related information.
pub fn error(range: Range, message: String) -> Diagnostic {
    diagnostic(range, message, Severity::Error)
}

/// A warning diagnostic with no related information.
pub fn warning(range: Range, message: String) -> Diagnostic {
    diagnostic(range, message, Severity::Warning)
}

/// An informational diagnostic with no related information.
pub fn info(range: Range, message: String) -> Diagnostic {
    diagnostic(range, message, Severity::Information)
}

/// Whether a symbol occurrence reads or writes the symbol.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ReferenceKind {
    Read,
    Write,
}

/// One occurrence of a symbol in source text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Reference {
    pub range: Range,
    pub kind: ReferenceKind,
}

/// A read occurrence at `range`.
pub fn read(range: Range) -> Reference {
    Reference {
        range,
        kind: ReferenceKind::Read,
    }
}

/// A write occurrence at `range`.
pub fn write(range: Range) -> Reference {
    Reference {
        range,
        kind: ReferenceKind::Write,
    }
}

/// Classification of a highlighted source region.
///
/// The parser emits the lexical classes (keyword, number, string,
/// operator); the resolver refines identifiers into functions, types,
/// modules, and the rest once it knows what they name.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SemanticTokenType {
    Comment,
    Constructor,
    Enumeration,
    Function,
    Interface,
    Keyword,
    Module,
    Number,
    Operator,
    Parameter,
    Property,
    String,
    Structure,
    Type,
    TypeParameter,
    Variable,
}

/// A classified source region for editor highlighting.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SemanticToken {
    pub range: Range,
    pub kind: SemanticTokenType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_base::Position;

    fn range() -> Range {
        Range::new(Position::new(1, 2), Position::new(1, 5))
    }

    #[test]
    fn error_constructor_sets_severity() {
        let diagnostic = error(range(), "bad".to_string());
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.range, range());
        assert!(diagnostic.related_info.is_empty());
    }

    #[test]
    fn warning_and_info_severities() {
        assert_eq!(warning(range(), String::new()).severity, Severity::Warning);
        assert_eq!(info(range(), String::new()).severity, Severity::Information);
    }

    #[test]
    fn reference_constructors() {
        assert_eq!(read(range()).kind, ReferenceKind::Read);
        assert_eq!(write(range()).kind, ReferenceKind::Write);
    }
}
