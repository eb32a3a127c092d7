//! Document formatting: one edit spanning the whole document.

use crate::line_index::LineIndex;
use kieli_compiler::db::{self, Configuration, Database, DocumentId};
use tower_lsp::lsp_types::TextEdit;

/// Formats the whole document, or returns no edits when the text does
/// not parse cleanly — reformatting broken code would destroy it.
pub fn format_document(db: &Database, doc_id: DocumentId, index: &LineIndex) -> Vec<TextEdit> {
    let text = db.documents[doc_id].text.clone();

    // Parse into a scratch database so the real document's diagnostics
    // are untouched.
    let mut scratch = db::database(Configuration::default());
    let scratch_id = db::test_document(&mut scratch, text);
    let tokens = kieli_lex::lex(&mut scratch, scratch_id);
    let (arena, module) = kieli_parse::parse(&mut scratch, scratch_id, &tokens);
    if !scratch.documents[scratch_id].info.diagnostics.is_empty() {
        return Vec::new();
    }

    let formatted = kieli_format::format_module(&arena, &scratch.string_pool, &module);
    if formatted == scratch.documents[scratch_id].text {
        return Vec::new();
    }
    vec![TextEdit {
        range: index.full_range(),
        new_text: formatted,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_replaces_the_whole_document() {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, "fn   f( ) =5".to_string());
        let index = LineIndex::new(&database.documents[doc_id].text);
        let edits = format_document(&database, doc_id, &index);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "fn f() = 5\n");
    }

    #[test]
    fn broken_documents_are_left_alone() {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, "fn f( = oops".to_string());
        let index = LineIndex::new(&database.documents[doc_id].text);
        assert!(format_document(&database, doc_id, &index).is_empty());
    }

    #[test]
    fn formatted_documents_produce_no_edits() {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, "fn f() = 5\n".to_string());
        let index = LineIndex::new(&database.documents[doc_id].text);
        assert!(format_document(&database, doc_id, &index).is_empty());
    }
}
