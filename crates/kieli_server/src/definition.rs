//! Goto definition: the defining name of the symbol at the cursor.

use crate::hover::symbol_at;
use crate::line_index::LineIndex;
use kieli_base::Position;
use kieli_compiler::db::{self, Database, DocumentId};
use tower_lsp::lsp_types::{Location, Url};

pub fn goto_definition(
    db: &Database,
    doc_id: DocumentId,
    index: &LineIndex,
    position: Position,
    uri: &Url,
) -> Option<Location> {
    let symbol_id = symbol_at(db, doc_id, position)?;
    let range = db::symbol_definition(&db.documents[doc_id].arena, symbol_id);
    Some(Location {
        uri: uri.clone(),
        range: index.to_lsp_range(range),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    #[test]
    fn definition_of_a_call_is_the_function_name() {
        let mut database = db::database(Configuration::full());
        let source = "fn g(): I32 = 5\nfn f(): I32 = g()";
        let doc_id = db::test_document(&mut database, source.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let index = LineIndex::new(source);
        let uri = Url::from_file_path("/tmp/x.ki").unwrap();

        // The `g` in `g()` on line 1.
        let location =
            goto_definition(&database, doc_id, &index, Position::new(1, 14), &uri).unwrap();
        assert_eq!(location.range.start.line, 0);
        assert_eq!(location.range.start.character, 3);
    }
}
