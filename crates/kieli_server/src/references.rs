//! Find references: every recorded occurrence of the symbol at the
//! cursor.

use crate::hover::symbol_at;
use crate::line_index::LineIndex;
use kieli_base::Position;
use kieli_compiler::db::{Database, DocumentId};
use kieli_compiler::lsp::ReferenceKind;
use tower_lsp::lsp_types::{Location, Url};

pub fn find_references(
    db: &Database,
    doc_id: DocumentId,
    index: &LineIndex,
    position: Position,
    uri: &Url,
    include_declaration: bool,
) -> Vec<Location> {
    let Some(symbol_id) = symbol_at(db, doc_id, position) else {
        return Vec::new();
    };
    let arena = &db.documents[doc_id].arena;
    // Distinct symbol records can stand for the same declaration (a
    // parameter is rebound for the body, for instance); occurrences are
    // grouped by the defining name instead of the raw symbol id.
    let target_name = arena.symbols[symbol_id].name;

    let mut locations: Vec<Location> = db.documents[doc_id]
        .info
        .references
        .iter()
        .filter(|reference| arena.symbols[reference.symbol_id].name == target_name)
        .filter(|reference| {
            include_declaration || reference.reference.kind != ReferenceKind::Write
        })
        .map(|reference| Location {
            uri: uri.clone(),
            range: index.to_lsp_range(reference.reference.range),
        })
        .collect();
    locations.sort_by_key(|location| (location.range.start.line, location.range.start.character));
    locations.dedup();
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    #[test]
    fn references_include_every_read() {
        let mut database = db::database(Configuration::full());
        let source = "fn g(): I32 = 5\nfn f(): I32 = g()\nfn h(): I32 = g()";
        let doc_id = db::test_document(&mut database, source.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let index = LineIndex::new(source);
        let uri = Url::from_file_path("/tmp/x.ki").unwrap();

        let with_declaration =
            find_references(&database, doc_id, &index, Position::new(0, 3), &uri, true);
        assert_eq!(with_declaration.len(), 3);

        let without_declaration =
            find_references(&database, doc_id, &index, Position::new(0, 3), &uri, false);
        assert_eq!(without_declaration.len(), 2);
    }
}
