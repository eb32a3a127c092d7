//! Hover: a markdown summary of the symbol at the cursor.

use crate::line_index::LineIndex;
use kieli_base::Position;
use kieli_compiler::db::{self, Database, DocumentId, SymbolId};
use kieli_compiler::hir_display;
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind};

/// The innermost recorded symbol reference containing `position`.
pub fn symbol_at(db: &Database, doc_id: DocumentId, position: Position) -> Option<SymbolId> {
    db.documents[doc_id]
        .info
        .references
        .iter()
        .filter(|reference| reference.reference.range.contains_inclusive(position))
        .min_by_key(|reference| {
            let range = reference.reference.range;
            (range.stop.line - range.start.line, range.stop.column.wrapping_sub(range.start.column))
        })
        .map(|reference| reference.symbol_id)
}

pub fn hover(db: &Database, doc_id: DocumentId, index: &LineIndex, position: Position) -> Option<Hover> {
    let symbol_id = symbol_at(db, doc_id, position)?;
    let arena = &db.documents[doc_id].arena;
    let symbol = arena.symbols[symbol_id];
    let name = db.string_pool.get(symbol.name.id);

    let mut value = String::new();
    match db::symbol_type(arena, symbol_id) {
        Some(type_id) => {
            let rendered = hir_display::type_to_string(&arena.hir, &db.string_pool, type_id);
            value.push_str(&format!("```kieli\n{name}: {rendered}\n```\n\n"));
        }
        None => value.push_str(&format!("```kieli\n{name}\n```\n\n")),
    }
    value.push_str(&format!("*{}*", db::describe_symbol_kind(symbol.variant)));

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(index.to_lsp_range(symbol.name.range)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::Configuration;

    fn analyzed(text: &str) -> (Database, DocumentId) {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, text.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        (database, doc_id)
    }

    #[test]
    fn hover_shows_the_function_type() {
        let (database, doc_id) = analyzed("fn f(x: I32): I32 = x");
        let index = LineIndex::new(&database.documents[doc_id].text);
        // Hover over the `x` in the body.
        let hover = hover(&database, doc_id, &index, Position::new(0, 20)).unwrap();
        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup hover");
        };
        assert!(markup.value.contains("x: I32"), "{}", markup.value);
        assert!(markup.value.contains("local variable"), "{}", markup.value);
    }

    #[test]
    fn hover_away_from_symbols_is_none() {
        let (database, doc_id) = analyzed("fn f(x: I32): I32 = x");
        let index = LineIndex::new(&database.documents[doc_id].text);
        assert!(hover(&database, doc_id, &index, Position::new(0, 1)).is_none());
    }
}
