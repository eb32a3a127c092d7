//! Code completion from the anchored completion record.
//!
//! The resolver records at most one completion candidate per analysis:
//! the environment to enumerate, the mode, and the prefix typed so far.
//! Top mode walks the whole environment chain outward; path mode lists
//! only the environment the previous segment resolved to.

use kieli_compiler::db::{CompletionMode, Database, DocumentId, SymbolVariant};
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, CompletionResponse};

fn item_kind(variant: SymbolVariant) -> CompletionItemKind {
    match variant {
        SymbolVariant::Function(_) => CompletionItemKind::FUNCTION,
        SymbolVariant::Structure(_) => CompletionItemKind::STRUCT,
        SymbolVariant::Enumeration(_) => CompletionItemKind::ENUM,
        SymbolVariant::Constructor(_) => CompletionItemKind::ENUM_MEMBER,
        SymbolVariant::Field(_) => CompletionItemKind::FIELD,
        SymbolVariant::Concept(_) => CompletionItemKind::INTERFACE,
        SymbolVariant::Alias(_) | SymbolVariant::LocalType(_) => CompletionItemKind::TYPE_PARAMETER,
        SymbolVariant::Module(_) => CompletionItemKind::MODULE,
        SymbolVariant::LocalVariable(_) | SymbolVariant::LocalMutability(_) => {
            CompletionItemKind::VARIABLE
        }
        SymbolVariant::Error => CompletionItemKind::TEXT,
    }
}

/// Builds the completion list for the document's recorded completion
/// info, if any.
pub fn completions(db: &Database, doc_id: DocumentId) -> Option<CompletionResponse> {
    let info = db.documents[doc_id].info.completion_info.as_ref()?;
    let arena = &db.documents[doc_id].arena;

    let mut items = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut env_id = Some(info.env_id);
    while let Some(id) = env_id {
        let environment = &arena.environments[id];
        for &symbol_id in &environment.in_order {
            let symbol = arena.symbols[symbol_id];
            let label = db.string_pool.get(symbol.name.id).to_string();
            if !label.starts_with(info.prefix.as_str()) || !seen.insert(label.clone()) {
                continue;
            }
            items.push(CompletionItem {
                label,
                kind: Some(item_kind(symbol.variant)),
                detail: Some(
                    kieli_compiler::db::describe_symbol_kind(symbol.variant).to_string(),
                ),
                ..Default::default()
            });
        }
        // Path mode lists exactly one environment.
        env_id = match info.mode {
            CompletionMode::Top => environment.parent_id,
            CompletionMode::Path => None,
        };
    }

    if items.is_empty() {
        return None;
    }
    items.sort_by(|a, b| a.label.cmp(&b.label));
    Some(CompletionResponse::Array(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_base::Position;
    use kieli_compiler::db::{self, Configuration};

    fn completions_at(text: &str, position: Position) -> Option<CompletionResponse> {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, text.to_string());
        database.documents[doc_id].edit_position = Some(position);
        kieli_resolve::analyze_document(&mut database, doc_id);
        completions(&database, doc_id)
    }

    #[test]
    fn top_level_completion_lists_prefix_matches() {
        // Cursor inside `ma` on the second line.
        let source = "fn magic(): I32 = 5\nfn main(): I32 = ma()";
        let response = completions_at(source, Position::new(1, 19)).unwrap();
        let CompletionResponse::Array(items) = response else {
            panic!("expected an item array");
        };
        let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["magic", "main"]);
    }

    #[test]
    fn path_completion_lists_module_members() {
        // Cursor on `g` of `m::g`.
        let source = "module m { fn g(): I32 = 5 }\nfn f(): I32 = m::g()";
        let response = completions_at(source, Position::new(1, 17)).unwrap();
        let CompletionResponse::Array(items) = response else {
            panic!("expected an item array");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "g");
        assert_eq!(items[0].kind, Some(CompletionItemKind::FUNCTION));
    }
}
