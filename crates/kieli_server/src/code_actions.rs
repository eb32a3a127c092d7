//! Code actions: quick fixes derived from the collected action records.

use crate::line_index::LineIndex;
use kieli_compiler::db::{ActionVariant, Database, DocumentId};
use std::collections::HashMap;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, Range, TextEdit, Url, WorkspaceEdit,
};

pub fn code_actions(
    db: &Database,
    doc_id: DocumentId,
    index: &LineIndex,
    range: Range,
    uri: &Url,
) -> Vec<CodeActionOrCommand> {
    let arena = &db.documents[doc_id].arena;
    db.documents[doc_id]
        .info
        .actions
        .iter()
        .filter_map(|action| {
            let action_range = index.to_lsp_range(action.range);
            if action_range.end < range.start || range.end < action_range.start {
                return None;
            }
            match action.variant {
                ActionVariant::SilenceUnused { symbol_id } => {
                    let name = arena.symbols[symbol_id].name;
                    let text = db.string_pool.get(name.id);
                    let start = index.to_lsp(name.range.start);
                    let edit = TextEdit {
                        range: Range {
                            start,
                            end: start,
                        },
                        new_text: "_".to_string(),
                    };
                    let mut changes = HashMap::new();
                    changes.insert(uri.clone(), vec![edit]);
                    Some(CodeActionOrCommand::CodeAction(CodeAction {
                        title: format!("Rename to '_{text}' to silence the warning"),
                        kind: Some(CodeActionKind::QUICKFIX),
                        edit: Some(WorkspaceEdit {
                            changes: Some(changes),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }))
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    #[test]
    fn unused_binding_offers_underscore_prefix() {
        let mut database = db::database(Configuration::full());
        let source = "fn f() { let x = 5; }";
        let doc_id = db::test_document(&mut database, source.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let index = LineIndex::new(source);
        let uri = Url::from_file_path("/tmp/x.ki").unwrap();

        let actions = code_actions(&database, doc_id, &index, index.full_range(), &uri);
        assert_eq!(actions.len(), 1);
        let CodeActionOrCommand::CodeAction(action) = &actions[0] else {
            panic!("expected a code action");
        };
        assert!(action.title.contains("_x"));
        let edit = action.edit.as_ref().unwrap();
        let edits = &edit.changes.as_ref().unwrap()[&uri];
        assert_eq!(edits[0].new_text, "_");
        assert_eq!(edits[0].range.start.character, 13);
    }
}
