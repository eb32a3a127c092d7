//! Inlay hints: inferred types after `let` bindings, parameter names
//! at call sites.

use crate::line_index::LineIndex;
use kieli_compiler::db::{Database, DocumentId, InlayHintVariant};
use kieli_compiler::{hir, hir_display};
use tower_lsp::lsp_types::{InlayHint, InlayHintKind, InlayHintLabel, Range};

pub fn inlay_hints(
    db: &Database,
    doc_id: DocumentId,
    index: &LineIndex,
    range: Range,
) -> Vec<InlayHint> {
    let arena = &db.documents[doc_id].arena;
    let unbounded = range == Range::default();

    db.documents[doc_id]
        .info
        .inlay_hints
        .iter()
        .filter_map(|hint| {
            let position = index.to_lsp(hint.position);
            if !unbounded && (position < range.start || position > range.end) {
                return None;
            }
            let (label, kind, padding_left, padding_right) = match hint.variant {
                InlayHintVariant::Type(type_id) => {
                    let rendered =
                        hir_display::type_to_string(&arena.hir, &db.string_pool, type_id);
                    (format!(": {rendered}"), InlayHintKind::TYPE, false, true)
                }
                InlayHintVariant::Parameter(pattern_id) => {
                    let name = parameter_name(arena, pattern_id)?;
                    let name = db.string_pool.get(name.id);
                    (format!("{name} ="), InlayHintKind::PARAMETER, false, true)
                }
            };
            Some(InlayHint {
                position,
                label: InlayHintLabel::String(label),
                kind: Some(kind),
                text_edits: None,
                tooltip: None,
                padding_left: Some(padding_left),
                padding_right: Some(padding_right),
                data: None,
            })
        })
        .collect()
}

fn parameter_name(
    arena: &kieli_compiler::db::DocumentArena,
    pattern_id: hir::PatternId,
) -> Option<kieli_compiler::Name> {
    match &arena.hir.patterns[pattern_id].variant {
        hir::PatternVariant::Name { name, .. } => Some(*name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    fn hints_for(source: &str) -> Vec<InlayHint> {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, source.to_string());
        kieli_resolve::analyze_document(&mut database, doc_id);
        let index = LineIndex::new(source);
        inlay_hints(&database, doc_id, &index, Range::default())
    }

    #[test]
    fn let_without_annotation_gets_a_type_hint() {
        let hints = hints_for("fn f() { let x = 5; discard x; }");
        let type_hints: Vec<_> = hints
            .iter()
            .filter(|hint| hint.kind == Some(InlayHintKind::TYPE))
            .collect();
        assert_eq!(type_hints.len(), 1);
        let InlayHintLabel::String(label) = &type_hints[0].label else {
            panic!("expected a string label");
        };
        assert_eq!(label, ": I32");
    }

    #[test]
    fn annotated_let_gets_no_type_hint() {
        let hints = hints_for("fn f() { let x: I64 = 5; discard x; }");
        assert!(hints
            .iter()
            .all(|hint| hint.kind != Some(InlayHintKind::TYPE)));
    }

    #[test]
    fn call_arguments_get_parameter_hints() {
        let hints = hints_for("fn g(count: I32): I32 = count\nfn f(): I32 = g(5)");
        let parameter_hints: Vec<_> = hints
            .iter()
            .filter(|hint| hint.kind == Some(InlayHintKind::PARAMETER))
            .collect();
        assert_eq!(parameter_hints.len(), 1);
        let InlayHintLabel::String(label) = &parameter_hints[0].label else {
            panic!("expected a string label");
        };
        assert_eq!(label, "count =");
    }
}
