//! # kieli-resolve
//!
//! Name resolution and type inference: the pipeline stage that turns a
//! desugared module into a type-checked HIR and fills the document's
//! collected info (diagnostics, semantic tokens, hints, references,
//! completions).
//!
//! [`analyze_document`] drives the whole pipeline for one document:
//! lex, parse, desugar, collect environments, resolve definitions, and
//! finally resolve every function body. Each signature or body is one
//! *resolution unit* with its own inference variables; at the end of a
//! unit every variable is solved, defaulted, or reported.

use kieli_compiler::db::{self, Database, DocumentId};

pub mod context;
pub mod definitions;
pub mod expressions;
pub mod path;
pub mod patterns;
pub mod types;
pub mod unify;

pub use context::{Context, InferenceState};

/// Analyze one document from scratch, replacing its arenas and
/// collected info.
pub fn analyze_document(db: &mut Database, doc_id: DocumentId) {
    let mut in_progress = Vec::new();
    analyze_inner(db, doc_id, &mut in_progress);
}

fn analyze_inner(db: &mut Database, doc_id: DocumentId, in_progress: &mut Vec<DocumentId>) {
    if in_progress.contains(&doc_id) {
        return;
    }
    in_progress.push(doc_id);

    let document = &mut db.documents[doc_id];
    document.info = db::DocumentInfo::default();
    document.arena = db::DocumentArena::default();

    let tokens = kieli_lex::lex(db, doc_id);
    let (cst_arena, cst_module) = kieli_parse::parse(db, doc_id, &tokens);
    let (ast_arena, ast_module) = kieli_desugar::desugar(db, doc_id, &cst_arena, &cst_module);

    // Imports pull other documents into the database before this
    // document's environment is built.
    for import in &ast_module.imports {
        handle_import(db, doc_id, import, in_progress);
    }

    let arena = db::DocumentArena {
        cst: cst_arena,
        ast: ast_arena,
        ..Default::default()
    };
    let mut ctx = Context::new(db, doc_id, arena);
    let root_env_id = ctx.root_env_id;

    definitions::collect_definitions(&mut ctx, root_env_id, ast_module.definitions);
    definitions::resolve_environment(&mut ctx, root_env_id);
    definitions::attach_impls(&mut ctx);
    definitions::resolve_all_function_bodies(&mut ctx);

    let arena = ctx.arena;
    db.documents[doc_id].arena = arena;
    db.documents[doc_id].info.root_env_id = Some(root_env_id);

    in_progress.pop();
}

/// Maps an import path onto a document and analyzes it. The mapping is
/// purely path → document: segments name directories relative to the
/// importing file, with the configured extension on the last one.
fn handle_import(
    db: &mut Database,
    doc_id: DocumentId,
    import: &kieli_compiler::ast::Import,
    in_progress: &mut Vec<DocumentId>,
) {
    let Some(base) = db::document_path(db, doc_id)
        .and_then(|path| path.parent())
        .map(std::path::Path::to_path_buf)
    else {
        return;
    };
    let mut imported = base;
    for segment in &import.segments {
        imported.push(db.string_pool.get(segment.id));
    }
    imported.set_extension(db.config.extension.clone());

    let imported_id = match db.paths.get(&imported) {
        Some(&existing) => existing,
        None => match db::read_document(db, imported.clone()) {
            Ok(new_id) => new_id,
            Err(failure) => {
                let message = format!(
                    "{}: '{}'",
                    db::describe_read_failure(failure),
                    imported.display()
                );
                db::add_error(db, doc_id, import.range, message);
                return;
            }
        },
    };

    if in_progress.contains(&imported_id) {
        let message = format!("Cyclic import of '{}'", imported.display());
        db::add_error(db, doc_id, import.range, message);
        return;
    }
    analyze_inner(db, imported_id, in_progress);
}
