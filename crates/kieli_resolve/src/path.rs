//! Qualified path resolution.
//!
//! A path starts from one of three roots: implicit (ascend the scope
//! chain of environments), global (the document root), or a type's
//! associated environment. Every matched segment bumps the symbol's use
//! count, records a read reference, and registers a completion
//! candidate; every intermediate segment must denote something with an
//! associated environment.

use crate::context::{Context, InferenceState};
use crate::definitions;
use kieli_compiler::db::{
    self, CompletionMode, EnvironmentId, ScopeId, SymbolId, SymbolVariant,
};
use kieli_compiler::lsp::{self, SemanticTokenType};
use kieli_compiler::{ast, hir, Name};

fn set_completion(ctx: &mut Context<'_>, env_id: EnvironmentId, name: Name, mode: CompletionMode) {
    db::add_completion(ctx.db, ctx.doc_id, name, env_id, mode);
}

fn environment_name(ctx: &Context<'_>, env_id: EnvironmentId) -> String {
    match ctx.arena.environments[env_id].name_id {
        Some(name_id) => format!("Module '{}'", ctx.string(name_id)),
        None => "The root module".to_string(),
    }
}

/// The semantic token class for a reference to `variant`.
pub fn symbol_token_type(variant: SymbolVariant) -> Option<SemanticTokenType> {
    match variant {
        SymbolVariant::Function(_) => Some(SemanticTokenType::Function),
        SymbolVariant::Structure(_) => Some(SemanticTokenType::Structure),
        SymbolVariant::Enumeration(_) => Some(SemanticTokenType::Enumeration),
        SymbolVariant::Constructor(_) => Some(SemanticTokenType::Constructor),
        SymbolVariant::Field(_) => Some(SemanticTokenType::Property),
        SymbolVariant::Concept(_) => Some(SemanticTokenType::Interface),
        SymbolVariant::Alias(_) | SymbolVariant::LocalType(_) => Some(SemanticTokenType::Type),
        SymbolVariant::Module(_) => Some(SemanticTokenType::Module),
        SymbolVariant::LocalVariable(_) | SymbolVariant::LocalMutability(_) => {
            Some(SemanticTokenType::Variable)
        }
        SymbolVariant::Error => None,
    }
}

/// The associated environment behind `type_id`, resolving the named
/// definition if needed.
pub fn type_associated_environment(
    ctx: &mut Context<'_>,
    type_id: hir::TypeId,
) -> Option<EnvironmentId> {
    match ctx.arena.hir.types[type_id].clone() {
        hir::TypeVariant::Enumeration { id, .. } => {
            definitions::resolve_enumeration(ctx, id);
            Some(ctx.arena.hir.enumerations[id].associated_env_id)
        }
        hir::TypeVariant::Structure { id, .. } => {
            definitions::resolve_structure(ctx, id);
            Some(ctx.arena.hir.structures[id].associated_env_id)
        }
        _ => None,
    }
}

fn symbol_environment(ctx: &mut Context<'_>, symbol_id: SymbolId) -> Option<EnvironmentId> {
    match ctx.arena.symbols[symbol_id].variant {
        SymbolVariant::Module(module_id) => Some(ctx.arena.hir.modules[module_id].mod_env_id),
        SymbolVariant::Enumeration(id) => {
            definitions::resolve_enumeration(ctx, id);
            Some(ctx.arena.hir.enumerations[id].associated_env_id)
        }
        SymbolVariant::Structure(id) => {
            definitions::resolve_structure(ctx, id);
            Some(ctx.arena.hir.structures[id].associated_env_id)
        }
        SymbolVariant::Alias(id) => {
            let alias = definitions::resolve_alias(ctx, id)?;
            type_associated_environment(ctx, alias.aliased_type.id)
        }
        _ => None,
    }
}

fn apply_segment(
    ctx: &mut Context<'_>,
    env_id: EnvironmentId,
    segment: &ast::PathSegment,
) -> Option<SymbolId> {
    let symbol_id = *ctx.arena.environments[env_id].map.get(&segment.name.id)?;
    if segment.template_arguments.is_some() {
        let message = "Template argument resolution has not been implemented".to_string();
        ctx.add_error(segment.name.range, message);
    }
    ctx.arena.symbols[symbol_id].use_count += 1;
    db::add_reference(ctx.db, ctx.doc_id, lsp::read(segment.name.range), symbol_id);
    if let Some(token_type) = symbol_token_type(ctx.arena.symbols[symbol_id].variant) {
        db::add_semantic_token(ctx.db, ctx.doc_id, segment.name.range, token_type);
    }
    Some(symbol_id)
}

fn lookup(
    ctx: &mut Context<'_>,
    site_env_id: EnvironmentId,
    mut lookup_env_id: EnvironmentId,
    mut mode: CompletionMode,
    segments: &[ast::PathSegment],
) -> SymbolId {
    let mut remaining = segments;
    loop {
        let (segment, rest) = remaining
            .split_first()
            .expect("a path has at least one segment");
        remaining = rest;

        let complete_env_id = if mode == CompletionMode::Path {
            lookup_env_id
        } else {
            site_env_id
        };
        set_completion(ctx, complete_env_id, segment.name, mode);
        mode = CompletionMode::Path;

        let Some(symbol_id) = apply_segment(ctx, lookup_env_id, segment) else {
            let message = format!(
                "{} does not contain '{}'",
                environment_name(ctx, lookup_env_id),
                ctx.string(segment.name.id)
            );
            ctx.add_error(segment.name.range, message);
            return ctx.new_symbol(segment.name, SymbolVariant::Error);
        };

        if remaining.is_empty() {
            return symbol_id;
        }
        match symbol_environment(ctx, symbol_id) {
            Some(next_env_id) => lookup_env_id = next_env_id,
            None => {
                let message = format!(
                    "Expected a module, but '{}' is {}",
                    ctx.string(segment.name.id),
                    db::describe_symbol_kind(ctx.arena.symbols[symbol_id].variant)
                );
                ctx.add_error(segment.name.range, message);
                return ctx.new_symbol(segment.name, SymbolVariant::Error);
            }
        }
    }
}

fn find_starting_point(
    ctx: &Context<'_>,
    mut env_id: EnvironmentId,
    name: Name,
) -> Option<EnvironmentId> {
    loop {
        let env = &ctx.arena.environments[env_id];
        if env.map.contains_key(&name.id) {
            return Some(env_id);
        }
        env_id = env.parent_id?;
    }
}

/// Resolve `path` against `env_id`, returning the symbol it denotes.
/// Failures produce an `Error` symbol and a diagnostic; resolution
/// always returns a symbol.
pub fn resolve_path(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    path: &ast::Path,
) -> SymbolId {
    match &path.root {
        ast::PathRoot::Implicit => {
            let front = path.segments.first().expect("a path has at least one segment");
            match find_starting_point(ctx, env_id, front.name) {
                Some(start_env_id) => lookup(
                    ctx,
                    env_id,
                    start_env_id,
                    CompletionMode::Top,
                    &path.segments,
                ),
                None => {
                    set_completion(ctx, env_id, front.name, CompletionMode::Top);
                    let message =
                        format!("Undeclared identifier: '{}'", ctx.string(front.name.id));
                    ctx.add_error(front.name.range, message);
                    ctx.new_symbol(front.name, SymbolVariant::Error)
                }
            }
        }
        ast::PathRoot::Global => {
            let root_env_id = ctx.root_env_id;
            lookup(ctx, env_id, root_env_id, CompletionMode::Path, &path.segments)
        }
        ast::PathRoot::Type(type_id) => {
            let ast_type = ctx.arena.ast.types[*type_id].clone();
            let resolved = crate::types::resolve_type(ctx, state, scope_id, env_id, &ast_type);
            match type_associated_environment(ctx, resolved.id) {
                Some(associated_env_id) => lookup(
                    ctx,
                    env_id,
                    associated_env_id,
                    CompletionMode::Path,
                    &path.segments,
                ),
                None => {
                    let message = format!(
                        "'{}' has no associated environment",
                        ctx.type_to_string(resolved.id)
                    );
                    ctx.add_error(resolved.range, message);
                    let name = Name {
                        id: ctx.db.string_pool.intern("(ERROR)"),
                        range: resolved.range,
                    };
                    ctx.new_symbol(name, SymbolVariant::Error)
                }
            }
        }
    }
}
