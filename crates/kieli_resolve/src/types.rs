//! Type and mutability resolution.

use crate::context::{Context, InferenceState};
use crate::unify;
use crate::{definitions, expressions, path};
use kieli_compiler::db::{self, EnvironmentId, ScopeId, SymbolVariant};
use kieli_compiler::{ast, hir, BuiltInType};

pub fn resolve_mutability(
    ctx: &mut Context<'_>,
    scope_id: ScopeId,
    mutability: &ast::Mutability,
) -> hir::Mutability {
    match &mutability.variant {
        ast::MutabilityVariant::Concrete(kieli_compiler::ConcreteMutability::Mut) => {
            hir::Mutability {
                id: ctx.constants.mutability_yes,
                range: mutability.range,
            }
        }
        ast::MutabilityVariant::Concrete(kieli_compiler::ConcreteMutability::Immut) => {
            hir::Mutability {
                id: ctx.constants.mutability_no,
                range: mutability.range,
            }
        }
        ast::MutabilityVariant::Parameterized { name } => {
            match ctx.find_mutability(scope_id, name.id) {
                Some(bind) => {
                    db::add_reference(
                        ctx.db,
                        ctx.doc_id,
                        kieli_compiler::lsp::read(name.range),
                        bind.symbol_id,
                    );
                    hir::Mutability {
                        id: ctx.arena.hir.local_mutabilities[bind.local_id].mutability_id,
                        range: mutability.range,
                    }
                }
                None => {
                    let message =
                        format!("Undeclared mutability parameter: '{}'", ctx.string(name.id));
                    ctx.add_error(name.range, message);
                    hir::Mutability {
                        id: ctx.constants.mutability_error,
                        range: mutability.range,
                    }
                }
            }
        }
    }
}

fn built_in_type_id(ctx: &Context<'_>, built_in: BuiltInType) -> hir::TypeId {
    match built_in {
        BuiltInType::Integer(integer) => ctx.constants.integer_type(integer),
        BuiltInType::Floating => ctx.constants.floating_type,
        BuiltInType::Character => ctx.constants.character_type,
        BuiltInType::Boolean => ctx.constants.boolean_type,
        BuiltInType::String => ctx.constants.string_type,
    }
}

fn resolve_path_type(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    ast_path: &ast::Path,
    range: kieli_base::Range,
) -> hir::Type {
    // A bare name can refer to a locally bound type: a template type
    // parameter or an `alias` expression binding.
    if ast_path.is_unqualified() {
        let name = ast_path.segments[0].name;
        if let Some(bind) = ctx.find_type(scope_id, name.id) {
            db::add_reference(
                ctx.db,
                ctx.doc_id,
                kieli_compiler::lsp::read(name.range),
                bind.symbol_id,
            );
            db::add_semantic_token(
                ctx.db,
                ctx.doc_id,
                name.range,
                kieli_compiler::lsp::SemanticTokenType::TypeParameter,
            );
            return hir::Type {
                id: ctx.arena.hir.local_types[bind.local_id].type_id,
                range,
            };
        }
    }

    let symbol_id = path::resolve_path(ctx, state, scope_id, env_id, ast_path);
    let symbol = ctx.arena.symbols[symbol_id];
    match symbol.variant {
        SymbolVariant::Structure(id) => hir::Type {
            id: ctx.arena.hir.structures[id].type_id,
            range,
        },
        SymbolVariant::Enumeration(id) => hir::Type {
            id: ctx.arena.hir.enumerations[id].type_id,
            range,
        },
        SymbolVariant::Alias(id) => match definitions::resolve_alias(ctx, id) {
            Some(alias) => hir::Type {
                id: alias.aliased_type.id,
                range,
            },
            None => ctx.error_type(range),
        },
        SymbolVariant::Error => ctx.error_type(range),
        variant => {
            let message = format!(
                "Expected a type, but '{}' is {}",
                ctx.string(symbol.name.id),
                db::describe_symbol_kind(variant)
            );
            ctx.add_error(range, message);
            ctx.error_type(range)
        }
    }
}

pub fn resolve_type(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    ty: &ast::Type,
) -> hir::Type {
    let range = ty.range;
    match &ty.variant {
        ast::TypeVariant::BuiltIn(built_in) => hir::Type {
            id: built_in_type_id(ctx, *built_in),
            range,
        },
        ast::TypeVariant::Path(ast_path) => {
            resolve_path_type(ctx, state, scope_id, env_id, ast_path, range)
        }
        ast::TypeVariant::Tuple { fields } => {
            if fields.is_empty() {
                return ctx.unit_type(range);
            }
            let types = fields
                .iter()
                .map(|&field| {
                    let field_type = ctx.arena.ast.types[field].clone();
                    resolve_type(ctx, state, scope_id, env_id, &field_type)
                })
                .collect();
            hir::Type {
                id: ctx.arena.hir.types.push(hir::TypeVariant::Tuple { types }),
                range,
            }
        }
        ast::TypeVariant::Slice { element } => {
            let element_ast = ctx.arena.ast.types[*element].clone();
            let element_type = resolve_type(ctx, state, scope_id, env_id, &element_ast);
            hir::Type {
                id: ctx
                    .arena
                    .hir
                    .types
                    .push(hir::TypeVariant::Slice { element_type }),
                range,
            }
        }
        ast::TypeVariant::Array { element, length } => {
            let element_ast = ctx.arena.ast.types[*element].clone();
            let element_type = resolve_type(ctx, state, scope_id, env_id, &element_ast);

            let length_ast = ctx.arena.ast.expressions[*length].clone();
            let length = expressions::resolve_expression(ctx, state, scope_id, env_id, &length_ast);
            // Array lengths are machine-width unsigned integers.
            let u64_type = ctx.constants.u64_type;
            unify::require_subtype(ctx, state, length.range, length.type_id, u64_type);
            let length = ctx.arena.hir.expressions.push(length);

            hir::Type {
                id: ctx.arena.hir.types.push(hir::TypeVariant::Array {
                    element_type,
                    length,
                }),
                range,
            }
        }
        ast::TypeVariant::Function {
            parameters,
            return_type,
        } => {
            let parameter_types = parameters
                .iter()
                .map(|&parameter| {
                    let parameter_ast = ctx.arena.ast.types[parameter].clone();
                    resolve_type(ctx, state, scope_id, env_id, &parameter_ast)
                })
                .collect();
            let return_ast = ctx.arena.ast.types[*return_type].clone();
            let return_type = resolve_type(ctx, state, scope_id, env_id, &return_ast);
            hir::Type {
                id: ctx.arena.hir.types.push(hir::TypeVariant::Function {
                    parameter_types,
                    return_type,
                }),
                range,
            }
        }
        ast::TypeVariant::Typeof { expression } => {
            // The inspected expression lives in its own scope and is
            // discarded; only its type survives.
            let typeof_scope = ctx.child_scope(scope_id);
            let expression_ast = ctx.arena.ast.expressions[*expression].clone();
            let inspected =
                expressions::resolve_expression(ctx, state, typeof_scope, env_id, &expression_ast);
            ctx.leave_scope(typeof_scope, false);
            hir::Type {
                id: inspected.type_id,
                range,
            }
        }
        ast::TypeVariant::Reference {
            mutability,
            referenced,
        } => {
            let mutability = resolve_mutability(ctx, scope_id, mutability);
            let referenced_ast = ctx.arena.ast.types[*referenced].clone();
            let referenced_type = resolve_type(ctx, state, scope_id, env_id, &referenced_ast);
            hir::Type {
                id: ctx.arena.hir.types.push(hir::TypeVariant::Reference {
                    referenced_type,
                    mutability,
                }),
                range,
            }
        }
        ast::TypeVariant::Pointer { mutability, pointee } => {
            let mutability = resolve_mutability(ctx, scope_id, mutability);
            let pointee_ast = ctx.arena.ast.types[*pointee].clone();
            let pointee_type = resolve_type(ctx, state, scope_id, env_id, &pointee_ast);
            hir::Type {
                id: ctx.arena.hir.types.push(hir::TypeVariant::Pointer {
                    pointee_type,
                    mutability,
                }),
                range,
            }
        }
        ast::TypeVariant::Wildcard => ctx.fresh_general_type_variable(state, range),
        ast::TypeVariant::SelfType => match ctx.self_type {
            Some(self_type) => hir::Type {
                id: self_type.id,
                range,
            },
            None => {
                let message =
                    "The Self type is only accessible within 'impl' blocks".to_string();
                ctx.add_error(range, message);
                ctx.error_type(range)
            }
        },
        ast::TypeVariant::ImplConcepts { .. } => {
            let message = "Concept resolution has not been implemented".to_string();
            ctx.add_error(range, message);
            ctx.error_type(range)
        }
        ast::TypeVariant::Error => ctx.error_type(range),
    }
}
