//! Pattern resolution.
//!
//! Each pattern is resolved against the type of the value it matches;
//! the pattern's own type is unified with that expectation. Name
//! patterns bind local variables into the current scope. Every resolved
//! pattern records whether it is exhaustive by itself, which match
//! resolution and single-constructor enums build on.

use crate::context::{flatten_type, Context, InferenceState};
use crate::unify;
use crate::{definitions, expressions, path, types};
use kieli_compiler::db::{self, EnvironmentId, ScopeId, SymbolVariant, VariableBind};
use kieli_compiler::lsp::{self, SemanticTokenType};
use kieli_compiler::{ast, hir, Name};

/// Creates the local variable info, symbol, and scope binding for a
/// name pattern.
pub fn bind_name(
    ctx: &mut Context<'_>,
    scope_id: ScopeId,
    name: Name,
    type_id: hir::TypeId,
    mutability: hir::Mutability,
) -> hir::LocalVariableId {
    let local_id = ctx.arena.hir.local_variables.push(hir::LocalVariable {
        name,
        type_id,
        mutability_id: mutability.id,
    });
    let symbol_id = ctx.new_symbol(name, SymbolVariant::LocalVariable(local_id));
    db::add_reference(ctx.db, ctx.doc_id, lsp::write(name.range), symbol_id);
    db::add_semantic_token(ctx.db, ctx.doc_id, name.range, SemanticTokenType::Variable);
    ctx.bind_variable(
        scope_id,
        VariableBind {
            name,
            local_id,
            symbol_id,
            mentioned: false,
        },
    );
    local_id
}

fn unify_with_matched(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    pattern_range: kieli_base::Range,
    pattern_type: hir::TypeId,
    matched_type: hir::Type,
) {
    unify::require_subtype(ctx, state, pattern_range, pattern_type, matched_type.id);
}

fn resolve_constructor_pattern(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    constructor_id: hir::ConstructorId,
    body: &ast::ConstructorPatternBody,
    matched_type: hir::Type,
    range: kieli_base::Range,
) -> hir::Pattern {
    let enumeration_id = ctx.arena.hir.constructors[constructor_id].enumeration_id;
    let enum_type_id = ctx.arena.hir.enumerations[enumeration_id].type_id;
    unify_with_matched(ctx, state, range, enum_type_id, matched_type);

    let constructor_body = ctx.arena.hir.constructors[constructor_id].body.clone();
    let constructor_name = ctx.arena.hir.constructors[constructor_id].name;

    let mut payload = None;
    let mut payload_exhaustive = true;

    match (&constructor_body, body) {
        (hir::ConstructorBody::Unit, ast::ConstructorPatternBody::Unit) => {}
        (hir::ConstructorBody::Tuple { types }, ast::ConstructorPatternBody::Tuple { fields })
            if types.len() == fields.len() =>
        {
            let mut field_patterns = Vec::with_capacity(fields.len());
            let mut field_types = Vec::with_capacity(fields.len());
            for (&field, &field_type) in fields.iter().zip(types) {
                let field_ast = ctx.arena.ast.patterns[field].clone();
                let resolved =
                    resolve_pattern(ctx, state, scope_id, env_id, &field_ast, field_type);
                payload_exhaustive &= resolved.is_exhaustive;
                field_types.push(hir::Type {
                    id: resolved.type_id,
                    range: resolved.range,
                });
                field_patterns.push(ctx.arena.hir.patterns.push(resolved));
            }
            let tuple_type = ctx
                .arena
                .hir
                .types
                .push(hir::TypeVariant::Tuple { types: field_types });
            payload = Some(ctx.arena.hir.patterns.push(hir::Pattern {
                variant: hir::PatternVariant::Tuple {
                    fields: field_patterns,
                },
                type_id: tuple_type,
                is_exhaustive: payload_exhaustive,
                range,
            }));
        }
        (hir::ConstructorBody::Struct { fields }, ast::ConstructorPatternBody::Struct { fields: field_patterns }) => {
            let declared = fields.clone();
            let mut resolved_fields = Vec::new();
            for field_pattern in field_patterns {
                let declared_field = declared.iter().copied().find(|&field_id| {
                    ctx.arena.hir.fields[field_id].name.id == field_pattern.name.id
                });
                let Some(field_id) = declared_field else {
                    let message = format!(
                        "Constructor '{}' has no field '{}'",
                        ctx.string(constructor_name.id),
                        ctx.string(field_pattern.name.id)
                    );
                    ctx.add_error(field_pattern.name.range, message);
                    continue;
                };
                let field_type = ctx.arena.hir.fields[field_id].field_type;
                let resolved = match field_pattern.pattern {
                    Some(pattern_id) => {
                        let pattern_ast = ctx.arena.ast.patterns[pattern_id].clone();
                        resolve_pattern(ctx, state, scope_id, env_id, &pattern_ast, field_type)
                    }
                    None => {
                        // `Ctor { x }` binds `x` to the field directly.
                        let mutability = ctx.immut_mutability(field_pattern.name.range);
                        let local_id = bind_name(
                            ctx,
                            scope_id,
                            field_pattern.name,
                            field_type.id,
                            mutability,
                        );
                        hir::Pattern {
                            variant: hir::PatternVariant::Name {
                                local_id,
                                name: field_pattern.name,
                                mutability,
                            },
                            type_id: field_type.id,
                            is_exhaustive: true,
                            range: field_pattern.name.range,
                        }
                    }
                };
                payload_exhaustive &= resolved.is_exhaustive;
                resolved_fields.push(resolved);
            }
            let field_types = resolved_fields
                .iter()
                .map(|pattern| hir::Type {
                    id: pattern.type_id,
                    range: pattern.range,
                })
                .collect();
            let field_patterns = resolved_fields
                .into_iter()
                .map(|pattern| ctx.arena.hir.patterns.push(pattern))
                .collect();
            let tuple_type = ctx
                .arena
                .hir
                .types
                .push(hir::TypeVariant::Tuple { types: field_types });
            payload = Some(ctx.arena.hir.patterns.push(hir::Pattern {
                variant: hir::PatternVariant::Tuple {
                    fields: field_patterns,
                },
                type_id: tuple_type,
                is_exhaustive: payload_exhaustive,
                range,
            }));
        }
        (hir::ConstructorBody::Unit, _) => {
            let message = format!(
                "Constructor '{}' has no fields to be handled",
                ctx.string(constructor_name.id)
            );
            ctx.add_error(range, message);
        }
        (_, ast::ConstructorPatternBody::Unit) => {
            let message = format!(
                "Constructor '{}' has fields which must be handled",
                ctx.string(constructor_name.id)
            );
            ctx.add_error(range, message);
        }
        _ => {
            let message = format!(
                "The pattern does not match the form of constructor '{}'",
                ctx.string(constructor_name.id)
            );
            ctx.add_error(range, message);
        }
    }

    let constructor_count = match ctx.arena.hir.enumerations[enumeration_id]
        .enumeration
        .resolved()
    {
        Some(enumeration) => enumeration.constructors.len(),
        None => 0,
    };
    let is_exhaustive = payload_exhaustive && constructor_count == 1;

    hir::Pattern {
        variant: hir::PatternVariant::Constructor {
            constructor_id,
            payload,
        },
        type_id: enum_type_id,
        is_exhaustive,
        range,
    }
}

pub fn resolve_pattern(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    pattern: &ast::Pattern,
    matched_type: hir::Type,
) -> hir::Pattern {
    let range = pattern.range;
    match &pattern.variant {
        ast::PatternVariant::Integer(integer) => {
            let literal_type = ctx.fresh_integral_type_variable(state, range);
            unify_with_matched(ctx, state, range, literal_type.id, matched_type);
            hir::Pattern {
                variant: hir::PatternVariant::Integer(*integer),
                type_id: literal_type.id,
                is_exhaustive: false,
                range,
            }
        }
        ast::PatternVariant::Floating(floating) => {
            let literal_type = ctx.constants.floating_type;
            unify_with_matched(ctx, state, range, literal_type, matched_type);
            hir::Pattern {
                variant: hir::PatternVariant::Floating(*floating),
                type_id: literal_type,
                is_exhaustive: false,
                range,
            }
        }
        ast::PatternVariant::Boolean(boolean) => {
            let literal_type = ctx.constants.boolean_type;
            unify_with_matched(ctx, state, range, literal_type, matched_type);
            hir::Pattern {
                variant: hir::PatternVariant::Boolean(*boolean),
                type_id: literal_type,
                is_exhaustive: false,
                range,
            }
        }
        ast::PatternVariant::Character(character) => {
            let literal_type = ctx.constants.character_type;
            unify_with_matched(ctx, state, range, literal_type, matched_type);
            hir::Pattern {
                variant: hir::PatternVariant::Character(*character),
                type_id: literal_type,
                is_exhaustive: false,
                range,
            }
        }
        ast::PatternVariant::String(string) => {
            let literal_type = ctx.constants.string_type;
            unify_with_matched(ctx, state, range, literal_type, matched_type);
            hir::Pattern {
                variant: hir::PatternVariant::String(*string),
                type_id: literal_type,
                is_exhaustive: false,
                range,
            }
        }
        ast::PatternVariant::Wildcard => hir::Pattern {
            variant: hir::PatternVariant::Wildcard,
            type_id: matched_type.id,
            is_exhaustive: true,
            range,
        },
        ast::PatternVariant::Name { mutability, name } => {
            let mutability = types::resolve_mutability(ctx, scope_id, mutability);
            let local_id = bind_name(ctx, scope_id, *name, matched_type.id, mutability);
            hir::Pattern {
                variant: hir::PatternVariant::Name {
                    local_id,
                    name: *name,
                    mutability,
                },
                type_id: matched_type.id,
                is_exhaustive: true,
                range,
            }
        }
        ast::PatternVariant::Tuple { fields } => {
            // Match the expectation against a tuple of fresh variables,
            // then resolve each field against its component.
            let component_types: Vec<hir::Type> = fields
                .iter()
                .map(|&field| {
                    let field_range = ctx.arena.ast.patterns[field].range;
                    ctx.fresh_general_type_variable(state, field_range)
                })
                .collect();
            let tuple_type = ctx.arena.hir.types.push(hir::TypeVariant::Tuple {
                types: component_types.clone(),
            });
            unify_with_matched(ctx, state, range, tuple_type, matched_type);

            let mut is_exhaustive = true;
            let field_patterns = fields
                .iter()
                .zip(component_types)
                .map(|(&field, component_type)| {
                    let field_ast = ctx.arena.ast.patterns[field].clone();
                    let resolved =
                        resolve_pattern(ctx, state, scope_id, env_id, &field_ast, component_type);
                    is_exhaustive &= resolved.is_exhaustive;
                    ctx.arena.hir.patterns.push(resolved)
                })
                .collect();

            hir::Pattern {
                variant: hir::PatternVariant::Tuple {
                    fields: field_patterns,
                },
                type_id: tuple_type,
                is_exhaustive,
                range,
            }
        }
        ast::PatternVariant::Slice { patterns } => {
            let element_type = ctx.fresh_general_type_variable(state, range);
            let slice_type = ctx
                .arena
                .hir
                .types
                .push(hir::TypeVariant::Slice { element_type });
            unify_with_matched(ctx, state, range, slice_type, matched_type);

            let element_patterns = patterns
                .iter()
                .map(|&element| {
                    let element_ast = ctx.arena.ast.patterns[element].clone();
                    let resolved =
                        resolve_pattern(ctx, state, scope_id, env_id, &element_ast, element_type);
                    ctx.arena.hir.patterns.push(resolved)
                })
                .collect();

            hir::Pattern {
                variant: hir::PatternVariant::Slice {
                    patterns: element_patterns,
                },
                type_id: slice_type,
                is_exhaustive: false,
                range,
            }
        }
        ast::PatternVariant::Constructor { path: ast_path, body } => {
            let symbol_id = path::resolve_path(ctx, state, scope_id, env_id, ast_path);
            let symbol = ctx.arena.symbols[symbol_id];
            match symbol.variant {
                SymbolVariant::Constructor(constructor_id) => resolve_constructor_pattern(
                    ctx,
                    state,
                    scope_id,
                    env_id,
                    constructor_id,
                    body,
                    matched_type,
                    range,
                ),
                SymbolVariant::Error => error_pattern(ctx, range),
                variant => {
                    let message = format!(
                        "Expected a constructor, but '{}' is {}",
                        ctx.string(symbol.name.id),
                        db::describe_symbol_kind(variant)
                    );
                    ctx.add_error(range, message);
                    error_pattern(ctx, range)
                }
            }
        }
        ast::PatternVariant::AbbreviatedConstructor { name, body } => {
            let mut matched_variant = ctx.arena.hir.types[matched_type.id].clone();
            flatten_type(ctx, state, &mut matched_variant);
            ctx.arena.hir.types[matched_type.id] = matched_variant.clone();
            match matched_variant {
                hir::TypeVariant::Enumeration { id, .. } => {
                    definitions::resolve_enumeration(ctx, id);
                    let constructors = match ctx.arena.hir.enumerations[id].enumeration.resolved() {
                        Some(enumeration) => enumeration.constructors.clone(),
                        None => Vec::new(),
                    };
                    let found = constructors.iter().copied().find(|&constructor_id| {
                        ctx.arena.hir.constructors[constructor_id].name.id == name.id
                    });
                    match found {
                        Some(constructor_id) => {
                            db::add_semantic_token(
                                ctx.db,
                                ctx.doc_id,
                                name.range,
                                SemanticTokenType::Constructor,
                            );
                            resolve_constructor_pattern(
                                ctx,
                                state,
                                scope_id,
                                env_id,
                                constructor_id,
                                body,
                                matched_type,
                                range,
                            )
                        }
                        None => {
                            let message = format!(
                                "{} does not have a constructor '{}'",
                                ctx.type_to_string(matched_type.id),
                                ctx.string(name.id)
                            );
                            ctx.add_error(name.range, message);
                            error_pattern(ctx, range)
                        }
                    }
                }
                hir::TypeVariant::Variable { .. } => {
                    let message = "Abbreviated constructor pattern used with an unsolved \
                                   type variable"
                        .to_string();
                    ctx.add_error(range, message);
                    error_pattern(ctx, range)
                }
                hir::TypeVariant::Error => error_pattern(ctx, range),
                _ => {
                    let message = format!(
                        "Abbreviated constructor pattern used with non-enum type {}",
                        ctx.type_to_string(matched_type.id)
                    );
                    ctx.add_error(range, message);
                    error_pattern(ctx, range)
                }
            }
        }
        ast::PatternVariant::Alias {
            pattern: aliased,
            mutability,
            name,
        } => {
            let aliased_ast = ctx.arena.ast.patterns[*aliased].clone();
            let resolved = resolve_pattern(ctx, state, scope_id, env_id, &aliased_ast, matched_type);
            let mutability = types::resolve_mutability(ctx, scope_id, mutability);
            bind_name(ctx, scope_id, *name, matched_type.id, mutability);
            // The alias binding lives in the scope; the pattern itself
            // is just the aliased pattern.
            resolved
        }
        ast::PatternVariant::Guarded { pattern: guarded, guard } => {
            let guarded_ast = ctx.arena.ast.patterns[*guarded].clone();
            let resolved =
                resolve_pattern(ctx, state, scope_id, env_id, &guarded_ast, matched_type);
            let guarded_pattern = ctx.arena.hir.patterns.push(resolved);

            let guard_ast = ctx.arena.ast.expressions[*guard].clone();
            let guard_expression =
                expressions::resolve_expression(ctx, state, scope_id, env_id, &guard_ast);
            let boolean_type = ctx.constants.boolean_type;
            unify::require_subtype(
                ctx,
                state,
                guard_expression.range,
                guard_expression.type_id,
                boolean_type,
            );
            let guard_expression = ctx.arena.hir.expressions.push(guard_expression);

            hir::Pattern {
                variant: hir::PatternVariant::Guarded {
                    guarded_pattern,
                    guard_expression,
                },
                type_id: matched_type.id,
                is_exhaustive: false,
                range,
            }
        }
    }
}

fn error_pattern(ctx: &Context<'_>, range: kieli_base::Range) -> hir::Pattern {
    hir::Pattern {
        variant: hir::PatternVariant::Error,
        type_id: ctx.constants.error_type,
        is_exhaustive: true,
        range,
    }
}
