//! Expression resolution.

use crate::context::{Context, InferenceState};
use crate::unify;
use crate::{definitions, path, patterns, types};
use kieli_base::Range;
use kieli_compiler::db::{self, EnvironmentId, ScopeId, SymbolVariant};
use kieli_compiler::lsp::{self, SemanticTokenType};
use kieli_compiler::{ast, hir, Integer};

fn push_expression(ctx: &mut Context<'_>, expression: hir::Expression) -> hir::ExpressionId {
    ctx.arena.hir.expressions.push(expression)
}

fn resolve_id(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    id: ast::ExpressionId,
) -> hir::Expression {
    let expression = ctx.arena.ast.expressions[id].clone();
    resolve_expression(ctx, state, scope_id, env_id, &expression)
}

fn unsupported(ctx: &mut Context<'_>, range: Range) -> hir::Expression {
    ctx.add_error(range, "Unsupported expression".to_string());
    ctx.error_expression(range)
}

fn resolve_path_expression(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    ast_path: &ast::Path,
    range: Range,
) -> hir::Expression {
    // A bare lowercase name is first and foremost a local variable.
    if ast_path.is_unqualified() {
        let name = ast_path.segments[0].name;
        if let Some(bind) = ctx.find_variable(scope_id, name.id) {
            db::add_reference(ctx.db, ctx.doc_id, lsp::read(name.range), bind.symbol_id);
            db::add_semantic_token(ctx.db, ctx.doc_id, name.range, SemanticTokenType::Variable);
            db::add_completion(ctx.db, ctx.doc_id, name, env_id, db::CompletionMode::Top);
            let type_id = ctx.arena.hir.local_variables[bind.local_id].type_id;
            return hir::Expression {
                variant: hir::ExpressionVariant::VariableReference {
                    local_id: bind.local_id,
                    name,
                },
                type_id,
                kind: hir::ExpressionKind::Place,
                range,
            };
        }
    }

    let symbol_id = path::resolve_path(ctx, state, scope_id, env_id, ast_path);
    let symbol = ctx.arena.symbols[symbol_id];
    let name = ast_path.head().name;
    match symbol.variant {
        SymbolVariant::Function(function_id) => {
            definitions::resolve_function_signature(ctx, function_id);
            let type_id = match ctx.arena.hir.functions[function_id].signature.resolved() {
                Some(signature) => signature.function_type.id,
                None => ctx.constants.error_type,
            };
            hir::Expression {
                variant: hir::ExpressionVariant::FunctionReference {
                    id: function_id,
                    name,
                },
                type_id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        SymbolVariant::Constructor(constructor_id) => {
            let enumeration_id = ctx.arena.hir.constructors[constructor_id].enumeration_id;
            let enum_type_id = ctx.arena.hir.enumerations[enumeration_id].type_id;
            let enum_name = ctx.arena.hir.enumerations[enumeration_id].name;
            match ctx.arena.hir.constructors[constructor_id].body.clone() {
                hir::ConstructorBody::Unit => hir::Expression {
                    variant: hir::ExpressionVariant::ConstructorReference {
                        id: constructor_id,
                        name,
                    },
                    type_id: enum_type_id,
                    kind: hir::ExpressionKind::Value,
                    range,
                },
                hir::ConstructorBody::Tuple { types: parameter_types } => {
                    let return_type = hir::Type {
                        id: enum_type_id,
                        range: enum_name.range,
                    };
                    let function_type = ctx.arena.hir.types.push(hir::TypeVariant::Function {
                        parameter_types,
                        return_type,
                    });
                    hir::Expression {
                        variant: hir::ExpressionVariant::ConstructorReference {
                            id: constructor_id,
                            name,
                        },
                        type_id: function_type,
                        kind: hir::ExpressionKind::Value,
                        range,
                    }
                }
                hir::ConstructorBody::Struct { .. } => {
                    let message = format!(
                        "Constructor '{}' requires a struct initializer",
                        ctx.string(name.id)
                    );
                    ctx.add_error(range, message);
                    ctx.error_expression(range)
                }
            }
        }
        SymbolVariant::Error => ctx.error_expression(range),
        variant => {
            let message = format!(
                "Expected an expression, but '{}' is {}",
                ctx.string(symbol.name.id),
                db::describe_symbol_kind(variant)
            );
            ctx.add_error(range, message);
            ctx.error_expression(range)
        }
    }
}

fn resolve_invocation(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    invocable: ast::ExpressionId,
    arguments: &[ast::FunctionArgument],
    range: Range,
) -> hir::Expression {
    let invocable = resolve_id(ctx, state, scope_id, env_id, invocable);

    // A failed callee has already been reported; inventing a function
    // type for it would only leak unsolved variables.
    if matches!(
        ctx.arena.hir.types[invocable.type_id],
        hir::TypeVariant::Error
    ) {
        for argument in arguments {
            let resolved = resolve_id(ctx, state, scope_id, env_id, argument.expression);
            let resolved_type = resolved.type_id;
            let resolved_range = resolved.range;
            push_expression(ctx, resolved);
            let error_type = ctx.constants.error_type;
            unify::require_subtype(ctx, state, resolved_range, resolved_type, error_type);
        }
        return ctx.error_expression(range);
    }

    let mut argument_ids = Vec::with_capacity(arguments.len());
    let mut argument_types = Vec::with_capacity(arguments.len());
    for argument in arguments {
        let resolved = resolve_id(ctx, state, scope_id, env_id, argument.expression);
        argument_types.push(hir::Type {
            id: resolved.type_id,
            range: resolved.range,
        });
        argument_ids.push(push_expression(ctx, resolved));
    }

    // Parameter name hints and signature help when the callee is a
    // known function.
    if let hir::ExpressionVariant::FunctionReference { id: function_id, .. } = &invocable.variant {
        let function_id = *function_id;
        let signature = ctx.arena.hir.functions[function_id].signature.resolved();
        let parameter_patterns: Vec<hir::PatternId> = signature
            .map(|signature| {
                signature
                    .parameters
                    .iter()
                    .map(|parameter| parameter.pattern)
                    .collect()
            })
            .unwrap_or_default();
        for (index, argument) in arguments.iter().enumerate() {
            if argument.name.is_none() {
                if let Some(&parameter) = parameter_patterns.get(index) {
                    let position = ctx.arena.ast.expressions[argument.expression].range.start;
                    db::add_param_hint(ctx.db, ctx.doc_id, position, parameter);
                }
            }
        }
        let active_param = active_parameter(ctx, arguments);
        db::add_signature_help(ctx.db, ctx.doc_id, range, function_id, active_param);
    }

    let result_type = ctx.fresh_general_type_variable(state, range);
    let expected = ctx.arena.hir.types.push(hir::TypeVariant::Function {
        parameter_types: argument_types,
        return_type: result_type,
    });
    unify::require_subtype(ctx, state, invocable.range, invocable.type_id, expected);

    let invocable = push_expression(ctx, invocable);
    hir::Expression {
        variant: hir::ExpressionVariant::Invocation {
            invocable,
            arguments: argument_ids,
        },
        type_id: result_type.id,
        kind: hir::ExpressionKind::Value,
        range,
    }
}

/// The argument the cursor is in, for signature help.
fn active_parameter(ctx: &Context<'_>, arguments: &[ast::FunctionArgument]) -> usize {
    let Some(edit_position) = ctx.db.documents[ctx.doc_id].edit_position else {
        return 0;
    };
    for (index, argument) in arguments.iter().enumerate() {
        let argument_range = ctx.arena.ast.expressions[argument.expression].range;
        if edit_position <= argument_range.stop {
            return index;
        }
    }
    arguments.len().saturating_sub(1)
}

pub fn resolve_expression(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    expression: &ast::Expression,
) -> hir::Expression {
    let range = expression.range;
    match &expression.variant {
        ast::ExpressionVariant::Integer(integer) => {
            let literal_type = ctx.fresh_integral_type_variable(state, range);
            hir::Expression {
                variant: hir::ExpressionVariant::Integer(*integer),
                type_id: literal_type.id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Floating(floating) => hir::Expression {
            variant: hir::ExpressionVariant::Floating(*floating),
            type_id: ctx.constants.floating_type,
            kind: hir::ExpressionKind::Value,
            range,
        },
        ast::ExpressionVariant::Boolean(boolean) => hir::Expression {
            variant: hir::ExpressionVariant::Boolean(*boolean),
            type_id: ctx.constants.boolean_type,
            kind: hir::ExpressionKind::Value,
            range,
        },
        ast::ExpressionVariant::Character(character) => hir::Expression {
            variant: hir::ExpressionVariant::Character(*character),
            type_id: ctx.constants.character_type,
            kind: hir::ExpressionKind::Value,
            range,
        },
        ast::ExpressionVariant::String(string) => hir::Expression {
            variant: hir::ExpressionVariant::String(*string),
            type_id: ctx.constants.string_type,
            kind: hir::ExpressionKind::Value,
            range,
        },
        ast::ExpressionVariant::Path(ast_path) => {
            resolve_path_expression(ctx, state, scope_id, env_id, ast_path, range)
        }
        ast::ExpressionVariant::Wildcard => {
            let hole_type = ctx.fresh_general_type_variable(state, range);
            hir::Expression {
                variant: hir::ExpressionVariant::Error,
                type_id: hole_type.id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Array { elements } => {
            let element_type = ctx.fresh_general_type_variable(state, range);
            let mut element_ids = Vec::with_capacity(elements.len());
            for &element in elements {
                let resolved = resolve_id(ctx, state, scope_id, env_id, element);
                unify::require_subtype(
                    ctx,
                    state,
                    resolved.range,
                    resolved.type_id,
                    element_type.id,
                );
                element_ids.push(push_expression(ctx, resolved));
            }
            let length = push_expression(
                ctx,
                hir::Expression {
                    variant: hir::ExpressionVariant::Integer(Integer {
                        value: element_ids.len() as u64,
                    }),
                    type_id: ctx.constants.u64_type,
                    kind: hir::ExpressionKind::Value,
                    range,
                },
            );
            let array_type = ctx.arena.hir.types.push(hir::TypeVariant::Array {
                element_type,
                length,
            });
            hir::Expression {
                variant: hir::ExpressionVariant::ArrayLiteral {
                    elements: element_ids,
                },
                type_id: array_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Tuple { fields } => {
            let mut field_ids = Vec::with_capacity(fields.len());
            let mut field_types = Vec::with_capacity(fields.len());
            for &field in fields {
                let resolved = resolve_id(ctx, state, scope_id, env_id, field);
                field_types.push(hir::Type {
                    id: resolved.type_id,
                    range: resolved.range,
                });
                field_ids.push(push_expression(ctx, resolved));
            }
            let type_id = if field_types.is_empty() {
                ctx.constants.unit_type
            } else {
                ctx.arena.hir.types.push(hir::TypeVariant::Tuple {
                    types: field_types,
                })
            };
            hir::Expression {
                variant: hir::ExpressionVariant::Tuple { fields: field_ids },
                type_id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Conditional {
            condition,
            true_branch,
            false_branch,
            ..
        } => {
            let condition = resolve_id(ctx, state, scope_id, env_id, *condition);
            let boolean_type = ctx.constants.boolean_type;
            unify::require_subtype(ctx, state, condition.range, condition.type_id, boolean_type);
            let condition = push_expression(ctx, condition);

            let result_type = ctx.fresh_general_type_variable(state, range);
            let true_branch = resolve_id(ctx, state, scope_id, env_id, *true_branch);
            unify::require_subtype(ctx, state, true_branch.range, true_branch.type_id, result_type.id);
            let true_branch = push_expression(ctx, true_branch);

            let false_branch = resolve_id(ctx, state, scope_id, env_id, *false_branch);
            unify::require_subtype(
                ctx,
                state,
                false_branch.range,
                false_branch.type_id,
                result_type.id,
            );
            let false_branch = push_expression(ctx, false_branch);

            hir::Expression {
                variant: hir::ExpressionVariant::Conditional {
                    condition,
                    true_branch,
                    false_branch,
                },
                type_id: result_type.id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Match { scrutinee, arms } => {
            let scrutinee = resolve_id(ctx, state, scope_id, env_id, *scrutinee);
            let scrutinee_type = hir::Type {
                id: scrutinee.type_id,
                range: scrutinee.range,
            };
            let result_type = ctx.fresh_general_type_variable(state, range);

            let cases = arms
                .iter()
                .map(|arm| {
                    // Each arm's bindings live in their own scope.
                    let arm_scope = ctx.child_scope(scope_id);
                    let pattern_ast = ctx.arena.ast.patterns[arm.pattern].clone();
                    let pattern = patterns::resolve_pattern(
                        ctx,
                        state,
                        arm_scope,
                        env_id,
                        &pattern_ast,
                        scrutinee_type,
                    );
                    let pattern = ctx.arena.hir.patterns.push(pattern);

                    let handler = resolve_id(ctx, state, arm_scope, env_id, arm.expression);
                    unify::require_subtype(ctx, state, handler.range, handler.type_id, result_type.id);
                    let handler = push_expression(ctx, handler);
                    ctx.leave_scope(arm_scope, true);
                    hir::MatchCase {
                        pattern,
                        expression: handler,
                    }
                })
                .collect();

            let scrutinee = push_expression(ctx, scrutinee);
            hir::Expression {
                variant: hir::ExpressionVariant::Match { cases, scrutinee },
                type_id: result_type.id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Block { effects, result } => {
            let block_scope = ctx.child_scope(scope_id);
            let mut effect_ids = Vec::with_capacity(effects.len());
            for &effect in effects {
                let resolved = resolve_id(ctx, state, block_scope, env_id, effect);
                let unit_type = ctx.constants.unit_type;
                unify::require_subtype(ctx, state, resolved.range, resolved.type_id, unit_type);
                effect_ids.push(push_expression(ctx, resolved));
            }
            let result = resolve_id(ctx, state, block_scope, env_id, *result);
            let result_type = result.type_id;
            let result = push_expression(ctx, result);
            ctx.leave_scope(block_scope, true);
            hir::Expression {
                variant: hir::ExpressionVariant::Block {
                    effects: effect_ids,
                    result,
                },
                type_id: result_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Loop { body, .. } => {
            let body = resolve_id(ctx, state, scope_id, env_id, *body);
            let body = push_expression(ctx, body);
            hir::Expression {
                variant: hir::ExpressionVariant::Loop { body },
                type_id: ctx.constants.unit_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Break { result } => {
            let result = resolve_id(ctx, state, scope_id, env_id, *result);
            let result = push_expression(ctx, result);
            // Control leaves the loop here; the break itself fits any
            // context.
            hir::Expression {
                variant: hir::ExpressionVariant::Break { result },
                type_id: ctx.constants.error_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Continue => hir::Expression {
            variant: hir::ExpressionVariant::Continue,
            type_id: ctx.constants.error_type,
            kind: hir::ExpressionKind::Value,
            range,
        },
        ast::ExpressionVariant::FunctionCall {
            invocable,
            arguments,
        } => resolve_invocation(ctx, state, scope_id, env_id, *invocable, arguments, range),
        ast::ExpressionVariant::Ascription {
            expression: inner,
            ascribed_type,
        } => {
            let mut inner = resolve_id(ctx, state, scope_id, env_id, *inner);
            let ascribed_ast = ctx.arena.ast.types[*ascribed_type].clone();
            let ascribed = types::resolve_type(ctx, state, scope_id, env_id, &ascribed_ast);
            unify::require_subtype(ctx, state, inner.range, inner.type_id, ascribed.id);
            inner.type_id = ascribed.id;
            inner
        }
        ast::ExpressionVariant::Let {
            pattern,
            ascribed_type,
            initializer,
        } => {
            let pattern_range = ctx.arena.ast.patterns[*pattern].range;
            let annotated_type = match ascribed_type {
                Some(type_id) => {
                    let type_ast = ctx.arena.ast.types[*type_id].clone();
                    types::resolve_type(ctx, state, scope_id, env_id, &type_ast)
                }
                None => ctx.fresh_general_type_variable(state, pattern_range),
            };

            let pattern_ast = ctx.arena.ast.patterns[*pattern].clone();
            let resolved_pattern = patterns::resolve_pattern(
                ctx,
                state,
                scope_id,
                env_id,
                &pattern_ast,
                annotated_type,
            );
            unify::require_subtype(
                ctx,
                state,
                resolved_pattern.range,
                resolved_pattern.type_id,
                annotated_type.id,
            );
            let resolved_pattern = ctx.arena.hir.patterns.push(resolved_pattern);

            let initializer = resolve_id(ctx, state, scope_id, env_id, *initializer);
            unify::require_subtype(
                ctx,
                state,
                initializer.range,
                initializer.type_id,
                annotated_type.id,
            );
            let initializer = push_expression(ctx, initializer);

            // A binding without a written type gets a trailing type
            // hint.
            if ascribed_type.is_none() {
                db::add_type_hint(ctx.db, ctx.doc_id, pattern_range.stop, annotated_type.id);
            }

            hir::Expression {
                variant: hir::ExpressionVariant::Let {
                    pattern: resolved_pattern,
                    annotated_type,
                    initializer,
                },
                type_id: ctx.constants.unit_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::TypeAlias { name, aliased_type } => {
            let type_ast = ctx.arena.ast.types[*aliased_type].clone();
            let aliased = types::resolve_type(ctx, state, scope_id, env_id, &type_ast);
            let local_id = ctx.arena.hir.local_types.push(hir::LocalType {
                name: *name,
                type_id: aliased.id,
            });
            let symbol_id = ctx.new_symbol(*name, SymbolVariant::LocalType(local_id));
            db::add_reference(ctx.db, ctx.doc_id, lsp::write(name.range), symbol_id);
            ctx.bind_type(
                scope_id,
                db::TypeBind {
                    name: *name,
                    local_id,
                    symbol_id,
                    mentioned: false,
                },
            );
            ctx.unit_expression(range)
        }
        ast::ExpressionVariant::Ret { expression: inner } => {
            let inner = resolve_id(ctx, state, scope_id, env_id, *inner);
            if let Some(return_type) = ctx.return_type {
                unify::require_subtype(ctx, state, inner.range, inner.type_id, return_type.id);
            }
            let inner = push_expression(ctx, inner);
            // Control leaves the function here; the ret itself fits any
            // context.
            hir::Expression {
                variant: hir::ExpressionVariant::Ret { expression: inner },
                type_id: ctx.constants.error_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Sizeof { inspected_type } => {
            let type_ast = ctx.arena.ast.types[*inspected_type].clone();
            let inspected_type = types::resolve_type(ctx, state, scope_id, env_id, &type_ast);
            let size_type = ctx.fresh_integral_type_variable(state, range);
            hir::Expression {
                variant: hir::ExpressionVariant::Sizeof { inspected_type },
                type_id: size_type.id,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Addressof {
            mutability,
            expression: place,
        } => {
            let place_expression = resolve_id(ctx, state, scope_id, env_id, *place);
            let mutability = types::resolve_mutability(ctx, scope_id, mutability);
            if place_expression.kind != hir::ExpressionKind::Place {
                let message = "This expression does not identify a place in memory, \
                               so its address can not be taken"
                    .to_string();
                ctx.add_error(place_expression.range, message);
                return ctx.error_expression(range);
            }
            let referenced_type = hir::Type {
                id: place_expression.type_id,
                range: place_expression.range,
            };
            let reference_type = ctx.arena.hir.types.push(hir::TypeVariant::Reference {
                referenced_type,
                mutability,
            });
            let place_expression = push_expression(ctx, place_expression);
            hir::Expression {
                variant: hir::ExpressionVariant::Addressof {
                    mutability,
                    place_expression,
                },
                type_id: reference_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::Deref { expression: inner } => {
            let referenced_type = ctx.fresh_general_type_variable(state, range);
            let mutability = ctx.fresh_mutability_variable(state, range);
            let reference_type = ctx.arena.hir.types.push(hir::TypeVariant::Reference {
                referenced_type,
                mutability,
            });

            let reference_expression = resolve_id(ctx, state, scope_id, env_id, *inner);
            unify::require_subtype(
                ctx,
                state,
                reference_expression.range,
                reference_expression.type_id,
                reference_type,
            );
            let reference_expression = push_expression(ctx, reference_expression);

            hir::Expression {
                variant: hir::ExpressionVariant::Dereference {
                    reference_expression,
                },
                type_id: referenced_type.id,
                kind: hir::ExpressionKind::Place,
                range,
            }
        }
        ast::ExpressionVariant::Defer { expression: inner } => {
            // The deferred expression's type is unconstrained.
            let inner = resolve_id(ctx, state, scope_id, env_id, *inner);
            let inner = push_expression(ctx, inner);
            hir::Expression {
                variant: hir::ExpressionVariant::Defer { expression: inner },
                type_id: ctx.constants.unit_type,
                kind: hir::ExpressionKind::Value,
                range,
            }
        }
        ast::ExpressionVariant::StructInit { .. }
        | ast::ExpressionVariant::InfixCall { .. }
        | ast::ExpressionVariant::StructField { .. }
        | ast::ExpressionVariant::TupleField { .. }
        | ast::ExpressionVariant::ArrayIndex { .. }
        | ast::ExpressionVariant::MethodCall { .. }
        | ast::ExpressionVariant::Move { .. } => unsupported(ctx, range),
        ast::ExpressionVariant::Error => ctx.error_expression(range),
    }
}
