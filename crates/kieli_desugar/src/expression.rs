//! Expression desugaring, including control-flow normalization.

use crate::{pattern, types, unit_value, wildcard_pattern, Context};
use kieli_base::Range;
use kieli_compiler::lsp::{self, Severity};
use kieli_compiler::{ast, cst};

fn constant_loop_condition_diagnostic(range: Range, constant: bool) -> lsp::Diagnostic {
    lsp::Diagnostic {
        message: if constant {
            "Use 'loop' instead of 'while true'".to_string()
        } else {
            "Loop will never run".to_string()
        },
        range,
        severity: if constant {
            Severity::Information
        } else {
            Severity::Warning
        },
        related_info: Vec::new(),
        tag: lsp::DiagnosticTag::None,
    }
}

fn break_expression(ctx: &mut Context<'_>, range: Range) -> ast::ExpressionId {
    let result = ctx.push_expression(unit_value(range));
    ctx.push_expression(ast::Expression {
        variant: ast::ExpressionVariant::Break { result },
        range,
    })
}

fn desugar_arguments(
    ctx: &mut Context<'_>,
    arguments: &[cst::FunctionArgument],
) -> Vec<ast::FunctionArgument> {
    arguments
        .iter()
        .map(|argument| ast::FunctionArgument {
            name: argument.name,
            expression: desugar_expression_id(ctx, argument.expression),
        })
        .collect()
}

/// The initializer of a desugared `let` condition, with any written
/// type folded into an ascription.
fn desugar_let_initializer(
    ctx: &mut Context<'_>,
    initializer: cst::ExpressionId,
    ascribed_type: &Option<cst::TypeId>,
) -> ast::ExpressionId {
    let initializer_range = ctx.cst.expressions[initializer].range;
    let desugared = desugar_expression_id(ctx, initializer);
    match ascribed_type {
        Some(type_id) => {
            let ascribed_type = types::desugar_type_id(ctx, *type_id);
            ctx.push_expression(ast::Expression {
                variant: ast::ExpressionVariant::Ascription {
                    expression: desugared,
                    ascribed_type,
                },
                range: initializer_range,
            })
        }
        None => desugared,
    }
}

fn desugar_conditional(
    ctx: &mut Context<'_>,
    whole_range: Range,
    condition: cst::ExpressionId,
    true_branch: cst::ExpressionId,
    false_branch: &Option<cst::ExpressionId>,
) -> ast::ExpressionVariant {
    let false_expression = match false_branch {
        Some(false_branch) => desugar_expression_id(ctx, *false_branch),
        None => ctx.push_expression(unit_value(whole_range)),
    };

    // `if let a = b { c } else { d }` is a match in disguise:
    //
    //     match b {
    //         a -> c
    //         _ -> d
    //     }
    if let cst::ExpressionVariant::Let {
        pattern: let_pattern,
        ascribed_type,
        initializer,
    } = &ctx.cst.expressions[condition].variant.clone()
    {
        let scrutinee = desugar_let_initializer(ctx, *initializer, ascribed_type);
        let pattern_range = ctx.cst.patterns[*let_pattern].range;
        let arm_pattern = pattern::desugar_pattern_id(ctx, *let_pattern);
        let wildcard = ctx.push_pattern(wildcard_pattern(pattern_range));
        let arms = vec![
            ast::MatchArm {
                pattern: arm_pattern,
                expression: desugar_expression_id(ctx, true_branch),
            },
            ast::MatchArm {
                pattern: wildcard,
                expression: false_expression,
            },
        ];
        return ast::ExpressionVariant::Match { scrutinee, arms };
    }

    let condition_cst = ctx.cst.expressions[condition].clone();
    let condition_ast = desugar_expression(ctx, &condition_cst);
    if matches!(condition_ast.variant, ast::ExpressionVariant::Boolean(_)) {
        let diagnostic = lsp::Diagnostic {
            message: "Constant condition".to_string(),
            range: condition_ast.range,
            severity: Severity::Information,
            related_info: Vec::new(),
            tag: lsp::DiagnosticTag::None,
        };
        crate::add_diagnostic(ctx, diagnostic);
    }

    let condition = ctx.push_expression(condition_ast);
    ast::ExpressionVariant::Conditional {
        condition,
        true_branch: desugar_expression_id(ctx, true_branch),
        false_branch: false_expression,
        source: ast::ConditionalSource::If,
        has_explicit_false_branch: false_branch_is_explicit(false_branch),
    }
}

fn false_branch_is_explicit(false_branch: &Option<cst::ExpressionId>) -> bool {
    false_branch.is_some()
}

/// `while let a = b { c }` becomes
///
/// ```text
/// loop {
///     match b {
///         a -> c
///         _ -> break
///     }
/// }
/// ```
fn desugar_while_let_loop(
    ctx: &mut Context<'_>,
    whole_range: Range,
    let_pattern: cst::PatternId,
    ascribed_type: &Option<cst::TypeId>,
    initializer: cst::ExpressionId,
    body: cst::ExpressionId,
) -> ast::ExpressionVariant {
    let body_range = ctx.cst.expressions[body].range;
    let scrutinee = desugar_let_initializer(ctx, initializer, ascribed_type);
    let arm_pattern = pattern::desugar_pattern_id(ctx, let_pattern);
    let wildcard = ctx.push_pattern(wildcard_pattern(whole_range));
    let break_arm = break_expression(ctx, whole_range);
    let arms = vec![
        ast::MatchArm {
            pattern: arm_pattern,
            expression: desugar_expression_id(ctx, body),
        },
        ast::MatchArm {
            pattern: wildcard,
            expression: break_arm,
        },
    ];
    let match_expression = ctx.push_expression(ast::Expression {
        variant: ast::ExpressionVariant::Match { scrutinee, arms },
        range: body_range,
    });
    ast::ExpressionVariant::Loop {
        body: match_expression,
        source: ast::LoopSource::WhileLoop,
    }
}

/// `while a { b }` becomes `loop { if a { b } else { break } }`.
fn desugar_while_loop(
    ctx: &mut Context<'_>,
    whole_range: Range,
    condition: cst::ExpressionId,
    body: cst::ExpressionId,
) -> ast::ExpressionVariant {
    if let cst::ExpressionVariant::Let {
        pattern: let_pattern,
        ascribed_type,
        initializer,
    } = &ctx.cst.expressions[condition].variant.clone()
    {
        return desugar_while_let_loop(
            ctx,
            whole_range,
            *let_pattern,
            ascribed_type,
            *initializer,
            body,
        );
    }

    let body_range = ctx.cst.expressions[body].range;
    let condition_cst = ctx.cst.expressions[condition].clone();
    let condition_ast = desugar_expression(ctx, &condition_cst);
    if let ast::ExpressionVariant::Boolean(boolean) = &condition_ast.variant {
        let diagnostic = constant_loop_condition_diagnostic(condition_ast.range, boolean.value);
        crate::add_diagnostic(ctx, diagnostic);
    }
    let condition = ctx.push_expression(condition_ast);
    let true_branch = desugar_expression_id(ctx, body);
    let false_branch = break_expression(ctx, whole_range);
    let conditional = ctx.push_expression(ast::Expression {
        variant: ast::ExpressionVariant::Conditional {
            condition,
            true_branch,
            false_branch,
            source: ast::ConditionalSource::While,
            has_explicit_false_branch: true,
        },
        range: body_range,
    });
    ast::ExpressionVariant::Loop {
        body: conditional,
        source: ast::LoopSource::WhileLoop,
    }
}

pub(crate) fn desugar_expression(
    ctx: &mut Context<'_>,
    expression: &cst::Expression,
) -> ast::Expression {
    let range = expression.range;
    let variant = match &expression.variant {
        cst::ExpressionVariant::Integer(integer) => ast::ExpressionVariant::Integer(*integer),
        cst::ExpressionVariant::Floating(floating) => ast::ExpressionVariant::Floating(*floating),
        cst::ExpressionVariant::Boolean(boolean) => ast::ExpressionVariant::Boolean(*boolean),
        cst::ExpressionVariant::Character(character) => {
            ast::ExpressionVariant::Character(*character)
        }
        cst::ExpressionVariant::String(string) => ast::ExpressionVariant::String(*string),
        cst::ExpressionVariant::Path(path) => {
            ast::ExpressionVariant::Path(types::desugar_path(ctx, path))
        }
        cst::ExpressionVariant::Wildcard => ast::ExpressionVariant::Wildcard,
        cst::ExpressionVariant::Paren { expression } => {
            // Grouping only; the inner expression keeps its own range.
            let inner = ctx.cst.expressions[*expression].clone();
            return desugar_expression(ctx, &inner);
        }
        cst::ExpressionVariant::Tuple { fields } => ast::ExpressionVariant::Tuple {
            fields: fields
                .iter()
                .map(|&field| desugar_expression_id(ctx, field))
                .collect(),
        },
        cst::ExpressionVariant::Array { elements } => ast::ExpressionVariant::Array {
            elements: elements
                .iter()
                .map(|&element| desugar_expression_id(ctx, element))
                .collect(),
        },
        cst::ExpressionVariant::Block(block) => {
            let effects = block
                .effects
                .iter()
                .map(|effect| desugar_expression_id(ctx, effect.expression))
                .collect();
            let result = match block.result {
                Some(result) => desugar_expression_id(ctx, result),
                None => ctx.push_expression(unit_value(block.close_brace)),
            };
            ast::ExpressionVariant::Block { effects, result }
        }
        cst::ExpressionVariant::Conditional {
            condition,
            true_branch,
            false_branch,
            ..
        } => desugar_conditional(ctx, range, *condition, *true_branch, false_branch),
        cst::ExpressionVariant::Match { scrutinee, arms } => {
            let scrutinee = desugar_expression_id(ctx, *scrutinee);
            let arms = arms
                .iter()
                .map(|arm| ast::MatchArm {
                    pattern: pattern::desugar_pattern_id(ctx, arm.pattern),
                    expression: desugar_expression_id(ctx, arm.handler),
                })
                .collect();
            ast::ExpressionVariant::Match { scrutinee, arms }
        }
        cst::ExpressionVariant::WhileLoop {
            condition, body, ..
        } => desugar_while_loop(ctx, range, *condition, *body),
        cst::ExpressionVariant::Loop { body } => ast::ExpressionVariant::Loop {
            body: desugar_expression_id(ctx, *body),
            source: ast::LoopSource::PlainLoop,
        },
        cst::ExpressionVariant::ForLoop { for_token, .. } => {
            let message = "For loops are not supported yet".to_string();
            crate::add_diagnostic(ctx, lsp::error(*for_token, message));
            ast::ExpressionVariant::Error
        }
        cst::ExpressionVariant::FunctionCall { invocable, arguments } => {
            ast::ExpressionVariant::FunctionCall {
                invocable: desugar_expression_id(ctx, *invocable),
                arguments: desugar_arguments(ctx, arguments),
            }
        }
        cst::ExpressionVariant::StructInit { path, fields } => ast::ExpressionVariant::StructInit {
            path: types::desugar_path(ctx, path),
            fields: fields
                .iter()
                .map(|field| ast::FieldInit {
                    name: field.name,
                    expression: desugar_expression_id(ctx, field.expression),
                })
                .collect(),
        },
        cst::ExpressionVariant::InfixCall { left, right, op } => ast::ExpressionVariant::InfixCall {
            left: desugar_expression_id(ctx, *left),
            right: desugar_expression_id(ctx, *right),
            op: *op,
        },
        cst::ExpressionVariant::StructField { base, name } => ast::ExpressionVariant::StructField {
            base: desugar_expression_id(ctx, *base),
            name: *name,
        },
        cst::ExpressionVariant::TupleField {
            base,
            index,
            index_range,
        } => ast::ExpressionVariant::TupleField {
            base: desugar_expression_id(ctx, *base),
            index: *index,
            index_range: *index_range,
        },
        cst::ExpressionVariant::ArrayIndex { base, index } => ast::ExpressionVariant::ArrayIndex {
            base: desugar_expression_id(ctx, *base),
            index: desugar_expression_id(ctx, *index),
        },
        cst::ExpressionVariant::MethodCall {
            expression,
            name,
            arguments,
        } => ast::ExpressionVariant::MethodCall {
            expression: desugar_expression_id(ctx, *expression),
            name: *name,
            arguments: desugar_arguments(ctx, arguments),
        },
        cst::ExpressionVariant::Ascription {
            expression,
            ascribed_type,
        } => ast::ExpressionVariant::Ascription {
            expression: desugar_expression_id(ctx, *expression),
            ascribed_type: types::desugar_type_id(ctx, *ascribed_type),
        },
        cst::ExpressionVariant::Let {
            pattern: let_pattern,
            ascribed_type,
            initializer,
        } => ast::ExpressionVariant::Let {
            pattern: pattern::desugar_pattern_id(ctx, *let_pattern),
            ascribed_type: ascribed_type
                .as_ref()
                .map(|&type_id| types::desugar_type_id(ctx, type_id)),
            initializer: desugar_expression_id(ctx, *initializer),
        },
        cst::ExpressionVariant::TypeAlias { name, aliased_type } => {
            ast::ExpressionVariant::TypeAlias {
                name: *name,
                aliased_type: types::desugar_type_id(ctx, *aliased_type),
            }
        }
        cst::ExpressionVariant::Ret { expression } => ast::ExpressionVariant::Ret {
            expression: match expression {
                Some(expression) => desugar_expression_id(ctx, *expression),
                None => ctx.push_expression(unit_value(range)),
            },
        },
        cst::ExpressionVariant::Discard { expression } => {
            // `discard e` is `let _ = e`.
            let initializer = desugar_expression_id(ctx, *expression);
            let wildcard = ctx.push_pattern(wildcard_pattern(range));
            ast::ExpressionVariant::Let {
                pattern: wildcard,
                ascribed_type: None,
                initializer,
            }
        }
        cst::ExpressionVariant::Break { expression } => ast::ExpressionVariant::Break {
            result: match expression {
                Some(expression) => desugar_expression_id(ctx, *expression),
                None => ctx.push_expression(unit_value(range)),
            },
        },
        cst::ExpressionVariant::Continue => ast::ExpressionVariant::Continue,
        cst::ExpressionVariant::Sizeof { inspected_type } => ast::ExpressionVariant::Sizeof {
            inspected_type: types::desugar_type_id(ctx, *inspected_type),
        },
        cst::ExpressionVariant::Addressof {
            ampersand,
            mutability,
            expression,
        } => ast::ExpressionVariant::Addressof {
            mutability: crate::desugar_opt_mutability(mutability, *ampersand),
            expression: desugar_expression_id(ctx, *expression),
        },
        cst::ExpressionVariant::Deref { expression } => ast::ExpressionVariant::Deref {
            expression: desugar_expression_id(ctx, *expression),
        },
        cst::ExpressionVariant::Move { expression } => ast::ExpressionVariant::Move {
            expression: desugar_expression_id(ctx, *expression),
        },
        cst::ExpressionVariant::Defer { expression } => ast::ExpressionVariant::Defer {
            expression: desugar_expression_id(ctx, *expression),
        },
        cst::ExpressionVariant::Error => ast::ExpressionVariant::Error,
    };
    ast::Expression { variant, range }
}

pub(crate) fn desugar_expression_id(
    ctx: &mut Context<'_>,
    id: cst::ExpressionId,
) -> ast::ExpressionId {
    let expression = ctx.cst.expressions[id].clone();
    let desugared = desugar_expression(ctx, &expression);
    ctx.push_expression(desugared)
}
