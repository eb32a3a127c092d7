//! Expression parsing.
//!
//! Plain recursive descent: prefix operators bind a whole postfix
//! chain, infix operator application is left-associative on a single
//! level, and `:` type ascription binds loosest. Struct initializers
//! are suppressed in condition and scrutinee positions so that their
//! brace unambiguously opens the following block.

use crate::internals::{parse_comma_separated, Context, Parse};
use crate::path;
use kieli_base::Range;
use kieli_compiler::lsp::SemanticTokenType;
use kieli_compiler::{cst, Boolean, Character, Floating, Integer, StringLiteral};
use kieli_lex::TokenType;

#[derive(Clone, Copy, PartialEq, Eq)]
enum StructInit {
    Allowed,
    Forbidden,
}

fn push(ctx: &mut Context<'_>, variant: cst::ExpressionVariant, range: Range) -> cst::ExpressionId {
    ctx.arena.expressions.push(cst::Expression { variant, range })
}

fn require_expression(ctx: &mut Context<'_>, description: &str) -> Parse<cst::ExpressionId> {
    match parse_expression(ctx)? {
        Some(expression) => Ok(expression),
        None => Err(ctx.error_expected(description)),
    }
}

fn require_condition(ctx: &mut Context<'_>, description: &str) -> Parse<cst::ExpressionId> {
    match parse_expression_impl(ctx, StructInit::Forbidden)? {
        Some(expression) => Ok(expression),
        None => Err(ctx.error_expected(description)),
    }
}

/// Parses `{ effect; …; result? }`.
pub fn parse_block_expression(ctx: &mut Context<'_>) -> Parse<Option<cst::ExpressionId>> {
    let Some(open) = ctx.try_punct(TokenType::BraceOpen) else {
        return Ok(None);
    };
    let mut effects = Vec::new();
    let mut result = None;
    loop {
        if let Some(close) = ctx.try_punct(TokenType::BraceClose) {
            let range = ctx.up_to_current(open.range);
            let block = cst::Block {
                effects,
                result,
                open_brace: open.range,
                close_brace: close.range,
            };
            return Ok(Some(push(ctx, cst::ExpressionVariant::Block(block), range)));
        }
        if result.is_some() {
            return Err(ctx.error_expected("a ';' or '}'"));
        }
        let expression = require_expression(ctx, "an expression or '}'")?;
        match ctx.try_punct(TokenType::Semicolon) {
            Some(semicolon) => effects.push(cst::BlockEffect {
                expression,
                semicolon: semicolon.range,
            }),
            None => result = Some(expression),
        }
    }
}

fn require_block(ctx: &mut Context<'_>) -> Parse<cst::ExpressionId> {
    match parse_block_expression(ctx)? {
        Some(block) => Ok(block),
        None => Err(ctx.error_expected("a block expression")),
    }
}

fn parse_conditional(ctx: &mut Context<'_>, if_token: Range) -> Parse<cst::ExpressionVariant> {
    let condition = require_condition(ctx, "the condition")?;
    let true_branch = require_block(ctx)?;
    let false_branch = if let Some(elif_keyword) = ctx.try_punct(TokenType::Elif) {
        ctx.add_keyword(elif_keyword);
        let start = elif_keyword.range;
        let variant = parse_conditional(ctx, elif_keyword.range)?;
        let range = ctx.up_to_current(start);
        Some(push(ctx, variant, range))
    } else if let Some(else_keyword) = ctx.try_punct(TokenType::Else) {
        ctx.add_keyword(else_keyword);
        Some(require_block(ctx)?)
    } else {
        None
    };
    Ok(cst::ExpressionVariant::Conditional {
        if_token,
        condition,
        true_branch,
        false_branch,
    })
}

fn parse_match_arms(ctx: &mut Context<'_>) -> Parse<Vec<cst::MatchArm>> {
    ctx.require_punct(TokenType::BraceOpen)?;
    let mut arms = Vec::new();
    loop {
        if ctx.try_punct(TokenType::BraceClose).is_some() {
            return Ok(arms);
        }
        let pattern = match crate::pattern::parse_top_level_pattern(ctx)? {
            Some(pattern) => pattern,
            None => return Err(ctx.error_expected("a match arm pattern or '}'")),
        };
        let arrow = ctx.require_punct(TokenType::Arrow)?;
        ctx.add_operator(arrow);
        let handler = require_expression(ctx, "the arm handler expression")?;
        arms.push(cst::MatchArm { pattern, handler });
        // Arms may optionally be separated by semicolons.
        while ctx.try_punct(TokenType::Semicolon).is_some() {}
    }
}

fn parse_arguments(ctx: &mut Context<'_>) -> Parse<Vec<cst::FunctionArgument>> {
    parse_comma_separated(ctx, TokenType::ParenClose, "a function argument", |ctx| {
        let name = match (ctx.peek().kind, ctx.peek_second().kind) {
            (TokenType::LowerName(_), TokenType::Equals) => {
                let name = ctx.try_lower_name();
                let equals = ctx.extract();
                ctx.add_operator(equals);
                name
            }
            _ => None,
        };
        match parse_expression(ctx)? {
            Some(expression) => Ok(Some(cst::FunctionArgument { name, expression })),
            None => Ok(None),
        }
    })
}

fn parse_struct_init_fields(ctx: &mut Context<'_>) -> Parse<Vec<cst::FieldInit>> {
    parse_comma_separated(ctx, TokenType::BraceClose, "a field initializer", |ctx| {
        let Some(name) = ctx.try_lower_name() else {
            return Ok(None);
        };
        let equals = ctx.require_punct(TokenType::Equals)?;
        ctx.add_operator(equals);
        let expression = require_expression(ctx, "the field value")?;
        Ok(Some(cst::FieldInit { name, expression }))
    })
}

fn parse_path_expression(
    ctx: &mut Context<'_>,
    init: StructInit,
    start: Range,
) -> Parse<cst::ExpressionId> {
    let Some(root) = path::parse_complex_path_root(ctx)? else {
        return Err(ctx.error_expected("an expression"));
    };
    let parsed = path::extract_path(ctx, root)?;
    let range = ctx.up_to_current(start);
    if init == StructInit::Allowed && ctx.peek().kind == TokenType::BraceOpen {
        ctx.extract();
        let fields = parse_struct_init_fields(ctx)?;
        let range = ctx.up_to_current(start);
        return Ok(push(
            ctx,
            cst::ExpressionVariant::StructInit { path: parsed, fields },
            range,
        ));
    }
    Ok(push(ctx, cst::ExpressionVariant::Path(parsed), range))
}

fn parse_normal_expression(
    ctx: &mut Context<'_>,
    init: StructInit,
) -> Parse<Option<cst::ExpressionId>> {
    let start = ctx.peek();
    let expression_id = match start.kind {
        TokenType::Integer(value) => {
            ctx.extract();
            ctx.add_semantic_token(start.range, SemanticTokenType::Number);
            push(ctx, cst::ExpressionVariant::Integer(Integer { value }), start.range)
        }
        TokenType::Floating(value) => {
            ctx.extract();
            ctx.add_semantic_token(start.range, SemanticTokenType::Number);
            push(
                ctx,
                cst::ExpressionVariant::Floating(Floating { value }),
                start.range,
            )
        }
        TokenType::Boolean(value) => {
            let token = ctx.extract();
            ctx.add_keyword(token);
            push(
                ctx,
                cst::ExpressionVariant::Boolean(Boolean { value }),
                start.range,
            )
        }
        TokenType::Character(value) => {
            ctx.extract();
            ctx.add_semantic_token(start.range, SemanticTokenType::String);
            push(
                ctx,
                cst::ExpressionVariant::Character(Character { value }),
                start.range,
            )
        }
        TokenType::String(id) => {
            ctx.extract();
            ctx.add_semantic_token(start.range, SemanticTokenType::String);
            push(
                ctx,
                cst::ExpressionVariant::String(StringLiteral { id }),
                start.range,
            )
        }
        TokenType::Underscore => {
            ctx.extract();
            push(ctx, cst::ExpressionVariant::Wildcard, start.range)
        }
        TokenType::LowerName(_)
        | TokenType::UpperName(_)
        | TokenType::Global
        | TokenType::Typeof => parse_path_expression(ctx, init, start.range)?,
        TokenType::LowerSelf => {
            let token = ctx.extract();
            ctx.add_keyword(token);
            // The self parameter is an ordinary binding named `self`.
            let id = ctx.db.string_pool.intern("self");
            let path = cst::Path {
                root: cst::PathRoot::Implicit,
                segments: vec![cst::PathSegment {
                    name: kieli_compiler::Name {
                        id,
                        range: token.range,
                    },
                    template_arguments: None,
                }],
            };
            push(ctx, cst::ExpressionVariant::Path(path), token.range)
        }
        TokenType::ParenOpen => {
            ctx.extract();
            let mut fields = parse_comma_separated(
                ctx,
                TokenType::ParenClose,
                "an expression",
                parse_expression,
            )?;
            let range = ctx.up_to_current(start.range);
            if fields.len() == 1 {
                let expression = fields.remove(0);
                push(ctx, cst::ExpressionVariant::Paren { expression }, range)
            } else {
                push(ctx, cst::ExpressionVariant::Tuple { fields }, range)
            }
        }
        TokenType::BracketOpen => {
            ctx.extract();
            let elements = parse_comma_separated(
                ctx,
                TokenType::BracketClose,
                "an array element",
                parse_expression,
            )?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Array { elements }, range)
        }
        TokenType::BraceOpen => match parse_block_expression(ctx)? {
            Some(block) => block,
            None => return Err(ctx.error_expected("a block expression")),
        },
        TokenType::If => {
            let if_keyword = ctx.extract();
            ctx.add_keyword(if_keyword);
            let variant = parse_conditional(ctx, if_keyword.range)?;
            let range = ctx.up_to_current(start.range);
            push(ctx, variant, range)
        }
        TokenType::Match => {
            let match_keyword = ctx.extract();
            ctx.add_keyword(match_keyword);
            let scrutinee = require_condition(ctx, "the matched expression")?;
            let arms = parse_match_arms(ctx)?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Match { scrutinee, arms }, range)
        }
        TokenType::While => {
            let while_keyword = ctx.extract();
            ctx.add_keyword(while_keyword);
            let condition = require_condition(ctx, "the loop condition")?;
            let body = require_block(ctx)?;
            let range = ctx.up_to_current(start.range);
            push(
                ctx,
                cst::ExpressionVariant::WhileLoop {
                    while_token: while_keyword.range,
                    condition,
                    body,
                },
                range,
            )
        }
        TokenType::Loop => {
            let loop_keyword = ctx.extract();
            ctx.add_keyword(loop_keyword);
            let body = require_block(ctx)?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Loop { body }, range)
        }
        TokenType::For => {
            let for_keyword = ctx.extract();
            ctx.add_keyword(for_keyword);
            let pattern = match crate::pattern::parse_pattern(ctx)? {
                Some(pattern) => pattern,
                None => return Err(ctx.error_expected("the loop pattern")),
            };
            let in_keyword = ctx.require_punct(TokenType::In)?;
            ctx.add_keyword(in_keyword);
            let iterable = require_condition(ctx, "the iterated expression")?;
            let body = require_block(ctx)?;
            let range = ctx.up_to_current(start.range);
            push(
                ctx,
                cst::ExpressionVariant::ForLoop {
                    for_token: for_keyword.range,
                    pattern,
                    iterable,
                    body,
                },
                range,
            )
        }
        TokenType::Let => {
            let let_keyword = ctx.extract();
            ctx.add_keyword(let_keyword);
            let pattern = match crate::pattern::parse_pattern(ctx)? {
                Some(pattern) => pattern,
                None => return Err(ctx.error_expected("the binding pattern")),
            };
            let ascribed_type = crate::types::parse_type_annotation(ctx)?;
            let equals = ctx.require_punct(TokenType::Equals)?;
            ctx.add_operator(equals);
            let initializer = require_expression(ctx, "the initializer")?;
            let range = ctx.up_to_current(start.range);
            push(
                ctx,
                cst::ExpressionVariant::Let {
                    pattern,
                    ascribed_type,
                    initializer,
                },
                range,
            )
        }
        TokenType::AliasKeyword => {
            let alias_keyword = ctx.extract();
            ctx.add_keyword(alias_keyword);
            let name = ctx.require_upper_name("the alias name")?;
            ctx.add_semantic_token(name.range, SemanticTokenType::Type);
            let equals = ctx.require_punct(TokenType::Equals)?;
            ctx.add_operator(equals);
            let aliased_type = match crate::types::parse_type(ctx)? {
                Some(aliased_type) => aliased_type,
                None => return Err(ctx.error_expected("the aliased type")),
            };
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::TypeAlias { name, aliased_type }, range)
        }
        TokenType::Ret => {
            let ret_keyword = ctx.extract();
            ctx.add_keyword(ret_keyword);
            let expression = parse_expression(ctx)?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Ret { expression }, range)
        }
        TokenType::Discard => {
            let discard_keyword = ctx.extract();
            ctx.add_keyword(discard_keyword);
            let expression = require_expression(ctx, "the discarded expression")?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Discard { expression }, range)
        }
        TokenType::Break => {
            let break_keyword = ctx.extract();
            ctx.add_keyword(break_keyword);
            let expression = parse_expression(ctx)?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Break { expression }, range)
        }
        TokenType::Continue => {
            let continue_keyword = ctx.extract();
            ctx.add_keyword(continue_keyword);
            push(ctx, cst::ExpressionVariant::Continue, start.range)
        }
        TokenType::Sizeof => {
            let sizeof_keyword = ctx.extract();
            ctx.add_keyword(sizeof_keyword);
            ctx.require_punct(TokenType::ParenOpen)?;
            let inspected_type = match crate::types::parse_type(ctx)? {
                Some(inspected_type) => inspected_type,
                None => return Err(ctx.error_expected("the inspected type")),
            };
            ctx.require_punct(TokenType::ParenClose)?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Sizeof { inspected_type }, range)
        }
        TokenType::Defer => {
            let defer_keyword = ctx.extract();
            ctx.add_keyword(defer_keyword);
            let expression = require_expression(ctx, "the deferred expression")?;
            let range = ctx.up_to_current(start.range);
            push(ctx, cst::ExpressionVariant::Defer { expression }, range)
        }
        _ => return Ok(None),
    };
    Ok(Some(expression_id))
}

fn parse_potential_expression(
    ctx: &mut Context<'_>,
    init: StructInit,
) -> Parse<Option<cst::ExpressionId>> {
    let start = ctx.peek();
    // Prefix operators bind the whole following postfix chain.
    match start.kind {
        TokenType::Ampersand => {
            let ampersand = ctx.extract();
            ctx.add_operator(ampersand);
            let mutability = crate::types::parse_mutability(ctx)?;
            let expression = match parse_potential_expression(ctx, init)? {
                Some(expression) => expression,
                None => return Err(ctx.error_expected("the referenced expression")),
            };
            let range = ctx.up_to_current(start.range);
            return Ok(Some(push(
                ctx,
                cst::ExpressionVariant::Addressof {
                    ampersand: ampersand.range,
                    mutability,
                    expression,
                },
                range,
            )));
        }
        TokenType::Asterisk => {
            let asterisk = ctx.extract();
            ctx.add_operator(asterisk);
            let expression = match parse_potential_expression(ctx, init)? {
                Some(expression) => expression,
                None => return Err(ctx.error_expected("the dereferenced expression")),
            };
            let range = ctx.up_to_current(start.range);
            return Ok(Some(push(
                ctx,
                cst::ExpressionVariant::Deref { expression },
                range,
            )));
        }
        TokenType::Mv => {
            let mv_keyword = ctx.extract();
            ctx.add_keyword(mv_keyword);
            let expression = match parse_potential_expression(ctx, init)? {
                Some(expression) => expression,
                None => return Err(ctx.error_expected("the moved expression")),
            };
            let range = ctx.up_to_current(start.range);
            return Ok(Some(push(
                ctx,
                cst::ExpressionVariant::Move { expression },
                range,
            )));
        }
        _ => {}
    }

    let Some(mut expression) = parse_normal_expression(ctx, init)? else {
        return Ok(None);
    };

    loop {
        match ctx.peek().kind {
            TokenType::Dot => {
                ctx.extract();
                let token = ctx.peek();
                match token.kind {
                    TokenType::Integer(index) => {
                        ctx.extract();
                        if index > u32::MAX as u64 {
                            return Err(ctx.error_expected("a smaller field index"));
                        }
                        let range = ctx.up_to_current(start.range);
                        expression = push(
                            ctx,
                            cst::ExpressionVariant::TupleField {
                                base: expression,
                                index: index as u32,
                                index_range: token.range,
                            },
                            range,
                        );
                    }
                    TokenType::BracketOpen => {
                        ctx.extract();
                        let index = require_expression(ctx, "the index expression")?;
                        ctx.require_punct(TokenType::BracketClose)?;
                        let range = ctx.up_to_current(start.range);
                        expression = push(
                            ctx,
                            cst::ExpressionVariant::ArrayIndex {
                                base: expression,
                                index,
                            },
                            range,
                        );
                    }
                    TokenType::LowerName(_) => {
                        let name = match ctx.try_lower_name() {
                            Some(name) => name,
                            None => return Err(ctx.error_expected("a member name")),
                        };
                        if ctx.try_punct(TokenType::ParenOpen).is_some() {
                            let arguments = parse_arguments(ctx)?;
                            let range = ctx.up_to_current(start.range);
                            expression = push(
                                ctx,
                                cst::ExpressionVariant::MethodCall {
                                    expression,
                                    name,
                                    arguments,
                                },
                                range,
                            );
                        } else {
                            let range = ctx.up_to_current(start.range);
                            expression = push(
                                ctx,
                                cst::ExpressionVariant::StructField {
                                    base: expression,
                                    name,
                                },
                                range,
                            );
                        }
                    }
                    _ => return Err(ctx.error_expected("a member name, field index, or '['")),
                }
            }
            TokenType::ParenOpen => {
                ctx.extract();
                let arguments = parse_arguments(ctx)?;
                let range = ctx.up_to_current(start.range);
                expression = push(
                    ctx,
                    cst::ExpressionVariant::FunctionCall {
                        invocable: expression,
                        arguments,
                    },
                    range,
                );
            }
            _ => return Ok(Some(expression)),
        }
    }
}

fn parse_infix_expression(
    ctx: &mut Context<'_>,
    init: StructInit,
) -> Parse<Option<cst::ExpressionId>> {
    let start = ctx.peek().range;
    let Some(mut left) = parse_potential_expression(ctx, init)? else {
        return Ok(None);
    };
    loop {
        let op = match ctx.peek().kind {
            TokenType::Operator(id) => {
                let token = ctx.extract();
                ctx.add_operator(token);
                kieli_compiler::Name {
                    id,
                    range: token.range,
                }
            }
            TokenType::Asterisk => {
                let token = ctx.extract();
                ctx.add_operator(token);
                let id = ctx.db.string_pool.intern("*");
                kieli_compiler::Name {
                    id,
                    range: token.range,
                }
            }
            _ => return Ok(Some(left)),
        };
        let right = match parse_potential_expression(ctx, init)? {
            Some(right) => right,
            None => return Err(ctx.error_expected("the right operand")),
        };
        let range = ctx.up_to_current(start);
        left = push(
            ctx,
            cst::ExpressionVariant::InfixCall { left, right, op },
            range,
        );
    }
}

fn parse_expression_impl(
    ctx: &mut Context<'_>,
    init: StructInit,
) -> Parse<Option<cst::ExpressionId>> {
    let start = ctx.peek().range;
    let Some(mut expression) = parse_infix_expression(ctx, init)? else {
        return Ok(None);
    };
    // Type ascription binds loosest and chains: `a: B: C`.
    while let Some(ascribed_type) = crate::types::parse_type_annotation(ctx)? {
        let range = ctx.up_to_current(start);
        expression = push(
            ctx,
            cst::ExpressionVariant::Ascription {
                expression,
                ascribed_type,
            },
            range,
        );
    }
    Ok(Some(expression))
}

/// Parses an expression if one starts here.
pub fn parse_expression(ctx: &mut Context<'_>) -> Parse<Option<cst::ExpressionId>> {
    parse_expression_impl(ctx, StructInit::Allowed)
}
