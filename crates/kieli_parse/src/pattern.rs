//! Pattern parsing.

use crate::internals::{parse_comma_separated, Context, Parse};
use crate::path;
use kieli_compiler::cst;
use kieli_lex::TokenType;

fn push_pattern(
    ctx: &mut Context<'_>,
    variant: cst::PatternVariant,
    range: kieli_base::Range,
) -> cst::PatternId {
    ctx.arena.patterns.push(cst::Pattern { variant, range })
}

fn parse_field_pattern(ctx: &mut Context<'_>) -> Parse<Option<cst::FieldPattern>> {
    let Some(name) = ctx.try_lower_name() else {
        return Ok(None);
    };
    let pattern = if ctx.try_punct(TokenType::Equals).is_some() {
        match parse_pattern(ctx)? {
            Some(pattern) => Some(pattern),
            None => return Err(ctx.error_expected("a field pattern")),
        }
    } else {
        None
    };
    Ok(Some(cst::FieldPattern { name, pattern }))
}

fn parse_constructor_body(ctx: &mut Context<'_>) -> Parse<Option<cst::ConstructorPatternBody>> {
    if ctx.try_punct(TokenType::ParenOpen).is_some() {
        let fields = parse_comma_separated(
            ctx,
            TokenType::ParenClose,
            "a constructor field pattern",
            |ctx| parse_pattern(ctx),
        )?;
        return Ok(Some(cst::ConstructorPatternBody::Tuple { fields }));
    }
    if ctx.try_punct(TokenType::BraceOpen).is_some() {
        let fields = parse_comma_separated(
            ctx,
            TokenType::BraceClose,
            "a constructor field pattern",
            parse_field_pattern,
        )?;
        return Ok(Some(cst::ConstructorPatternBody::Struct { fields }));
    }
    Ok(None)
}

fn parse_normal_pattern(ctx: &mut Context<'_>) -> Parse<Option<cst::PatternId>> {
    let start = ctx.peek();
    let pattern_id = match start.kind {
        TokenType::Integer(value) => {
            ctx.extract();
            push_pattern(
                ctx,
                cst::PatternVariant::Integer(kieli_compiler::Integer { value }),
                start.range,
            )
        }
        TokenType::Floating(value) => {
            ctx.extract();
            push_pattern(
                ctx,
                cst::PatternVariant::Floating(kieli_compiler::Floating { value }),
                start.range,
            )
        }
        TokenType::Boolean(value) => {
            let token = ctx.extract();
            ctx.add_keyword(token);
            push_pattern(
                ctx,
                cst::PatternVariant::Boolean(kieli_compiler::Boolean { value }),
                start.range,
            )
        }
        TokenType::Character(value) => {
            ctx.extract();
            push_pattern(
                ctx,
                cst::PatternVariant::Character(kieli_compiler::Character { value }),
                start.range,
            )
        }
        TokenType::String(id) => {
            ctx.extract();
            push_pattern(
                ctx,
                cst::PatternVariant::String(kieli_compiler::StringLiteral { id }),
                start.range,
            )
        }
        TokenType::Underscore => {
            ctx.extract();
            push_pattern(ctx, cst::PatternVariant::Wildcard, start.range)
        }
        TokenType::Mut => {
            let mutability = crate::types::parse_mutability(ctx)?;
            let name = ctx.require_lower_name("a variable name")?;
            let range = ctx.up_to_current(start.range);
            push_pattern(ctx, cst::PatternVariant::Name { mutability, name }, range)
        }
        TokenType::ParenOpen => {
            ctx.extract();
            let mut fields = parse_comma_separated(
                ctx,
                TokenType::ParenClose,
                "a pattern",
                |ctx| parse_pattern(ctx),
            )?;
            let range = ctx.up_to_current(start.range);
            if fields.len() == 1 {
                let pattern = fields.remove(0);
                push_pattern(ctx, cst::PatternVariant::Paren { pattern }, range)
            } else {
                push_pattern(ctx, cst::PatternVariant::Tuple { fields }, range)
            }
        }
        TokenType::BracketOpen => {
            ctx.extract();
            let patterns = parse_comma_separated(
                ctx,
                TokenType::BracketClose,
                "an element pattern",
                |ctx| parse_pattern(ctx),
            )?;
            let range = ctx.up_to_current(start.range);
            push_pattern(ctx, cst::PatternVariant::Slice { patterns }, range)
        }
        TokenType::DoubleColon => {
            // Abbreviated constructor: `::Ctor`, enum inferred later.
            ctx.extract();
            let name = ctx.require_upper_name("a constructor name")?;
            let body = parse_constructor_body(ctx)?;
            let range = ctx.up_to_current(start.range);
            push_pattern(
                ctx,
                cst::PatternVariant::AbbreviatedConstructor { name, body },
                range,
            )
        }
        TokenType::LowerName(_) | TokenType::UpperName(_) | TokenType::Global | TokenType::Typeof => {
            let Some(root) = path::parse_complex_path_root(ctx)? else {
                return Err(ctx.error_expected("a pattern"));
            };
            let parsed = path::extract_path(ctx, root)?;
            let range = ctx.up_to_current(start.range);
            let is_plain_lower = matches!(parsed.root, cst::PathRoot::Implicit)
                && parsed.segments.len() == 1
                && parsed.segments[0].template_arguments.is_none()
                && ctx
                    .string(parsed.segments[0].name.id)
                    .chars()
                    .find(|character| *character != '_')
                    .is_some_and(|character| !character.is_uppercase());
            if is_plain_lower {
                let name = parsed.segments[0].name;
                push_pattern(
                    ctx,
                    cst::PatternVariant::Name {
                        mutability: None,
                        name,
                    },
                    range,
                )
            } else {
                let body = parse_constructor_body(ctx)?;
                let range = ctx.up_to_current(start.range);
                push_pattern(ctx, cst::PatternVariant::Constructor { path: parsed, body }, range)
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(pattern_id))
}

/// Parses a pattern including `as` aliases.
pub fn parse_pattern(ctx: &mut Context<'_>) -> Parse<Option<cst::PatternId>> {
    let start = ctx.peek().range;
    let Some(mut pattern) = parse_normal_pattern(ctx)? else {
        return Ok(None);
    };
    while let Some(as_keyword) = ctx.try_punct(TokenType::As) {
        ctx.add_keyword(as_keyword);
        let mutability = crate::types::parse_mutability(ctx)?;
        let name = ctx.require_lower_name("an alias name")?;
        let range = ctx.up_to_current(start);
        pattern = push_pattern(
            ctx,
            cst::PatternVariant::Alias {
                pattern,
                mutability,
                name,
            },
            range,
        );
    }
    Ok(Some(pattern))
}

/// Parses a pattern including trailing `if` guards; used where a whole
/// pattern is expected, like match arms and let bindings.
pub fn parse_top_level_pattern(ctx: &mut Context<'_>) -> Parse<Option<cst::PatternId>> {
    let start = ctx.peek().range;
    let Some(pattern) = parse_pattern(ctx)? else {
        return Ok(None);
    };
    if let Some(if_keyword) = ctx.try_punct(TokenType::If) {
        ctx.add_keyword(if_keyword);
        let guard = match crate::expression::parse_expression(ctx)? {
            Some(guard) => guard,
            None => return Err(ctx.error_expected("a guard expression")),
        };
        let range = ctx.up_to_current(start);
        return Ok(Some(push_pattern(
            ctx,
            cst::PatternVariant::Guarded { pattern, guard },
            range,
        )));
    }
    Ok(Some(pattern))
}
