//! Path parsing, shared between expressions, patterns, and types.

use crate::internals::{parse_comma_separated, Context, Parse};
use kieli_compiler::cst;
use kieli_lex::TokenType;

/// Parses a path root that requires no lookahead: a leading name means
/// an implicit root, `global` an absolute one.
pub fn parse_simple_path_root(ctx: &mut Context<'_>) -> Option<cst::PathRoot> {
    match ctx.peek().kind {
        TokenType::LowerName(_) | TokenType::UpperName(_) => Some(cst::PathRoot::Implicit),
        TokenType::Global => {
            let token = ctx.extract();
            ctx.add_keyword(token);
            Some(cst::PathRoot::Global { range: token.range })
        }
        _ => None,
    }
}

/// Parses a path root including type roots: `typeof(x)::…`.
pub fn parse_complex_path_root(ctx: &mut Context<'_>) -> Parse<Option<cst::PathRoot>> {
    if let Some(root) = parse_simple_path_root(ctx) {
        return Ok(Some(root));
    }
    if matches!(ctx.peek().kind, TokenType::Typeof) {
        let type_id = crate::types::parse_typeof(ctx)?;
        return Ok(Some(cst::PathRoot::Type(type_id)));
    }
    Ok(None)
}

pub fn parse_template_arguments(ctx: &mut Context<'_>) -> Parse<Option<cst::TemplateArguments>> {
    let Some(open) = ctx.try_punct(TokenType::BracketOpen) else {
        return Ok(None);
    };
    let arguments = parse_comma_separated(
        ctx,
        TokenType::BracketClose,
        "a template argument",
        parse_template_argument,
    )?;
    let range = ctx.up_to_current(open.range);
    Ok(Some(cst::TemplateArguments { arguments, range }))
}

fn parse_template_argument(ctx: &mut Context<'_>) -> Parse<Option<cst::TemplateArgument>> {
    if let Some(token) = ctx.try_punct(TokenType::Underscore) {
        return Ok(Some(cst::TemplateArgument::Wildcard { range: token.range }));
    }
    if matches!(ctx.peek().kind, TokenType::Mut | TokenType::Immut) {
        return match crate::types::parse_mutability(ctx)? {
            Some(mutability) => Ok(Some(cst::TemplateArgument::Mutability(mutability))),
            None => Err(ctx.error_expected("a mutability")),
        };
    }
    if let Some(type_id) = crate::types::parse_type(ctx)? {
        return Ok(Some(cst::TemplateArgument::Type(type_id)));
    }
    if let Some(expression_id) = crate::expression::parse_expression(ctx)? {
        return Ok(Some(cst::TemplateArgument::Expression(expression_id)));
    }
    Ok(None)
}

/// Parses the `seg(::seg)*` spine after `root`.
pub fn extract_path(ctx: &mut Context<'_>, root: cst::PathRoot) -> Parse<cst::Path> {
    if !matches!(root, cst::PathRoot::Implicit) {
        ctx.require_punct(TokenType::DoubleColon)?;
    }
    let mut segments = Vec::new();
    loop {
        let name = match ctx.try_lower_name().or_else(|| ctx.try_upper_name()) {
            Some(name) => name,
            None => return Err(ctx.error_expected("a path segment name")),
        };
        let template_arguments = parse_template_arguments(ctx)?;
        segments.push(cst::PathSegment {
            name,
            template_arguments,
        });
        if ctx.try_punct(TokenType::DoubleColon).is_none() {
            return Ok(cst::Path { root, segments });
        }
    }
}

/// Parses a whole path if one starts here.
pub fn parse_path(ctx: &mut Context<'_>) -> Parse<Option<cst::Path>> {
    match parse_complex_path_root(ctx)? {
        Some(root) => extract_path(ctx, root).map(Some),
        None => Ok(None),
    }
}
