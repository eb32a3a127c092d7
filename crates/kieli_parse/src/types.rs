//! Type parsing.

use crate::internals::{parse_comma_separated, Context, Parse};
use crate::path;
use kieli_compiler::lsp::SemanticTokenType;
use kieli_compiler::{cst, BuiltInType};
use kieli_lex::TokenType;

/// Parses `mut`, `immut`, or the parameterized form `mut?name`.
pub fn parse_mutability(ctx: &mut Context<'_>) -> Parse<Option<cst::Mutability>> {
    if let Some(mut_keyword) = ctx.try_punct(TokenType::Mut) {
        ctx.add_keyword(mut_keyword);
        if let Some(question) = ctx.try_punct(TokenType::Question) {
            ctx.add_operator(question);
            let name = ctx.require_lower_name("a mutability parameter name")?;
            ctx.add_semantic_token(name.range, SemanticTokenType::Parameter);
            return Ok(Some(cst::Mutability {
                variant: cst::MutabilityVariant::Parameterized { name },
                range: ctx.up_to_current(mut_keyword.range),
            }));
        }
        return Ok(Some(cst::Mutability {
            variant: cst::MutabilityVariant::Mut,
            range: mut_keyword.range,
        }));
    }
    if let Some(immut_keyword) = ctx.try_punct(TokenType::Immut) {
        ctx.add_keyword(immut_keyword);
        return Ok(Some(cst::Mutability {
            variant: cst::MutabilityVariant::Immut,
            range: immut_keyword.range,
        }));
    }
    Ok(None)
}

/// Parses `typeof ( expression )` and returns the pushed type node.
pub fn parse_typeof(ctx: &mut Context<'_>) -> Parse<cst::TypeId> {
    let typeof_keyword = ctx.require_punct(TokenType::Typeof)?;
    ctx.add_keyword(typeof_keyword);
    ctx.require_punct(TokenType::ParenOpen)?;
    let expression = match crate::expression::parse_expression(ctx)? {
        Some(expression) => expression,
        None => return Err(ctx.error_expected("an inspected expression")),
    };
    ctx.require_punct(TokenType::ParenClose)?;
    let range = ctx.up_to_current(typeof_keyword.range);
    Ok(ctx.arena.types.push(cst::Type {
        variant: cst::TypeVariant::Typeof { expression },
        range,
    }))
}

fn push_type(ctx: &mut Context<'_>, variant: cst::TypeVariant, range: kieli_base::Range) -> cst::TypeId {
    ctx.arena.types.push(cst::Type { variant, range })
}

fn parse_path_type(ctx: &mut Context<'_>) -> Parse<cst::TypeId> {
    let start = ctx.peek().range;
    let Some(root) = path::parse_simple_path_root(ctx) else {
        return Err(ctx.error_expected("a type"));
    };
    let parsed = path::extract_path(ctx, root)?;
    let range = ctx.up_to_current(start);

    // A bare uppercase name may be one of the built-in types.
    if matches!(parsed.root, cst::PathRoot::Implicit)
        && parsed.segments.len() == 1
        && parsed.segments[0].template_arguments.is_none()
    {
        let name = parsed.segments[0].name;
        if let Some(built_in) = BuiltInType::from_name(ctx.string(name.id)) {
            ctx.add_semantic_token(name.range, SemanticTokenType::Type);
            return Ok(push_type(ctx, cst::TypeVariant::BuiltIn(built_in), range));
        }
    }
    Ok(push_type(ctx, cst::TypeVariant::Path(parsed), range))
}

/// Parses a type if one starts here.
pub fn parse_type(ctx: &mut Context<'_>) -> Parse<Option<cst::TypeId>> {
    let start = ctx.peek();
    let type_id = match start.kind {
        TokenType::LowerName(_) | TokenType::UpperName(_) | TokenType::Global => {
            parse_path_type(ctx)?
        }
        TokenType::Typeof => {
            let typeof_id = parse_typeof(ctx)?;
            if ctx.peek().kind == TokenType::DoubleColon {
                let parsed = path::extract_path(ctx, cst::PathRoot::Type(typeof_id))?;
                let range = ctx.up_to_current(start.range);
                push_type(ctx, cst::TypeVariant::Path(parsed), range)
            } else {
                typeof_id
            }
        }
        TokenType::UpperSelf => {
            let token = ctx.extract();
            ctx.add_keyword(token);
            push_type(ctx, cst::TypeVariant::SelfType, token.range)
        }
        TokenType::Underscore => {
            let token = ctx.extract();
            push_type(ctx, cst::TypeVariant::Wildcard, token.range)
        }
        TokenType::ParenOpen => {
            ctx.extract();
            let mut fields = parse_comma_separated(
                ctx,
                TokenType::ParenClose,
                "a type",
                parse_type,
            )?;
            let range = ctx.up_to_current(start.range);
            if fields.len() == 1 {
                let inner = fields.remove(0);
                push_type(ctx, cst::TypeVariant::Paren { inner }, range)
            } else {
                push_type(ctx, cst::TypeVariant::Tuple { fields }, range)
            }
        }
        TokenType::BracketOpen => {
            ctx.extract();
            let element = match parse_type(ctx)? {
                Some(element) => element,
                None => return Err(ctx.error_expected("the element type")),
            };
            if ctx.try_punct(TokenType::Semicolon).is_some() {
                let length = match crate::expression::parse_expression(ctx)? {
                    Some(length) => length,
                    None => return Err(ctx.error_expected("the array length")),
                };
                ctx.require_punct(TokenType::BracketClose)?;
                let range = ctx.up_to_current(start.range);
                push_type(ctx, cst::TypeVariant::Array { element, length }, range)
            } else {
                ctx.require_punct(TokenType::BracketClose)?;
                let range = ctx.up_to_current(start.range);
                push_type(ctx, cst::TypeVariant::Slice { element }, range)
            }
        }
        TokenType::Fn => {
            let fn_keyword = ctx.extract();
            ctx.add_keyword(fn_keyword);
            ctx.require_punct(TokenType::ParenOpen)?;
            let parameters = parse_comma_separated(
                ctx,
                TokenType::ParenClose,
                "a parameter type",
                parse_type,
            )?;
            ctx.require_punct(TokenType::Colon)?;
            let return_type = match parse_type(ctx)? {
                Some(return_type) => return_type,
                None => return Err(ctx.error_expected("the return type")),
            };
            let range = ctx.up_to_current(start.range);
            push_type(
                ctx,
                cst::TypeVariant::Function {
                    parameters,
                    return_type,
                },
                range,
            )
        }
        TokenType::Ampersand => {
            let ampersand = ctx.extract();
            ctx.add_operator(ampersand);
            let mutability = parse_mutability(ctx)?;
            let referenced = match parse_type(ctx)? {
                Some(referenced) => referenced,
                None => return Err(ctx.error_expected("the referenced type")),
            };
            let range = ctx.up_to_current(start.range);
            push_type(
                ctx,
                cst::TypeVariant::Reference {
                    mutability,
                    referenced,
                },
                range,
            )
        }
        TokenType::Asterisk => {
            let asterisk = ctx.extract();
            ctx.add_operator(asterisk);
            let mutability = parse_mutability(ctx)?;
            let pointee = match parse_type(ctx)? {
                Some(pointee) => pointee,
                None => return Err(ctx.error_expected("the pointee type")),
            };
            let range = ctx.up_to_current(start.range);
            push_type(ctx, cst::TypeVariant::Pointer { mutability, pointee }, range)
        }
        TokenType::Impl => {
            let impl_keyword = ctx.extract();
            ctx.add_keyword(impl_keyword);
            let concepts = parse_concept_references(ctx)?;
            let range = ctx.up_to_current(start.range);
            push_type(ctx, cst::TypeVariant::ImplConcepts { concepts }, range)
        }
        _ => return Ok(None),
    };
    Ok(Some(type_id))
}

/// Parses `Concept (+ Concept)*`.
pub fn parse_concept_references(ctx: &mut Context<'_>) -> Parse<Vec<cst::Path>> {
    let mut concepts = Vec::new();
    loop {
        match path::parse_path(ctx)? {
            Some(concept) => {
                ctx.add_semantic_token(concept.head().name.range, SemanticTokenType::Interface);
                concepts.push(concept);
            }
            None => return Err(ctx.error_expected("a concept reference")),
        }
        let is_plus = match ctx.peek().kind {
            TokenType::Operator(id) => ctx.string(id) == "+",
            _ => false,
        };
        if !is_plus {
            return Ok(concepts);
        }
        let plus = ctx.extract();
        ctx.add_operator(plus);
    }
}

/// Parses `: Type` and returns the type.
pub fn parse_type_annotation(ctx: &mut Context<'_>) -> Parse<Option<cst::TypeId>> {
    if ctx.try_punct(TokenType::Colon).is_none() {
        return Ok(None);
    }
    match parse_type(ctx)? {
        Some(type_id) => Ok(Some(type_id)),
        None => Err(ctx.error_expected("a type")),
    }
}
