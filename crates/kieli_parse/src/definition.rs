//! Definition parsing: functions, structures, enumerations, aliases,
//! concepts, implementations, and submodules.

use crate::internals::{parse_comma_separated, Context, Parse};
use crate::{expression, path, pattern, types};
use kieli_compiler::lsp::SemanticTokenType;
use kieli_compiler::cst;
use kieli_lex::{Token, TokenType};

fn parse_template_parameter(ctx: &mut Context<'_>) -> Parse<Option<cst::TemplateParameter>> {
    let start = ctx.peek().range;
    if let Some(name) = ctx.try_upper_name() {
        ctx.add_semantic_token(name.range, SemanticTokenType::TypeParameter);
        let concepts = if ctx.try_punct(TokenType::Colon).is_some() {
            types::parse_concept_references(ctx)?
        } else {
            Vec::new()
        };
        return Ok(Some(cst::TemplateParameter {
            variant: cst::TemplateParameterVariant::Type { name, concepts },
            range: ctx.up_to_current(start),
        }));
    }
    if let Some(name) = ctx.try_lower_name() {
        ctx.add_semantic_token(name.range, SemanticTokenType::Parameter);
        ctx.require_punct(TokenType::Colon)?;
        if let Some(mut_keyword) = ctx.try_punct(TokenType::Mut) {
            ctx.add_keyword(mut_keyword);
            return Ok(Some(cst::TemplateParameter {
                variant: cst::TemplateParameterVariant::Mutability { name },
                range: ctx.up_to_current(start),
            }));
        }
        let value_type = match types::parse_type(ctx)? {
            Some(value_type) => value_type,
            None => return Err(ctx.error_expected("'mut' or a type")),
        };
        return Ok(Some(cst::TemplateParameter {
            variant: cst::TemplateParameterVariant::Value { name, value_type },
            range: ctx.up_to_current(start),
        }));
    }
    Ok(None)
}

pub fn parse_template_parameters(ctx: &mut Context<'_>) -> Parse<Option<cst::TemplateParameters>> {
    let Some(open) = ctx.try_punct(TokenType::BracketOpen) else {
        return Ok(None);
    };
    let parameters = parse_comma_separated(
        ctx,
        TokenType::BracketClose,
        "a template parameter",
        parse_template_parameter,
    )?;
    Ok(Some(cst::TemplateParameters {
        parameters,
        range: ctx.up_to_current(open.range),
    }))
}

fn parse_self_parameter(ctx: &mut Context<'_>) -> Parse<Option<cst::SelfParameter>> {
    let save = ctx.position();
    let start = ctx.peek().range;

    let is_reference = ctx.try_punct(TokenType::Ampersand).is_some();
    let mutability = types::parse_mutability(ctx)?;
    match ctx.try_punct(TokenType::LowerSelf) {
        Some(self_keyword) => {
            ctx.add_keyword(self_keyword);
            Ok(Some(cst::SelfParameter {
                is_reference,
                mutability,
                range: ctx.up_to_current(start),
            }))
        }
        None => {
            // Not a self parameter after all; back out.
            ctx.restore(save);
            Ok(None)
        }
    }
}

fn parse_function_parameter(ctx: &mut Context<'_>) -> Parse<Option<cst::FunctionParameter>> {
    let Some(parameter_pattern) = pattern::parse_pattern(ctx)? else {
        return Ok(None);
    };
    let parameter_type = types::parse_type_annotation(ctx)?;
    let default_argument = if let Some(equals) = ctx.try_punct(TokenType::Equals) {
        ctx.add_operator(equals);
        match expression::parse_expression(ctx)? {
            Some(default_argument) => Some(default_argument),
            None => return Err(ctx.error_expected("a default argument")),
        }
    } else {
        None
    };
    Ok(Some(cst::FunctionParameter {
        pattern: parameter_pattern,
        parameter_type,
        default_argument,
    }))
}

fn parse_function_signature(ctx: &mut Context<'_>) -> Parse<cst::FunctionSignature> {
    let name = ctx.require_lower_name("a function name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Function);

    let template_parameters = parse_template_parameters(ctx)?;

    ctx.require_punct(TokenType::ParenOpen)?;
    let mut self_parameter = None;
    let mut parameters = Vec::new();
    if ctx.try_punct(TokenType::ParenClose).is_none() {
        self_parameter = parse_self_parameter(ctx)?;
        let expect_more = match self_parameter {
            Some(_) => ctx.try_punct(TokenType::Comma).is_some(),
            None => true,
        };
        if expect_more {
            loop {
                match parse_function_parameter(ctx)? {
                    Some(parameter) => parameters.push(parameter),
                    None => return Err(ctx.error_expected("a function parameter")),
                }
                if ctx.try_punct(TokenType::Comma).is_none() {
                    break;
                }
            }
        }
        ctx.require_punct(TokenType::ParenClose)?;
    }

    let return_type = types::parse_type_annotation(ctx)?;

    Ok(cst::FunctionSignature {
        name,
        template_parameters,
        self_parameter,
        parameters,
        return_type,
    })
}

fn extract_function(ctx: &mut Context<'_>, fn_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(fn_keyword);
    let signature = parse_function_signature(ctx)?;

    let body = if let Some(equals) = ctx.try_punct(TokenType::Equals) {
        ctx.add_operator(equals);
        match expression::parse_expression(ctx)? {
            Some(body) => body,
            None => return Err(ctx.error_expected("the function body expression")),
        }
    } else {
        match expression::parse_block_expression(ctx)? {
            Some(body) => body,
            None => return Err(ctx.error_expected("the function body: '=' or '{'")),
        }
    };

    Ok(cst::DefinitionVariant::Function(cst::Function {
        signature,
        body,
        fn_token: fn_keyword.range,
    }))
}

fn parse_field(ctx: &mut Context<'_>) -> Parse<Option<cst::Field>> {
    let Some(name) = ctx.try_lower_name() else {
        return Ok(None);
    };
    ctx.add_semantic_token(name.range, SemanticTokenType::Property);
    ctx.require_punct(TokenType::Colon)?;
    let field_type = match types::parse_type(ctx)? {
        Some(field_type) => field_type,
        None => return Err(ctx.error_expected("the field type")),
    };
    Ok(Some(cst::Field {
        name,
        field_type,
        range: ctx.up_to_current(name.range),
    }))
}

fn extract_constructor_body(ctx: &mut Context<'_>) -> Parse<cst::ConstructorBody> {
    if ctx.try_punct(TokenType::BraceOpen).is_some() {
        let fields = parse_comma_separated(ctx, TokenType::BraceClose, "a field", parse_field)?;
        return Ok(cst::ConstructorBody::Struct { fields });
    }
    if ctx.try_punct(TokenType::ParenOpen).is_some() {
        let field_types =
            parse_comma_separated(ctx, TokenType::ParenClose, "a type", types::parse_type)?;
        return Ok(cst::ConstructorBody::Tuple { types: field_types });
    }
    Ok(cst::ConstructorBody::Unit)
}

fn extract_structure(ctx: &mut Context<'_>, struct_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(struct_keyword);
    let name = ctx.require_upper_name("a struct name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Structure);
    let template_parameters = parse_template_parameters(ctx)?;
    let body = extract_constructor_body(ctx)?;
    Ok(cst::DefinitionVariant::Structure(cst::Structure {
        name,
        template_parameters,
        body,
    }))
}

fn parse_constructor(ctx: &mut Context<'_>) -> Parse<Option<cst::Constructor>> {
    let Some(name) = ctx.try_upper_name() else {
        return Ok(None);
    };
    ctx.add_semantic_token(name.range, SemanticTokenType::Constructor);
    let body = extract_constructor_body(ctx)?;
    Ok(Some(cst::Constructor { name, body }))
}

fn extract_enumeration(ctx: &mut Context<'_>, enum_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(enum_keyword);
    let name = ctx.require_upper_name("an enum name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Enumeration);
    let template_parameters = parse_template_parameters(ctx)?;
    let equals = ctx.require_punct(TokenType::Equals)?;
    ctx.add_operator(equals);

    let mut constructors = Vec::new();
    loop {
        match parse_constructor(ctx)? {
            Some(constructor) => constructors.push(constructor),
            None => return Err(ctx.error_expected("an enum constructor")),
        }
        match ctx.try_punct(TokenType::Pipe) {
            Some(pipe) => ctx.add_operator(pipe),
            None => break,
        }
    }

    Ok(cst::DefinitionVariant::Enumeration(cst::Enumeration {
        name,
        template_parameters,
        constructors,
    }))
}

fn extract_alias(ctx: &mut Context<'_>, alias_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(alias_keyword);
    let name = ctx.require_upper_name("an alias name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Type);
    let template_parameters = parse_template_parameters(ctx)?;
    let equals = ctx.require_punct(TokenType::Equals)?;
    ctx.add_operator(equals);
    let aliased_type = match types::parse_type(ctx)? {
        Some(aliased_type) => aliased_type,
        None => return Err(ctx.error_expected("the aliased type")),
    };
    Ok(cst::DefinitionVariant::Alias(cst::Alias {
        name,
        template_parameters,
        aliased_type,
    }))
}

fn parse_type_signature(ctx: &mut Context<'_>) -> Parse<cst::TypeSignature> {
    let name = ctx.require_upper_name("an associated type name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Type);
    let concepts = if ctx.try_punct(TokenType::Colon).is_some() {
        types::parse_concept_references(ctx)?
    } else {
        Vec::new()
    };
    Ok(cst::TypeSignature { name, concepts })
}

fn extract_concept(ctx: &mut Context<'_>, concept_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(concept_keyword);
    let name = ctx.require_upper_name("a concept name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Interface);
    let template_parameters = parse_template_parameters(ctx)?;
    ctx.require_punct(TokenType::BraceOpen)?;

    let mut function_signatures = Vec::new();
    let mut type_signatures = Vec::new();
    loop {
        if let Some(fn_keyword) = ctx.try_punct(TokenType::Fn) {
            ctx.add_keyword(fn_keyword);
            function_signatures.push(parse_function_signature(ctx)?);
        } else if let Some(alias_keyword) = ctx.try_punct(TokenType::AliasKeyword) {
            ctx.add_keyword(alias_keyword);
            type_signatures.push(parse_type_signature(ctx)?);
        } else {
            ctx.require_punct(TokenType::BraceClose)?;
            return Ok(cst::DefinitionVariant::Concept(cst::Concept {
                name,
                template_parameters,
                function_signatures,
                type_signatures,
            }));
        }
    }
}

fn extract_impl(ctx: &mut Context<'_>, impl_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(impl_keyword);
    let template_parameters = parse_template_parameters(ctx)?;
    let self_type = match types::parse_type(ctx)? {
        Some(self_type) => self_type,
        None => return Err(ctx.error_expected("the implemented type")),
    };
    let definitions = parse_braced_definitions(ctx)?;
    Ok(cst::DefinitionVariant::Impl(cst::Impl {
        template_parameters,
        self_type,
        definitions,
    }))
}

fn extract_submodule(ctx: &mut Context<'_>, module_keyword: Token) -> Parse<cst::DefinitionVariant> {
    ctx.add_keyword(module_keyword);
    let name = ctx.require_lower_name("a module name")?;
    ctx.add_semantic_token(name.range, SemanticTokenType::Module);
    let template_parameters = parse_template_parameters(ctx)?;
    let definitions = parse_braced_definitions(ctx)?;
    Ok(cst::DefinitionVariant::Submodule(cst::Submodule {
        name,
        template_parameters,
        definitions,
    }))
}

fn parse_braced_definitions(ctx: &mut Context<'_>) -> Parse<Vec<cst::Definition>> {
    ctx.require_punct(TokenType::BraceOpen)?;
    let mut definitions = Vec::new();
    while let Some(definition) = parse_definition(ctx)? {
        definitions.push(definition);
    }
    ctx.require_punct(TokenType::BraceClose)?;
    Ok(definitions)
}

/// Parses one definition if one starts here.
pub fn parse_definition(ctx: &mut Context<'_>) -> Parse<Option<cst::Definition>> {
    let start = ctx.peek();
    if !start.kind.starts_definition() {
        return Ok(None);
    }
    let keyword = ctx.extract();
    let variant = match keyword.kind {
        TokenType::Fn => extract_function(ctx, keyword),
        TokenType::Struct => extract_structure(ctx, keyword),
        TokenType::Enum => extract_enumeration(ctx, keyword),
        TokenType::AliasKeyword => extract_alias(ctx, keyword),
        TokenType::Concept => extract_concept(ctx, keyword),
        TokenType::Impl => extract_impl(ctx, keyword),
        TokenType::Module => extract_submodule(ctx, keyword),
        _ => return Ok(None),
    }?;
    Ok(Some(cst::Definition {
        variant,
        range: ctx.up_to_current(start.range),
    }))
}

fn parse_import(ctx: &mut Context<'_>) -> Parse<Option<cst::Import>> {
    let Some(import_keyword) = ctx.try_punct(TokenType::Import) else {
        return Ok(None);
    };
    ctx.add_keyword(import_keyword);
    let mut segments = Vec::new();
    loop {
        let segment = ctx.require_lower_name("a module path segment")?;
        ctx.add_semantic_token(segment.range, SemanticTokenType::Module);
        segments.push(segment);
        if ctx.try_punct(TokenType::Dot).is_none() {
            return Ok(Some(cst::Import {
                segments,
                range: ctx.up_to_current(import_keyword.range),
            }));
        }
    }
}

/// Parses a whole module, recovering at definition keywords after
/// malformed input.
pub fn parse_module(ctx: &mut Context<'_>) -> cst::Module {
    let mut module = cst::Module::default();

    loop {
        match parse_import(ctx) {
            Ok(Some(import)) => module.imports.push(import),
            Ok(None) => break,
            Err(_) => {
                ctx.recover_to_next_definition();
                break;
            }
        }
    }

    while !ctx.at_end() {
        match parse_definition(ctx) {
            Ok(Some(definition)) => module.definitions.push(definition),
            Ok(None) => {
                ctx.error_expected("a definition");
                ctx.recover_to_next_definition();
            }
            Err(_) => ctx.recover_to_next_definition(),
        }
    }

    module
}
