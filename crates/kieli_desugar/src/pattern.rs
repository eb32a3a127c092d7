//! Pattern desugaring.

use crate::{expression, types, Context};
use kieli_compiler::{ast, cst};

fn desugar_constructor_body(
    ctx: &mut Context<'_>,
    body: &Option<cst::ConstructorPatternBody>,
) -> ast::ConstructorPatternBody {
    match body {
        None => ast::ConstructorPatternBody::Unit,
        Some(cst::ConstructorPatternBody::Tuple { fields }) => ast::ConstructorPatternBody::Tuple {
            fields: fields
                .iter()
                .map(|&field| desugar_pattern_id(ctx, field))
                .collect(),
        },
        Some(cst::ConstructorPatternBody::Struct { fields }) => {
            ast::ConstructorPatternBody::Struct {
                fields: fields
                    .iter()
                    .map(|field| ast::FieldPattern {
                        name: field.name,
                        pattern: field
                            .pattern
                            .map(|pattern| desugar_pattern_id(ctx, pattern)),
                    })
                    .collect(),
            }
        }
    }
}

pub(crate) fn desugar_pattern(ctx: &mut Context<'_>, pattern: &cst::Pattern) -> ast::Pattern {
    let range = pattern.range;
    let variant = match &pattern.variant {
        cst::PatternVariant::Integer(integer) => ast::PatternVariant::Integer(*integer),
        cst::PatternVariant::Floating(floating) => ast::PatternVariant::Floating(*floating),
        cst::PatternVariant::Boolean(boolean) => ast::PatternVariant::Boolean(*boolean),
        cst::PatternVariant::Character(character) => ast::PatternVariant::Character(*character),
        cst::PatternVariant::String(string) => ast::PatternVariant::String(*string),
        cst::PatternVariant::Wildcard => ast::PatternVariant::Wildcard,
        cst::PatternVariant::Name { mutability, name } => ast::PatternVariant::Name {
            mutability: crate::desugar_opt_mutability(mutability, name.range),
            name: *name,
        },
        cst::PatternVariant::Paren { pattern } => {
            let inner = ctx.cst.patterns[*pattern].clone();
            return desugar_pattern(ctx, &inner);
        }
        cst::PatternVariant::Tuple { fields } => ast::PatternVariant::Tuple {
            fields: fields
                .iter()
                .map(|&field| desugar_pattern_id(ctx, field))
                .collect(),
        },
        cst::PatternVariant::Slice { patterns } => ast::PatternVariant::Slice {
            patterns: patterns
                .iter()
                .map(|&pattern| desugar_pattern_id(ctx, pattern))
                .collect(),
        },
        cst::PatternVariant::Constructor { path, body } => ast::PatternVariant::Constructor {
            path: types::desugar_path(ctx, path),
            body: desugar_constructor_body(ctx, body),
        },
        cst::PatternVariant::AbbreviatedConstructor { name, body } => {
            ast::PatternVariant::AbbreviatedConstructor {
                name: *name,
                body: desugar_constructor_body(ctx, body),
            }
        }
        cst::PatternVariant::Alias {
            pattern,
            mutability,
            name,
        } => ast::PatternVariant::Alias {
            pattern: desugar_pattern_id(ctx, *pattern),
            mutability: crate::desugar_opt_mutability(mutability, name.range),
            name: *name,
        },
        cst::PatternVariant::Guarded { pattern, guard } => ast::PatternVariant::Guarded {
            pattern: desugar_pattern_id(ctx, *pattern),
            guard: expression::desugar_expression_id(ctx, *guard),
        },
    };
    ast::Pattern { variant, range }
}

pub(crate) fn desugar_pattern_id(ctx: &mut Context<'_>, id: cst::PatternId) -> ast::PatternId {
    let pattern = ctx.cst.patterns[id].clone();
    let desugared = desugar_pattern(ctx, &pattern);
    ctx.push_pattern(desugared)
}
