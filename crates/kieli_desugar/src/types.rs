//! Type and path desugaring.

use crate::{expression, Context};
use kieli_compiler::{ast, cst};

pub(crate) fn desugar_mutability(mutability: &cst::Mutability) -> ast::Mutability {
    let variant = match &mutability.variant {
        cst::MutabilityVariant::Mut => {
            ast::MutabilityVariant::Concrete(kieli_compiler::ConcreteMutability::Mut)
        }
        cst::MutabilityVariant::Immut => {
            ast::MutabilityVariant::Concrete(kieli_compiler::ConcreteMutability::Immut)
        }
        cst::MutabilityVariant::Parameterized { name } => {
            ast::MutabilityVariant::Parameterized { name: *name }
        }
    };
    ast::Mutability {
        variant,
        range: mutability.range,
    }
}

pub(crate) fn desugar_template_argument(
    ctx: &mut Context<'_>,
    argument: &cst::TemplateArgument,
) -> ast::TemplateArgument {
    match argument {
        cst::TemplateArgument::Type(type_id) => {
            ast::TemplateArgument::Type(desugar_type_id(ctx, *type_id))
        }
        cst::TemplateArgument::Expression(expression_id) => {
            ast::TemplateArgument::Expression(expression::desugar_expression_id(ctx, *expression_id))
        }
        cst::TemplateArgument::Mutability(mutability) => {
            ast::TemplateArgument::Mutability(desugar_mutability(mutability))
        }
        cst::TemplateArgument::Wildcard { range } => {
            ast::TemplateArgument::Wildcard { range: *range }
        }
    }
}

pub(crate) fn desugar_path(ctx: &mut Context<'_>, path: &cst::Path) -> ast::Path {
    let root = match &path.root {
        cst::PathRoot::Implicit => ast::PathRoot::Implicit,
        cst::PathRoot::Global { .. } => ast::PathRoot::Global,
        cst::PathRoot::Type(type_id) => ast::PathRoot::Type(desugar_type_id(ctx, *type_id)),
    };
    let segments = path
        .segments
        .iter()
        .map(|segment| ast::PathSegment {
            name: segment.name,
            template_arguments: segment.template_arguments.as_ref().map(|arguments| {
                arguments
                    .arguments
                    .iter()
                    .map(|argument| desugar_template_argument(ctx, argument))
                    .collect()
            }),
        })
        .collect();
    ast::Path { root, segments }
}

pub(crate) fn desugar_type(ctx: &mut Context<'_>, ty: &cst::Type) -> ast::Type {
    let variant = match &ty.variant {
        cst::TypeVariant::BuiltIn(built_in) => ast::TypeVariant::BuiltIn(*built_in),
        cst::TypeVariant::Path(path) => ast::TypeVariant::Path(desugar_path(ctx, path)),
        cst::TypeVariant::Paren { inner } => {
            // Parentheses are grouping only; drop them here.
            let inner = ctx.cst.types[*inner].clone();
            return desugar_type(ctx, &inner);
        }
        cst::TypeVariant::Tuple { fields } => ast::TypeVariant::Tuple {
            fields: fields
                .iter()
                .map(|&field| desugar_type_id(ctx, field))
                .collect(),
        },
        cst::TypeVariant::Slice { element } => ast::TypeVariant::Slice {
            element: desugar_type_id(ctx, *element),
        },
        cst::TypeVariant::Array { element, length } => ast::TypeVariant::Array {
            element: desugar_type_id(ctx, *element),
            length: expression::desugar_expression_id(ctx, *length),
        },
        cst::TypeVariant::Function {
            parameters,
            return_type,
        } => ast::TypeVariant::Function {
            parameters: parameters
                .iter()
                .map(|&parameter| desugar_type_id(ctx, parameter))
                .collect(),
            return_type: desugar_type_id(ctx, *return_type),
        },
        cst::TypeVariant::Typeof { expression } => ast::TypeVariant::Typeof {
            expression: expression::desugar_expression_id(ctx, *expression),
        },
        cst::TypeVariant::Reference {
            mutability,
            referenced,
        } => ast::TypeVariant::Reference {
            mutability: crate::desugar_opt_mutability(mutability, ty.range),
            referenced: desugar_type_id(ctx, *referenced),
        },
        cst::TypeVariant::Pointer { mutability, pointee } => ast::TypeVariant::Pointer {
            mutability: crate::desugar_opt_mutability(mutability, ty.range),
            pointee: desugar_type_id(ctx, *pointee),
        },
        cst::TypeVariant::Wildcard => ast::TypeVariant::Wildcard,
        cst::TypeVariant::SelfType => ast::TypeVariant::SelfType,
        cst::TypeVariant::ImplConcepts { concepts } => ast::TypeVariant::ImplConcepts {
            concepts: concepts
                .iter()
                .map(|concept| desugar_path(ctx, concept))
                .collect(),
        },
        cst::TypeVariant::Error => ast::TypeVariant::Error,
    };
    ast::Type {
        variant,
        range: ty.range,
    }
}

pub(crate) fn desugar_type_id(ctx: &mut Context<'_>, id: cst::TypeId) -> ast::TypeId {
    let ty = ctx.cst.types[id].clone();
    let desugared = desugar_type(ctx, &ty);
    ctx.push_type(desugared)
}
