//! Definition desugaring: signature normalization and duplicate
//! detection.

use crate::{expression, pattern, types, unit_type, Context};
use kieli_base::Range;
use kieli_compiler::lsp::{self, Location, Severity};
use kieli_compiler::{ast, cst, Name};

fn duplicate_definition_diagnostic(
    ctx: &Context<'_>,
    description: &str,
    name: &str,
    first: Range,
    second: Range,
) -> lsp::Diagnostic {
    lsp::Diagnostic {
        message: format!("Multiple definitions for {description} {name}"),
        range: second,
        severity: Severity::Error,
        related_info: vec![lsp::DiagnosticRelated {
            message: "First defined here".to_string(),
            location: Location {
                doc_id: ctx.doc_id,
                range: first,
            },
        }],
        tag: lsp::DiagnosticTag::None,
    }
}

/// Reports every element whose name repeats an earlier element's name.
fn ensure_no_duplicates(
    ctx: &mut Context<'_>,
    description: &str,
    names: impl Iterator<Item = Name>,
) {
    let mut seen: Vec<Name> = Vec::new();
    for name in names {
        match seen.iter().find(|earlier| earlier.id == name.id) {
            Some(earlier) => {
                let text = ctx.db.string_pool.get(name.id).to_string();
                let diagnostic = duplicate_definition_diagnostic(
                    ctx,
                    description,
                    &text,
                    earlier.range,
                    name.range,
                );
                crate::add_diagnostic(ctx, diagnostic);
            }
            None => seen.push(name),
        }
    }
}

fn desugar_field(ctx: &mut Context<'_>, field: &cst::Field) -> ast::Field {
    ast::Field {
        name: field.name,
        field_type: types::desugar_type_id(ctx, field.field_type),
        range: field.range,
    }
}

fn desugar_constructor_body(
    ctx: &mut Context<'_>,
    body: &cst::ConstructorBody,
) -> ast::ConstructorBody {
    match body {
        cst::ConstructorBody::Struct { fields } => {
            ensure_no_duplicates(ctx, "field", fields.iter().map(|field| field.name));
            ast::ConstructorBody::Struct {
                fields: fields.iter().map(|field| desugar_field(ctx, field)).collect(),
            }
        }
        cst::ConstructorBody::Tuple { types: field_types } => ast::ConstructorBody::Tuple {
            types: field_types
                .iter()
                .map(|&field_type| types::desugar_type_id(ctx, field_type))
                .collect(),
        },
        cst::ConstructorBody::Unit => ast::ConstructorBody::Unit,
    }
}

fn desugar_template_parameters(
    ctx: &mut Context<'_>,
    parameters: &Option<cst::TemplateParameters>,
) -> Vec<ast::TemplateParameter> {
    let Some(parameters) = parameters else {
        return Vec::new();
    };
    parameters
        .parameters
        .iter()
        .map(|parameter| {
            let variant = match &parameter.variant {
                cst::TemplateParameterVariant::Type { name, concepts } => {
                    ast::TemplateParameterVariant::Type {
                        name: *name,
                        concepts: concepts
                            .iter()
                            .map(|concept| types::desugar_path(ctx, concept))
                            .collect(),
                    }
                }
                cst::TemplateParameterVariant::Value { name, value_type } => {
                    ast::TemplateParameterVariant::Value {
                        name: *name,
                        value_type: types::desugar_type_id(ctx, *value_type),
                    }
                }
                cst::TemplateParameterVariant::Mutability { name } => {
                    ast::TemplateParameterVariant::Mutability { name: *name }
                }
            };
            ast::TemplateParameter {
                variant,
                range: parameter.range,
            }
        })
        .collect()
}

/// `self`, `&self`, and `&mut self` become an ordinary parameter named
/// `self` whose type is `Self` or `&[mut] Self`.
fn normalize_self_parameter(
    ctx: &mut Context<'_>,
    self_parameter: &cst::SelfParameter,
) -> ast::FunctionParameter {
    let range = self_parameter.range;

    let mut self_type = ast::Type {
        variant: ast::TypeVariant::SelfType,
        range,
    };
    if self_parameter.is_reference {
        let referenced = ctx.push_type(self_type);
        self_type = ast::Type {
            variant: ast::TypeVariant::Reference {
                mutability: crate::desugar_opt_mutability(&self_parameter.mutability, range),
                referenced,
            },
            range,
        };
    }

    // By-value self keeps its written mutability; by-reference self is
    // an immutable binding of a reference.
    let binding_mutability = if self_parameter.is_reference {
        crate::immut_mutability(range)
    } else {
        crate::desugar_opt_mutability(&self_parameter.mutability, range)
    };

    let self_name = Name {
        id: ctx.db.string_pool.intern("self"),
        range,
    };
    let self_pattern = ctx.push_pattern(ast::Pattern {
        variant: ast::PatternVariant::Name {
            mutability: binding_mutability,
            name: self_name,
        },
        range,
    });
    let parameter_type = ctx.push_type(self_type);
    ast::FunctionParameter {
        pattern: self_pattern,
        parameter_type,
        default_argument: None,
    }
}

/// Desugars the parameter list right to left so that a parameter
/// without a written type can inherit the type of the parameter to its
/// right.
fn desugar_function_parameters(
    ctx: &mut Context<'_>,
    signature: &cst::FunctionSignature,
) -> Vec<ast::FunctionParameter> {
    let mut parameters = std::collections::VecDeque::new();
    let mut inherited_type: Option<ast::TypeId> = None;

    for parameter in signature.parameters.iter().rev() {
        let parameter_type = match parameter.parameter_type {
            Some(type_id) => {
                let desugared = types::desugar_type_id(ctx, type_id);
                inherited_type = Some(desugared);
                desugared
            }
            None => match inherited_type {
                Some(inherited) => inherited,
                None => {
                    let pattern_range = ctx.cst.patterns[parameter.pattern].range;
                    let message =
                        "The last function parameter must have an explicit type".to_string();
                    crate::add_diagnostic(ctx, lsp::error(pattern_range, message));
                    ctx.push_type(ast::Type {
                        variant: ast::TypeVariant::Error,
                        range: pattern_range,
                    })
                }
            },
        };
        parameters.push_front(ast::FunctionParameter {
            pattern: pattern::desugar_pattern_id(ctx, parameter.pattern),
            parameter_type,
            default_argument: parameter
                .default_argument
                .map(|argument| expression::desugar_expression_id(ctx, argument)),
        });
    }

    let mut result = Vec::with_capacity(parameters.len() + 1);
    if let Some(self_parameter) = &signature.self_parameter {
        result.push(normalize_self_parameter(ctx, self_parameter));
    }
    result.extend(parameters);
    result
}

pub(crate) fn desugar_function_signature(
    ctx: &mut Context<'_>,
    signature: &cst::FunctionSignature,
) -> ast::FunctionSignature {
    let parameters = desugar_function_parameters(ctx, signature);

    // If there is no explicit return type, insert the unit type.
    let return_type = match signature.return_type {
        Some(type_id) => types::desugar_type_id(ctx, type_id),
        None => ctx.push_type(unit_type(signature.name.range)),
    };

    ast::FunctionSignature {
        name: signature.name,
        template_parameters: desugar_template_parameters(ctx, &signature.template_parameters),
        parameters,
        return_type,
    }
}

fn desugar_function(ctx: &mut Context<'_>, function: &cst::Function) -> ast::Function {
    ast::Function {
        signature: desugar_function_signature(ctx, &function.signature),
        body: expression::desugar_expression_id(ctx, function.body),
    }
}

fn desugar_structure(ctx: &mut Context<'_>, structure: &cst::Structure) -> ast::Structure {
    ast::Structure {
        name: structure.name,
        template_parameters: desugar_template_parameters(ctx, &structure.template_parameters),
        body: desugar_constructor_body(ctx, &structure.body),
    }
}

fn desugar_enumeration(ctx: &mut Context<'_>, enumeration: &cst::Enumeration) -> ast::Enumeration {
    ensure_no_duplicates(
        ctx,
        "constructor",
        enumeration.constructors.iter().map(|constructor| constructor.name),
    );
    ast::Enumeration {
        name: enumeration.name,
        template_parameters: desugar_template_parameters(ctx, &enumeration.template_parameters),
        constructors: enumeration
            .constructors
            .iter()
            .map(|constructor| ast::Constructor {
                name: constructor.name,
                body: desugar_constructor_body(ctx, &constructor.body),
            })
            .collect(),
    }
}

fn desugar_concept(ctx: &mut Context<'_>, concept: &cst::Concept) -> ast::Concept {
    ast::Concept {
        name: concept.name,
        template_parameters: desugar_template_parameters(ctx, &concept.template_parameters),
        function_signatures: concept
            .function_signatures
            .iter()
            .map(|signature| desugar_function_signature(ctx, signature))
            .collect(),
        type_signatures: concept
            .type_signatures
            .iter()
            .map(|signature| ast::TypeSignature {
                name: signature.name,
                concepts: signature
                    .concepts
                    .iter()
                    .map(|concept| types::desugar_path(ctx, concept))
                    .collect(),
            })
            .collect(),
    }
}

pub(crate) fn desugar_definition(
    ctx: &mut Context<'_>,
    definition: &cst::Definition,
) -> ast::Definition {
    let variant = match &definition.variant {
        cst::DefinitionVariant::Function(function) => {
            ast::DefinitionVariant::Function(desugar_function(ctx, function))
        }
        cst::DefinitionVariant::Structure(structure) => {
            ast::DefinitionVariant::Structure(desugar_structure(ctx, structure))
        }
        cst::DefinitionVariant::Enumeration(enumeration) => {
            ast::DefinitionVariant::Enumeration(desugar_enumeration(ctx, enumeration))
        }
        cst::DefinitionVariant::Alias(alias) => ast::DefinitionVariant::Alias(ast::Alias {
            name: alias.name,
            template_parameters: desugar_template_parameters(ctx, &alias.template_parameters),
            aliased_type: types::desugar_type_id(ctx, alias.aliased_type),
        }),
        cst::DefinitionVariant::Concept(concept) => {
            ast::DefinitionVariant::Concept(desugar_concept(ctx, concept))
        }
        cst::DefinitionVariant::Impl(implementation) => ast::DefinitionVariant::Impl(ast::Impl {
            template_parameters: desugar_template_parameters(
                ctx,
                &implementation.template_parameters,
            ),
            self_type: types::desugar_type_id(ctx, implementation.self_type),
            definitions: implementation
                .definitions
                .iter()
                .map(|definition| desugar_definition(ctx, definition))
                .collect(),
        }),
        cst::DefinitionVariant::Submodule(submodule) => {
            ast::DefinitionVariant::Submodule(ast::Submodule {
                name: submodule.name,
                template_parameters: desugar_template_parameters(
                    ctx,
                    &submodule.template_parameters,
                ),
                definitions: submodule
                    .definitions
                    .iter()
                    .map(|definition| desugar_definition(ctx, definition))
                    .collect(),
            })
        }
    };
    ast::Definition {
        variant,
        range: definition.range,
    }
}
