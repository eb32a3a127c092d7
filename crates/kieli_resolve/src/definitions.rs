//! Environment collection and definition resolution.
//!
//! Collection walks a module's definitions, allocating a symbol and an
//! info record for each; resolution then fills the infos in, lazily and
//! re-entrantly. Each definition tracks a resolution state so that a
//! definition transitively depending on itself is reported instead of
//! looping.

use crate::context::{ensure_no_unsolved_variables, Context, InferenceState};
use crate::unify;
use crate::{expressions, path, patterns, types};
use kieli_base::Range;
use kieli_compiler::db::{
    self, Environment, EnvironmentId, EnvironmentKind, MutabilityBind, ScopeId, SymbolVariant,
    TypeBind, VariableBind,
};
use kieli_compiler::lsp::{self, Location, Severity};
use kieli_compiler::{ast, hir, Name};

fn duplicate_definition_diagnostic(
    ctx: &Context<'_>,
    name: &str,
    first: Range,
    second: Range,
) -> lsp::Diagnostic {
    lsp::Diagnostic {
        message: format!("Duplicate definitions of '{name}' in the same module"),
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

/// Inserts `name -> variant` into the environment. On collision the
/// first definition wins and the duplicate is reported.
fn add_to_environment(
    ctx: &mut Context<'_>,
    env_id: EnvironmentId,
    name: Name,
    variant: SymbolVariant,
) {
    if let Some(&existing) = ctx.arena.environments[env_id].map.get(&name.id) {
        let first = ctx.arena.symbols[existing].name.range;
        let text = ctx.string(name.id).to_string();
        let diagnostic = duplicate_definition_diagnostic(ctx, &text, first, name.range);
        ctx.add_diagnostic(diagnostic);
        return;
    }
    let symbol_id = ctx.new_symbol(name, variant);
    db::add_reference(ctx.db, ctx.doc_id, lsp::write(name.range), symbol_id);
    let environment = &mut ctx.arena.environments[env_id];
    environment.map.insert(name.id, symbol_id);
    environment.in_order.push(symbol_id);
}

fn new_environment(
    ctx: &mut Context<'_>,
    parent_id: EnvironmentId,
    name_id: Option<kieli_base::StringId>,
    kind: EnvironmentKind,
) -> EnvironmentId {
    ctx.arena.environments.push(Environment {
        map: std::collections::HashMap::new(),
        in_order: Vec::new(),
        parent_id: Some(parent_id),
        name_id,
        doc_id: ctx.doc_id,
        kind,
    })
}

/// Walks the module's definitions and builds its environment. The AST
/// definitions move into their info records for later resolution.
pub fn collect_definitions(
    ctx: &mut Context<'_>,
    env_id: EnvironmentId,
    definitions: Vec<ast::Definition>,
) {
    for definition in definitions {
        add_definition(ctx, env_id, definition);
    }
}

fn add_definition(ctx: &mut Context<'_>, env_id: EnvironmentId, definition: ast::Definition) {
    match definition.variant {
        ast::DefinitionVariant::Function(function) => {
            let name = function.signature.name;
            let function_id = ctx.arena.hir.functions.push(hir::FunctionInfo {
                name,
                env_id,
                self_type: None,
                ast: function,
                signature: hir::Resolvable::Unresolved,
                body: hir::Resolvable::Unresolved,
            });
            ctx.function_ids.push(function_id);
            add_to_environment(ctx, env_id, name, SymbolVariant::Function(function_id));
        }
        ast::DefinitionVariant::Structure(structure) => {
            let name = structure.name;
            let associated_env_id =
                new_environment(ctx, env_id, Some(name.id), EnvironmentKind::Type);
            let structure_id = ctx.arena.hir.structures.next_id();
            let type_id = ctx
                .arena
                .hir
                .types
                .push(hir::TypeVariant::Structure { name, id: structure_id });
            ctx.arena.hir.structures.push(hir::StructureInfo {
                name,
                env_id,
                associated_env_id,
                type_id,
                ast: structure,
                structure: hir::Resolvable::Unresolved,
            });
            add_to_environment(ctx, env_id, name, SymbolVariant::Structure(structure_id));
        }
        ast::DefinitionVariant::Enumeration(enumeration) => {
            let name = enumeration.name;
            let associated_env_id =
                new_environment(ctx, env_id, Some(name.id), EnvironmentKind::Type);
            let enumeration_id = ctx.arena.hir.enumerations.next_id();
            let type_id = ctx.arena.hir.types.push(hir::TypeVariant::Enumeration {
                name,
                id: enumeration_id,
            });
            ctx.arena.hir.enumerations.push(hir::EnumerationInfo {
                name,
                env_id,
                associated_env_id,
                type_id,
                ast: enumeration,
                enumeration: hir::Resolvable::Unresolved,
            });
            add_to_environment(ctx, env_id, name, SymbolVariant::Enumeration(enumeration_id));
        }
        ast::DefinitionVariant::Alias(alias) => {
            let name = alias.name;
            let alias_id = ctx.arena.hir.aliases.push(hir::AliasInfo {
                name,
                env_id,
                ast: alias,
                alias: hir::Resolvable::Unresolved,
            });
            add_to_environment(ctx, env_id, name, SymbolVariant::Alias(alias_id));
        }
        ast::DefinitionVariant::Concept(concept) => {
            let name = concept.name;
            let concept_id = ctx.arena.hir.concepts.push(hir::ConceptInfo {
                name,
                env_id,
                ast: concept,
                resolved: hir::Resolvable::Unresolved,
            });
            add_to_environment(ctx, env_id, name, SymbolVariant::Concept(concept_id));
        }
        ast::DefinitionVariant::Submodule(submodule) => {
            let name = submodule.name;
            let mod_env_id =
                new_environment(ctx, env_id, Some(name.id), EnvironmentKind::Module);
            let module_id = ctx
                .arena
                .hir
                .modules
                .push(hir::ModuleInfo { name, mod_env_id });
            add_to_environment(ctx, env_id, name, SymbolVariant::Module(module_id));
            collect_definitions(ctx, mod_env_id, submodule.definitions);
        }
        ast::DefinitionVariant::Impl(implementation) => {
            // Deferred until the target type can resolve.
            ctx.pending_impls.push(crate::context::PendingImpl {
                env_id,
                ast: implementation,
            });
        }
    }
}

pub fn resolve_template_parameters(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    parameters: &[ast::TemplateParameter],
) -> Vec<hir::TemplateParameter> {
    parameters
        .iter()
        .map(|parameter| match &parameter.variant {
            ast::TemplateParameterVariant::Type { name, concepts } => {
                for concept in concepts {
                    let symbol_id = path::resolve_path(ctx, state, scope_id, env_id, concept);
                    let symbol = ctx.arena.symbols[symbol_id];
                    if !matches!(
                        symbol.variant,
                        SymbolVariant::Concept(_) | SymbolVariant::Error
                    ) {
                        let message = format!(
                            "Expected a concept, but '{}' is {}",
                            ctx.string(symbol.name.id),
                            db::describe_symbol_kind(symbol.variant)
                        );
                        ctx.add_error(concept.head().name.range, message);
                    }
                }
                let tag = ctx.tags.fresh_template_parameter_tag();
                bind_template_type(ctx, scope_id, *name, tag);
                hir::TemplateParameter {
                    name: *name,
                    tag,
                    variant: hir::TemplateParameterVariant::Type,
                    range: parameter.range,
                }
            }
            ast::TemplateParameterVariant::Mutability { name } => {
                let tag = ctx.tags.fresh_template_parameter_tag();
                bind_template_mutability(ctx, scope_id, *name, tag);
                hir::TemplateParameter {
                    name: *name,
                    tag,
                    variant: hir::TemplateParameterVariant::Mutability,
                    range: parameter.range,
                }
            }
            ast::TemplateParameterVariant::Value { name, value_type } => {
                let value_ast = ctx.arena.ast.types[*value_type].clone();
                let value_type = types::resolve_type(ctx, state, scope_id, env_id, &value_ast);
                let tag = ctx.tags.fresh_template_parameter_tag();
                bind_template_value(ctx, scope_id, *name, value_type);
                hir::TemplateParameter {
                    name: *name,
                    tag,
                    variant: hir::TemplateParameterVariant::Value { value_type },
                    range: parameter.range,
                }
            }
        })
        .collect()
}

fn bind_template_type(
    ctx: &mut Context<'_>,
    scope_id: ScopeId,
    name: Name,
    tag: hir::TemplateParameterTag,
) {
    let type_id = ctx
        .arena
        .hir
        .types
        .push(hir::TypeVariant::Parameterized { tag });
    let local_id = ctx
        .arena
        .hir
        .local_types
        .push(hir::LocalType { name, type_id });
    let symbol_id = ctx.new_symbol(name, SymbolVariant::LocalType(local_id));
    db::add_reference(ctx.db, ctx.doc_id, lsp::write(name.range), symbol_id);
    ctx.bind_type(
        scope_id,
        TypeBind {
            name,
            local_id,
            symbol_id,
            mentioned: false,
        },
    );
}

fn bind_template_mutability(
    ctx: &mut Context<'_>,
    scope_id: ScopeId,
    name: Name,
    tag: hir::TemplateParameterTag,
) {
    let mutability_id = ctx
        .arena
        .hir
        .mutabilities
        .push(hir::MutabilityVariant::Parameterized { tag });
    let local_id = ctx
        .arena
        .hir
        .local_mutabilities
        .push(hir::LocalMutability { name, mutability_id });
    let symbol_id = ctx.new_symbol(name, SymbolVariant::LocalMutability(local_id));
    db::add_reference(ctx.db, ctx.doc_id, lsp::write(name.range), symbol_id);
    ctx.bind_mutability(
        scope_id,
        MutabilityBind {
            name,
            local_id,
            symbol_id,
            mentioned: false,
        },
    );
}

fn bind_template_value(
    ctx: &mut Context<'_>,
    scope_id: ScopeId,
    name: Name,
    value_type: hir::Type,
) {
    let mutability = ctx.immut_mutability(name.range);
    patterns::bind_name(ctx, scope_id, name, value_type.id, mutability);
}

/// Rebinds the template parameters of an already-resolved signature
/// into a fresh scope, reusing their original tags.
fn rebind_template_parameters(
    ctx: &mut Context<'_>,
    scope_id: ScopeId,
    parameters: &[hir::TemplateParameter],
) {
    for parameter in parameters {
        match &parameter.variant {
            hir::TemplateParameterVariant::Type => {
                bind_template_type(ctx, scope_id, parameter.name, parameter.tag);
            }
            hir::TemplateParameterVariant::Mutability => {
                bind_template_mutability(ctx, scope_id, parameter.name, parameter.tag);
            }
            hir::TemplateParameterVariant::Value { value_type } => {
                bind_template_value(ctx, scope_id, parameter.name, *value_type);
            }
        }
    }
}

/// Rebinds every name a resolved pattern introduced into `scope_id`.
fn rebind_pattern(ctx: &mut Context<'_>, scope_id: ScopeId, pattern_id: hir::PatternId) {
    match ctx.arena.hir.patterns[pattern_id].variant.clone() {
        hir::PatternVariant::Name { local_id, name, .. } => {
            let symbol_id = ctx.new_symbol(name, SymbolVariant::LocalVariable(local_id));
            ctx.bind_variable(
                scope_id,
                VariableBind {
                    name,
                    local_id,
                    symbol_id,
                    mentioned: false,
                },
            );
        }
        hir::PatternVariant::Tuple { fields } => {
            for field in fields {
                rebind_pattern(ctx, scope_id, field);
            }
        }
        hir::PatternVariant::Slice { patterns } => {
            for pattern in patterns {
                rebind_pattern(ctx, scope_id, pattern);
            }
        }
        hir::PatternVariant::Constructor { payload, .. } => {
            if let Some(payload) = payload {
                rebind_pattern(ctx, scope_id, payload);
            }
        }
        hir::PatternVariant::Guarded { guarded_pattern, .. } => {
            rebind_pattern(ctx, scope_id, guarded_pattern);
        }
        _ => {}
    }
}

fn error_function_signature(ctx: &mut Context<'_>, name: Name) -> hir::FunctionSignature {
    let error = ctx.error_type(name.range);
    hir::FunctionSignature {
        template_parameters: Vec::new(),
        parameters: Vec::new(),
        return_type: error,
        function_type: error,
        name,
    }
}

fn report_recursive_definition(ctx: &mut Context<'_>, name: Name) {
    let message = format!("Recursive definition: '{}'", ctx.string(name.id));
    ctx.add_error(name.range, message);
}

pub fn resolve_function_signature(ctx: &mut Context<'_>, function_id: hir::FunctionId) {
    match ctx.arena.hir.functions[function_id].signature {
        hir::Resolvable::Resolved(_) => return,
        hir::Resolvable::InProgress => {
            let name = ctx.arena.hir.functions[function_id].name;
            report_recursive_definition(ctx, name);
            let signature = error_function_signature(ctx, name);
            ctx.arena.hir.functions[function_id].signature = hir::Resolvable::Resolved(signature);
            return;
        }
        hir::Resolvable::Unresolved => {}
    }
    ctx.arena.hir.functions[function_id].signature = hir::Resolvable::InProgress;

    let info = &ctx.arena.hir.functions[function_id];
    let name = info.name;
    let env_id = info.env_id;
    let self_type = info.self_type;
    let ast_signature = info.ast.signature.clone();

    let outer_self_type = std::mem::replace(&mut ctx.self_type, self_type);
    let mut state = InferenceState::new();
    let scope_id = ctx.new_scope();

    let template_parameters = resolve_template_parameters(
        ctx,
        &mut state,
        scope_id,
        env_id,
        &ast_signature.template_parameters,
    );

    let mut parameters = Vec::with_capacity(ast_signature.parameters.len());
    for parameter in &ast_signature.parameters {
        let type_ast = ctx.arena.ast.types[parameter.parameter_type].clone();
        let parameter_type = types::resolve_type(ctx, &mut state, scope_id, env_id, &type_ast);
        let pattern_ast = ctx.arena.ast.patterns[parameter.pattern].clone();
        let pattern = patterns::resolve_pattern(
            ctx,
            &mut state,
            scope_id,
            env_id,
            &pattern_ast,
            parameter_type,
        );
        let pattern = ctx.arena.hir.patterns.push(pattern);
        parameters.push(hir::FunctionParameter {
            pattern,
            parameter_type,
        });
    }

    let return_ast = ctx.arena.ast.types[ast_signature.return_type].clone();
    let return_type = types::resolve_type(ctx, &mut state, scope_id, env_id, &return_ast);

    let function_type = hir::Type {
        id: ctx.arena.hir.types.push(hir::TypeVariant::Function {
            parameter_types: parameters
                .iter()
                .map(|parameter| parameter.parameter_type)
                .collect(),
            return_type,
        }),
        range: name.range,
    };

    ensure_no_unsolved_variables(ctx, &mut state);
    // Parameter bindings are rebound for the body; unused warnings wait
    // until then.
    ctx.leave_scope(scope_id, false);
    ctx.self_type = outer_self_type;

    ctx.arena.hir.functions[function_id].signature =
        hir::Resolvable::Resolved(hir::FunctionSignature {
            template_parameters,
            parameters,
            return_type,
            function_type,
            name,
        });
}

pub fn resolve_function_body(ctx: &mut Context<'_>, function_id: hir::FunctionId) {
    match ctx.arena.hir.functions[function_id].body {
        hir::Resolvable::Resolved(_) => return,
        hir::Resolvable::InProgress => {
            let name = ctx.arena.hir.functions[function_id].name;
            report_recursive_definition(ctx, name);
            let error = ctx.error_expression(name.range);
            let error = ctx.arena.hir.expressions.push(error);
            ctx.arena.hir.functions[function_id].body = hir::Resolvable::Resolved(error);
            return;
        }
        hir::Resolvable::Unresolved => {}
    }
    resolve_function_signature(ctx, function_id);
    ctx.arena.hir.functions[function_id].body = hir::Resolvable::InProgress;

    let info = &ctx.arena.hir.functions[function_id];
    let env_id = info.env_id;
    let self_type = info.self_type;
    let body_id = info.ast.body;
    let signature = match info.signature.resolved() {
        Some(signature) => signature.clone(),
        None => {
            let name = info.name;
            error_function_signature(ctx, name)
        }
    };

    let outer_self_type = std::mem::replace(&mut ctx.self_type, self_type);
    let outer_return_type = std::mem::replace(&mut ctx.return_type, Some(signature.return_type));

    let mut state = InferenceState::new();
    let scope_id = ctx.new_scope();
    rebind_template_parameters(ctx, scope_id, &signature.template_parameters);
    for parameter in &signature.parameters {
        rebind_pattern(ctx, scope_id, parameter.pattern);
    }

    let body_ast = ctx.arena.ast.expressions[body_id].clone();
    let body = expressions::resolve_expression(ctx, &mut state, scope_id, env_id, &body_ast);
    unify::require_subtype(ctx, &mut state, body.range, body.type_id, signature.return_type.id);
    let body = ctx.arena.hir.expressions.push(body);

    ensure_no_unsolved_variables(ctx, &mut state);
    ctx.leave_scope(scope_id, true);
    ctx.self_type = outer_self_type;
    ctx.return_type = outer_return_type;

    ctx.arena.hir.functions[function_id].body = hir::Resolvable::Resolved(body);
}

fn add_member_symbol(
    ctx: &mut Context<'_>,
    env_id: EnvironmentId,
    name: Name,
    variant: SymbolVariant,
) {
    // Duplicates among members were already reported by the desugarer;
    // the first occurrence wins quietly here.
    if ctx.arena.environments[env_id].map.contains_key(&name.id) {
        return;
    }
    let symbol_id = ctx.new_symbol(name, variant);
    db::add_reference(ctx.db, ctx.doc_id, lsp::write(name.range), symbol_id);
    let environment = &mut ctx.arena.environments[env_id];
    environment.map.insert(name.id, symbol_id);
    environment.in_order.push(symbol_id);
}

fn resolve_fields(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    scope_id: ScopeId,
    env_id: EnvironmentId,
    associated_env_id: EnvironmentId,
    body: &ast::ConstructorBody,
    add_symbols: bool,
) -> Vec<hir::FieldId> {
    match body {
        ast::ConstructorBody::Struct { fields } => fields
            .iter()
            .map(|field| {
                let type_ast = ctx.arena.ast.types[field.field_type].clone();
                let field_type = types::resolve_type(ctx, state, scope_id, env_id, &type_ast);
                let field_id = ctx.arena.hir.fields.push(hir::FieldInfo {
                    name: field.name,
                    field_type,
                    range: field.range,
                });
                if add_symbols {
                    add_member_symbol(
                        ctx,
                        associated_env_id,
                        field.name,
                        SymbolVariant::Field(field_id),
                    );
                }
                field_id
            })
            .collect(),
        ast::ConstructorBody::Tuple { types: field_types } => field_types
            .iter()
            .enumerate()
            .map(|(index, &field_type)| {
                let type_ast = ctx.arena.ast.types[field_type].clone();
                let field_type = types::resolve_type(ctx, state, scope_id, env_id, &type_ast);
                let name = Name {
                    id: ctx.db.string_pool.intern(&index.to_string()),
                    range: field_type.range,
                };
                ctx.arena.hir.fields.push(hir::FieldInfo {
                    name,
                    field_type,
                    range: field_type.range,
                })
            })
            .collect(),
        ast::ConstructorBody::Unit => Vec::new(),
    }
}

pub fn resolve_structure(ctx: &mut Context<'_>, structure_id: hir::StructureId) {
    match ctx.arena.hir.structures[structure_id].structure {
        hir::Resolvable::Resolved(_) => return,
        hir::Resolvable::InProgress => {
            let name = ctx.arena.hir.structures[structure_id].name;
            report_recursive_definition(ctx, name);
            ctx.arena.hir.structures[structure_id].structure =
                hir::Resolvable::Resolved(hir::Structure { fields: Vec::new() });
            return;
        }
        hir::Resolvable::Unresolved => {}
    }
    ctx.arena.hir.structures[structure_id].structure = hir::Resolvable::InProgress;

    let info = &ctx.arena.hir.structures[structure_id];
    let name = info.name;
    let env_id = info.env_id;
    let associated_env_id = info.associated_env_id;
    let type_id = info.type_id;
    let ast_structure = info.ast.clone();

    let outer_self_type = std::mem::replace(
        &mut ctx.self_type,
        Some(hir::Type {
            id: type_id,
            range: name.range,
        }),
    );
    let mut state = InferenceState::new();
    let scope_id = ctx.new_scope();
    resolve_template_parameters(
        ctx,
        &mut state,
        scope_id,
        env_id,
        &ast_structure.template_parameters,
    );

    let fields = resolve_fields(
        ctx,
        &mut state,
        scope_id,
        env_id,
        associated_env_id,
        &ast_structure.body,
        true,
    );

    ensure_no_unsolved_variables(ctx, &mut state);
    ctx.leave_scope(scope_id, false);
    ctx.self_type = outer_self_type;

    ctx.arena.hir.structures[structure_id].structure =
        hir::Resolvable::Resolved(hir::Structure { fields });
}

pub fn resolve_enumeration(ctx: &mut Context<'_>, enumeration_id: hir::EnumerationId) {
    match ctx.arena.hir.enumerations[enumeration_id].enumeration {
        hir::Resolvable::Resolved(_) => return,
        hir::Resolvable::InProgress => {
            let name = ctx.arena.hir.enumerations[enumeration_id].name;
            report_recursive_definition(ctx, name);
            ctx.arena.hir.enumerations[enumeration_id].enumeration =
                hir::Resolvable::Resolved(hir::Enumeration {
                    constructors: Vec::new(),
                });
            return;
        }
        hir::Resolvable::Unresolved => {}
    }
    ctx.arena.hir.enumerations[enumeration_id].enumeration = hir::Resolvable::InProgress;

    let info = &ctx.arena.hir.enumerations[enumeration_id];
    let name = info.name;
    let env_id = info.env_id;
    let associated_env_id = info.associated_env_id;
    let type_id = info.type_id;
    let ast_enumeration = info.ast.clone();

    let outer_self_type = std::mem::replace(
        &mut ctx.self_type,
        Some(hir::Type {
            id: type_id,
            range: name.range,
        }),
    );
    let mut state = InferenceState::new();
    let scope_id = ctx.new_scope();
    resolve_template_parameters(
        ctx,
        &mut state,
        scope_id,
        env_id,
        &ast_enumeration.template_parameters,
    );

    let mut constructors = Vec::with_capacity(ast_enumeration.constructors.len());
    for constructor in &ast_enumeration.constructors {
        let body = match &constructor.body {
            ast::ConstructorBody::Unit => hir::ConstructorBody::Unit,
            ast::ConstructorBody::Tuple { types: field_types } => hir::ConstructorBody::Tuple {
                types: field_types
                    .iter()
                    .map(|&field_type| {
                        let type_ast = ctx.arena.ast.types[field_type].clone();
                        types::resolve_type(ctx, &mut state, scope_id, env_id, &type_ast)
                    })
                    .collect(),
            },
            ast::ConstructorBody::Struct { .. } => hir::ConstructorBody::Struct {
                fields: resolve_fields(
                    ctx,
                    &mut state,
                    scope_id,
                    env_id,
                    associated_env_id,
                    &constructor.body,
                    false,
                ),
            },
        };
        let constructor_id = ctx.arena.hir.constructors.push(hir::ConstructorInfo {
            name: constructor.name,
            enumeration_id,
            body,
        });
        add_member_symbol(
            ctx,
            associated_env_id,
            constructor.name,
            SymbolVariant::Constructor(constructor_id),
        );
        constructors.push(constructor_id);
    }

    ensure_no_unsolved_variables(ctx, &mut state);
    ctx.leave_scope(scope_id, false);
    ctx.self_type = outer_self_type;

    ctx.arena.hir.enumerations[enumeration_id].enumeration =
        hir::Resolvable::Resolved(hir::Enumeration { constructors });
}

pub fn resolve_alias(ctx: &mut Context<'_>, alias_id: hir::AliasId) -> Option<hir::Alias> {
    match &ctx.arena.hir.aliases[alias_id].alias {
        hir::Resolvable::Resolved(alias) => return Some(alias.clone()),
        hir::Resolvable::InProgress => {
            let name = ctx.arena.hir.aliases[alias_id].name;
            report_recursive_definition(ctx, name);
            return None;
        }
        hir::Resolvable::Unresolved => {}
    }
    ctx.arena.hir.aliases[alias_id].alias = hir::Resolvable::InProgress;

    let info = &ctx.arena.hir.aliases[alias_id];
    let name = info.name;
    let env_id = info.env_id;
    let ast_alias = info.ast.clone();

    let mut state = InferenceState::new();
    let scope_id = ctx.new_scope();
    resolve_template_parameters(
        ctx,
        &mut state,
        scope_id,
        env_id,
        &ast_alias.template_parameters,
    );

    let type_ast = ctx.arena.ast.types[ast_alias.aliased_type].clone();
    let aliased_type = types::resolve_type(ctx, &mut state, scope_id, env_id, &type_ast);

    ensure_no_unsolved_variables(ctx, &mut state);
    ctx.leave_scope(scope_id, false);

    let alias = hir::Alias { name, aliased_type };
    ctx.arena.hir.aliases[alias_id].alias = hir::Resolvable::Resolved(alias.clone());
    Some(alias)
}

pub fn resolve_concept(ctx: &mut Context<'_>, concept_id: hir::ConceptId) {
    match ctx.arena.hir.concepts[concept_id].resolved {
        hir::Resolvable::Resolved(()) => return,
        hir::Resolvable::InProgress => {
            let name = ctx.arena.hir.concepts[concept_id].name;
            report_recursive_definition(ctx, name);
            ctx.arena.hir.concepts[concept_id].resolved = hir::Resolvable::Resolved(());
            return;
        }
        hir::Resolvable::Unresolved => {}
    }
    // Concept requirements only participate in name resolution;
    // constraint solving is out of scope.
    ctx.arena.hir.concepts[concept_id].resolved = hir::Resolvable::Resolved(());
}

/// Resolves the definitions reachable from `env_id`, in declaration
/// order. Function bodies wait for [`resolve_all_function_bodies`].
pub fn resolve_environment(ctx: &mut Context<'_>, env_id: EnvironmentId) {
    let symbols = ctx.arena.environments[env_id].in_order.clone();
    for symbol_id in symbols {
        match ctx.arena.symbols[symbol_id].variant {
            SymbolVariant::Function(id) => resolve_function_signature(ctx, id),
            SymbolVariant::Structure(id) => resolve_structure(ctx, id),
            SymbolVariant::Enumeration(id) => resolve_enumeration(ctx, id),
            SymbolVariant::Alias(id) => {
                resolve_alias(ctx, id);
            }
            SymbolVariant::Concept(id) => resolve_concept(ctx, id),
            SymbolVariant::Module(id) => {
                let mod_env_id = ctx.arena.hir.modules[id].mod_env_id;
                resolve_environment(ctx, mod_env_id);
            }
            _ => {}
        }
    }
}

/// Attaches each pending `impl` block's definitions to its target
/// type's associated environment.
pub fn attach_impls(ctx: &mut Context<'_>) {
    let pending = std::mem::take(&mut ctx.pending_impls);
    for crate::context::PendingImpl { env_id, ast } in pending {
        let mut state = InferenceState::new();
        let scope_id = ctx.new_scope();
        resolve_template_parameters(ctx, &mut state, scope_id, env_id, &ast.template_parameters);

        let type_ast = ctx.arena.ast.types[ast.self_type].clone();
        let self_type = types::resolve_type(ctx, &mut state, scope_id, env_id, &type_ast);

        match path::type_associated_environment(ctx, self_type.id) {
            Some(associated_env_id) => {
                for definition in ast.definitions {
                    match definition.variant {
                        ast::DefinitionVariant::Function(function) => {
                            let name = function.signature.name;
                            let function_id = ctx.arena.hir.functions.push(hir::FunctionInfo {
                                name,
                                env_id: associated_env_id,
                                self_type: Some(self_type),
                                ast: function,
                                signature: hir::Resolvable::Unresolved,
                                body: hir::Resolvable::Unresolved,
                            });
                            ctx.function_ids.push(function_id);
                            add_to_environment(
                                ctx,
                                associated_env_id,
                                name,
                                SymbolVariant::Function(function_id),
                            );
                            resolve_function_signature(ctx, function_id);
                        }
                        other => {
                            let message =
                                "Only function definitions are supported in impl blocks"
                                    .to_string();
                            let range = match &other {
                                ast::DefinitionVariant::Structure(structure) => structure.name.range,
                                ast::DefinitionVariant::Enumeration(enumeration) => {
                                    enumeration.name.range
                                }
                                ast::DefinitionVariant::Alias(alias) => alias.name.range,
                                ast::DefinitionVariant::Concept(concept) => concept.name.range,
                                _ => definition.range,
                            };
                            ctx.add_error(range, message);
                        }
                    }
                }
            }
            None => {
                let message = format!(
                    "'{}' has no associated environment",
                    ctx.type_to_string(self_type.id)
                );
                ctx.add_error(self_type.range, message);
            }
        }

        ensure_no_unsolved_variables(ctx, &mut state);
        ctx.leave_scope(scope_id, false);
    }
}

/// Resolves every collected function body, including bodies the impl
/// pass added.
pub fn resolve_all_function_bodies(ctx: &mut Context<'_>) {
    let mut index = 0;
    while index < ctx.function_ids.len() {
        let function_id = ctx.function_ids[index];
        resolve_function_body(ctx, function_id);
        index += 1;
    }
}
