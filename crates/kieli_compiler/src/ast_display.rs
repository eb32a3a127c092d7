//! Structural display of the AST.
//!
//! Renders the desugared tree with box-drawing connectors, one node per
//! line with a fixed prefix per variant. The output is deterministic
//! and byte-stable, which is what the golden tests and the `des` debug
//! REPL compare against.

use crate::{ast, Name};
use kieli_base::StringPool;

struct DisplayState<'a> {
    output: String,
    indent: String,
    arena: &'a ast::Arena,
    pool: &'a StringPool,
}

impl<'a> DisplayState<'a> {
    fn line(&mut self, text: impl AsRef<str>) {
        self.output.push_str(text.as_ref());
        self.output.push('\n');
    }

    fn name(&self, name: Name) -> &'a str {
        self.pool.get(name.id)
    }
}

fn child(state: &mut DisplayState<'_>, last: bool, display: impl FnOnce(&mut DisplayState<'_>)) {
    state.output.push_str(&state.indent);
    state.output.push_str(if last { "└─ " } else { "├─ " });
    let previous_indent = state.indent.len();
    state.indent.push_str(if last { "   " } else { "│  " });
    display(state);
    state.indent.truncate(previous_indent);
}

fn children<T>(
    state: &mut DisplayState<'_>,
    items: &[T],
    mut display: impl FnMut(&mut DisplayState<'_>, &T),
) {
    for (index, item) in items.iter().enumerate() {
        child(state, index + 1 == items.len(), |state| display(state, item));
    }
}

fn format_path(state: &DisplayState<'_>, path: &ast::Path) -> String {
    let segments = path
        .segments
        .iter()
        .map(|segment| {
            let name = state.pool.get(segment.name.id);
            match &segment.template_arguments {
                Some(arguments) => format!("{name}[{}]", arguments.len()),
                None => name.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("::");
    match path.root {
        ast::PathRoot::Implicit => segments,
        ast::PathRoot::Global => format!("global::{segments}"),
        ast::PathRoot::Type(_) => format!("<type>::{segments}"),
    }
}

fn display_mutability(state: &mut DisplayState<'_>, mutability: &ast::Mutability) {
    match &mutability.variant {
        ast::MutabilityVariant::Concrete(crate::ConcreteMutability::Mut) => state.line("mut"),
        ast::MutabilityVariant::Concrete(crate::ConcreteMutability::Immut) => state.line("immut"),
        ast::MutabilityVariant::Parameterized { name } => {
            let line = format!("mut?{}", state.name(*name));
            state.line(line);
        }
    }
}

fn display_path(state: &mut DisplayState<'_>, prefix: &str, path: &ast::Path) {
    state.line(format!("{prefix} {}", format_path(state, path)));
    if let ast::PathRoot::Type(type_id) = path.root {
        child(state, true, |state| display_type(state, type_id));
    }
}

fn display_expression(state: &mut DisplayState<'_>, id: ast::ExpressionId) {
    let expression = state.arena.expressions[id].clone();
    match &expression.variant {
        ast::ExpressionVariant::Integer(integer) => state.line(format!("integer {}", integer.value)),
        ast::ExpressionVariant::Floating(floating) => {
            state.line(format!("floating {}", floating.value));
        }
        ast::ExpressionVariant::Boolean(boolean) => state.line(format!("boolean {}", boolean.value)),
        ast::ExpressionVariant::Character(character) => {
            state.line(format!("character {:?}", character.value));
        }
        ast::ExpressionVariant::String(string) => {
            state.line(format!("string {:?}", state.pool.get(string.id)));
        }
        ast::ExpressionVariant::Path(path) => display_path(state, "path", path),
        ast::ExpressionVariant::Wildcard => state.line("wildcard"),
        ast::ExpressionVariant::Array { elements } => {
            state.line("array");
            children(state, elements, |state, &element| display_expression(state, element));
        }
        ast::ExpressionVariant::Tuple { fields } => {
            state.line("tuple");
            children(state, fields, |state, &field| display_expression(state, field));
        }
        ast::ExpressionVariant::Conditional {
            condition,
            true_branch,
            false_branch,
            ..
        } => {
            state.line("conditional");
            child(state, false, |state| display_expression(state, *condition));
            child(state, false, |state| display_expression(state, *true_branch));
            child(state, true, |state| display_expression(state, *false_branch));
        }
        ast::ExpressionVariant::Match { scrutinee, arms } => {
            state.line("match");
            child(state, arms.is_empty(), |state| display_expression(state, *scrutinee));
            children(state, arms, |state, arm| {
                state.line("arm");
                child(state, false, |state| display_pattern(state, arm.pattern));
                child(state, true, |state| display_expression(state, arm.expression));
            });
        }
        ast::ExpressionVariant::Block { effects, result } => {
            state.line("block");
            children(state, effects, |state, &effect| display_expression(state, effect));
            child(state, true, |state| display_expression(state, *result));
        }
        ast::ExpressionVariant::Loop { body, .. } => {
            state.line("loop");
            child(state, true, |state| display_expression(state, *body));
        }
        ast::ExpressionVariant::Break { result } => {
            state.line("break");
            child(state, true, |state| display_expression(state, *result));
        }
        ast::ExpressionVariant::Continue => state.line("continue"),
        ast::ExpressionVariant::FunctionCall { invocable, arguments } => {
            state.line("function call");
            child(state, arguments.is_empty(), |state| display_expression(state, *invocable));
            children(state, arguments, |state, argument| {
                display_expression(state, argument.expression);
            });
        }
        ast::ExpressionVariant::StructInit { path, fields } => {
            state.line("struct initializer");
            child(state, fields.is_empty(), |state| display_path(state, "path", path));
            children(state, fields, |state, field| {
                state.line(format!("field {}", state.name(field.name)));
                child(state, true, |state| display_expression(state, field.expression));
            });
        }
        ast::ExpressionVariant::InfixCall { left, right, op } => {
            state.line(format!("infix call {}", state.name(*op)));
            child(state, false, |state| display_expression(state, *left));
            child(state, true, |state| display_expression(state, *right));
        }
        ast::ExpressionVariant::StructField { base, name } => {
            state.line(format!("struct field {}", state.name(*name)));
            child(state, true, |state| display_expression(state, *base));
        }
        ast::ExpressionVariant::TupleField { base, index, .. } => {
            state.line(format!("tuple field {index}"));
            child(state, true, |state| display_expression(state, *base));
        }
        ast::ExpressionVariant::ArrayIndex { base, index } => {
            state.line("array index");
            child(state, false, |state| display_expression(state, *base));
            child(state, true, |state| display_expression(state, *index));
        }
        ast::ExpressionVariant::MethodCall {
            expression,
            name,
            arguments,
        } => {
            state.line(format!("method call {}", state.name(*name)));
            child(state, arguments.is_empty(), |state| display_expression(state, *expression));
            children(state, arguments, |state, argument| {
                display_expression(state, argument.expression);
            });
        }
        ast::ExpressionVariant::Ascription {
            expression,
            ascribed_type,
        } => {
            state.line("ascription");
            child(state, false, |state| display_expression(state, *expression));
            child(state, true, |state| display_type(state, *ascribed_type));
        }
        ast::ExpressionVariant::Let {
            pattern,
            ascribed_type,
            initializer,
        } => {
            state.line("let");
            child(state, false, |state| display_pattern(state, *pattern));
            if let Some(ascribed_type) = ascribed_type {
                child(state, false, |state| display_type(state, *ascribed_type));
            }
            child(state, true, |state| display_expression(state, *initializer));
        }
        ast::ExpressionVariant::TypeAlias { name, aliased_type } => {
            state.line(format!("type alias {}", state.name(*name)));
            child(state, true, |state| display_type(state, *aliased_type));
        }
        ast::ExpressionVariant::Ret { expression } => {
            state.line("ret");
            child(state, true, |state| display_expression(state, *expression));
        }
        ast::ExpressionVariant::Sizeof { inspected_type } => {
            state.line("sizeof");
            child(state, true, |state| display_type(state, *inspected_type));
        }
        ast::ExpressionVariant::Addressof {
            mutability,
            expression,
        } => {
            state.line("addressof");
            child(state, false, |state| display_mutability(state, mutability));
            child(state, true, |state| display_expression(state, *expression));
        }
        ast::ExpressionVariant::Deref { expression } => {
            state.line("dereference");
            child(state, true, |state| display_expression(state, *expression));
        }
        ast::ExpressionVariant::Move { expression } => {
            state.line("move");
            child(state, true, |state| display_expression(state, *expression));
        }
        ast::ExpressionVariant::Defer { expression } => {
            state.line("defer");
            child(state, true, |state| display_expression(state, *expression));
        }
        ast::ExpressionVariant::Error => state.line("error"),
    }
}

fn display_constructor_pattern_body(state: &mut DisplayState<'_>, body: &ast::ConstructorPatternBody) {
    match body {
        ast::ConstructorPatternBody::Tuple { fields } => {
            state.line("tuple body");
            children(state, fields, |state, &field| display_pattern(state, field));
        }
        ast::ConstructorPatternBody::Struct { fields } => {
            state.line("struct body");
            children(state, fields, |state, field| {
                state.line(format!("field {}", state.name(field.name)));
                if let Some(pattern) = field.pattern {
                    child(state, true, |state| display_pattern(state, pattern));
                }
            });
        }
        ast::ConstructorPatternBody::Unit => state.line("unit body"),
    }
}

fn display_pattern(state: &mut DisplayState<'_>, id: ast::PatternId) {
    let pattern = state.arena.patterns[id].clone();
    match &pattern.variant {
        ast::PatternVariant::Integer(integer) => state.line(format!("integer {}", integer.value)),
        ast::PatternVariant::Floating(floating) => {
            state.line(format!("floating {}", floating.value));
        }
        ast::PatternVariant::Boolean(boolean) => state.line(format!("boolean {}", boolean.value)),
        ast::PatternVariant::Character(character) => {
            state.line(format!("character {:?}", character.value));
        }
        ast::PatternVariant::String(string) => {
            state.line(format!("string {:?}", state.pool.get(string.id)));
        }
        ast::PatternVariant::Wildcard => state.line("wildcard"),
        ast::PatternVariant::Name { mutability, name } => {
            state.line(format!("name {}", state.name(*name)));
            child(state, true, |state| display_mutability(state, mutability));
        }
        ast::PatternVariant::Tuple { fields } => {
            state.line("tuple");
            children(state, fields, |state, &field| display_pattern(state, field));
        }
        ast::PatternVariant::Slice { patterns } => {
            state.line("slice");
            children(state, patterns, |state, &pattern| display_pattern(state, pattern));
        }
        ast::PatternVariant::Constructor { path, body } => {
            state.line("constructor");
            child(state, false, |state| display_path(state, "path", path));
            child(state, true, |state| display_constructor_pattern_body(state, body));
        }
        ast::PatternVariant::AbbreviatedConstructor { name, body } => {
            state.line(format!("abbreviated constructor {}", state.name(*name)));
            child(state, true, |state| display_constructor_pattern_body(state, body));
        }
        ast::PatternVariant::Alias {
            pattern,
            mutability,
            name,
        } => {
            state.line(format!("alias {}", state.name(*name)));
            child(state, false, |state| display_mutability(state, mutability));
            child(state, true, |state| display_pattern(state, *pattern));
        }
        ast::PatternVariant::Guarded { pattern, guard } => {
            state.line("guarded");
            child(state, false, |state| display_pattern(state, *pattern));
            child(state, true, |state| display_expression(state, *guard));
        }
    }
}

fn display_type(state: &mut DisplayState<'_>, id: ast::TypeId) {
    let ty = state.arena.types[id].clone();
    match &ty.variant {
        ast::TypeVariant::BuiltIn(built_in) => state.line(built_in.name()),
        ast::TypeVariant::Path(path) => display_path(state, "typename", path),
        ast::TypeVariant::Tuple { fields } => {
            state.line("tuple type");
            children(state, fields, |state, &field| display_type(state, field));
        }
        ast::TypeVariant::Slice { element } => {
            state.line("slice type");
            child(state, true, |state| display_type(state, *element));
        }
        ast::TypeVariant::Array { element, length } => {
            state.line("array type");
            child(state, false, |state| display_type(state, *element));
            child(state, true, |state| display_expression(state, *length));
        }
        ast::TypeVariant::Function {
            parameters,
            return_type,
        } => {
            state.line("function type");
            children(state, parameters, |state, &parameter| display_type(state, parameter));
            child(state, true, |state| display_type(state, *return_type));
        }
        ast::TypeVariant::Typeof { expression } => {
            state.line("typeof");
            child(state, true, |state| display_expression(state, *expression));
        }
        ast::TypeVariant::Reference {
            mutability,
            referenced,
        } => {
            state.line("reference type");
            child(state, false, |state| display_mutability(state, mutability));
            child(state, true, |state| display_type(state, *referenced));
        }
        ast::TypeVariant::Pointer { mutability, pointee } => {
            state.line("pointer type");
            child(state, false, |state| display_mutability(state, mutability));
            child(state, true, |state| display_type(state, *pointee));
        }
        ast::TypeVariant::Wildcard => state.line("wildcard type"),
        ast::TypeVariant::SelfType => state.line("Self"),
        ast::TypeVariant::ImplConcepts { concepts } => {
            state.line("impl concepts");
            children(state, concepts, |state, concept| display_path(state, "concept", concept));
        }
        ast::TypeVariant::Error => state.line("error type"),
    }
}

fn display_function_signature(state: &mut DisplayState<'_>, signature: &ast::FunctionSignature) {
    for parameter in &signature.parameters {
        child(state, false, |state| {
            state.line("parameter");
            child(state, false, |state| display_pattern(state, parameter.pattern));
            child(state, true, |state| display_type(state, parameter.parameter_type));
        });
    }
    child(state, false, |state| {
        state.line("return type");
        child(state, true, |state| display_type(state, signature.return_type));
    });
}

fn display_constructor_body(state: &mut DisplayState<'_>, body: &ast::ConstructorBody) {
    match body {
        ast::ConstructorBody::Struct { fields } => {
            children(state, fields, |state, field| {
                state.line(format!("field {}", state.name(field.name)));
                child(state, true, |state| display_type(state, field.field_type));
            });
        }
        ast::ConstructorBody::Tuple { types } => {
            children(state, types, |state, &ty| display_type(state, ty));
        }
        ast::ConstructorBody::Unit => child(state, true, |state| state.line("unit")),
    }
}

fn display_definition(state: &mut DisplayState<'_>, definition: &ast::Definition) {
    match &definition.variant {
        ast::DefinitionVariant::Function(function) => {
            state.line(format!("function {}", state.name(function.signature.name)));
            display_function_signature(state, &function.signature);
            child(state, true, |state| {
                state.line("body");
                child(state, true, |state| display_expression(state, function.body));
            });
        }
        ast::DefinitionVariant::Structure(structure) => {
            state.line(format!("structure {}", state.name(structure.name)));
            display_constructor_body(state, &structure.body);
        }
        ast::DefinitionVariant::Enumeration(enumeration) => {
            state.line(format!("enumeration {}", state.name(enumeration.name)));
            children(state, &enumeration.constructors, |state, constructor| {
                state.line(format!("constructor {}", state.name(constructor.name)));
                display_constructor_body(state, &constructor.body);
            });
        }
        ast::DefinitionVariant::Alias(alias) => {
            state.line(format!("alias {}", state.name(alias.name)));
            child(state, true, |state| display_type(state, alias.aliased_type));
        }
        ast::DefinitionVariant::Concept(concept) => {
            state.line(format!("concept {}", state.name(concept.name)));
            children(state, &concept.function_signatures, |state, signature| {
                state.line(format!("required function {}", state.name(signature.name)));
            });
        }
        ast::DefinitionVariant::Impl(implementation) => {
            state.line("impl");
            child(
                state,
                implementation.definitions.is_empty(),
                |state| display_type(state, implementation.self_type),
            );
            children(state, &implementation.definitions, display_definition);
        }
        ast::DefinitionVariant::Submodule(submodule) => {
            state.line(format!("module {}", state.name(submodule.name)));
            children(state, &submodule.definitions, display_definition);
        }
    }
}

/// Render one definition as a connector tree.
pub fn definition_to_string(arena: &ast::Arena, pool: &StringPool, definition: &ast::Definition) -> String {
    let mut state = DisplayState {
        output: String::new(),
        indent: String::new(),
        arena,
        pool,
    };
    display_definition(&mut state, definition);
    state.output
}

/// Render a whole module, one definition tree after another.
pub fn module_to_string(arena: &ast::Arena, pool: &StringPool, module: &ast::Module) -> String {
    let mut output = String::new();
    for definition in &module.definitions {
        output.push_str(&definition_to_string(arena, pool, definition));
    }
    output
}

/// Render one expression as a connector tree.
pub fn expression_to_string(arena: &ast::Arena, pool: &StringPool, id: ast::ExpressionId) -> String {
    let mut state = DisplayState {
        output: String::new(),
        indent: String::new(),
        arena,
        pool,
    };
    display_expression(&mut state, id);
    state.output
}
