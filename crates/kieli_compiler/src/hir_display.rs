//! Structural display of the HIR.
//!
//! Two renderers live here. [`type_to_string`] and
//! [`mutability_to_string`] produce the compact inline notation used in
//! unification diagnostics ("Could not unify (I32, ?0) ~> Bool").
//! [`expression_to_string`] renders the resolved tree with the same
//! connector layout as the AST display, for golden tests and the `res`
//! debug REPL. Unsolved inference variables print as `?N`.

use crate::{hir, ConcreteMutability, Name};
use kieli_base::StringPool;

/// Render a mutability in inline notation.
pub fn mutability_to_string(arena: &hir::Arena, id: hir::MutabilityId) -> String {
    match arena.mutabilities[id] {
        hir::MutabilityVariant::Concrete(ConcreteMutability::Mut) => "mut".to_string(),
        hir::MutabilityVariant::Concrete(ConcreteMutability::Immut) => "immut".to_string(),
        hir::MutabilityVariant::Parameterized { tag } => format!("mut?{tag}"),
        hir::MutabilityVariant::Variable { id } => format!("?{id}"),
        hir::MutabilityVariant::Error => "(ERROR)".to_string(),
    }
}

fn write_types(arena: &hir::Arena, pool: &StringPool, types: &[hir::Type], out: &mut String) {
    for (index, ty) in types.iter().enumerate() {
        if index != 0 {
            out.push_str(", ");
        }
        out.push_str(&type_to_string(arena, pool, ty.id));
    }
}

/// Render a type in inline notation.
pub fn type_to_string(arena: &hir::Arena, pool: &StringPool, id: hir::TypeId) -> String {
    let mut out = String::new();
    write_type(arena, pool, id, &mut out);
    out
}

/// Render a type variant that may not live in the arena, such as a
/// candidate solution inside the unifier.
pub fn type_variant_to_string(
    arena: &hir::Arena,
    pool: &StringPool,
    variant: &hir::TypeVariant,
) -> String {
    let mut out = String::new();
    write_type_variant(arena, pool, variant, &mut out);
    out
}

fn write_type(arena: &hir::Arena, pool: &StringPool, id: hir::TypeId, out: &mut String) {
    let variant = arena.types[id].clone();
    write_type_variant(arena, pool, &variant, out);
}

fn write_type_variant(
    arena: &hir::Arena,
    pool: &StringPool,
    variant: &hir::TypeVariant,
    out: &mut String,
) {
    match variant {
        hir::TypeVariant::Integer(integer) => out.push_str(integer.name()),
        hir::TypeVariant::Floating => out.push_str("Float"),
        hir::TypeVariant::Character => out.push_str("Char"),
        hir::TypeVariant::Boolean => out.push_str("Bool"),
        hir::TypeVariant::String => out.push_str("String"),
        hir::TypeVariant::Array { element_type, length } => {
            out.push('[');
            out.push_str(&type_to_string(arena, pool, element_type.id));
            out.push_str("; ");
            match &arena.expressions[*length].variant {
                hir::ExpressionVariant::Integer(integer) => out.push_str(&integer.value.to_string()),
                _ => out.push('_'),
            }
            out.push(']');
        }
        hir::TypeVariant::Slice { element_type } => {
            out.push('[');
            out.push_str(&type_to_string(arena, pool, element_type.id));
            out.push(']');
        }
        hir::TypeVariant::Tuple { types } => {
            out.push('(');
            write_types(arena, pool, types, out);
            out.push(')');
        }
        hir::TypeVariant::Reference {
            referenced_type,
            mutability,
        } => {
            out.push('&');
            if let hir::MutabilityVariant::Concrete(ConcreteMutability::Immut) =
                arena.mutabilities[mutability.id]
            {
                // Immutability is the default and stays implicit.
            } else {
                out.push_str(&mutability_to_string(arena, mutability.id));
                out.push(' ');
            }
            out.push_str(&type_to_string(arena, pool, referenced_type.id));
        }
        hir::TypeVariant::Pointer {
            pointee_type,
            mutability,
        } => {
            out.push('*');
            if let hir::MutabilityVariant::Concrete(ConcreteMutability::Immut) =
                arena.mutabilities[mutability.id]
            {
                // As above.
            } else {
                out.push_str(&mutability_to_string(arena, mutability.id));
                out.push(' ');
            }
            out.push_str(&type_to_string(arena, pool, pointee_type.id));
        }
        hir::TypeVariant::Function {
            parameter_types,
            return_type,
        } => {
            out.push_str("fn(");
            write_types(arena, pool, parameter_types, out);
            out.push_str("): ");
            out.push_str(&type_to_string(arena, pool, return_type.id));
        }
        hir::TypeVariant::Structure { name, .. } | hir::TypeVariant::Enumeration { name, .. } => {
            out.push_str(pool.get(name.id));
        }
        hir::TypeVariant::Parameterized { tag } => {
            out.push_str(&format!("template-parameter-{tag}"));
        }
        hir::TypeVariant::Variable { id } => out.push_str(&format!("?{id}")),
        hir::TypeVariant::Error => out.push_str("(ERROR)"),
    }
}

struct DisplayState<'a> {
    output: String,
    indent: String,
    arena: &'a hir::Arena,
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

    fn type_of(&self, type_id: hir::TypeId) -> String {
        type_to_string(self.arena, self.pool, type_id)
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

fn children<T: Copy>(
    state: &mut DisplayState<'_>,
    items: &[T],
    mut display: impl FnMut(&mut DisplayState<'_>, T),
) {
    for (index, item) in items.iter().enumerate() {
        child(state, index + 1 == items.len(), |state| display(state, *item));
    }
}

fn display_expression(state: &mut DisplayState<'_>, id: hir::ExpressionId) {
    let expression = state.arena.expressions[id].clone();
    let type_note = state.type_of(expression.type_id);
    match &expression.variant {
        hir::ExpressionVariant::Integer(integer) => {
            state.line(format!("integer {}: {type_note}", integer.value));
        }
        hir::ExpressionVariant::Floating(floating) => {
            state.line(format!("floating {}: {type_note}", floating.value));
        }
        hir::ExpressionVariant::Boolean(boolean) => {
            state.line(format!("boolean {}: {type_note}", boolean.value));
        }
        hir::ExpressionVariant::Character(character) => {
            state.line(format!("character {:?}: {type_note}", character.value));
        }
        hir::ExpressionVariant::String(string) => {
            state.line(format!("string {:?}: {type_note}", state.pool.get(string.id)));
        }
        hir::ExpressionVariant::ArrayLiteral { elements } => {
            state.line(format!("array: {type_note}"));
            children(state, elements, display_expression);
        }
        hir::ExpressionVariant::Tuple { fields } => {
            state.line(format!("tuple: {type_note}"));
            children(state, fields, display_expression);
        }
        hir::ExpressionVariant::Loop { body } => {
            state.line(format!("loop: {type_note}"));
            child(state, true, |state| display_expression(state, *body));
        }
        hir::ExpressionVariant::Break { result } => {
            state.line(format!("break: {type_note}"));
            child(state, true, |state| display_expression(state, *result));
        }
        hir::ExpressionVariant::Continue => state.line(format!("continue: {type_note}")),
        hir::ExpressionVariant::Block { effects, result } => {
            state.line(format!("block: {type_note}"));
            for effect in effects {
                child(state, false, |state| display_expression(state, *effect));
            }
            child(state, true, |state| display_expression(state, *result));
        }
        hir::ExpressionVariant::Conditional {
            condition,
            true_branch,
            false_branch,
        } => {
            state.line(format!("conditional: {type_note}"));
            child(state, false, |state| display_expression(state, *condition));
            child(state, false, |state| display_expression(state, *true_branch));
            child(state, true, |state| display_expression(state, *false_branch));
        }
        hir::ExpressionVariant::Let {
            pattern,
            annotated_type,
            initializer,
        } => {
            state.line(format!("let: {}", state.type_of(annotated_type.id)));
            child(state, false, |state| display_pattern(state, *pattern));
            child(state, true, |state| display_expression(state, *initializer));
        }
        hir::ExpressionVariant::Match { cases, scrutinee } => {
            state.line(format!("match: {type_note}"));
            child(state, cases.is_empty(), |state| display_expression(state, *scrutinee));
            for (index, case) in cases.iter().enumerate() {
                child(state, index + 1 == cases.len(), |state| {
                    state.line("case");
                    child(state, false, |state| display_pattern(state, case.pattern));
                    child(state, true, |state| display_expression(state, case.expression));
                });
            }
        }
        hir::ExpressionVariant::VariableReference { name, .. } => {
            state.line(format!("variable {}: {type_note}", state.name(*name)));
        }
        hir::ExpressionVariant::FunctionReference { name, .. } => {
            state.line(format!("function {}: {type_note}", state.name(*name)));
        }
        hir::ExpressionVariant::ConstructorReference { name, .. } => {
            state.line(format!("constructor {}: {type_note}", state.name(*name)));
        }
        hir::ExpressionVariant::Invocation { invocable, arguments } => {
            state.line(format!("invocation: {type_note}"));
            child(state, arguments.is_empty(), |state| display_expression(state, *invocable));
            children(state, arguments, display_expression);
        }
        hir::ExpressionVariant::Ret { expression } => {
            state.line(format!("ret: {type_note}"));
            child(state, true, |state| display_expression(state, *expression));
        }
        hir::ExpressionVariant::Sizeof { inspected_type } => {
            state.line(format!(
                "sizeof {}: {type_note}",
                state.type_of(inspected_type.id)
            ));
        }
        hir::ExpressionVariant::Addressof {
            mutability,
            place_expression,
        } => {
            state.line(format!(
                "addressof {}: {type_note}",
                mutability_to_string(state.arena, mutability.id)
            ));
            child(state, true, |state| display_expression(state, *place_expression));
        }
        hir::ExpressionVariant::Dereference { reference_expression } => {
            state.line(format!("dereference: {type_note}"));
            child(state, true, |state| display_expression(state, *reference_expression));
        }
        hir::ExpressionVariant::Defer { expression } => {
            state.line(format!("defer: {type_note}"));
            child(state, true, |state| display_expression(state, *expression));
        }
        hir::ExpressionVariant::Error => state.line(format!("error: {type_note}")),
    }
}

fn display_pattern(state: &mut DisplayState<'_>, id: hir::PatternId) {
    let pattern = state.arena.patterns[id].clone();
    let type_note = state.type_of(pattern.type_id);
    match &pattern.variant {
        hir::PatternVariant::Integer(integer) => {
            state.line(format!("integer {}: {type_note}", integer.value));
        }
        hir::PatternVariant::Floating(floating) => {
            state.line(format!("floating {}: {type_note}", floating.value));
        }
        hir::PatternVariant::Boolean(boolean) => {
            state.line(format!("boolean {}: {type_note}", boolean.value));
        }
        hir::PatternVariant::Character(character) => {
            state.line(format!("character {:?}: {type_note}", character.value));
        }
        hir::PatternVariant::String(string) => {
            state.line(format!("string {:?}: {type_note}", state.pool.get(string.id)));
        }
        hir::PatternVariant::Wildcard => state.line(format!("wildcard: {type_note}")),
        hir::PatternVariant::Name { name, mutability, .. } => {
            state.line(format!(
                "name {} {}: {type_note}",
                mutability_to_string(state.arena, mutability.id),
                state.name(*name)
            ));
        }
        hir::PatternVariant::Tuple { fields } => {
            state.line(format!("tuple: {type_note}"));
            children(state, fields, display_pattern);
        }
        hir::PatternVariant::Slice { patterns } => {
            state.line(format!("slice: {type_note}"));
            children(state, patterns, display_pattern);
        }
        hir::PatternVariant::Constructor { constructor_id, payload } => {
            let name = state.arena.constructors[*constructor_id].name;
            state.line(format!("constructor {}: {type_note}", state.name(name)));
            if let Some(payload) = payload {
                child(state, true, |state| display_pattern(state, *payload));
            }
        }
        hir::PatternVariant::Guarded {
            guarded_pattern,
            guard_expression,
        } => {
            state.line(format!("guarded: {type_note}"));
            child(state, false, |state| display_pattern(state, *guarded_pattern));
            child(state, true, |state| display_expression(state, *guard_expression));
        }
        hir::PatternVariant::Error => state.line(format!("error: {type_note}")),
    }
}

/// Render one resolved expression as a connector tree, each node
/// annotated with its type.
pub fn expression_to_string(arena: &hir::Arena, pool: &StringPool, id: hir::ExpressionId) -> String {
    let mut state = DisplayState {
        output: String::new(),
        indent: String::new(),
        arena,
        pool,
    };
    display_expression(&mut state, id);
    state.output
}

/// Render one resolved pattern as a connector tree.
pub fn pattern_to_string(arena: &hir::Arena, pool: &StringPool, id: hir::PatternId) -> String {
    let mut state = DisplayState {
        output: String::new(),
        indent: String::new(),
        arena,
        pool,
    };
    display_pattern(&mut state, id);
    state.output
}
