//! Subtype unification over types and mutabilities.
//!
//! Two relations share one implementation: equality, and the subtype
//! relation that additionally admits `&mut T ≤ &T` through the
//! mutability rule `mut ≤ immut`. Inference variables unify by merging
//! union-find classes; a variable against a concrete type records a
//! solution after the occurs check. `Error` unifies with everything so
//! that one mistake does not cascade.

use crate::context::{
    flatten_type, set_mutability_solution, set_type_solution, Context, InferenceState,
};
use kieli_base::{ArenaId, Range};
use kieli_compiler::{hir, ConcreteMutability};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Goal {
    Equality,
    Subtype,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum UnifyResult {
    Ok,
    Mismatch,
    Recursive,
}

fn from_bool(ok: bool) -> UnifyResult {
    if ok {
        UnifyResult::Ok
    } else {
        UnifyResult::Mismatch
    }
}

fn bind(result: UnifyResult, callback: impl FnOnce() -> UnifyResult) -> UnifyResult {
    if result == UnifyResult::Ok {
        callback()
    } else {
        result
    }
}

/// Check whether the variable `id` occurs in `variant`.
///
/// A positive result means the candidate solution mentions the variable
/// being solved, which would make the solution infinitely recursive.
pub fn occurs_check(
    arena: &hir::Arena,
    id: hir::TypeVariableId,
    variant: &hir::TypeVariant,
) -> bool {
    let occurs_in_type = |ty: &hir::Type| occurs_check(arena, id, &arena.types[ty.id]);
    match variant {
        hir::TypeVariant::Variable { id: found } => *found == id,
        hir::TypeVariant::Array { element_type, .. } => occurs_in_type(element_type),
        hir::TypeVariant::Slice { element_type } => occurs_in_type(element_type),
        hir::TypeVariant::Tuple { types } => types.iter().any(occurs_in_type),
        hir::TypeVariant::Reference { referenced_type, .. } => occurs_in_type(referenced_type),
        hir::TypeVariant::Pointer { pointee_type, .. } => occurs_in_type(pointee_type),
        hir::TypeVariant::Function {
            parameter_types,
            return_type,
        } => parameter_types.iter().any(occurs_in_type) || occurs_in_type(return_type),
        hir::TypeVariant::Integer(_)
        | hir::TypeVariant::Floating
        | hir::TypeVariant::Character
        | hir::TypeVariant::Boolean
        | hir::TypeVariant::String
        | hir::TypeVariant::Structure { .. }
        | hir::TypeVariant::Enumeration { .. }
        | hir::TypeVariant::Parameterized { .. }
        | hir::TypeVariant::Error => false,
    }
}

fn unify_mutability_ids(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    goal: Goal,
    sub: hir::MutabilityId,
    super_: hir::MutabilityId,
) -> UnifyResult {
    let sub_variant = ctx.arena.hir.mutabilities[sub];
    let super_variant = ctx.arena.hir.mutabilities[super_];
    unify_mutability_variants(ctx, state, goal, sub_variant, super_variant)
}

fn unify_mutability_variants(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    goal: Goal,
    sub: hir::MutabilityVariant,
    super_: hir::MutabilityVariant,
) -> UnifyResult {
    use hir::MutabilityVariant as M;
    match (sub, super_) {
        (M::Concrete(sub), M::Concrete(super_)) => from_bool(
            sub == super_ || (sub == ConcreteMutability::Mut && goal == Goal::Subtype),
        ),
        (M::Variable { id: sub }, M::Variable { id: super_ }) => {
            if sub != super_ {
                state.mutability_disjoint_set.merge(sub.index(), super_.index());
            }
            UnifyResult::Ok
        }
        (M::Variable { id }, other) => {
            set_mutability_solution(ctx, state, id.index(), other);
            UnifyResult::Ok
        }
        (other, M::Variable { id }) => {
            set_mutability_solution(ctx, state, id.index(), other);
            UnifyResult::Ok
        }
        (M::Parameterized { tag: sub }, M::Parameterized { tag: super_ }) => {
            from_bool(sub == super_)
        }
        (M::Error, _) | (_, M::Error) => UnifyResult::Ok,
        _ => UnifyResult::Mismatch,
    }
}

fn solution(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    id: hir::TypeVariableId,
    mut candidate: hir::TypeVariant,
) -> UnifyResult {
    if occurs_check(&ctx.arena.hir, id, &candidate) {
        set_type_solution(ctx, state, id.index(), hir::TypeVariant::Error);
        return UnifyResult::Recursive;
    }
    // An integral variable may only become an integer type.
    let kind = state.type_variables[id.index()].kind;
    if kind == hir::TypeVariableKind::Integral
        && !matches!(candidate, hir::TypeVariant::Integer(_) | hir::TypeVariant::Error)
    {
        return UnifyResult::Mismatch;
    }
    flatten_type(ctx, state, &mut candidate);
    set_type_solution(ctx, state, id.index(), candidate);
    UnifyResult::Ok
}

fn unify_types(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    goal: Goal,
    sub: hir::Type,
    super_: hir::Type,
) -> UnifyResult {
    let sub_variant = ctx.arena.hir.types[sub.id].clone();
    let super_variant = ctx.arena.hir.types[super_.id].clone();
    unify_type_variants(ctx, state, goal, &sub_variant, &super_variant)
}

fn unify_all(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    goal: Goal,
    sub: &[hir::Type],
    super_: &[hir::Type],
) -> UnifyResult {
    if sub.len() != super_.len() {
        return UnifyResult::Mismatch;
    }
    for (&sub, &super_) in sub.iter().zip(super_) {
        let result = unify_types(ctx, state, goal, sub, super_);
        if result != UnifyResult::Ok {
            return result;
        }
    }
    UnifyResult::Ok
}

pub fn unify_type_variants(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    goal: Goal,
    sub: &hir::TypeVariant,
    super_: &hir::TypeVariant,
) -> UnifyResult {
    use hir::TypeVariant as T;
    match (sub, super_) {
        (T::Variable { id: sub_id }, T::Variable { id: super_id }) => {
            if sub_id != super_id {
                // The merged class is integral if either side was.
                let sub_kind = state.type_variables[sub_id.index()].kind;
                let super_kind = state.type_variables[super_id.index()].kind;
                state.type_disjoint_set.merge(sub_id.index(), super_id.index());
                if sub_kind == hir::TypeVariableKind::Integral
                    || super_kind == hir::TypeVariableKind::Integral
                {
                    let representative = state.type_disjoint_set.find(sub_id.index());
                    state.type_variables[representative].kind = hir::TypeVariableKind::Integral;
                }
            }
            UnifyResult::Ok
        }
        (T::Variable { id }, _) => solution(ctx, state, *id, super_.clone()),
        (_, T::Variable { id }) => solution(ctx, state, *id, sub.clone()),

        (T::Integer(sub), T::Integer(super_)) => from_bool(sub == super_),
        (T::Floating, T::Floating)
        | (T::Character, T::Character)
        | (T::Boolean, T::Boolean)
        | (T::String, T::String) => UnifyResult::Ok,

        (T::Parameterized { tag: sub }, T::Parameterized { tag: super_ }) => {
            from_bool(sub == super_)
        }

        (T::Tuple { types: sub }, T::Tuple { types: super_ }) => {
            unify_all(ctx, state, goal, sub, super_)
        }

        (
            T::Array {
                element_type: sub_element,
                length: sub_length,
            },
            T::Array {
                element_type: super_element,
                length: super_length,
            },
        ) => {
            let result = unify_types(ctx, state, goal, *sub_element, *super_element);
            let sub_length = *sub_length;
            let super_length = *super_length;
            bind(result, || {
                let sub_range = ctx.arena.hir.expressions[sub_length].range;
                let super_range = ctx.arena.hir.expressions[super_length].range;
                let sub_type = hir::Type {
                    id: ctx.arena.hir.expressions[sub_length].type_id,
                    range: sub_range,
                };
                let super_type = hir::Type {
                    id: ctx.arena.hir.expressions[super_length].type_id,
                    range: super_range,
                };
                unify_types(ctx, state, goal, sub_type, super_type)
            })
        }

        (T::Slice { element_type: sub }, T::Slice { element_type: super_ }) => {
            unify_types(ctx, state, goal, *sub, *super_)
        }

        (
            T::Reference {
                referenced_type: sub_type,
                mutability: sub_mutability,
            },
            T::Reference {
                referenced_type: super_type,
                mutability: super_mutability,
            },
        ) => {
            let result = unify_types(ctx, state, goal, *sub_type, *super_type);
            let sub_mutability = *sub_mutability;
            let super_mutability = *super_mutability;
            bind(result, || {
                unify_mutability_ids(ctx, state, goal, sub_mutability.id, super_mutability.id)
            })
        }

        (
            T::Pointer {
                pointee_type: sub_type,
                mutability: sub_mutability,
            },
            T::Pointer {
                pointee_type: super_type,
                mutability: super_mutability,
            },
        ) => {
            let result = unify_types(ctx, state, goal, *sub_type, *super_type);
            let sub_mutability = *sub_mutability;
            let super_mutability = *super_mutability;
            bind(result, || {
                unify_mutability_ids(ctx, state, goal, sub_mutability.id, super_mutability.id)
            })
        }

        (
            T::Function {
                parameter_types: sub_parameters,
                return_type: sub_return,
            },
            T::Function {
                parameter_types: super_parameters,
                return_type: super_return,
            },
        ) => {
            let result = unify_types(ctx, state, goal, *sub_return, *super_return);
            let sub_parameters = sub_parameters.clone();
            let super_parameters = super_parameters.clone();
            bind(result, || {
                unify_all(ctx, state, goal, &sub_parameters, &super_parameters)
            })
        }

        (T::Structure { id: sub, .. }, T::Structure { id: super_, .. }) => {
            from_bool(sub == super_)
        }
        (T::Enumeration { id: sub, .. }, T::Enumeration { id: super_, .. }) => {
            from_bool(sub == super_)
        }

        (T::Error, _) | (_, T::Error) => UnifyResult::Ok,

        _ => UnifyResult::Mismatch,
    }
}

/// Require that `sub` is equal to or a subtype of `super`, reporting a
/// diagnostic at `range` on failure.
pub fn require_subtype_relationship(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    range: Range,
    sub: &hir::TypeVariant,
    super_: &hir::TypeVariant,
) {
    let result = unify_type_variants(ctx, state, Goal::Subtype, sub, super_);
    report_unify_failure(ctx, range, result, sub, super_);
}

/// Like [`require_subtype_relationship`], addressed by arena id.
pub fn require_subtype(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    range: Range,
    sub: hir::TypeId,
    super_: hir::TypeId,
) {
    let sub_variant = ctx.arena.hir.types[sub].clone();
    let super_variant = ctx.arena.hir.types[super_].clone();
    require_subtype_relationship(ctx, state, range, &sub_variant, &super_variant);
}

fn report_unify_failure(
    ctx: &mut Context<'_>,
    range: Range,
    result: UnifyResult,
    sub: &hir::TypeVariant,
    super_: &hir::TypeVariant,
) {
    if result == UnifyResult::Ok {
        return;
    }
    let left = kieli_compiler::hir_display::type_variant_to_string(
        &ctx.arena.hir,
        &ctx.db.string_pool,
        sub,
    );
    let right = kieli_compiler::hir_display::type_variant_to_string(
        &ctx.arena.hir,
        &ctx.db.string_pool,
        super_,
    );
    let description = if result == UnifyResult::Recursive {
        "Recursive type variable solution"
    } else {
        "Could not unify"
    };
    ctx.add_error(range, format!("{description} {left} ~> {right}"));
}
