//! Resolution state: the context, the constants table, inference
//! variables, and scopes.

use kieli_base::{ArenaId, Range, StringId};
use kieli_compiler::db::{
    self, Database, DocumentArena, DocumentId, EnvironmentId, MutabilityBind, Scope, ScopeId,
    SymbolId, TypeBind, VariableBind,
};
use kieli_compiler::{hir, lsp, ConcreteMutability, IntegerType, Name};

/// Pre-interned HIR nodes for the built-in types and mutabilities.
///
/// Every `I32` in a document shares one arena slot; unification can
/// compare ids before comparing structures.
pub struct Constants {
    pub i8_type: hir::TypeId,
    pub i16_type: hir::TypeId,
    pub i32_type: hir::TypeId,
    pub i64_type: hir::TypeId,
    pub u8_type: hir::TypeId,
    pub u16_type: hir::TypeId,
    pub u32_type: hir::TypeId,
    pub u64_type: hir::TypeId,
    pub boolean_type: hir::TypeId,
    pub floating_type: hir::TypeId,
    pub string_type: hir::TypeId,
    pub character_type: hir::TypeId,
    pub unit_type: hir::TypeId,
    pub error_type: hir::TypeId,
    pub mutability_yes: hir::MutabilityId,
    pub mutability_no: hir::MutabilityId,
    pub mutability_error: hir::MutabilityId,
}

pub fn make_constants(arena: &mut hir::Arena) -> Constants {
    Constants {
        i8_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::I8)),
        i16_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::I16)),
        i32_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::I32)),
        i64_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::I64)),
        u8_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::U8)),
        u16_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::U16)),
        u32_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::U32)),
        u64_type: arena.types.push(hir::TypeVariant::Integer(IntegerType::U64)),
        boolean_type: arena.types.push(hir::TypeVariant::Boolean),
        floating_type: arena.types.push(hir::TypeVariant::Floating),
        string_type: arena.types.push(hir::TypeVariant::String),
        character_type: arena.types.push(hir::TypeVariant::Character),
        unit_type: arena.types.push(hir::TypeVariant::Tuple { types: Vec::new() }),
        error_type: arena.types.push(hir::TypeVariant::Error),
        mutability_yes: arena
            .mutabilities
            .push(hir::MutabilityVariant::Concrete(ConcreteMutability::Mut)),
        mutability_no: arena
            .mutabilities
            .push(hir::MutabilityVariant::Concrete(ConcreteMutability::Immut)),
        mutability_error: arena.mutabilities.push(hir::MutabilityVariant::Error),
    }
}

impl Constants {
    pub fn integer_type(&self, integer: IntegerType) -> hir::TypeId {
        match integer {
            IntegerType::I8 => self.i8_type,
            IntegerType::I16 => self.i16_type,
            IntegerType::I32 => self.i32_type,
            IntegerType::I64 => self.i64_type,
            IntegerType::U8 => self.u8_type,
            IntegerType::U16 => self.u16_type,
            IntegerType::U32 => self.u32_type,
            IntegerType::U64 => self.u64_type,
        }
    }
}

/// A disjoint-set forest over raw variable indices, with path
/// compression on find.
#[derive(Default)]
pub struct DisjointSet {
    parents: Vec<usize>,
}

impl DisjointSet {
    pub fn add(&mut self) -> usize {
        let index = self.parents.len();
        self.parents.push(index);
        index
    }

    pub fn find(&mut self, index: usize) -> usize {
        let parent = self.parents[index];
        if parent == index {
            return index;
        }
        let root = self.find(parent);
        self.parents[index] = root;
        root
    }

    /// Unions the classes of `a` and `b`; `b`'s root becomes the
    /// representative.
    pub fn merge(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            self.parents[root_a] = root_b;
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TypeVariableData {
    pub kind: hir::TypeVariableKind,
    pub variable_id: hir::TypeVariableId,
    /// The arena slot holding the variable's self-reference, or its
    /// solution once solved.
    pub type_id: hir::TypeId,
    pub origin: Range,
    pub is_solved: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct MutabilityVariableData {
    pub variable_id: hir::MutabilityVariableId,
    pub mutability_id: hir::MutabilityId,
    pub origin: Range,
    pub is_solved: bool,
}

/// Inference state for one resolution unit (one definition signature or
/// body). At the end of the unit every variable is either solved,
/// defaulted, or reported.
pub struct InferenceState {
    pub type_variables: Vec<TypeVariableData>,
    pub mutability_variables: Vec<MutabilityVariableData>,
    pub type_disjoint_set: DisjointSet,
    pub mutability_disjoint_set: DisjointSet,
}

impl InferenceState {
    pub fn new() -> Self {
        InferenceState {
            type_variables: Vec::new(),
            mutability_variables: Vec::new(),
            type_disjoint_set: DisjointSet::default(),
            mutability_disjoint_set: DisjointSet::default(),
        }
    }
}

impl Default for InferenceState {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Tags {
    current_template_parameter_tag: u32,
}

impl Tags {
    pub fn fresh_template_parameter_tag(&mut self) -> hir::TemplateParameterTag {
        self.current_template_parameter_tag += 1;
        hir::TemplateParameterTag(self.current_template_parameter_tag)
    }
}

/// An `impl` block waiting for its target type to resolve.
pub struct PendingImpl {
    pub env_id: EnvironmentId,
    pub ast: kieli_compiler::ast::Impl,
}

/// Everything resolution needs for one document.
///
/// The document's arena is taken out of the database for the duration
/// of the analysis and put back by the driver, so the context can hold
/// both mutably.
pub struct Context<'a> {
    pub db: &'a mut Database,
    pub doc_id: DocumentId,
    pub arena: DocumentArena,
    pub constants: Constants,
    pub tags: Tags,
    pub root_env_id: EnvironmentId,
    /// The `Self` type while resolving inside an `impl` block.
    pub self_type: Option<hir::Type>,
    /// The return type of the function body being resolved.
    pub return_type: Option<hir::Type>,
    pub pending_impls: Vec<PendingImpl>,
    /// Every function collected for this document, for the body pass.
    pub function_ids: Vec<hir::FunctionId>,
}

impl<'a> Context<'a> {
    pub fn new(db: &'a mut Database, doc_id: DocumentId, mut arena: DocumentArena) -> Self {
        let constants = make_constants(&mut arena.hir);
        let root_env_id = arena.environments.push(db::Environment::root(doc_id));
        Context {
            db,
            doc_id,
            arena,
            constants,
            tags: Tags {
                current_template_parameter_tag: 0,
            },
            root_env_id,
            self_type: None,
            return_type: None,
            pending_impls: Vec::new(),
            function_ids: Vec::new(),
        }
    }

    pub fn add_diagnostic(&mut self, diagnostic: lsp::Diagnostic) {
        db::add_diagnostic(self.db, self.doc_id, diagnostic);
    }

    pub fn add_error(&mut self, range: Range, message: String) {
        db::add_error(self.db, self.doc_id, range, message);
    }

    pub fn string(&self, id: StringId) -> &str {
        self.db.string_pool.get(id)
    }

    pub fn new_symbol(&mut self, name: Name, variant: db::SymbolVariant) -> SymbolId {
        self.arena.symbols.push(db::Symbol {
            variant,
            name,
            use_count: 0,
        })
    }

    pub fn error_type(&self, range: Range) -> hir::Type {
        hir::Type {
            id: self.constants.error_type,
            range,
        }
    }

    pub fn unit_type(&self, range: Range) -> hir::Type {
        hir::Type {
            id: self.constants.unit_type,
            range,
        }
    }

    pub fn error_expression(&self, range: Range) -> hir::Expression {
        hir::Expression {
            variant: hir::ExpressionVariant::Error,
            type_id: self.constants.error_type,
            kind: hir::ExpressionKind::Place,
            range,
        }
    }

    pub fn unit_expression(&self, range: Range) -> hir::Expression {
        hir::Expression {
            variant: hir::ExpressionVariant::Tuple { fields: Vec::new() },
            type_id: self.constants.unit_type,
            kind: hir::ExpressionKind::Value,
            range,
        }
    }

    pub fn immut_mutability(&self, range: Range) -> hir::Mutability {
        hir::Mutability {
            id: self.constants.mutability_no,
            range,
        }
    }

    pub fn type_to_string(&self, type_id: hir::TypeId) -> String {
        kieli_compiler::hir_display::type_to_string(&self.arena.hir, &self.db.string_pool, type_id)
    }

    // ------------------------------------------------------------------
    // Scopes

    pub fn new_scope(&mut self) -> ScopeId {
        self.arena.scopes.push(Scope::new(self.doc_id))
    }

    pub fn child_scope(&mut self, parent_id: ScopeId) -> ScopeId {
        self.arena.scopes.push(Scope::child_of(parent_id, self.doc_id))
    }

    /// Leaves a scope, optionally reporting its unused bindings.
    pub fn leave_scope(&mut self, scope_id: ScopeId, report: bool) {
        if report {
            self.report_unused(scope_id);
        }
        self.arena.scopes.kill(scope_id);
    }

    pub fn bind_variable(&mut self, scope_id: ScopeId, bind: VariableBind) {
        self.arena.scopes[scope_id].variables.insert(bind.name.id, bind);
    }

    pub fn bind_mutability(&mut self, scope_id: ScopeId, bind: MutabilityBind) {
        self.arena.scopes[scope_id]
            .mutabilities
            .insert(bind.name.id, bind);
    }

    pub fn bind_type(&mut self, scope_id: ScopeId, bind: TypeBind) {
        self.arena.scopes[scope_id].types.insert(bind.name.id, bind);
    }

    /// Finds a variable binding in the scope chain and marks it
    /// mentioned.
    pub fn find_variable(&mut self, scope_id: ScopeId, name_id: StringId) -> Option<VariableBind> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &mut self.arena.scopes[id];
            if let Some(bind) = scope.variables.get_mut(&name_id) {
                bind.mentioned = true;
                return Some(*bind);
            }
            current = scope.parent_id;
        }
        None
    }

    pub fn find_mutability(
        &mut self,
        scope_id: ScopeId,
        name_id: StringId,
    ) -> Option<MutabilityBind> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &mut self.arena.scopes[id];
            if let Some(bind) = scope.mutabilities.get_mut(&name_id) {
                bind.mentioned = true;
                return Some(*bind);
            }
            current = scope.parent_id;
        }
        None
    }

    pub fn find_type(&mut self, scope_id: ScopeId, name_id: StringId) -> Option<TypeBind> {
        let mut current = Some(scope_id);
        while let Some(id) = current {
            let scope = &mut self.arena.scopes[id];
            if let Some(bind) = scope.types.get_mut(&name_id) {
                bind.mentioned = true;
                return Some(*bind);
            }
            current = scope.parent_id;
        }
        None
    }

    /// Emits warnings for bindings in `scope_id` that were never
    /// mentioned. A leading underscore opts out.
    pub fn report_unused(&mut self, scope_id: ScopeId) {
        let scope = &self.arena.scopes[scope_id];
        let mut unused: Vec<(Name, SymbolId, &'static str)> = Vec::new();
        for bind in scope.variables.values() {
            if !bind.mentioned {
                unused.push((bind.name, bind.symbol_id, "local variable"));
            }
        }
        for bind in scope.mutabilities.values() {
            if !bind.mentioned {
                unused.push((bind.name, bind.symbol_id, "mutability binding"));
            }
        }
        for bind in scope.types.values() {
            if !bind.mentioned {
                unused.push((bind.name, bind.symbol_id, "local type alias"));
            }
        }
        unused.sort_by_key(|(name, _, _)| name.range.start);
        for (name, symbol_id, description) in unused {
            let text = self.string(name.id);
            if text.starts_with('_') || text == "self" {
                continue;
            }
            let message = format!("Unused {description}: '{text}'");
            let mut diagnostic = lsp::warning(name.range, message);
            diagnostic.tag = lsp::DiagnosticTag::Unnecessary;
            self.add_diagnostic(diagnostic);
            db::add_action(
                self.db,
                self.doc_id,
                name.range,
                db::ActionVariant::SilenceUnused { symbol_id },
            );
        }
    }

    // ------------------------------------------------------------------
    // Inference variables

    pub fn fresh_general_type_variable(
        &mut self,
        state: &mut InferenceState,
        origin: Range,
    ) -> hir::Type {
        self.fresh_type_variable(state, hir::TypeVariableKind::General, origin)
    }

    pub fn fresh_integral_type_variable(
        &mut self,
        state: &mut InferenceState,
        origin: Range,
    ) -> hir::Type {
        self.fresh_type_variable(state, hir::TypeVariableKind::Integral, origin)
    }

    fn fresh_type_variable(
        &mut self,
        state: &mut InferenceState,
        kind: hir::TypeVariableKind,
        origin: Range,
    ) -> hir::Type {
        let variable_id = hir::TypeVariableId(state.type_variables.len() as u32);
        let type_id = self
            .arena
            .hir
            .types
            .push(hir::TypeVariant::Variable { id: variable_id });
        state.type_variables.push(TypeVariableData {
            kind,
            variable_id,
            type_id,
            origin,
            is_solved: false,
        });
        state.type_disjoint_set.add();
        hir::Type {
            id: type_id,
            range: origin,
        }
    }

    pub fn fresh_mutability_variable(
        &mut self,
        state: &mut InferenceState,
        origin: Range,
    ) -> hir::Mutability {
        let variable_id = hir::MutabilityVariableId(state.mutability_variables.len() as u32);
        let mutability_id = self
            .arena
            .hir
            .mutabilities
            .push(hir::MutabilityVariant::Variable { id: variable_id });
        state.mutability_variables.push(MutabilityVariableData {
            variable_id,
            mutability_id,
            origin,
            is_solved: false,
        });
        state.mutability_disjoint_set.add();
        hir::Mutability {
            id: mutability_id,
            range: origin,
        }
    }
}

/// Follows solved variables and union-find representatives until
/// `type_variant` is either concrete or an unsolved variable.
///
/// This is the find half of union-find, with path compression through
/// the solution slots.
pub fn flatten_type(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    type_variant: &mut hir::TypeVariant,
) {
    let hir::TypeVariant::Variable { id } = *type_variant else {
        return;
    };
    let data = state.type_variables[id.index()];
    if data.is_solved {
        *type_variant = ctx.arena.hir.types[data.type_id].clone();
        return;
    }
    let representative = state.type_disjoint_set.find(id.index());
    if representative == id.index() {
        return;
    }
    let representative_type_id = state.type_variables[representative].type_id;
    let mut representative_type = ctx.arena.hir.types[representative_type_id].clone();
    flatten_type(ctx, state, &mut representative_type);
    ctx.arena.hir.types[representative_type_id] = representative_type.clone();
    if state.type_variables[representative].is_solved {
        // The member's own slot must show the solution too; every
        // reference to the member points at that slot, and the
        // solved-variable fast path above reads it.
        ctx.arena.hir.types[data.type_id] = representative_type.clone();
        *type_variant = representative_type;
        state.type_variables[id.index()].is_solved = true;
    }
}

/// Records `solution` for the variable at `index`'s equivalence class.
///
/// The representative's arena slot stores the solution. Solving an
/// already-solved class unifies the new solution with the previous one
/// instead of overwriting it.
pub fn set_type_solution(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    index: usize,
    solution: hir::TypeVariant,
) {
    let representative = state.type_disjoint_set.find(index);
    let data = state.type_variables[representative];
    if data.is_solved {
        let previous = ctx.arena.hir.types[data.type_id].clone();
        crate::unify::require_subtype_relationship(ctx, state, data.origin, &solution, &previous);
        return;
    }
    ctx.arena.hir.types[data.type_id] = solution;
    state.type_variables[representative].is_solved = true;
}

/// Records `solution` for a mutability variable's equivalence class.
pub fn set_mutability_solution(
    ctx: &mut Context<'_>,
    state: &mut InferenceState,
    index: usize,
    solution: hir::MutabilityVariant,
) {
    let representative = state.mutability_disjoint_set.find(index);
    let data = state.mutability_variables[representative];
    if data.is_solved {
        // A second solution for the same class must agree; disagreement
        // is reported by the unifier that found it.
        return;
    }
    ctx.arena.hir.mutabilities[data.mutability_id] = solution;
    state.mutability_variables[representative].is_solved = true;
}

/// Closes a resolution unit: defaults every unsolved mutability
/// variable to `immut`, defaults unsolved integral variables to `I32`
/// when configured, and reports every other unsolved type variable.
pub fn ensure_no_unsolved_variables(ctx: &mut Context<'_>, state: &mut InferenceState) {
    for index in 0..state.mutability_variables.len() {
        let representative = state.mutability_disjoint_set.find(index);
        if !state.mutability_variables[representative].is_solved {
            set_mutability_solution(
                ctx,
                state,
                index,
                hir::MutabilityVariant::Concrete(ConcreteMutability::Immut),
            );
        }
    }
    for index in 0..state.type_variables.len() {
        let type_id = state.type_variables[index].type_id;
        let mut variant = ctx.arena.hir.types[type_id].clone();
        flatten_type(ctx, state, &mut variant);
        ctx.arena.hir.types[type_id] = variant;

        let data = state.type_variables[index];
        if data.is_solved {
            continue;
        }
        let representative = state.type_disjoint_set.find(index);
        if state.type_variables[representative].is_solved {
            continue;
        }
        if data.kind == hir::TypeVariableKind::Integral && ctx.db.config.default_integer {
            set_type_solution(ctx, state, index, hir::TypeVariant::Integer(IntegerType::I32));
            continue;
        }
        let message = format!("Unsolved type variable: ?{}", data.variable_id);
        ctx.add_error(data.origin, message);
        set_type_solution(ctx, state, index, hir::TypeVariant::Error);
    }
    // A member solved late (defaulting) may still have a bare variable
    // in its own slot; flatten once more so every slot shows its
    // solution.
    for index in 0..state.type_variables.len() {
        let type_id = state.type_variables[index].type_id;
        let mut variant = ctx.arena.hir.types[type_id].clone();
        flatten_type(ctx, state, &mut variant);
        ctx.arena.hir.types[type_id] = variant;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_set_find_is_idempotent() {
        let mut set = DisjointSet::default();
        for _ in 0..4 {
            set.add();
        }
        set.merge(0, 1);
        set.merge(1, 2);
        let root = set.find(0);
        assert_eq!(set.find(0), root);
        assert_eq!(set.find(1), root);
        assert_eq!(set.find(2), root);
        assert_ne!(set.find(3), root);
    }

    #[test]
    fn disjoint_set_transitive_merge_shares_representative() {
        let mut set = DisjointSet::default();
        for _ in 0..5 {
            set.add();
        }
        set.merge(0, 1);
        set.merge(2, 3);
        set.merge(1, 3);
        assert_eq!(set.find(0), set.find(2));
        assert_eq!(set.find(1), set.find(3));
        assert_ne!(set.find(0), set.find(4));
    }
}
