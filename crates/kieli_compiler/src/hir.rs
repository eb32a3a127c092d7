//! The high-level intermediate representation.
//!
//! The HIR is the resolver's output: every name is resolved to a
//! symbol, every expression and pattern carries a type, and every type
//! is either concrete or an inference variable awaiting unification.
//! Nodes live in the per-document [`Arena`] and reference each other by
//! id; a node's range is the range of the AST node it came from.
//!
//! Definition bodies are resolved on demand. Each definition's info
//! record tracks a [`Resolvable`] state so that re-entrant resolution
//! (a struct whose field type mentions the struct) is detected rather
//! than looping.

use crate::db::EnvironmentId;
use crate::{ast, Boolean, Character, ConcreteMutability, Floating, Integer, IntegerType, Name, StringLiteral};
use kieli_base::{define_id, Range};

define_id!(ExpressionId);
define_id!(PatternId);
define_id!(TypeId);
define_id!(MutabilityId);

define_id!(TypeVariableId);
define_id!(MutabilityVariableId);
define_id!(TemplateParameterTag);
define_id!(LocalVariableId);
define_id!(LocalMutabilityId);
define_id!(LocalTypeId);

define_id!(FunctionId);
define_id!(StructureId);
define_id!(EnumerationId);
define_id!(ConstructorId);
define_id!(FieldId);
define_id!(ConceptId);
define_id!(AliasId);
define_id!(ModuleId);

/// Arena storage for one document's HIR nodes and definition infos.
#[derive(Default)]
pub struct Arena {
    pub expressions: kieli_base::Arena<ExpressionId, Expression>,
    pub patterns: kieli_base::Arena<PatternId, Pattern>,
    pub types: kieli_base::Arena<TypeId, TypeVariant>,
    pub mutabilities: kieli_base::Arena<MutabilityId, MutabilityVariant>,

    pub functions: kieli_base::Arena<FunctionId, FunctionInfo>,
    pub structures: kieli_base::Arena<StructureId, StructureInfo>,
    pub enumerations: kieli_base::Arena<EnumerationId, EnumerationInfo>,
    pub constructors: kieli_base::Arena<ConstructorId, ConstructorInfo>,
    pub fields: kieli_base::Arena<FieldId, FieldInfo>,
    pub concepts: kieli_base::Arena<ConceptId, ConceptInfo>,
    pub aliases: kieli_base::Arena<AliasId, AliasInfo>,
    pub modules: kieli_base::Arena<ModuleId, ModuleInfo>,

    pub local_variables: kieli_base::Arena<LocalVariableId, LocalVariable>,
    pub local_mutabilities: kieli_base::Arena<LocalMutabilityId, LocalMutability>,
    pub local_types: kieli_base::Arena<LocalTypeId, LocalType>,
}

/// A type annotated with the source range it was produced for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Type {
    pub id: TypeId,
    pub range: Range,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TypeVariant {
    Integer(IntegerType),
    Floating,
    Character,
    Boolean,
    String,
    Array {
        element_type: Type,
        /// The length expression; its type unifies with the other
        /// array's length type during unification.
        length: ExpressionId,
    },
    Slice {
        element_type: Type,
    },
    Tuple {
        types: Vec<Type>,
    },
    Reference {
        referenced_type: Type,
        mutability: Mutability,
    },
    Pointer {
        pointee_type: Type,
        mutability: Mutability,
    },
    Function {
        parameter_types: Vec<Type>,
        return_type: Type,
    },
    Structure {
        name: Name,
        id: StructureId,
    },
    Enumeration {
        name: Name,
        id: EnumerationId,
    },
    Parameterized {
        tag: TemplateParameterTag,
    },
    Variable {
        id: TypeVariableId,
    },
    Error,
}

/// A mutability annotated with its source range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Mutability {
    pub id: MutabilityId,
    pub range: Range,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MutabilityVariant {
    Concrete(ConcreteMutability),
    Parameterized { tag: TemplateParameterTag },
    Variable { id: MutabilityVariableId },
    Error,
}

/// Inference variables come in two flavors: general variables unify
/// with anything, integral variables only with integer types.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeVariableKind {
    General,
    Integral,
}

/// Whether an expression denotes a memory location or a fresh value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExpressionKind {
    Place,
    Value,
}

#[derive(Clone, Debug)]
pub struct MatchCase {
    pub pattern: PatternId,
    pub expression: ExpressionId,
}

#[derive(Clone, Debug)]
pub struct Expression {
    pub variant: ExpressionVariant,
    pub type_id: TypeId,
    pub kind: ExpressionKind,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum ExpressionVariant {
    Integer(Integer),
    Floating(Floating),
    Boolean(Boolean),
    Character(Character),
    String(StringLiteral),
    ArrayLiteral {
        elements: Vec<ExpressionId>,
    },
    Tuple {
        fields: Vec<ExpressionId>,
    },
    Loop {
        body: ExpressionId,
    },
    Break {
        result: ExpressionId,
    },
    Continue,
    Block {
        effects: Vec<ExpressionId>,
        result: ExpressionId,
    },
    Conditional {
        condition: ExpressionId,
        true_branch: ExpressionId,
        false_branch: ExpressionId,
    },
    Let {
        pattern: PatternId,
        annotated_type: Type,
        initializer: ExpressionId,
    },
    Match {
        cases: Vec<MatchCase>,
        scrutinee: ExpressionId,
    },
    /// A reference to a local variable binding.
    VariableReference {
        local_id: LocalVariableId,
        name: Name,
    },
    /// A reference to a top-level function.
    FunctionReference {
        id: FunctionId,
        name: Name,
    },
    /// A reference to an enum constructor used as a value.
    ConstructorReference {
        id: ConstructorId,
        name: Name,
    },
    Invocation {
        invocable: ExpressionId,
        arguments: Vec<ExpressionId>,
    },
    Ret {
        expression: ExpressionId,
    },
    Sizeof {
        inspected_type: Type,
    },
    Addressof {
        mutability: Mutability,
        place_expression: ExpressionId,
    },
    Dereference {
        reference_expression: ExpressionId,
    },
    Defer {
        expression: ExpressionId,
    },
    Error,
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub variant: PatternVariant,
    pub type_id: TypeId,
    /// `true` if this pattern alone matches every value of its type.
    pub is_exhaustive: bool,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum PatternVariant {
    Integer(Integer),
    Floating(Floating),
    Boolean(Boolean),
    Character(Character),
    String(StringLiteral),
    Wildcard,
    Name {
        local_id: LocalVariableId,
        name: Name,
        mutability: Mutability,
    },
    Tuple {
        fields: Vec<PatternId>,
    },
    Slice {
        patterns: Vec<PatternId>,
    },
    Constructor {
        constructor_id: ConstructorId,
        payload: Option<PatternId>,
    },
    Guarded {
        guarded_pattern: PatternId,
        guard_expression: ExpressionId,
    },
    Error,
}

/// The resolution state of a definition.
///
/// Entering a definition that is already [`Resolvable::InProgress`]
/// means resolution has come back around to it; the resolver reports a
/// recursive definition and substitutes an error value.
#[derive(Clone, Debug, Default)]
pub enum Resolvable<T> {
    #[default]
    Unresolved,
    InProgress,
    Resolved(T),
}

impl<T> Resolvable<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Resolvable::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, Resolvable::InProgress)
    }
}

#[derive(Clone, Debug)]
pub enum TemplateParameterVariant {
    Type,
    Mutability,
    Value { value_type: Type },
}

#[derive(Clone, Debug)]
pub struct TemplateParameter {
    pub name: Name,
    pub tag: TemplateParameterTag,
    pub variant: TemplateParameterVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub struct FunctionParameter {
    pub pattern: PatternId,
    pub parameter_type: Type,
}

#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub template_parameters: Vec<TemplateParameter>,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: Type,
    /// The function's own `fn(…): R` type.
    pub function_type: Type,
    pub name: Name,
}

/// A top-level function: AST retained for lazy body resolution.
pub struct FunctionInfo {
    pub name: Name,
    pub env_id: EnvironmentId,
    /// The `Self` type for functions defined in an `impl` block.
    pub self_type: Option<Type>,
    pub ast: ast::Function,
    pub signature: Resolvable<FunctionSignature>,
    pub body: Resolvable<ExpressionId>,
}

#[derive(Clone, Debug)]
pub struct Structure {
    pub fields: Vec<FieldId>,
}

pub struct StructureInfo {
    pub name: Name,
    pub env_id: EnvironmentId,
    /// Holds the structure's fields once resolved.
    pub associated_env_id: EnvironmentId,
    /// The canonical `TypeVariant::Structure` node for this type.
    pub type_id: TypeId,
    pub ast: ast::Structure,
    pub structure: Resolvable<Structure>,
}

#[derive(Clone, Debug)]
pub struct Enumeration {
    pub constructors: Vec<ConstructorId>,
}

pub struct EnumerationInfo {
    pub name: Name,
    pub env_id: EnvironmentId,
    /// Holds the enumeration's constructors once resolved.
    pub associated_env_id: EnvironmentId,
    /// The canonical `TypeVariant::Enumeration` node for this type.
    pub type_id: TypeId,
    pub ast: ast::Enumeration,
    pub enumeration: Resolvable<Enumeration>,
}

/// The resolved shape of one enum constructor's payload.
#[derive(Clone, Debug)]
pub enum ConstructorBody {
    Unit,
    Tuple { types: Vec<Type> },
    Struct { fields: Vec<FieldId> },
}

pub struct ConstructorInfo {
    pub name: Name,
    pub enumeration_id: EnumerationId,
    pub body: ConstructorBody,
}

pub struct FieldInfo {
    pub name: Name,
    pub field_type: Type,
    pub range: Range,
}

pub struct ConceptInfo {
    pub name: Name,
    pub env_id: EnvironmentId,
    pub ast: ast::Concept,
    pub resolved: Resolvable<()>,
}

#[derive(Clone, Debug)]
pub struct Alias {
    pub name: Name,
    pub aliased_type: Type,
}

pub struct AliasInfo {
    pub name: Name,
    pub env_id: EnvironmentId,
    pub ast: ast::Alias,
    pub alias: Resolvable<Alias>,
}

pub struct ModuleInfo {
    pub name: Name,
    /// The environment holding the module's own definitions.
    pub mod_env_id: EnvironmentId,
}

/// A local variable binding introduced by a name pattern.
pub struct LocalVariable {
    pub name: Name,
    pub type_id: TypeId,
    pub mutability_id: MutabilityId,
}

/// A local mutability binding introduced by a template parameter.
pub struct LocalMutability {
    pub name: Name,
    pub mutability_id: MutabilityId,
}

/// A local type binding introduced by `alias` expressions or template
/// parameters.
pub struct LocalType {
    pub name: Name,
    pub type_id: TypeId,
}
