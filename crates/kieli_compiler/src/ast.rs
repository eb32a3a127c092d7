//! The abstract syntax tree.
//!
//! The AST is the desugarer's output: control flow is normalized
//! (`while`/`if let` and friends are gone), synthetic units and
//! wildcards are inserted, self parameters are ordinary parameters,
//! and every node carries a plain source [`Range`] — no token
//! bookkeeping survives desugaring.

use crate::{Boolean, BuiltInType, Character, ConcreteMutability, Floating, Integer, Name, StringLiteral};
use kieli_base::{define_id, Range};

define_id!(ExpressionId);
define_id!(PatternId);
define_id!(TypeId);

/// Arena storage for one module's AST.
#[derive(Default)]
pub struct Arena {
    pub expressions: kieli_base::Arena<ExpressionId, Expression>,
    pub patterns: kieli_base::Arena<PatternId, Pattern>,
    pub types: kieli_base::Arena<TypeId, Type>,
}

#[derive(Clone, Debug)]
pub struct Mutability {
    pub variant: MutabilityVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum MutabilityVariant {
    Concrete(ConcreteMutability),
    Parameterized { name: Name },
}

#[derive(Clone, Debug)]
pub enum PathRoot {
    Implicit,
    Global,
    Type(TypeId),
}

#[derive(Clone, Debug)]
pub enum TemplateArgument {
    Type(TypeId),
    Expression(ExpressionId),
    Mutability(Mutability),
    Wildcard { range: Range },
}

#[derive(Clone, Debug)]
pub struct PathSegment {
    pub name: Name,
    pub template_arguments: Option<Vec<TemplateArgument>>,
}

#[derive(Clone, Debug)]
pub struct Path {
    pub root: PathRoot,
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn head(&self) -> &PathSegment {
        self.segments.last().expect("a path has at least one segment")
    }

    /// `true` for a bare single-segment path with no root qualifier and
    /// no template arguments — the only form that can name a local.
    pub fn is_unqualified(&self) -> bool {
        matches!(self.root, PathRoot::Implicit)
            && self.segments.len() == 1
            && self.segments[0].template_arguments.is_none()
    }
}

/// Which surface syntax a desugared conditional came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConditionalSource {
    If,
    While,
}

/// Which surface syntax a desugared loop came from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoopSource {
    PlainLoop,
    WhileLoop,
}

#[derive(Clone, Debug)]
pub struct MatchArm {
    pub pattern: PatternId,
    pub expression: ExpressionId,
}

#[derive(Clone, Debug)]
pub struct FunctionArgument {
    pub name: Option<Name>,
    pub expression: ExpressionId,
}

#[derive(Clone, Debug)]
pub struct FieldInit {
    pub name: Name,
    pub expression: ExpressionId,
}

#[derive(Clone, Debug)]
pub struct Expression {
    pub variant: ExpressionVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum ExpressionVariant {
    Integer(Integer),
    Floating(Floating),
    Boolean(Boolean),
    Character(Character),
    String(StringLiteral),
    Path(Path),
    Wildcard,
    Array {
        elements: Vec<ExpressionId>,
    },
    Tuple {
        fields: Vec<ExpressionId>,
    },
    Conditional {
        condition: ExpressionId,
        true_branch: ExpressionId,
        false_branch: ExpressionId,
        source: ConditionalSource,
        has_explicit_false_branch: bool,
    },
    Match {
        scrutinee: ExpressionId,
        arms: Vec<MatchArm>,
    },
    Block {
        effects: Vec<ExpressionId>,
        result: ExpressionId,
    },
    Loop {
        body: ExpressionId,
        source: LoopSource,
    },
    Break {
        result: ExpressionId,
    },
    Continue,
    FunctionCall {
        invocable: ExpressionId,
        arguments: Vec<FunctionArgument>,
    },
    StructInit {
        path: Path,
        fields: Vec<FieldInit>,
    },
    InfixCall {
        left: ExpressionId,
        right: ExpressionId,
        op: Name,
    },
    StructField {
        base: ExpressionId,
        name: Name,
    },
    TupleField {
        base: ExpressionId,
        index: u32,
        index_range: Range,
    },
    ArrayIndex {
        base: ExpressionId,
        index: ExpressionId,
    },
    MethodCall {
        expression: ExpressionId,
        name: Name,
        arguments: Vec<FunctionArgument>,
    },
    Ascription {
        expression: ExpressionId,
        ascribed_type: TypeId,
    },
    Let {
        pattern: PatternId,
        ascribed_type: Option<TypeId>,
        initializer: ExpressionId,
    },
    TypeAlias {
        name: Name,
        aliased_type: TypeId,
    },
    Ret {
        expression: ExpressionId,
    },
    Sizeof {
        inspected_type: TypeId,
    },
    Addressof {
        mutability: Mutability,
        expression: ExpressionId,
    },
    Deref {
        expression: ExpressionId,
    },
    Move {
        expression: ExpressionId,
    },
    Defer {
        expression: ExpressionId,
    },
    Error,
}

#[derive(Clone, Debug)]
pub struct FieldPattern {
    pub name: Name,
    pub pattern: Option<PatternId>,
}

#[derive(Clone, Debug)]
pub enum ConstructorPatternBody {
    Tuple { fields: Vec<PatternId> },
    Struct { fields: Vec<FieldPattern> },
    Unit,
}

#[derive(Clone, Debug)]
pub struct Pattern {
    pub variant: PatternVariant,
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
        mutability: Mutability,
        name: Name,
    },
    Tuple {
        fields: Vec<PatternId>,
    },
    Slice {
        patterns: Vec<PatternId>,
    },
    Constructor {
        path: Path,
        body: ConstructorPatternBody,
    },
    AbbreviatedConstructor {
        name: Name,
        body: ConstructorPatternBody,
    },
    Alias {
        pattern: PatternId,
        mutability: Mutability,
        name: Name,
    },
    Guarded {
        pattern: PatternId,
        guard: ExpressionId,
    },
}

#[derive(Clone, Debug)]
pub struct Type {
    pub variant: TypeVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum TypeVariant {
    BuiltIn(BuiltInType),
    Path(Path),
    Tuple {
        fields: Vec<TypeId>,
    },
    Slice {
        element: TypeId,
    },
    Array {
        element: TypeId,
        length: ExpressionId,
    },
    Function {
        parameters: Vec<TypeId>,
        return_type: TypeId,
    },
    Typeof {
        expression: ExpressionId,
    },
    Reference {
        mutability: Mutability,
        referenced: TypeId,
    },
    Pointer {
        mutability: Mutability,
        pointee: TypeId,
    },
    Wildcard,
    SelfType,
    ImplConcepts {
        concepts: Vec<Path>,
    },
    Error,
}

#[derive(Clone, Debug)]
pub enum TemplateParameterVariant {
    Type { name: Name, concepts: Vec<Path> },
    Value { name: Name, value_type: TypeId },
    Mutability { name: Name },
}

#[derive(Clone, Debug)]
pub struct TemplateParameter {
    pub variant: TemplateParameterVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub struct FunctionParameter {
    pub pattern: PatternId,
    pub parameter_type: TypeId,
    pub default_argument: Option<ExpressionId>,
}

#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub name: Name,
    pub template_parameters: Vec<TemplateParameter>,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: TypeId,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub signature: FunctionSignature,
    pub body: ExpressionId,
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: Name,
    pub field_type: TypeId,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum ConstructorBody {
    Struct { fields: Vec<Field> },
    Tuple { types: Vec<TypeId> },
    Unit,
}

#[derive(Clone, Debug)]
pub struct Constructor {
    pub name: Name,
    pub body: ConstructorBody,
}

#[derive(Clone, Debug)]
pub struct Structure {
    pub name: Name,
    pub template_parameters: Vec<TemplateParameter>,
    pub body: ConstructorBody,
}

#[derive(Clone, Debug)]
pub struct Enumeration {
    pub name: Name,
    pub template_parameters: Vec<TemplateParameter>,
    pub constructors: Vec<Constructor>,
}

#[derive(Clone, Debug)]
pub struct Alias {
    pub name: Name,
    pub template_parameters: Vec<TemplateParameter>,
    pub aliased_type: TypeId,
}

#[derive(Clone, Debug)]
pub struct TypeSignature {
    pub name: Name,
    pub concepts: Vec<Path>,
}

#[derive(Clone, Debug)]
pub struct Concept {
    pub name: Name,
    pub template_parameters: Vec<TemplateParameter>,
    pub function_signatures: Vec<FunctionSignature>,
    pub type_signatures: Vec<TypeSignature>,
}

#[derive(Clone, Debug)]
pub struct Impl {
    pub template_parameters: Vec<TemplateParameter>,
    pub self_type: TypeId,
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug)]
pub struct Submodule {
    pub name: Name,
    pub template_parameters: Vec<TemplateParameter>,
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug)]
pub enum DefinitionVariant {
    Function(Function),
    Structure(Structure),
    Enumeration(Enumeration),
    Alias(Alias),
    Concept(Concept),
    Impl(Impl),
    Submodule(Submodule),
}

#[derive(Clone, Debug)]
pub struct Definition {
    pub variant: DefinitionVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub struct Import {
    pub segments: Vec<Name>,
    pub range: Range,
}

/// The desugar result for one source document.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub imports: Vec<Import>,
    pub definitions: Vec<Definition>,
}
