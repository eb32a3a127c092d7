//! The concrete syntax tree.
//!
//! The CST is the parser's output: one tree per module, nodes stored in
//! a per-document [`Arena`] and addressed by typed ids. Unlike the AST
//! it still remembers the token ranges that later phases need for
//! precise diagnostics and synthetic-node placement (a block's closing
//! brace, a `for` keyword, a self parameter's keyword).

use crate::{Boolean, BuiltInType, Character, Floating, Integer, Name, StringLiteral};
use kieli_base::{define_id, Range};

define_id!(ExpressionId);
define_id!(PatternId);
define_id!(TypeId);

/// Arena storage for one module's CST.
#[derive(Default)]
pub struct Arena {
    pub expressions: kieli_base::Arena<ExpressionId, Expression>,
    pub patterns: kieli_base::Arena<PatternId, Pattern>,
    pub types: kieli_base::Arena<TypeId, Type>,
}

/// A mutability qualifier as written: `mut`, `immut`, or `mut?m`.
#[derive(Clone, Debug)]
pub struct Mutability {
    pub variant: MutabilityVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum MutabilityVariant {
    Mut,
    Immut,
    /// A template mutability parameter reference: `mut?name`.
    Parameterized { name: Name },
}

/// Where a path starts looking.
#[derive(Clone, Debug)]
pub enum PathRoot {
    /// Start from the nearest scope and walk outward.
    Implicit,
    /// `global::` — start from the document root environment.
    Global { range: Range },
    /// `T::` — start from the type's associated environment.
    Type(TypeId),
}

#[derive(Clone, Debug)]
pub struct TemplateArguments {
    pub arguments: Vec<TemplateArgument>,
    pub range: Range,
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
    pub template_arguments: Option<TemplateArguments>,
}

/// A possibly qualified name: `root :: seg_1 :: … :: seg_n`.
#[derive(Clone, Debug)]
pub struct Path {
    pub root: PathRoot,
    pub segments: Vec<PathSegment>,
}

impl Path {
    /// The final segment, which names the entity the path denotes.
    pub fn head(&self) -> &PathSegment {
        self.segments.last().expect("a path has at least one segment")
    }

    pub fn range(&self) -> Range {
        let head = self.head().name.range;
        match &self.root {
            PathRoot::Global { range } => range.merge(head),
            _ => match self.segments.first() {
                Some(first) => first.name.range.merge(head),
                None => head,
            },
        }
    }
}

/// An expression statement inside a block, with its trailing semicolon.
#[derive(Clone, Debug)]
pub struct BlockEffect {
    pub expression: ExpressionId,
    pub semicolon: Range,
}

#[derive(Clone, Debug)]
pub struct Block {
    pub effects: Vec<BlockEffect>,
    pub result: Option<ExpressionId>,
    pub open_brace: Range,
    pub close_brace: Range,
}

#[derive(Clone, Debug)]
pub struct MatchArm {
    pub pattern: PatternId,
    pub handler: ExpressionId,
}

/// A function call argument, optionally labeled `name = expression`.
#[derive(Clone, Debug)]
pub struct FunctionArgument {
    pub name: Option<Name>,
    pub expression: ExpressionId,
}

/// A struct initializer field: `name = expression`.
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
    Paren {
        expression: ExpressionId,
    },
    Tuple {
        fields: Vec<ExpressionId>,
    },
    Array {
        elements: Vec<ExpressionId>,
    },
    Block(Block),
    Conditional {
        if_token: Range,
        condition: ExpressionId,
        true_branch: ExpressionId,
        false_branch: Option<ExpressionId>,
    },
    Match {
        scrutinee: ExpressionId,
        arms: Vec<MatchArm>,
    },
    WhileLoop {
        while_token: Range,
        condition: ExpressionId,
        body: ExpressionId,
    },
    Loop {
        body: ExpressionId,
    },
    ForLoop {
        for_token: Range,
        pattern: PatternId,
        iterable: ExpressionId,
        body: ExpressionId,
    },
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
        expression: Option<ExpressionId>,
    },
    Discard {
        expression: ExpressionId,
    },
    Break {
        expression: Option<ExpressionId>,
    },
    Continue,
    Sizeof {
        inspected_type: TypeId,
    },
    Addressof {
        ampersand: Range,
        mutability: Option<Mutability>,
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
        mutability: Option<Mutability>,
        name: Name,
    },
    Paren {
        pattern: PatternId,
    },
    Tuple {
        fields: Vec<PatternId>,
    },
    Slice {
        patterns: Vec<PatternId>,
    },
    Constructor {
        path: Path,
        body: Option<ConstructorPatternBody>,
    },
    /// `::Ctor` — the enum is inferred from the matched type.
    AbbreviatedConstructor {
        name: Name,
        body: Option<ConstructorPatternBody>,
    },
    Alias {
        pattern: PatternId,
        mutability: Option<Mutability>,
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
    Paren {
        inner: TypeId,
    },
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
        mutability: Option<Mutability>,
        referenced: TypeId,
    },
    Pointer {
        mutability: Option<Mutability>,
        pointee: TypeId,
    },
    Wildcard,
    SelfType,
    /// `impl Concept + Concept` — a concept-constrained opaque type.
    ImplConcepts {
        concepts: Vec<Path>,
    },
    Error,
}

#[derive(Clone, Debug)]
pub struct TemplateParameters {
    pub parameters: Vec<TemplateParameter>,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub struct TemplateParameter {
    pub variant: TemplateParameterVariant,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub enum TemplateParameterVariant {
    /// `Name` or `Name: Concept + Concept`.
    Type { name: Name, concepts: Vec<Path> },
    /// `name: Type`.
    Value { name: Name, value_type: TypeId },
    /// `name: mut`.
    Mutability { name: Name },
}

/// `self`, `&self`, or `&mut self`.
#[derive(Clone, Debug)]
pub struct SelfParameter {
    pub is_reference: bool,
    pub mutability: Option<Mutability>,
    pub range: Range,
}

#[derive(Clone, Debug)]
pub struct FunctionParameter {
    pub pattern: PatternId,
    pub parameter_type: Option<TypeId>,
    pub default_argument: Option<ExpressionId>,
}

#[derive(Clone, Debug)]
pub struct FunctionSignature {
    pub name: Name,
    pub template_parameters: Option<TemplateParameters>,
    pub self_parameter: Option<SelfParameter>,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: Option<TypeId>,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub signature: FunctionSignature,
    pub body: ExpressionId,
    pub fn_token: Range,
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
    pub template_parameters: Option<TemplateParameters>,
    pub body: ConstructorBody,
}

#[derive(Clone, Debug)]
pub struct Enumeration {
    pub name: Name,
    pub template_parameters: Option<TemplateParameters>,
    pub constructors: Vec<Constructor>,
}

#[derive(Clone, Debug)]
pub struct Alias {
    pub name: Name,
    pub template_parameters: Option<TemplateParameters>,
    pub aliased_type: TypeId,
}

/// An associated type requirement inside a concept: `alias Name[: C]`.
#[derive(Clone, Debug)]
pub struct TypeSignature {
    pub name: Name,
    pub concepts: Vec<Path>,
}

#[derive(Clone, Debug)]
pub struct Concept {
    pub name: Name,
    pub template_parameters: Option<TemplateParameters>,
    pub function_signatures: Vec<FunctionSignature>,
    pub type_signatures: Vec<TypeSignature>,
}

#[derive(Clone, Debug)]
pub struct Impl {
    pub template_parameters: Option<TemplateParameters>,
    pub self_type: TypeId,
    pub definitions: Vec<Definition>,
}

#[derive(Clone, Debug)]
pub struct Submodule {
    pub name: Name,
    pub template_parameters: Option<TemplateParameters>,
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

/// `import a.b.c` — brings the named module document into scope.
#[derive(Clone, Debug)]
pub struct Import {
    pub segments: Vec<Name>,
    pub range: Range,
}

/// The parse result for one source document.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub imports: Vec<Import>,
    pub definitions: Vec<Definition>,
}
