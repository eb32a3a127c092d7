//! # kieli-desugar
//!
//! Lowers a module's concrete syntax tree to its abstract syntax tree.
//!
//! Desugaring normalizes control flow so the resolver only ever sees a
//! small core language:
//!
//! - `if let P = E { T } else { F }` becomes `match E { P -> T; _ -> F }`
//! - `while let P = E { B }` becomes `loop { match E { P -> B; _ -> break } }`
//! - `while C { B }` becomes `loop { if C { B } else { break } }`
//! - blocks without a result gain a synthetic unit at their `}`
//! - self parameters become ordinary `self: Self` parameters
//! - parameters without a written type inherit the type of the next
//!   parameter to their right
//!
//! Desugaring never aborts. Unsupported constructs (`for` loops) and
//! local mistakes produce an `Error` AST node plus a diagnostic, and
//! the rest of the tree is processed normally.

use kieli_base::Range;
use kieli_compiler::db::{self, Database, DocumentId};
use kieli_compiler::{ast, cst, ConcreteMutability};

mod definition;
mod expression;
mod pattern;
mod types;

pub(crate) struct Context<'a> {
    pub db: &'a mut Database,
    pub doc_id: DocumentId,
    pub cst: &'a cst::Arena,
    pub ast: ast::Arena,
}

impl Context<'_> {
    pub fn push_expression(&mut self, expression: ast::Expression) -> ast::ExpressionId {
        self.ast.expressions.push(expression)
    }

    pub fn push_pattern(&mut self, pattern: ast::Pattern) -> ast::PatternId {
        self.ast.patterns.push(pattern)
    }

    pub fn push_type(&mut self, ty: ast::Type) -> ast::TypeId {
        self.ast.types.push(ty)
    }
}

/// A synthetic `()` value expression.
pub(crate) fn unit_value(range: Range) -> ast::Expression {
    ast::Expression {
        variant: ast::ExpressionVariant::Tuple { fields: Vec::new() },
        range,
    }
}

/// A synthetic `()` type.
pub(crate) fn unit_type(range: Range) -> ast::Type {
    ast::Type {
        variant: ast::TypeVariant::Tuple { fields: Vec::new() },
        range,
    }
}

/// A synthetic `_` pattern.
pub(crate) fn wildcard_pattern(range: Range) -> ast::Pattern {
    ast::Pattern {
        variant: ast::PatternVariant::Wildcard,
        range,
    }
}

/// The implicit `immut` used where no mutability was written.
pub(crate) fn immut_mutability(range: Range) -> ast::Mutability {
    ast::Mutability {
        variant: ast::MutabilityVariant::Concrete(ConcreteMutability::Immut),
        range,
    }
}

pub(crate) fn desugar_opt_mutability(
    mutability: &Option<cst::Mutability>,
    fallback_range: Range,
) -> ast::Mutability {
    match mutability {
        Some(mutability) => types::desugar_mutability(mutability),
        None => immut_mutability(fallback_range),
    }
}

/// Desugar one parsed module. `cst` is the arena the parser produced
/// for the same document; diagnostics land on `doc_id`.
pub fn desugar(
    db: &mut Database,
    doc_id: DocumentId,
    cst: &cst::Arena,
    module: &cst::Module,
) -> (ast::Arena, ast::Module) {
    let mut ctx = Context {
        db,
        doc_id,
        cst,
        ast: ast::Arena::default(),
    };
    let definitions = module
        .definitions
        .iter()
        .map(|definition| definition::desugar_definition(&mut ctx, definition))
        .collect();
    let imports = module
        .imports
        .iter()
        .map(|import| ast::Import {
            segments: import.segments.clone(),
            range: import.range,
        })
        .collect();
    (ctx.ast, ast::Module { imports, definitions })
}

pub(crate) fn add_diagnostic(ctx: &mut Context<'_>, diagnostic: kieli_compiler::lsp::Diagnostic) {
    db::add_diagnostic(ctx.db, ctx.doc_id, diagnostic);
}
