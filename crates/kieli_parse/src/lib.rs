//! # kieli-parse
//!
//! Produces the concrete syntax tree for one module from its token
//! stream.
//!
//! Parsing never aborts: a malformed definition records a diagnostic
//! and the parser recovers at the next definition keyword. When the
//! database configuration enables semantic tokens, the parser also
//! records the lexical highlighting classes (keywords, literals,
//! operators, declaration names) as it goes; the resolver later refines
//! identifier classifications.

use kieli_compiler::cst;
use kieli_compiler::db::{Database, DocumentId};
use kieli_lex::Token;

pub mod definition;
pub mod expression;
pub mod internals;
pub mod path;
pub mod pattern;
pub mod types;

pub use internals::{Context, Parse, ParseFailure};

/// Parse the given token stream into a module, recording diagnostics
/// and semantic tokens on the document identified by `doc_id`.
pub fn parse(db: &mut Database, doc_id: DocumentId, tokens: &[Token]) -> (cst::Arena, cst::Module) {
    let mut ctx = Context::new(db, doc_id, tokens);
    let module = definition::parse_module(&mut ctx);
    (ctx.arena, module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    fn parse_source(text: &str) -> (Database, DocumentId, cst::Arena, cst::Module) {
        let mut database = db::database(Configuration::default());
        let doc_id = db::test_document(&mut database, text.to_string());
        let tokens = kieli_lex::lex(&mut database, doc_id);
        let (arena, module) = parse(&mut database, doc_id, &tokens);
        (database, doc_id, arena, module)
    }

    fn diagnostics(database: &Database, doc_id: DocumentId) -> usize {
        database.documents[doc_id].info.diagnostics.len()
    }

    #[test]
    fn function_with_expression_body() {
        let (database, doc_id, _, module) = parse_source("fn f(x: I32): I32 = x");
        assert_eq!(diagnostics(&database, doc_id), 0);
        assert_eq!(module.definitions.len(), 1);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        assert_eq!(function.signature.parameters.len(), 1);
        assert!(function.signature.return_type.is_some());
    }

    #[test]
    fn function_with_block_body() {
        let (database, doc_id, arena, module) = parse_source("fn f() { 5; }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        let cst::ExpressionVariant::Block(block) = &arena.expressions[function.body].variant else {
            panic!("expected a block body");
        };
        assert_eq!(block.effects.len(), 1);
        assert!(block.result.is_none());
    }

    #[test]
    fn self_parameters() {
        for source in ["fn f(self) = 0", "fn f(&self) = 0", "fn f(&mut self) = 0"] {
            let (database, doc_id, _, module) = parse_source(source);
            assert_eq!(diagnostics(&database, doc_id), 0, "source: {source}");
            let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
                panic!("expected a function");
            };
            assert!(function.signature.self_parameter.is_some(), "source: {source}");
        }
    }

    #[test]
    fn struct_with_fields() {
        let (database, doc_id, _, module) = parse_source("struct S { x: I32, y: Bool }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Structure(structure) = &module.definitions[0].variant else {
            panic!("expected a structure");
        };
        let cst::ConstructorBody::Struct { fields } = &structure.body else {
            panic!("expected a struct body");
        };
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn enum_with_constructors() {
        let (database, doc_id, _, module) =
            parse_source("enum Option = None | Some(I32) | Pair { a: I32, b: I32 }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Enumeration(enumeration) = &module.definitions[0].variant
        else {
            panic!("expected an enumeration");
        };
        assert_eq!(enumeration.constructors.len(), 3);
        assert!(matches!(enumeration.constructors[0].body, cst::ConstructorBody::Unit));
        assert!(matches!(
            enumeration.constructors[1].body,
            cst::ConstructorBody::Tuple { .. }
        ));
        assert!(matches!(
            enumeration.constructors[2].body,
            cst::ConstructorBody::Struct { .. }
        ));
    }

    #[test]
    fn if_let_condition_is_a_let_expression() {
        let (database, doc_id, arena, module) =
            parse_source("fn f() = if let (a, b) = (1, 2) { a } else { 0 }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        let cst::ExpressionVariant::Conditional { condition, false_branch, .. } =
            &arena.expressions[function.body].variant
        else {
            panic!("expected a conditional");
        };
        assert!(false_branch.is_some());
        assert!(matches!(
            arena.expressions[*condition].variant,
            cst::ExpressionVariant::Let { .. }
        ));
    }

    #[test]
    fn while_loop_and_loop() {
        let (database, doc_id, _, _) = parse_source("fn f() { while true { 1 }; loop {}; }");
        assert_eq!(diagnostics(&database, doc_id), 0);
    }

    #[test]
    fn match_arms_parse() {
        let (database, doc_id, arena, module) =
            parse_source("fn f() = match x { 0 -> true; _ -> false }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        let cst::ExpressionVariant::Match { arms, .. } = &arena.expressions[function.body].variant
        else {
            panic!("expected a match");
        };
        assert_eq!(arms.len(), 2);
    }

    #[test]
    fn paths_with_template_arguments() {
        let (database, doc_id, _, _) = parse_source("fn f() = global::x[I32, 5]::y");
        assert_eq!(diagnostics(&database, doc_id), 0);
    }

    #[test]
    fn struct_init_is_suppressed_in_conditions() {
        let (database, doc_id, _, _) = parse_source("fn f() = if x { 1 } else { 2 }");
        assert_eq!(diagnostics(&database, doc_id), 0);
    }

    #[test]
    fn struct_init_parses_in_plain_position() {
        let (database, doc_id, arena, module) = parse_source("fn f() = S { x = 10 }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        assert!(matches!(
            arena.expressions[function.body].variant,
            cst::ExpressionVariant::StructInit { .. }
        ));
    }

    #[test]
    fn postfix_chains() {
        for source in [
            "fn f() = x.y.z",
            "fn f() = x.0.1",
            "fn f() = x.[y].[z]",
            "fn f() = a.b(x, y)",
            "fn f() = f(x)(y)",
        ] {
            let (database, doc_id, _, _) = parse_source(source);
            assert_eq!(diagnostics(&database, doc_id), 0, "source: {source}");
        }
    }

    #[test]
    fn reference_and_dereference() {
        for source in ["fn f() = &x.y", "fn f() = &mut x", "fn f() = *x.y", "fn f() = mv x"] {
            let (database, doc_id, _, _) = parse_source(source);
            assert_eq!(diagnostics(&database, doc_id), 0, "source: {source}");
        }
    }

    #[test]
    fn types_parse() {
        for source in [
            "fn f(x: (I32, (), String)) = 0",
            "fn f(x: [T; 5]) = 0",
            "fn f(x: [std::Vector[I32]]) = 0",
            "fn f(x: fn(I32): U32) = 0",
            "fn f(x: &mut T) = 0",
            "fn f(x: *T) = 0",
            "fn f(x: typeof(5)) = 0",
            "fn f(x: _) = 0",
        ] {
            let (database, doc_id, _, _) = parse_source(source);
            assert_eq!(diagnostics(&database, doc_id), 0, "source: {source}");
        }
    }

    #[test]
    fn patterns_parse() {
        for source in [
            "fn f() = match x { mut y -> y }",
            "fn f() = match x { (a, b) -> a }",
            "fn f() = match x { [a, [b, c]] -> a }",
            "fn f() = match x { Option::Some(a) -> a }",
            "fn f() = match x { ::Some(a) -> a }",
            "fn f() = match x { (_, ___) as y -> y }",
            "fn f() = match x { y if y -> y }",
        ] {
            let (database, doc_id, _, _) = parse_source(source);
            assert_eq!(diagnostics(&database, doc_id), 0, "source: {source}");
        }
    }

    #[test]
    fn malformed_definition_recovers() {
        let (database, doc_id, _, module) = parse_source("fn f( = 5\nfn g() = 1");
        assert!(diagnostics(&database, doc_id) > 0);
        assert_eq!(module.definitions.len(), 1);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        assert_eq!(database.string_pool.get(function.signature.name.id), "g");
    }

    #[test]
    fn imports_parse() {
        let (database, doc_id, _, module) = parse_source("import a.b\nimport c\nfn f() = 0");
        assert_eq!(diagnostics(&database, doc_id), 0);
        assert_eq!(module.imports.len(), 2);
        assert_eq!(module.imports[0].segments.len(), 2);
    }

    #[test]
    fn semantic_tokens_recorded_when_enabled() {
        let mut database = db::database(Configuration::full());
        let doc_id = db::test_document(&mut database, "fn f() = 5".to_string());
        let tokens = kieli_lex::lex(&mut database, doc_id);
        let _ = parse(&mut database, doc_id, &tokens);
        assert!(!database.documents[doc_id].info.semantic_tokens.is_empty());
    }

    #[test]
    fn semantic_tokens_skipped_when_disabled() {
        let (database, doc_id, _, _) = parse_source("fn f() = 5");
        assert!(database.documents[doc_id].info.semantic_tokens.is_empty());
    }

    #[test]
    fn nested_modules_parse() {
        let (database, doc_id, _, module) =
            parse_source("module outer { module inner { fn f() = 0 } }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Submodule(outer) = &module.definitions[0].variant else {
            panic!("expected a submodule");
        };
        assert_eq!(outer.definitions.len(), 1);
    }

    #[test]
    fn impl_block_parses() {
        let (database, doc_id, _, module) =
            parse_source("struct S { x: I32 }\nimpl S { fn get(&self): I32 = 0 }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        assert_eq!(module.definitions.len(), 2);
        assert!(matches!(
            module.definitions[1].variant,
            cst::DefinitionVariant::Impl(_)
        ));
    }

    #[test]
    fn concept_parses() {
        let (database, doc_id, _, module) =
            parse_source("concept Num { fn add(self, other: Self): Self alias Output }");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Concept(concept) = &module.definitions[0].variant else {
            panic!("expected a concept");
        };
        assert_eq!(concept.function_signatures.len(), 1);
        assert_eq!(concept.type_signatures.len(), 1);
    }

    #[test]
    fn infix_operators_are_left_associative() {
        let (database, doc_id, arena, module) = parse_source("fn f() = a * b + c");
        assert_eq!(diagnostics(&database, doc_id), 0);
        let cst::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
            panic!("expected a function");
        };
        let cst::ExpressionVariant::InfixCall { left, op, .. } =
            &arena.expressions[function.body].variant
        else {
            panic!("expected an infix call");
        };
        assert_eq!(database.string_pool.get(op.id), "+");
        assert!(matches!(
            arena.expressions[*left].variant,
            cst::ExpressionVariant::InfixCall { .. }
        ));
    }

    #[test]
    fn ascription_chains() {
        let (database, doc_id, _, _) = parse_source("fn f() = a: B: C");
        assert_eq!(diagnostics(&database, doc_id), 0);
    }
}
