//! End-to-end desugaring tests: lex, parse, desugar, inspect.

use kieli_compiler::db::{self, Configuration, Database, DocumentId};
use kieli_compiler::lsp::Severity;
use kieli_compiler::{ast, ast_display};

fn desugar_source(text: &str) -> (Database, DocumentId, ast::Arena, ast::Module) {
    let mut database = db::database(Configuration::default());
    let doc_id = db::test_document(&mut database, text.to_string());
    let tokens = kieli_lex::lex(&mut database, doc_id);
    let (cst_arena, cst_module) = kieli_parse::parse(&mut database, doc_id, &tokens);
    let (ast_arena, ast_module) = kieli_desugar::desugar(&mut database, doc_id, &cst_arena, &cst_module);
    (database, doc_id, ast_arena, ast_module)
}

fn function_body<'a>(arena: &'a ast::Arena, module: &ast::Module) -> &'a ast::Expression {
    let ast::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
        panic!("expected a function definition");
    };
    &arena.expressions[function.body]
}

#[test]
fn while_true_becomes_loop_with_conditional() {
    let (database, doc_id, arena, module) = desugar_source("fn f() { while true { 1 } }");

    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Use 'loop' instead of 'while true'");
    assert_eq!(diagnostics[0].severity, Severity::Information);

    let ast::ExpressionVariant::Block { effects, .. } = &function_body(&arena, &module).variant
    else {
        panic!("expected a block body");
    };
    let ast::ExpressionVariant::Loop { body, source } = &arena.expressions[effects[0]].variant
    else {
        panic!("expected while to desugar to a loop");
    };
    assert_eq!(*source, ast::LoopSource::WhileLoop);
    let ast::ExpressionVariant::Conditional {
        source,
        has_explicit_false_branch,
        false_branch,
        ..
    } = &arena.expressions[*body].variant
    else {
        panic!("expected the loop body to be a conditional");
    };
    assert_eq!(*source, ast::ConditionalSource::While);
    assert!(has_explicit_false_branch);
    assert!(matches!(
        arena.expressions[*false_branch].variant,
        ast::ExpressionVariant::Break { .. }
    ));
}

#[test]
fn while_false_warns_about_dead_loop() {
    let (database, doc_id, _, _) = desugar_source("fn f() { while false { 1 } }");
    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Loop will never run");
    assert_eq!(diagnostics[0].severity, Severity::Warning);
}

#[test]
fn constant_if_condition_is_reported() {
    let (database, doc_id, _, _) = desugar_source("fn f() = if true { 1 } else { 2 }");
    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Constant condition");
    assert_eq!(diagnostics[0].severity, Severity::Information);
}

#[test]
fn if_let_becomes_match_with_two_arms() {
    let (database, doc_id, arena, module) =
        desugar_source("fn f() = if let (a, b) = (1, 2) { a } else { 0 }");
    assert!(database.documents[doc_id].info.diagnostics.is_empty());

    let ast::ExpressionVariant::Match { scrutinee, arms } = &function_body(&arena, &module).variant
    else {
        panic!("expected if-let to desugar to a match");
    };
    assert_eq!(arms.len(), 2);
    assert!(matches!(
        arena.expressions[*scrutinee].variant,
        ast::ExpressionVariant::Tuple { .. }
    ));
    assert!(matches!(
        arena.patterns[arms[0].pattern].variant,
        ast::PatternVariant::Tuple { .. }
    ));
    assert!(matches!(
        arena.patterns[arms[1].pattern].variant,
        ast::PatternVariant::Wildcard
    ));
}

#[test]
fn while_let_becomes_loop_with_match() {
    let (_, _, arena, module) = desugar_source("fn f() { while let x = y { x } }");
    let ast::ExpressionVariant::Block { effects, .. } = &function_body(&arena, &module).variant
    else {
        panic!("expected a block body");
    };
    let ast::ExpressionVariant::Loop { body, .. } = &arena.expressions[effects[0]].variant else {
        panic!("expected a loop");
    };
    let ast::ExpressionVariant::Match { arms, .. } = &arena.expressions[*body].variant else {
        panic!("expected the loop body to be a match");
    };
    assert_eq!(arms.len(), 2);
    assert!(matches!(
        arena.expressions[arms[1].expression].variant,
        ast::ExpressionVariant::Break { .. }
    ));
}

#[test]
fn for_loops_are_not_supported() {
    let (database, doc_id, arena, module) = desugar_source("fn f() { for x in xs {} }");
    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "For loops are not supported yet");

    let ast::ExpressionVariant::Block { effects, .. } = &function_body(&arena, &module).variant
    else {
        panic!("expected a block body");
    };
    assert!(matches!(
        arena.expressions[effects[0]].variant,
        ast::ExpressionVariant::Error
    ));
}

#[test]
fn block_without_result_gets_synthetic_unit_at_close_brace() {
    let (_, _, arena, module) = desugar_source("fn f() { 5; }");
    let body = function_body(&arena, &module);
    let ast::ExpressionVariant::Block { result, .. } = &body.variant else {
        panic!("expected a block body");
    };
    let result = &arena.expressions[*result];
    assert!(matches!(
        &result.variant,
        ast::ExpressionVariant::Tuple { fields } if fields.is_empty()
    ));
    // The synthetic unit sits on the closing brace.
    assert_eq!(result.range.stop, body.range.stop);
}

#[test]
fn missing_parameter_type_inherits_from_the_right() {
    let (database, doc_id, arena, module) = desugar_source("fn f(a, b: I32): I32 = a");
    assert!(database.documents[doc_id].info.diagnostics.is_empty());
    let ast::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
        panic!("expected a function");
    };
    let parameters = &function.signature.parameters;
    assert_eq!(parameters.len(), 2);
    assert_eq!(parameters[0].parameter_type, parameters[1].parameter_type);
    assert!(matches!(
        arena.types[parameters[0].parameter_type].variant,
        ast::TypeVariant::BuiltIn(kieli_compiler::BuiltInType::Integer(
            kieli_compiler::IntegerType::I32
        ))
    ));
}

#[test]
fn last_parameter_without_type_is_an_error() {
    let (database, doc_id, _, _) = desugar_source("fn f(a: I32, b) = a");
    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0]
        .message
        .contains("must have an explicit type"));
}

#[test]
fn self_parameter_desugars_to_reference_to_self_type() {
    let (database, _, arena, module) = desugar_source("fn f(&mut self): I32 = 0");
    let ast::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
        panic!("expected a function");
    };
    let parameter = &function.signature.parameters[0];
    let ast::PatternVariant::Name { name, .. } = &arena.patterns[parameter.pattern].variant else {
        panic!("expected the self pattern to be a name");
    };
    assert_eq!(database.string_pool.get(name.id), "self");
    let ast::TypeVariant::Reference { mutability, referenced } =
        &arena.types[parameter.parameter_type].variant
    else {
        panic!("expected &mut Self");
    };
    assert!(matches!(
        mutability.variant,
        ast::MutabilityVariant::Concrete(kieli_compiler::ConcreteMutability::Mut)
    ));
    assert!(matches!(
        arena.types[*referenced].variant,
        ast::TypeVariant::SelfType
    ));
}

#[test]
fn missing_return_type_is_unit() {
    let (_, _, arena, module) = desugar_source("fn f() = 5");
    let ast::DefinitionVariant::Function(function) = &module.definitions[0].variant else {
        panic!("expected a function");
    };
    assert!(matches!(
        &arena.types[function.signature.return_type].variant,
        ast::TypeVariant::Tuple { fields } if fields.is_empty()
    ));
}

#[test]
fn duplicate_struct_fields_are_reported_once_with_related_info() {
    let (database, doc_id, _, _) = desugar_source("struct S { x: I32, x: Bool }");
    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "Multiple definitions for field x");
    assert_eq!(diagnostics[0].related_info.len(), 1);
    assert_eq!(diagnostics[0].related_info[0].message, "First defined here");
    // The diagnostic points at the second occurrence, its related info
    // at the first.
    assert!(diagnostics[0].related_info[0].location.range.start < diagnostics[0].range.start);
}

#[test]
fn duplicate_enum_constructors_are_reported() {
    let (database, doc_id, _, _) = desugar_source("enum E = A | B | A");
    let diagnostics = &database.documents[doc_id].info.diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "Multiple definitions for constructor A"
    );
}

#[test]
fn ranges_survive_desugaring() {
    let (_, _, arena, module) = desugar_source("fn f() = if let x = y { x } else { 0 }");
    let body = function_body(&arena, &module);
    // The desugared match covers the whole surface conditional.
    assert_eq!(body.range.start, kieli_base::Position::new(0, 9));
}

#[test]
fn printed_ast_is_stable() {
    let source = "fn f(x: I32): I32 = if x { 1 } else { 2 }";
    let (database, _, arena, module) = desugar_source(source);
    let first = ast_display::module_to_string(&arena, &database.string_pool, &module);

    let (database, _, arena, module) = desugar_source(source);
    let second = ast_display::module_to_string(&arena, &database.string_pool, &module);

    assert_eq!(first, second);
    assert!(first.contains("function f"));
    assert!(first.contains("conditional"));
}

#[test]
fn discard_desugars_to_wildcard_let() {
    let (_, _, arena, module) = desugar_source("fn f() { discard g(); }");
    let ast::ExpressionVariant::Block { effects, .. } = &function_body(&arena, &module).variant
    else {
        panic!("expected a block body");
    };
    let ast::ExpressionVariant::Let { pattern, ascribed_type, .. } =
        &arena.expressions[effects[0]].variant
    else {
        panic!("expected discard to desugar to a let");
    };
    assert!(ascribed_type.is_none());
    assert!(matches!(
        arena.patterns[*pattern].variant,
        ast::PatternVariant::Wildcard
    ));
}
