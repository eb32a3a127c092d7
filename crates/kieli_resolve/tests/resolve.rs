//! End-to-end resolution tests: the full pipeline from source text to
//! type-checked HIR and collected document info.

use kieli_base::{Position, Range};
use kieli_compiler::db::{self, Configuration, Database, DocumentId};
use kieli_compiler::lsp::Severity;
use kieli_compiler::{hir, hir_display};
use kieli_resolve::context::{ensure_no_unsolved_variables, flatten_type, InferenceState};
use kieli_resolve::unify;
use kieli_resolve::Context;

fn analyze(text: &str) -> (Database, DocumentId) {
    let mut database = db::database(Configuration::default());
    let doc_id = db::test_document(&mut database, text.to_string());
    kieli_resolve::analyze_document(&mut database, doc_id);
    (database, doc_id)
}

fn diagnostics(database: &Database, doc_id: DocumentId) -> Vec<String> {
    database.documents[doc_id]
        .info
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.message.clone())
        .collect()
}

fn errors(database: &Database, doc_id: DocumentId) -> Vec<String> {
    database.documents[doc_id]
        .info
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Error)
        .map(|diagnostic| diagnostic.message.clone())
        .collect()
}

/// The resolved body of the function named `name`.
fn function_body(database: &Database, doc_id: DocumentId, name: &str) -> hir::ExpressionId {
    let arena = &database.documents[doc_id].arena;
    let (_, info) = arena
        .hir
        .functions
        .iter()
        .find(|(_, info)| database.string_pool.get(info.name.id) == name)
        .expect("no such function");
    match info.body.resolved() {
        Some(&body) => body,
        None => panic!("the body of '{name}' is not resolved"),
    }
}

fn body_type(database: &Database, doc_id: DocumentId, name: &str) -> String {
    let arena = &database.documents[doc_id].arena;
    let body = function_body(database, doc_id, name);
    hir_display::type_to_string(
        &arena.hir,
        &database.string_pool,
        arena.hir.expressions[body].type_id,
    )
}

#[test]
fn identity_function_resolves_without_diagnostics() {
    let (database, doc_id) = analyze("fn f(x: I32): I32 = x");
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());

    let arena = &database.documents[doc_id].arena;
    let body = function_body(&database, doc_id, "f");
    let body = &arena.hir.expressions[body];
    assert!(matches!(
        body.variant,
        hir::ExpressionVariant::VariableReference { .. }
    ));
    assert_eq!(body_type(&database, doc_id, "f"), "I32");

    let printed = hir_display::expression_to_string(
        &arena.hir,
        &database.string_pool,
        function_body(&database, doc_id, "f"),
    );
    assert_eq!(printed, "variable x: I32\n");
}

#[test]
fn while_true_produces_exactly_one_informational_diagnostic() {
    let (database, doc_id) = analyze("fn f() { while true { 1 } }");
    let all = &database.documents[doc_id].info.diagnostics;
    assert_eq!(all.len(), 1, "diagnostics: {all:?}");
    assert_eq!(all[0].message, "Use 'loop' instead of 'while true'");
    assert_eq!(all[0].severity, Severity::Information);
}

#[test]
fn if_let_resolves_to_defaulted_integer() {
    let (database, doc_id) = analyze("fn f(): I32 = if let (a, _b) = (1, 2) { a } else { 0 }");
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "I32");

    let arena = &database.documents[doc_id].arena;
    let body = function_body(&database, doc_id, "f");
    let hir::ExpressionVariant::Match { cases, .. } = &arena.hir.expressions[body].variant else {
        panic!("expected the desugared conditional to be a match");
    };
    assert_eq!(cases.len(), 2);
}

#[test]
fn undeclared_identifier_is_one_error_and_signature_still_resolves() {
    let (database, doc_id) = analyze("fn f() = g()");
    assert_eq!(
        errors(&database, doc_id),
        vec!["Undeclared identifier: 'g'".to_string()]
    );

    let arena = &database.documents[doc_id].arena;
    let body = function_body(&database, doc_id, "f");
    assert!(matches!(
        arena.hir.expressions[body].variant,
        hir::ExpressionVariant::Error
    ));
    let (_, info) = arena.hir.functions.iter().next().unwrap();
    let signature = info.signature.resolved().expect("signature must resolve");
    assert_eq!(
        hir_display::type_to_string(&arena.hir, &database.string_pool, signature.return_type.id),
        "()"
    );
}

#[test]
fn function_calls_infer_argument_and_return_types() {
    let source = "fn g(x: I32): Bool = true\nfn f(): Bool = g(5)";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "Bool");
}

#[test]
fn call_with_wrong_argument_type_reports_unification_failure() {
    let source = "fn g(x: Bool): Bool = x\nfn f(): Bool = g(\"hello\")";
    let (database, doc_id) = analyze(source);
    let errors = errors(&database, doc_id);
    assert_eq!(errors.len(), 1, "errors: {errors:?}");
    assert!(errors[0].starts_with("Could not unify"), "{}", errors[0]);
}

#[test]
fn module_paths_resolve_through_nested_environments() {
    let source = "module m { fn g(): I32 = 5 }\nfn f(): I32 = m::g()";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "I32");
}

#[test]
fn global_paths_start_at_the_document_root() {
    let source = "fn g(): I32 = 5\nmodule m { fn f(): I32 = global::g() }";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn missing_member_reports_the_environment_name() {
    let source = "module m { fn g() = () }\nfn f() = m::h()";
    let (database, doc_id) = analyze(source);
    assert_eq!(
        errors(&database, doc_id),
        vec!["Module 'm' does not contain 'h'".to_string()]
    );
}

#[test]
fn non_module_path_prefix_is_reported() {
    let source = "fn g() = ()\nfn f() = g::h";
    let (database, doc_id) = analyze(source);
    assert_eq!(
        errors(&database, doc_id),
        vec!["Expected a module, but 'g' is a function".to_string()]
    );
}

#[test]
fn module_as_expression_is_reported() {
    let source = "module m { }\nfn f() = m";
    let (database, doc_id) = analyze(source);
    assert_eq!(
        errors(&database, doc_id),
        vec!["Expected an expression, but 'm' is a module".to_string()]
    );
}

#[test]
fn duplicate_definitions_keep_the_first() {
    let source = "fn f(): I32 = 5\nfn f(): Bool = true\nfn g(): I32 = f()";
    let (database, doc_id) = analyze(source);
    let errors = errors(&database, doc_id);
    assert_eq!(
        errors,
        vec!["Duplicate definitions of 'f' in the same module".to_string()]
    );
    // `g` sees the first `f`, which returns I32.
    assert_eq!(body_type(&database, doc_id, "g"), "I32");
}

#[test]
fn enum_constructors_resolve_in_patterns_and_calls() {
    let source = "enum Option = None | Some(I32)\n\
                  fn f(o: Option): I32 = match o { Option::Some(x) -> x; Option::None -> 0 }\n\
                  fn g(): Option = Option::Some(5)";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "I32");
    assert_eq!(body_type(&database, doc_id, "g"), "Option");
}

#[test]
fn abbreviated_constructor_pattern_uses_the_matched_type() {
    let source = "enum Option = None | Some(I32)\n\
                  fn f(o: Option): I32 = match o { ::Some(x) -> x; ::None -> 0 }";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn missing_constructor_is_reported_against_the_enum() {
    let source = "enum E = A\nfn f(e: E): I32 = match e { ::B -> 0 }";
    let (database, doc_id) = analyze(source);
    let errors = errors(&database, doc_id);
    assert_eq!(errors, vec!["E does not have a constructor 'B'".to_string()]);
}

#[test]
fn impl_functions_live_in_the_associated_environment() {
    let source = "struct S { x: I32 }\n\
                  impl S { fn make(): I32 = 5 }\n\
                  fn f(): I32 = S::make()";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "I32");
}

#[test]
fn self_type_resolves_inside_impl_blocks() {
    let source = "struct S { x: I32 }\nimpl S { fn id(&self): &Self = self }";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn self_type_outside_impl_is_an_error() {
    let (database, doc_id) = analyze("fn f(x: Self) = ()");
    let errors = errors(&database, doc_id);
    assert_eq!(
        errors,
        vec!["The Self type is only accessible within 'impl' blocks".to_string()]
    );
}

#[test]
fn recursive_alias_is_reported() {
    let (database, doc_id) = analyze("alias A = A");
    let errors = errors(&database, doc_id);
    assert_eq!(errors, vec!["Recursive definition: 'A'".to_string()]);
}

#[test]
fn self_recursive_functions_are_fine() {
    let (database, doc_id) = analyze("fn f(x: I32): I32 = f(x)");
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn unused_local_variable_warns_with_code_action() {
    let mut database = db::database(Configuration::full());
    let doc_id = db::test_document(&mut database, "fn f() { let x = 5; }".to_string());
    kieli_resolve::analyze_document(&mut database, doc_id);

    let info = &database.documents[doc_id].info;
    let warnings: Vec<_> = info
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.severity == Severity::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Unused local variable: 'x'");
    assert!(!info.actions.is_empty());
}

#[test]
fn underscore_prefix_silences_unused_warning() {
    let (database, doc_id) = analyze("fn f() { let _x = 5; }");
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn block_effects_must_be_unit() {
    let (database, doc_id) = analyze("fn f() { 5; }");
    let errors = errors(&database, doc_id);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Could not unify"));
}

#[test]
fn address_of_a_value_is_an_error() {
    let (database, doc_id) = analyze("fn f() = &5");
    let errors = errors(&database, doc_id);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("does not identify a place in memory"));
}

#[test]
fn address_of_a_variable_builds_a_reference() {
    let source = "fn f(x: I32): &I32 = &x";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "&I32");
}

#[test]
fn dereference_produces_a_place() {
    let source = "fn f(x: &mut I32): I32 = *x";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "I32");
}

#[test]
fn mutable_reference_coerces_to_shared() {
    let source = "fn f(x: &mut I32): &I32 = x";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn shared_reference_does_not_coerce_to_mutable() {
    let source = "fn f(x: &I32): &mut I32 = x";
    let (database, doc_id) = analyze(source);
    let errors = errors(&database, doc_id);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Could not unify"));
}

#[test]
fn sizeof_defaults_to_an_integer() {
    let (database, doc_id) = analyze("fn f(): I64 = sizeof((I32, Bool)): I64");
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn typeof_types_borrow_the_expression_type() {
    let source = "fn f(x: I32): typeof(0) = x";
    let (database, doc_id) = analyze(source);
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
}

#[test]
fn type_ascription_constrains_the_expression() {
    let (database, doc_id) = analyze("fn f(): I64 = 5: I64");
    assert_eq!(diagnostics(&database, doc_id), Vec::<String>::new());
    assert_eq!(body_type(&database, doc_id, "f"), "I64");
}

#[test]
fn template_argument_resolution_is_a_documented_hole() {
    let source = "fn g(): I32 = 5\nfn f(): I32 = g[I32]()";
    let (database, doc_id) = analyze(source);
    let errors = errors(&database, doc_id);
    assert_eq!(
        errors,
        vec!["Template argument resolution has not been implemented".to_string()]
    );
}

#[test]
fn hir_ranges_match_ast_ranges() {
    let source = "fn f(x: I32): I32 = x";
    let (database, doc_id) = analyze(source);
    let arena = &database.documents[doc_id].arena;
    let body = function_body(&database, doc_id, "f");
    let body = &arena.hir.expressions[body];
    // The body expression is the final `x`.
    assert_eq!(
        body.range,
        Range::new(Position::new(0, 20), Position::new(0, 21))
    );
    for reference in &database.documents[doc_id].info.references {
        assert!(reference.reference.range.stop.line == 0);
        assert!(reference.reference.range.stop.column <= source.len() as u32);
    }
}

// ---------------------------------------------------------------------
// Direct unifier properties

fn with_context(run: impl FnOnce(&mut Context<'_>, &mut InferenceState)) {
    let mut database = db::database(Configuration::default());
    let doc_id = db::test_document(&mut database, String::new());
    let arena = db::DocumentArena::default();
    let mut ctx = Context::new(&mut database, doc_id, arena);
    let mut state = InferenceState::new();
    run(&mut ctx, &mut state);
}

fn flattened(ctx: &mut Context<'_>, state: &mut InferenceState, ty: hir::Type) -> hir::TypeVariant {
    let mut variant = ctx.arena.hir.types[ty.id].clone();
    flatten_type(ctx, state, &mut variant);
    ctx.arena.hir.types[ty.id] = variant.clone();
    variant
}

#[test]
fn transitively_unified_variables_share_a_solution() {
    with_context(|ctx, state| {
        let range = Range::default();
        let a = ctx.fresh_general_type_variable(state, range);
        let b = ctx.fresh_general_type_variable(state, range);
        let c = ctx.fresh_general_type_variable(state, range);

        let boolean_type = ctx.constants.boolean_type;
        unify::require_subtype(ctx, state, range, a.id, b.id);
        unify::require_subtype(ctx, state, range, b.id, c.id);
        unify::require_subtype(ctx, state, range, c.id, boolean_type);

        for ty in [a, b, c] {
            assert_eq!(flattened(ctx, state, ty), hir::TypeVariant::Boolean);
        }
        assert!(ctx.db.documents[ctx.doc_id].info.diagnostics.is_empty());
    });
}

#[test]
fn non_representative_members_expose_the_class_solution() {
    with_context(|ctx, state| {
        let range = Range::default();
        let a = ctx.fresh_general_type_variable(state, range);
        let b = ctx.fresh_general_type_variable(state, range);
        let boolean_type = ctx.constants.boolean_type;

        // `a` joins `b`'s class and becomes the non-representative
        // member; the representative solves afterwards.
        unify::require_subtype(ctx, state, range, a.id, b.id);
        unify::require_subtype(ctx, state, range, b.id, boolean_type);

        // Flattening the member must write the solution into the
        // member's own slot, not just the local copy: everything that
        // captured `a`'s type points at that slot.
        let mut variant = ctx.arena.hir.types[a.id].clone();
        flatten_type(ctx, state, &mut variant);
        assert_eq!(variant, hir::TypeVariant::Boolean);
        assert_eq!(ctx.arena.hir.types[a.id].clone(), hir::TypeVariant::Boolean);

        ensure_no_unsolved_variables(ctx, state);
        assert!(ctx.db.documents[ctx.doc_id].info.diagnostics.is_empty());
        assert_eq!(ctx.arena.hir.types[a.id].clone(), hir::TypeVariant::Boolean);
        assert_eq!(ctx.arena.hir.types[b.id].clone(), hir::TypeVariant::Boolean);
    });
}

#[test]
fn occurs_check_reports_recursive_solutions() {
    with_context(|ctx, state| {
        let range = Range::default();
        let alpha = ctx.fresh_general_type_variable(state, range);
        let tuple = ctx.arena.hir.types.push(hir::TypeVariant::Tuple {
            types: vec![alpha],
        });

        unify::require_subtype(ctx, state, range, alpha.id, tuple);

        let messages: Vec<_> = ctx.db.documents[ctx.doc_id]
            .info
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.message.clone())
            .collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Recursive type variable solution"));
        assert_eq!(flattened(ctx, state, alpha), hir::TypeVariant::Error);
    });
}

#[test]
fn integral_variables_reject_non_integer_solutions() {
    with_context(|ctx, state| {
        let range = Range::default();
        let n = ctx.fresh_integral_type_variable(state, range);
        let boolean_type = ctx.constants.boolean_type;
        unify::require_subtype(ctx, state, range, n.id, boolean_type);
        let diagnostics = &ctx.db.documents[ctx.doc_id].info.diagnostics;
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.starts_with("Could not unify"));
    });
}

#[test]
fn unsolved_mutability_variables_default_to_immut() {
    with_context(|ctx, state| {
        let range = Range::default();
        let mutability = ctx.fresh_mutability_variable(state, range);
        ensure_no_unsolved_variables(ctx, state);
        assert_eq!(
            kieli_compiler::hir_display::mutability_to_string(&ctx.arena.hir, mutability.id),
            "immut"
        );
        assert!(ctx.db.documents[ctx.doc_id].info.diagnostics.is_empty());
    });
}

#[test]
fn unsolved_general_variables_report_once_and_become_errors() {
    with_context(|ctx, state| {
        let range = Range::default();
        let alpha = ctx.fresh_general_type_variable(state, range);
        ensure_no_unsolved_variables(ctx, state);
        let diagnostics = &ctx.db.documents[ctx.doc_id].info.diagnostics;
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Unsolved type variable: ?0");
        assert_eq!(
            ctx.arena.hir.types[alpha.id].clone(),
            hir::TypeVariant::Error
        );
    });
}

#[test]
fn unsolved_integral_variables_default_to_i32() {
    with_context(|ctx, state| {
        let range = Range::default();
        let n = ctx.fresh_integral_type_variable(state, range);
        ensure_no_unsolved_variables(ctx, state);
        assert!(ctx.db.documents[ctx.doc_id].info.diagnostics.is_empty());
        assert_eq!(
            ctx.arena.hir.types[n.id].clone(),
            hir::TypeVariant::Integer(kieli_compiler::IntegerType::I32)
        );
    });
}

#[test]
fn error_suppresses_follow_up_mismatches() {
    with_context(|ctx, state| {
        let range = Range::default();
        let error_type = ctx.constants.error_type;
        let boolean_type = ctx.constants.boolean_type;
        let string_type = ctx.constants.string_type;
        unify::require_subtype(ctx, state, range, error_type, boolean_type);
        unify::require_subtype(ctx, state, range, string_type, error_type);
        assert!(ctx.db.documents[ctx.doc_id].info.diagnostics.is_empty());
    });
}
