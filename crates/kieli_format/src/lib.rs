//! # kieli-format
//!
//! Renders a parsed module back to canonical source text: four-space
//! indents, single spaces around operators, one definition per
//! paragraph. The formatter is structural — it works on the CST, so
//! only well-parsed code is reformatted; parse errors leave the
//! affected definition out.
//!
//! Formatting is idempotent: formatting already-formatted text is the
//! identity.

use kieli_base::StringPool;
use kieli_compiler::cst;

struct Formatter<'a> {
    out: String,
    indent: usize,
    arena: &'a cst::Arena,
    pool: &'a StringPool,
}

impl<'a> Formatter<'a> {
    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn name(&mut self, name: kieli_compiler::Name) {
        let text = self.pool.get(name.id).to_string();
        self.write(&text);
    }

    fn floating(&mut self, value: f64) {
        if value.is_finite() && value.fract() == 0.0 {
            self.write(&format!("{}", value as i64));
        } else {
            self.write(&format!("{value}"));
        }
    }

    fn mutability(&mut self, mutability: &cst::Mutability) {
        match &mutability.variant {
            cst::MutabilityVariant::Mut => self.write("mut"),
            cst::MutabilityVariant::Immut => self.write("immut"),
            cst::MutabilityVariant::Parameterized { name } => {
                self.write("mut?");
                self.name(*name);
            }
        }
    }

    fn optional_mutability_prefix(&mut self, mutability: &Option<cst::Mutability>) {
        if let Some(mutability) = mutability {
            self.mutability(mutability);
            self.write(" ");
        }
    }

    fn comma_separated<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (index, item) in items.iter().enumerate() {
            if index != 0 {
                self.write(", ");
            }
            each(self, item);
        }
    }

    fn template_arguments(&mut self, arguments: &cst::TemplateArguments) {
        self.write("[");
        self.comma_separated(&arguments.arguments, |this, argument| match argument {
            cst::TemplateArgument::Type(type_id) => this.type_(*type_id),
            cst::TemplateArgument::Expression(expression_id) => this.expression(*expression_id),
            cst::TemplateArgument::Mutability(mutability) => this.mutability(mutability),
            cst::TemplateArgument::Wildcard { .. } => this.write("_"),
        });
        self.write("]");
    }

    fn path(&mut self, path: &cst::Path) {
        match &path.root {
            cst::PathRoot::Implicit => {}
            cst::PathRoot::Global { .. } => self.write("global::"),
            cst::PathRoot::Type(type_id) => {
                self.type_(*type_id);
                self.write("::");
            }
        }
        for (index, segment) in path.segments.iter().enumerate() {
            if index != 0 {
                self.write("::");
            }
            self.name(segment.name);
            if let Some(arguments) = &segment.template_arguments {
                self.template_arguments(arguments);
            }
        }
    }

    // ------------------------------------------------------------------
    // Types

    fn type_(&mut self, id: cst::TypeId) {
        let ty = self.arena.types[id].clone();
        match &ty.variant {
            cst::TypeVariant::BuiltIn(built_in) => self.write(built_in.name()),
            cst::TypeVariant::Path(path) => self.path(path),
            cst::TypeVariant::Paren { inner } => {
                self.write("(");
                self.type_(*inner);
                self.write(")");
            }
            cst::TypeVariant::Tuple { fields } => {
                self.write("(");
                self.comma_separated(fields, |this, &field| this.type_(field));
                self.write(")");
            }
            cst::TypeVariant::Slice { element } => {
                self.write("[");
                self.type_(*element);
                self.write("]");
            }
            cst::TypeVariant::Array { element, length } => {
                self.write("[");
                self.type_(*element);
                self.write("; ");
                self.expression(*length);
                self.write("]");
            }
            cst::TypeVariant::Function {
                parameters,
                return_type,
            } => {
                self.write("fn(");
                self.comma_separated(parameters, |this, &parameter| this.type_(parameter));
                self.write("): ");
                self.type_(*return_type);
            }
            cst::TypeVariant::Typeof { expression } => {
                self.write("typeof(");
                self.expression(*expression);
                self.write(")");
            }
            cst::TypeVariant::Reference {
                mutability,
                referenced,
            } => {
                self.write("&");
                self.optional_mutability_prefix(mutability);
                self.type_(*referenced);
            }
            cst::TypeVariant::Pointer { mutability, pointee } => {
                self.write("*");
                self.optional_mutability_prefix(mutability);
                self.type_(*pointee);
            }
            cst::TypeVariant::Wildcard => self.write("_"),
            cst::TypeVariant::SelfType => self.write("Self"),
            cst::TypeVariant::ImplConcepts { concepts } => {
                self.write("impl ");
                for (index, concept) in concepts.iter().enumerate() {
                    if index != 0 {
                        self.write(" + ");
                    }
                    self.path(concept);
                }
            }
            cst::TypeVariant::Error => self.write("_"),
        }
    }

    // ------------------------------------------------------------------
    // Patterns

    fn pattern(&mut self, id: cst::PatternId) {
        let pattern = self.arena.patterns[id].clone();
        match &pattern.variant {
            cst::PatternVariant::Integer(integer) => self.write(&integer.value.to_string()),
            cst::PatternVariant::Floating(floating) => self.floating(floating.value),
            cst::PatternVariant::Boolean(boolean) => self.write(&boolean.value.to_string()),
            cst::PatternVariant::Character(character) => {
                self.write(&format!("{:?}", character.value));
            }
            cst::PatternVariant::String(string) => {
                let text = format!("{:?}", self.pool.get(string.id));
                self.write(&text);
            }
            cst::PatternVariant::Wildcard => self.write("_"),
            cst::PatternVariant::Name { mutability, name } => {
                self.optional_mutability_prefix(mutability);
                self.name(*name);
            }
            cst::PatternVariant::Paren { pattern } => {
                self.write("(");
                self.pattern(*pattern);
                self.write(")");
            }
            cst::PatternVariant::Tuple { fields } => {
                self.write("(");
                self.comma_separated(fields, |this, &field| this.pattern(field));
                self.write(")");
            }
            cst::PatternVariant::Slice { patterns } => {
                self.write("[");
                self.comma_separated(patterns, |this, &pattern| this.pattern(pattern));
                self.write("]");
            }
            cst::PatternVariant::Constructor { path, body } => {
                self.path(path);
                self.constructor_pattern_body(body);
            }
            cst::PatternVariant::AbbreviatedConstructor { name, body } => {
                self.write("::");
                self.name(*name);
                self.constructor_pattern_body(body);
            }
            cst::PatternVariant::Alias {
                pattern,
                mutability,
                name,
            } => {
                self.pattern(*pattern);
                self.write(" as ");
                self.optional_mutability_prefix(mutability);
                self.name(*name);
            }
            cst::PatternVariant::Guarded { pattern, guard } => {
                self.pattern(*pattern);
                self.write(" if ");
                self.expression(*guard);
            }
        }
    }

    fn constructor_pattern_body(&mut self, body: &Option<cst::ConstructorPatternBody>) {
        match body {
            None => {}
            Some(cst::ConstructorPatternBody::Tuple { fields }) => {
                self.write("(");
                self.comma_separated(fields, |this, &field| this.pattern(field));
                self.write(")");
            }
            Some(cst::ConstructorPatternBody::Struct { fields }) => {
                self.write(" { ");
                self.comma_separated(fields, |this, field| {
                    this.name(field.name);
                    if let Some(pattern) = field.pattern {
                        this.write(" = ");
                        this.pattern(pattern);
                    }
                });
                self.write(" }");
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions

    fn block(&mut self, block: &cst::Block) {
        if block.effects.is_empty() {
            match block.result {
                None => self.write("{}"),
                Some(result) => {
                    self.write("{ ");
                    self.expression(result);
                    self.write(" }");
                }
            }
            return;
        }
        self.write("{");
        self.indent += 1;
        for effect in &block.effects {
            self.newline();
            self.expression(effect.expression);
            self.write(";");
        }
        if let Some(result) = block.result {
            self.newline();
            self.expression(result);
        }
        self.indent -= 1;
        self.newline();
        self.write("}");
    }

    fn arguments(&mut self, arguments: &[cst::FunctionArgument]) {
        self.write("(");
        self.comma_separated(arguments, |this, argument| {
            if let Some(name) = argument.name {
                this.name(name);
                this.write(" = ");
            }
            this.expression(argument.expression);
        });
        self.write(")");
    }

    fn conditional(
        &mut self,
        condition: cst::ExpressionId,
        true_branch: cst::ExpressionId,
        false_branch: &Option<cst::ExpressionId>,
    ) {
        self.expression(condition);
        self.write(" ");
        self.expression(true_branch);
        if let Some(false_branch) = false_branch {
            self.newline();
            let false_expression = self.arena.expressions[*false_branch].clone();
            if let cst::ExpressionVariant::Conditional {
                condition,
                true_branch,
                false_branch,
                ..
            } = &false_expression.variant
            {
                self.write("elif ");
                self.conditional(*condition, *true_branch, false_branch);
            } else {
                self.write("else ");
                self.expression(*false_branch);
            }
        }
    }

    fn expression(&mut self, id: cst::ExpressionId) {
        let expression = self.arena.expressions[id].clone();
        match &expression.variant {
            cst::ExpressionVariant::Integer(integer) => self.write(&integer.value.to_string()),
            cst::ExpressionVariant::Floating(floating) => self.floating(floating.value),
            cst::ExpressionVariant::Boolean(boolean) => self.write(&boolean.value.to_string()),
            cst::ExpressionVariant::Character(character) => {
                self.write(&format!("{:?}", character.value));
            }
            cst::ExpressionVariant::String(string) => {
                let text = format!("{:?}", self.pool.get(string.id));
                self.write(&text);
            }
            cst::ExpressionVariant::Path(path) => self.path(path),
            cst::ExpressionVariant::Wildcard => self.write("_"),
            cst::ExpressionVariant::Paren { expression } => {
                self.write("(");
                self.expression(*expression);
                self.write(")");
            }
            cst::ExpressionVariant::Tuple { fields } => {
                self.write("(");
                self.comma_separated(fields, |this, &field| this.expression(field));
                self.write(")");
            }
            cst::ExpressionVariant::Array { elements } => {
                self.write("[");
                self.comma_separated(elements, |this, &element| this.expression(element));
                self.write("]");
            }
            cst::ExpressionVariant::Block(block) => self.block(block),
            cst::ExpressionVariant::Conditional {
                condition,
                true_branch,
                false_branch,
                ..
            } => {
                self.write("if ");
                self.conditional(*condition, *true_branch, false_branch);
            }
            cst::ExpressionVariant::Match { scrutinee, arms } => {
                self.write("match ");
                self.expression(*scrutinee);
                self.write(" {");
                self.indent += 1;
                for arm in arms {
                    self.newline();
                    self.pattern(arm.pattern);
                    self.write(" -> ");
                    self.expression(arm.handler);
                }
                self.indent -= 1;
                self.newline();
                self.write("}");
            }
            cst::ExpressionVariant::WhileLoop {
                condition, body, ..
            } => {
                self.write("while ");
                self.expression(*condition);
                self.write(" ");
                self.expression(*body);
            }
            cst::ExpressionVariant::Loop { body } => {
                self.write("loop ");
                self.expression(*body);
            }
            cst::ExpressionVariant::ForLoop {
                pattern,
                iterable,
                body,
                ..
            } => {
                self.write("for ");
                self.pattern(*pattern);
                self.write(" in ");
                self.expression(*iterable);
                self.write(" ");
                self.expression(*body);
            }
            cst::ExpressionVariant::FunctionCall {
                invocable,
                arguments,
            } => {
                self.expression(*invocable);
                self.arguments(arguments);
            }
            cst::ExpressionVariant::StructInit { path, fields } => {
                self.path(path);
                self.write(" { ");
                self.comma_separated(fields, |this, field| {
                    this.name(field.name);
                    this.write(" = ");
                    this.expression(field.expression);
                });
                self.write(" }");
            }
            cst::ExpressionVariant::InfixCall { left, right, op } => {
                self.expression(*left);
                self.write(" ");
                self.name(*op);
                self.write(" ");
                self.expression(*right);
            }
            cst::ExpressionVariant::StructField { base, name } => {
                self.expression(*base);
                self.write(".");
                self.name(*name);
            }
            cst::ExpressionVariant::TupleField { base, index, .. } => {
                self.expression(*base);
                self.write(&format!(".{index}"));
            }
            cst::ExpressionVariant::ArrayIndex { base, index } => {
                self.expression(*base);
                self.write(".[");
                self.expression(*index);
                self.write("]");
            }
            cst::ExpressionVariant::MethodCall {
                expression,
                name,
                arguments,
            } => {
                self.expression(*expression);
                self.write(".");
                self.name(*name);
                self.arguments(arguments);
            }
            cst::ExpressionVariant::Ascription {
                expression,
                ascribed_type,
            } => {
                self.expression(*expression);
                self.write(": ");
                self.type_(*ascribed_type);
            }
            cst::ExpressionVariant::Let {
                pattern,
                ascribed_type,
                initializer,
            } => {
                self.write("let ");
                self.pattern(*pattern);
                if let Some(ascribed_type) = ascribed_type {
                    self.write(": ");
                    self.type_(*ascribed_type);
                }
                self.write(" = ");
                self.expression(*initializer);
            }
            cst::ExpressionVariant::TypeAlias { name, aliased_type } => {
                self.write("alias ");
                self.name(*name);
                self.write(" = ");
                self.type_(*aliased_type);
            }
            cst::ExpressionVariant::Ret { expression } => {
                self.write("ret");
                if let Some(expression) = expression {
                    self.write(" ");
                    self.expression(*expression);
                }
            }
            cst::ExpressionVariant::Discard { expression } => {
                self.write("discard ");
                self.expression(*expression);
            }
            cst::ExpressionVariant::Break { expression } => {
                self.write("break");
                if let Some(expression) = expression {
                    self.write(" ");
                    self.expression(*expression);
                }
            }
            cst::ExpressionVariant::Continue => self.write("continue"),
            cst::ExpressionVariant::Sizeof { inspected_type } => {
                self.write("sizeof(");
                self.type_(*inspected_type);
                self.write(")");
            }
            cst::ExpressionVariant::Addressof {
                mutability,
                expression,
                ..
            } => {
                self.write("&");
                self.optional_mutability_prefix(mutability);
                self.expression(*expression);
            }
            cst::ExpressionVariant::Deref { expression } => {
                self.write("*");
                self.expression(*expression);
            }
            cst::ExpressionVariant::Move { expression } => {
                self.write("mv ");
                self.expression(*expression);
            }
            cst::ExpressionVariant::Defer { expression } => {
                self.write("defer ");
                self.expression(*expression);
            }
            cst::ExpressionVariant::Error => self.write("_"),
        }
    }

    // ------------------------------------------------------------------
    // Definitions

    fn template_parameters(&mut self, parameters: &Option<cst::TemplateParameters>) {
        let Some(parameters) = parameters else { return };
        self.write("[");
        self.comma_separated(&parameters.parameters, |this, parameter| {
            match &parameter.variant {
                cst::TemplateParameterVariant::Type { name, concepts } => {
                    this.name(*name);
                    if !concepts.is_empty() {
                        this.write(": ");
                        for (index, concept) in concepts.iter().enumerate() {
                            if index != 0 {
                                this.write(" + ");
                            }
                            this.path(concept);
                        }
                    }
                }
                cst::TemplateParameterVariant::Value { name, value_type } => {
                    this.name(*name);
                    this.write(": ");
                    this.type_(*value_type);
                }
                cst::TemplateParameterVariant::Mutability { name } => {
                    this.name(*name);
                    this.write(": mut");
                }
            }
        });
        self.write("]");
    }

    fn function_signature(&mut self, signature: &cst::FunctionSignature) {
        self.name(signature.name);
        self.template_parameters(&signature.template_parameters);
        self.write("(");
        let mut first = true;
        if let Some(self_parameter) = &signature.self_parameter {
            if self_parameter.is_reference {
                self.write("&");
            }
            self.optional_mutability_prefix(&self_parameter.mutability);
            self.write("self");
            first = false;
        }
        for parameter in &signature.parameters {
            if !first {
                self.write(", ");
            }
            first = false;
            self.pattern(parameter.pattern);
            if let Some(parameter_type) = parameter.parameter_type {
                self.write(": ");
                self.type_(parameter_type);
            }
            if let Some(default_argument) = parameter.default_argument {
                self.write(" = ");
                self.expression(default_argument);
            }
        }
        self.write(")");
        if let Some(return_type) = signature.return_type {
            self.write(": ");
            self.type_(return_type);
        }
    }

    fn constructor_body(&mut self, body: &cst::ConstructorBody) {
        match body {
            cst::ConstructorBody::Struct { fields } => {
                self.write(" { ");
                self.comma_separated(fields, |this, field| {
                    this.name(field.name);
                    this.write(": ");
                    this.type_(field.field_type);
                });
                self.write(" }");
            }
            cst::ConstructorBody::Tuple { types } => {
                self.write("(");
                self.comma_separated(types, |this, &ty| this.type_(ty));
                self.write(")");
            }
            cst::ConstructorBody::Unit => {}
        }
    }

    fn braced_definitions(&mut self, definitions: &[cst::Definition]) {
        if definitions.is_empty() {
            self.write(" {}");
            return;
        }
        self.write(" {");
        self.indent += 1;
        for definition in definitions {
            self.newline();
            self.definition(definition);
        }
        self.indent -= 1;
        self.newline();
        self.write("}");
    }

    fn definition(&mut self, definition: &cst::Definition) {
        match &definition.variant {
            cst::DefinitionVariant::Function(function) => {
                self.write("fn ");
                self.function_signature(&function.signature);
                let body = self.arena.expressions[function.body].clone();
                if matches!(body.variant, cst::ExpressionVariant::Block(_)) {
                    self.write(" ");
                    self.expression(function.body);
                } else {
                    self.write(" = ");
                    self.expression(function.body);
                }
            }
            cst::DefinitionVariant::Structure(structure) => {
                self.write("struct ");
                self.name(structure.name);
                self.template_parameters(&structure.template_parameters);
                self.constructor_body(&structure.body);
            }
            cst::DefinitionVariant::Enumeration(enumeration) => {
                self.write("enum ");
                self.name(enumeration.name);
                self.template_parameters(&enumeration.template_parameters);
                self.write(" = ");
                for (index, constructor) in enumeration.constructors.iter().enumerate() {
                    if index != 0 {
                        self.write(" | ");
                    }
                    self.name(constructor.name);
                    self.constructor_body(&constructor.body);
                }
            }
            cst::DefinitionVariant::Alias(alias) => {
                self.write("alias ");
                self.name(alias.name);
                self.template_parameters(&alias.template_parameters);
                self.write(" = ");
                self.type_(alias.aliased_type);
            }
            cst::DefinitionVariant::Concept(concept) => {
                self.write("concept ");
                self.name(concept.name);
                self.template_parameters(&concept.template_parameters);
                self.write(" {");
                self.indent += 1;
                for signature in &concept.function_signatures {
                    self.newline();
                    self.write("fn ");
                    self.function_signature(signature);
                }
                for signature in &concept.type_signatures {
                    self.newline();
                    self.write("alias ");
                    self.name(signature.name);
                    if !signature.concepts.is_empty() {
                        self.write(": ");
                        for (index, concept) in signature.concepts.iter().enumerate() {
                            if index != 0 {
                                self.write(" + ");
                            }
                            self.path(concept);
                        }
                    }
                }
                self.indent -= 1;
                self.newline();
                self.write("}");
            }
            cst::DefinitionVariant::Impl(implementation) => {
                self.write("impl");
                self.template_parameters(&implementation.template_parameters);
                self.write(" ");
                self.type_(implementation.self_type);
                self.braced_definitions(&implementation.definitions);
            }
            cst::DefinitionVariant::Submodule(submodule) => {
                self.write("module ");
                self.name(submodule.name);
                self.template_parameters(&submodule.template_parameters);
                self.braced_definitions(&submodule.definitions);
            }
        }
    }
}

/// Render a whole module as canonical source text.
pub fn format_module(arena: &cst::Arena, pool: &StringPool, module: &cst::Module) -> String {
    let mut formatter = Formatter {
        out: String::new(),
        indent: 0,
        arena,
        pool,
    };
    for import in &module.imports {
        formatter.write("import ");
        for (index, segment) in import.segments.iter().enumerate() {
            if index != 0 {
                formatter.write(".");
            }
            formatter.name(*segment);
        }
        formatter.write("\n");
    }
    if !module.imports.is_empty() && !module.definitions.is_empty() {
        formatter.write("\n");
    }
    for (index, definition) in module.definitions.iter().enumerate() {
        if index != 0 {
            formatter.write("\n\n");
        }
        formatter.definition(definition);
    }
    if !formatter.out.is_empty() {
        formatter.write("\n");
    }
    formatter.out
}

/// Render one expression as canonical source text.
pub fn format_expression(arena: &cst::Arena, pool: &StringPool, id: cst::ExpressionId) -> String {
    let mut formatter = Formatter {
        out: String::new(),
        indent: 0,
        arena,
        pool,
    };
    formatter.expression(id);
    formatter.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_compiler::db::{self, Configuration};

    fn format_source(text: &str) -> String {
        let mut database = db::database(Configuration::default());
        let doc_id = db::test_document(&mut database, text.to_string());
        let tokens = kieli_lex::lex(&mut database, doc_id);
        let (arena, module) = kieli_parse::parse(&mut database, doc_id, &tokens);
        format_module(&arena, &database.string_pool, &module)
    }

    #[test]
    fn simple_function_formats_canonically() {
        assert_eq!(
            format_source("fn   f( x :I32 ) :I32=x"),
            "fn f(x: I32): I32 = x\n"
        );
    }

    #[test]
    fn block_bodies_indent_by_four() {
        assert_eq!(
            format_source("fn f() { a; b }"),
            "fn f() {\n    a;\n    b\n}\n"
        );
    }

    #[test]
    fn single_result_blocks_stay_inline() {
        assert_eq!(format_source("fn f() { x }"), "fn f() { x }\n");
        assert_eq!(format_source("fn f() {}"), "fn f() {}\n");
    }

    #[test]
    fn conditionals_break_before_else() {
        assert_eq!(
            format_source("fn f() = if a { b } else { c }"),
            "fn f() = if a { b }\nelse { c }\n"
        );
    }

    #[test]
    fn elif_chains_are_preserved() {
        let formatted = format_source("fn f() = if a { b } elif c { d } else { e }");
        assert!(formatted.contains("elif c { d }"), "{formatted}");
    }

    #[test]
    fn enum_definitions_use_pipes() {
        assert_eq!(
            format_source("enum E=A|B(I32)"),
            "enum E = A | B(I32)\n"
        );
    }

    #[test]
    fn definitions_are_separated_by_blank_lines() {
        let formatted = format_source("fn f() = 0 fn g() = 1");
        assert_eq!(formatted, "fn f() = 0\n\nfn g() = 1\n");
    }

    #[test]
    fn formatting_is_idempotent() {
        let sources = [
            "fn f(x: I32): I32 = x",
            "fn f() { while true { 1 }; }",
            "fn f() = match x { 0 -> true\n_ -> false }",
            "struct S { x: I32, y: Bool }",
            "enum Option[T] = None | Some(T)",
            "module m { fn g(): I32 = 5 }",
            "impl S { fn get(&self): I32 = 0 }",
            "fn f() = a: B: C",
            "fn f() = &mut x.y",
            "import a.b\nfn f() = 0",
        ];
        for source in sources {
            let once = format_source(source);
            let twice = format_source(&once);
            assert_eq!(once, twice, "formatting is not idempotent for: {source}");
        }
    }
}
