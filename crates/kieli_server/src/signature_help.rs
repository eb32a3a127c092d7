//! Signature help from the anchored signature record.

use kieli_compiler::db::{Database, DocumentId};
use kieli_compiler::hir_display;
use tower_lsp::lsp_types::{
    Documentation, ParameterInformation, ParameterLabel, SignatureHelp, SignatureInformation,
};

pub fn signature_help(db: &Database, doc_id: DocumentId) -> Option<SignatureHelp> {
    let info = db.documents[doc_id].info.signature_info?;
    let arena = &db.documents[doc_id].arena;
    let function = &arena.hir.functions[info.function_id];
    let signature = function.signature.resolved()?;
    let name = db.string_pool.get(function.name.id);

    let mut parameters = Vec::with_capacity(signature.parameters.len());
    let mut rendered_parameters = Vec::with_capacity(signature.parameters.len());
    for parameter in &signature.parameters {
        let parameter_type =
            hir_display::type_to_string(&arena.hir, &db.string_pool, parameter.parameter_type.id);
        let label = match &arena.hir.patterns[parameter.pattern].variant {
            kieli_compiler::hir::PatternVariant::Name { name, .. } => {
                format!("{}: {parameter_type}", db.string_pool.get(name.id))
            }
            _ => parameter_type,
        };
        parameters.push(ParameterInformation {
            label: ParameterLabel::Simple(label.clone()),
            documentation: None,
        });
        rendered_parameters.push(label);
    }

    let return_type =
        hir_display::type_to_string(&arena.hir, &db.string_pool, signature.return_type.id);
    let label = format!("fn {name}({}): {return_type}", rendered_parameters.join(", "));

    Some(SignatureHelp {
        signatures: vec![SignatureInformation {
            label,
            documentation: None::<Documentation>,
            parameters: Some(parameters),
            active_parameter: Some(info.active_param),
        }],
        active_signature: Some(0),
        active_parameter: Some(info.active_param),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kieli_base::Position;
    use kieli_compiler::db::{self, Configuration};

    #[test]
    fn call_sites_report_the_callee_signature() {
        let mut database = db::database(Configuration::full());
        let source = "fn g(count: I32): Bool = true\nfn f(): Bool = g(5)";
        let doc_id = db::test_document(&mut database, source.to_string());
        // Cursor between the call parentheses.
        database.documents[doc_id].edit_position = Some(Position::new(1, 17));
        kieli_resolve::analyze_document(&mut database, doc_id);

        let help = signature_help(&database, doc_id).unwrap();
        assert_eq!(help.signatures.len(), 1);
        assert_eq!(help.signatures[0].label, "fn g(count: I32): Bool");
    }
}
