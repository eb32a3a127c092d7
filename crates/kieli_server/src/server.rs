//! The LSP dispatcher: maps protocol methods onto database operations.
//!
//! Notifications mutate the database and re-run the pipeline for the
//! affected document; requests read the collected document info. The
//! runtime is single-threaded, so each message is handled to completion
//! before the next is read.

use crate::state::{self, ServerState};
use crate::{
    code_actions, completion, definition, formatting, hover, inlay_hints, line_index, references,
    semantic_tokens, signature_help,
};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

pub struct KieliServer {
    client: Client,
    state: ServerState,
}

impl KieliServer {
    pub fn new(client: Client) -> Self {
        KieliServer {
            client,
            state: ServerState::new(),
        }
    }

    async fn publish_diagnostics(&self, uri: Url) {
        let diagnostics = {
            let db = self.state.lock();
            let Some(doc_id) = state::document_id(&db, &uri) else {
                return;
            };
            let index = state::line_index(&db, doc_id);
            db.documents[doc_id]
                .info
                .diagnostics
                .iter()
                .map(|diagnostic| convert_diagnostic(&index, &uri, diagnostic))
                .collect::<Vec<_>>()
        };
        self.client.publish_diagnostics(uri, diagnostics, None).await;
    }
}

fn convert_severity(severity: kieli_compiler::lsp::Severity) -> DiagnosticSeverity {
    match severity {
        kieli_compiler::lsp::Severity::Error => DiagnosticSeverity::ERROR,
        kieli_compiler::lsp::Severity::Warning => DiagnosticSeverity::WARNING,
        kieli_compiler::lsp::Severity::Information => DiagnosticSeverity::INFORMATION,
        kieli_compiler::lsp::Severity::Hint => DiagnosticSeverity::HINT,
    }
}

fn convert_diagnostic(
    index: &line_index::LineIndex,
    uri: &Url,
    diagnostic: &kieli_compiler::lsp::Diagnostic,
) -> Diagnostic {
    let related_information = if diagnostic.related_info.is_empty() {
        None
    } else {
        Some(
            diagnostic
                .related_info
                .iter()
                .map(|related| DiagnosticRelatedInformation {
                    location: Location {
                        uri: uri.clone(),
                        range: index.to_lsp_range(related.location.range),
                    },
                    message: related.message.clone(),
                })
                .collect(),
        )
    };
    let tags = match diagnostic.tag {
        kieli_compiler::lsp::DiagnosticTag::None => None,
        kieli_compiler::lsp::DiagnosticTag::Unnecessary => Some(vec![DiagnosticTag::UNNECESSARY]),
        kieli_compiler::lsp::DiagnosticTag::Deprecated => Some(vec![DiagnosticTag::DEPRECATED]),
    };
    Diagnostic {
        range: index.to_lsp_range(diagnostic.range),
        severity: Some(convert_severity(diagnostic.severity)),
        source: Some("kieli".to_string()),
        message: diagnostic.message.clone(),
        related_information,
        tags,
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for KieliServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        ..Default::default()
                    },
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                document_formatting_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![":".to_string()]),
                    ..Default::default()
                }),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
                    ..Default::default()
                }),
                code_action_provider: Some(CodeActionProviderCapability::Simple(true)),
                inlay_hint_provider: Some(OneOf::Left(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: semantic_tokens::legend(),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            range: None,
                            ..Default::default()
                        },
                    ),
                ),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "kieli-language-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        log::info!("kieli language server initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut db = self.state.lock();
            state::open_document(&mut db, &uri, params.text_document.text);
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        {
            let mut db = self.state.lock();
            let Some(doc_id) = state::document_id(&db, &uri) else {
                return;
            };
            // Changes apply left to right, each against the text the
            // previous ones produced.
            for change in params.content_changes {
                state::apply_content_change(&mut db, doc_id, change.range, &change.text);
            }
            state::reanalyze(&mut db, doc_id, None);
        }
        self.publish_diagnostics(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        {
            let mut db = self.state.lock();
            if let Some(doc_id) = state::document_id(&db, &params.text_document.uri) {
                kieli_compiler::db::client_close_document(&mut db, doc_id);
            }
        }
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let position = index.from_lsp(params.text_document_position_params.position);
        Ok(hover::hover(&db, doc_id, &index, position))
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let position = index.from_lsp(params.text_document_position_params.position);
        Ok(definition::goto_definition(&db, doc_id, &index, position, uri)
            .map(GotoDefinitionResponse::Scalar))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let uri = &params.text_document_position.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let position = index.from_lsp(params.text_document_position.position);
        let locations = references::find_references(
            &db,
            doc_id,
            &index,
            position,
            uri,
            params.context.include_declaration,
        );
        Ok((!locations.is_empty()).then_some(locations))
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let mut db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let position = index.from_lsp(params.text_document_position.position);
        state::reanalyze(&mut db, doc_id, Some(position));
        Ok(completion::completions(&db, doc_id))
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let mut db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let position = index.from_lsp(params.text_document_position_params.position);
        state::reanalyze(&mut db, doc_id, Some(position));
        Ok(signature_help::signature_help(&db, doc_id))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = &params.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let actions = code_actions::code_actions(&db, doc_id, &index, params.range, uri);
        Ok((!actions.is_empty()).then_some(actions))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let uri = &params.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let hints = inlay_hints::inlay_hints(&db, doc_id, &index, params.range);
        Ok((!hints.is_empty()).then_some(hints))
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let uri = &params.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let data = semantic_tokens::encode_tokens(&db, doc_id, &index);
        Ok(Some(SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = &params.text_document.uri;
        let db = self.state.lock();
        let Some(doc_id) = state::document_id(&db, uri) else {
            return Ok(None);
        };
        let index = state::line_index(&db, doc_id);
        let edits = formatting::format_document(&db, doc_id, &index);
        Ok((!edits.is_empty()).then_some(edits))
    }
}
