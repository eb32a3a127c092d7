//! Server-side document state: one mutex-guarded database.
//!
//! The language-server loop is single-threaded cooperative — each
//! request runs to completion before the next is read — so one lock
//! around the whole database mirrors the execution model instead of
//! fighting it.

use crate::line_index::LineIndex;
use kieli_base::Position;
use kieli_compiler::db::{self, Database, DocumentId};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tower_lsp::lsp_types::Url;

pub struct ServerState {
    db: Mutex<Database>,
}

impl ServerState {
    pub fn new() -> Self {
        ServerState {
            db: Mutex::new(db::database(db::Configuration::full())),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Database> {
        self.db
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a `file://` URI to a filesystem path. Any other scheme is
/// an error.
pub fn uri_to_path(uri: &Url) -> Result<PathBuf, String> {
    if uri.scheme() != "file" {
        return Err(format!("URI with unsupported scheme: '{uri}'"));
    }
    uri.to_file_path()
        .map_err(|()| format!("Invalid file URI: '{uri}'"))
}

/// The document a request addresses, if it is open.
pub fn document_id(db: &Database, uri: &Url) -> Option<DocumentId> {
    let path = uri_to_path(uri).ok()?;
    db.paths.get(&path).copied()
}

/// Opens a client-owned document and analyzes it.
pub fn open_document(db: &mut Database, uri: &Url, text: String) -> Option<DocumentId> {
    let path = match uri_to_path(uri) {
        Ok(path) => path,
        Err(message) => {
            log::error!("{message}");
            return None;
        }
    };
    let doc_id = db::client_open_document(db, path, text);
    kieli_resolve::analyze_document(db, doc_id);
    Some(doc_id)
}

/// Applies one `didChange` content change. Each change's range is
/// interpreted against the text produced by the previous changes in the
/// same message.
pub fn apply_content_change(
    db: &mut Database,
    doc_id: DocumentId,
    range: Option<tower_lsp::lsp_types::Range>,
    new_text: &str,
) {
    match range {
        Some(range) => {
            let index = LineIndex::new(&db.documents[doc_id].text);
            let edit_range = index.from_lsp_range(range);
            let mut text = std::mem::take(&mut db.documents[doc_id].text);
            if let Err(error) = db::edit_text(&mut text, edit_range, new_text) {
                log::error!("didChange: {error}");
            }
            db.documents[doc_id].text = text;
        }
        None => db.documents[doc_id].text = new_text.to_string(),
    }
}

/// Re-analyzes a document, optionally anchoring the cursor for
/// completion and signature-help collection.
pub fn reanalyze(db: &mut Database, doc_id: DocumentId, edit_position: Option<Position>) {
    db.documents[doc_id].edit_position = edit_position;
    kieli_resolve::analyze_document(db, doc_id);
}

/// The line index of a document's current text.
pub fn line_index(db: &Database, doc_id: DocumentId) -> LineIndex {
    LineIndex::new(&db.documents[doc_id].text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::from_file_path(path).unwrap()
    }

    #[test]
    fn open_then_change_then_query() {
        let mut db = db::database(db::Configuration::full());
        let uri = url("/tmp/main.ki");
        let doc_id = open_document(&mut db, &uri, "fn f(): I32 = 5".to_string()).unwrap();
        assert!(db.documents[doc_id].info.diagnostics.is_empty());

        // Replace `5` with `true`.
        let range = tower_lsp::lsp_types::Range {
            start: tower_lsp::lsp_types::Position::new(0, 14),
            end: tower_lsp::lsp_types::Position::new(0, 15),
        };
        apply_content_change(&mut db, doc_id, Some(range), "true");
        assert_eq!(db.documents[doc_id].text, "fn f(): I32 = true");
        reanalyze(&mut db, doc_id, None);
        assert!(!db.documents[doc_id].info.diagnostics.is_empty());
    }

    #[test]
    fn sequential_changes_compose() {
        let mut db = db::database(db::Configuration::full());
        let uri = url("/tmp/a.ki");
        let doc_id = open_document(&mut db, &uri, "hello".to_string()).unwrap();
        let range = tower_lsp::lsp_types::Range {
            start: tower_lsp::lsp_types::Position::new(0, 4),
            end: tower_lsp::lsp_types::Position::new(0, 5),
        };
        apply_content_change(&mut db, doc_id, Some(range), "");
        assert_eq!(db.documents[doc_id].text, "hell");
        let range = tower_lsp::lsp_types::Range {
            start: tower_lsp::lsp_types::Position::new(0, 0),
            end: tower_lsp::lsp_types::Position::new(0, 0),
        };
        apply_content_change(&mut db, doc_id, Some(range), "s");
        assert_eq!(db.documents[doc_id].text, "shell");
    }

    #[test]
    fn non_file_uris_are_rejected() {
        let uri = Url::parse("untitled:scratch").unwrap();
        assert!(uri_to_path(&uri).is_err());
    }

    #[test]
    fn close_forgets_the_document() {
        let mut db = db::database(db::Configuration::full());
        let uri = url("/tmp/b.ki");
        let doc_id = open_document(&mut db, &uri, "fn f() = 0".to_string()).unwrap();
        db::client_close_document(&mut db, doc_id);
        assert!(document_id(&db, &uri).is_none());
    }
}
