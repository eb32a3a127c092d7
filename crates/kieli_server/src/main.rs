//! Entry point for the kieli language server.
//!
//! Speaks the Language Server Protocol over standard input and output.
//! The runtime is a single-threaded executor: requests are handled to
//! completion in arrival order, which matches the editor's own model
//! and keeps database access race-free.

use kieli_language_server::KieliServer;
use tower_lsp::{LspService, Server};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(KieliServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
