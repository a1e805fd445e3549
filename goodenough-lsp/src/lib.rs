//! Language Server Protocol (LSP) implementation for good-enough Scala navigation
//!
//!     This crate puts the regex-driven symbol index from `goodenough-index` behind a language
//!     server, so any LSP-capable editor gets usable navigation in Scala projects without a
//!     build server or compiler.
//!
//! Design Decision: tower-lsp
//!
//!     The server is built on tower-lsp. Handlers are async and take `&self`, so all mutable
//!     state lives behind the symbol service's own locks. The client connection is reached
//!     through the [server::LspClient] trait, which keeps the server testable without a real
//!     JSON-RPC transport.
//!
//! Feature Set
//!
//!         1. Go to Definition (textDocument/definition):
//!             - Every declaration named like the identifier under the cursor
//!             - The declaration the cursor is on is left out
//!
//!         2. Hover (textDocument/hover):
//!             - Markdown list of `path:line,char` links to those declarations
//!             - Can be switched off with the `goodEnoughScala.hoverEnabled` setting
//!
//!         3. Workspace Symbols (workspace/symbol):
//!             - Fuzzy subsequence search over every indexed declaration
//!
//!         4. Organize Imports (textDocument/codeAction, `source.organizeImports`):
//!             - Sorts each contiguous block of import lines
//!
//!     Document sync is full-text. Edits are indexed after a short quiet period; saves and
//!     watched-file events are folded into the same debounced batches.
//!
//! Architecture
//!
//!     LSP Layer (tower-lsp):
//!         - JSON-RPC transport, capability negotiation, request routing
//!
//!     Server Layer ([server]):
//!         - Implements the LanguageServer trait
//!         - Translates notifications into symbol service calls
//!         - Thin tests asserting the right things are called and returned
//!
//!     Feature Layer ([features]):
//!         - Stateless conversions from symbol records to LSP types
//!         - Dense unit tests
//!
//!     File contents come either from the editor extension through the custom requests in
//!     [requests], or from disk, depending on `indexing.file_source`.
//!
//! Non-Features
//!
//!         - Find references, rename, completion, diagnostics: these need real name resolution
//!         - Persisting the index between sessions: a full re-index is fast enough
//!
//! Usage
//!
//!     Library:
//!         ```rust
//!         use goodenough_lsp::GoodEnoughLanguageServer;
//!         use tower_lsp::{LspService, Server};
//!
//!         #[tokio::main]
//!         async fn main() {
//!             let config = goodenough_config::load_defaults().unwrap();
//!             let (service, socket) =
//!                 LspService::new(|client| GoodEnoughLanguageServer::new(client, config));
//!             Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
//!                 .serve(service)
//!                 .await;
//!         }
//!         ```
//!
//!     Binary:
//!         $ goodenough-lsp [--config path/to/goodenough.toml] [--file-source client|disk]
//!         Starts the language server on stdin/stdout. Logs go to stderr; set RUST_LOG to tune.
//!

pub mod features;
pub mod requests;
pub mod server;

pub use server::{GoodEnoughLanguageServer, LspClient};
