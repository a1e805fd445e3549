//! Symbol index for good-enough Scala navigation
//!
//!     This crate finds declarations with regular expressions instead of a compiler. It is fast,
//!     needs no build, and is wrong in well understood ways: comments and strings are scanned
//!     too, and only declarations written as `keyword Name` with a single space are found.
//!
//! Layout
//!
//!     The pieces stack bottom-up:
//!
//!         - [term]: the identifier under a cursor position (UTF-16 columns).
//!         - [extract]: declaration records from file text.
//!         - [index]: records grouped by name, with incremental per-file updates.
//!         - [fuzzy]: ranked subsequence search over one index generation.
//!         - [query]: term lookup minus the declaration the cursor sits on.
//!         - [scheduler]: debounced batching of edits.
//!         - [service]: the outward façade an editor integration talks to.
//!
//!     File contents come from a [files::FileProvider]. The LSP server asks the client for them;
//!     [disk::DiskFileProvider] reads the workspace folders directly.
//!
//! Concurrency
//!
//!     The index sits behind a tokio `RwLock`. Each mutation (drop stale records, add fresh
//!     ones, resort, rebuild the fuzzy snapshot) runs under a single write guard, so readers
//!     observe one generation or the next and never a mix.

pub mod analytics;
pub mod disk;
pub mod error;
pub mod extract;
pub mod files;
pub mod fuzzy;
pub mod imports;
pub mod index;
pub mod query;
pub mod scheduler;
pub mod service;
pub mod symbol;
pub mod term;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use analytics::{Analytics, NoopAnalytics, TracingAnalytics};
pub use disk::DiskFileProvider;
pub use error::{ProviderError, QueryError};
pub use files::{FileEntry, FileProvider};
pub use imports::LineEdit;
pub use service::{ServiceOptions, SymbolService, WatchedChange};
pub use symbol::{DeclarationKind, SourceFile, SymbolLocation, SymbolRecord};
