//! Workspace symbols: fuzzy search results as flat `SymbolInformation`.

use super::definition::record_location;
use goodenough_index::SymbolRecord;
use tower_lsp::lsp_types::SymbolInformation;

/// Flat symbol list in search rank order, named as written in the source.
#[allow(deprecated)]
pub fn symbol_information(records: &[SymbolRecord]) -> Vec<SymbolInformation> {
    records
        .iter()
        .map(|record| SymbolInformation {
            name: record.raw_name.clone(),
            kind: record.kind.to_lsp(),
            tags: None,
            deprecated: None,
            location: record_location(record),
            container_name: None,
        })
        .collect()
}
