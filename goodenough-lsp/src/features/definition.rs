//! Go-to-definition: one point location per matching declaration.

use goodenough_index::SymbolRecord;
use tower_lsp::lsp_types::{Location, Position, Range};

pub fn definition_locations(records: &[SymbolRecord]) -> Vec<Location> {
    records.iter().map(record_location).collect()
}

/// Zero-width range at the start of the declared identifier.
pub fn record_location(record: &SymbolRecord) -> Location {
    let point = Position::new(record.location.line, record.location.character);
    Location {
        uri: record.uri().clone(),
        range: Range::new(point, point),
    }
}
