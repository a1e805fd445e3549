//! The authoritative name → declaration index.
//!
//!     Buckets are keyed by the prefixed symbol name and kept sorted by (uri, character, line)
//!     so repeated queries over unchanged input come back in the same order. Every mutation
//!     rebuilds the fuzzy search snapshot before returning, so a read that follows a mutation
//!     always sees the same generation through both `lookup` and `fuzzy_search`.

use crate::extract::extract_files;
use crate::files::FileEntry;
use crate::fuzzy::FuzzySearch;
use crate::symbol::SymbolRecord;
use lsp_types::Url;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
pub struct SymbolIndex {
    buckets: HashMap<String, Vec<SymbolRecord>>,
    search: FuzzySearch,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard everything and index `files` from scratch.
    pub fn rebuild_all(&mut self, files: &[FileEntry]) -> Vec<SymbolRecord> {
        self.replace(extract_files(files))
    }

    /// Drop every record belonging to `files` or `removed`, then index `files`.
    pub fn update_files(&mut self, files: &[FileEntry], removed: &[Url]) -> Vec<SymbolRecord> {
        let stale: HashSet<&Url> = files
            .iter()
            .map(|file| &file.uri)
            .chain(removed.iter())
            .collect();

        let mut records: Vec<SymbolRecord> = std::mem::take(&mut self.buckets)
            .into_values()
            .flatten()
            .collect();
        if !stale.is_empty() {
            records.retain(|record| !stale.contains(record.uri()));
        }
        records.extend(extract_files(files));
        self.replace(records)
    }

    /// Records declared under the prefixed `name`.
    pub fn lookup(&self, name: &str) -> &[SymbolRecord] {
        self.buckets.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fuzzy_search(&self, query: &str) -> Vec<SymbolRecord> {
        self.search.search(query)
    }

    /// Every record in the current generation.
    pub fn records(&self) -> Vec<SymbolRecord> {
        let mut records: Vec<SymbolRecord> = self.buckets.values().flatten().cloned().collect();
        sort_records(&mut records);
        records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of distinct names.
    pub fn name_count(&self) -> usize {
        self.buckets.len()
    }

    fn replace(&mut self, mut records: Vec<SymbolRecord>) -> Vec<SymbolRecord> {
        sort_records(&mut records);
        let mut buckets: HashMap<String, Vec<SymbolRecord>> = HashMap::new();
        for record in &records {
            buckets
                .entry(record.name.clone())
                .or_default()
                .push(record.clone());
        }
        self.buckets = buckets;
        self.search = FuzzySearch::new(records.clone());
        records
    }
}

fn sort_records(records: &mut [SymbolRecord]) {
    records.sort_by(|a, b| a.index_order().cmp(&b.index_order()));
}
