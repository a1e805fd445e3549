//! In-memory collaborators and fixtures shared by unit tests and downstream crates.

use crate::analytics::Analytics;
use crate::error::ProviderError;
use crate::files::{FileEntry, FileProvider};
use crate::symbol::SourceFile;
use async_trait::async_trait;
use lsp_types::Url;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn uri(path: &str) -> Url {
    Url::parse(&format!("file:///{path}")).unwrap()
}

pub fn file(path: &str, contents: &str) -> FileEntry {
    FileEntry::new(uri(path), path, contents)
}

pub fn source_file(path: &str) -> Arc<SourceFile> {
    Arc::new(SourceFile {
        uri: uri(path),
        relative_path: path.to_string(),
    })
}

/// File provider backed by a map. Contents can be swapped between calls.
#[derive(Default)]
pub struct MemoryFileProvider {
    files: Mutex<BTreeMap<Url, FileEntry>>,
    get_files_calls: AtomicUsize,
    get_all_files_calls: AtomicUsize,
    fail: Mutex<bool>,
}

impl MemoryFileProvider {
    pub fn new<I>(files: I) -> Self
    where
        I: IntoIterator<Item = FileEntry>,
    {
        let provider = Self::default();
        for entry in files {
            provider.put(entry);
        }
        provider
    }

    pub fn put(&self, entry: FileEntry) {
        self.files.lock().unwrap().insert(entry.uri.clone(), entry);
    }

    pub fn delete(&self, uri: &Url) {
        self.files.lock().unwrap().remove(uri);
    }

    /// Make every subsequent request fail.
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn get_files_calls(&self) -> usize {
        self.get_files_calls.load(Ordering::SeqCst)
    }

    pub fn get_all_files_calls(&self) -> usize {
        self.get_all_files_calls.load(Ordering::SeqCst)
    }

    fn check(&self, method: &str) -> Result<(), ProviderError> {
        if *self.fail.lock().unwrap() {
            return Err(ProviderError::Request {
                method: method.to_string(),
                message: "provider offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FileProvider for MemoryFileProvider {
    async fn get_files(&self, uris: &[Url]) -> Result<Vec<FileEntry>, ProviderError> {
        self.get_files_calls.fetch_add(1, Ordering::SeqCst);
        self.check("getFiles")?;
        let files = self.files.lock().unwrap();
        Ok(uris.iter().filter_map(|uri| files.get(uri).cloned()).collect())
    }

    async fn get_all_files(&self) -> Result<Vec<FileEntry>, ProviderError> {
        self.get_all_files_calls.fetch_add(1, Ordering::SeqCst);
        self.check("getAllFiles")?;
        Ok(self.files.lock().unwrap().values().cloned().collect())
    }

    async fn get_relative_path(&self, uri: &Url) -> Result<String, ProviderError> {
        self.check("getRelPath")?;
        self.files
            .lock()
            .unwrap()
            .get(uri)
            .map(|entry| entry.relative_path.clone())
            .ok_or_else(|| ProviderError::NotFound(uri.clone()))
    }
}

/// Analytics sink that remembers what it was told.
#[derive(Default)]
pub struct RecordingAnalytics {
    pub events: Mutex<Vec<(String, String, Option<String>, Option<u64>)>>,
    pub timings: Mutex<Vec<(String, String)>>,
}

impl Analytics for RecordingAnalytics {
    fn track_event(&self, category: &str, action: &str, label: Option<&str>, value: Option<u64>) {
        self.events.lock().unwrap().push((
            category.to_string(),
            action.to_string(),
            label.map(str::to_string),
            value,
        ));
    }

    fn track_timing(&self, category: &str, action: &str, _duration: Duration) {
        self.timings
            .lock()
            .unwrap()
            .push((category.to_string(), action.to_string()));
    }
}
