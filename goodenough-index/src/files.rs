//! Source files, the provider seam and the local file cache.

use crate::error::{ProviderError, QueryError};
use crate::symbol::SourceFile;
use async_trait::async_trait;
use lsp_types::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// A file's full, current text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub uri: Url,
    pub relative_path: String,
    pub contents: String,
}

impl FileEntry {
    pub fn new(uri: Url, relative_path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            uri,
            relative_path: relative_path.into(),
            contents: contents.into(),
        }
    }

    pub fn source_file(&self) -> SourceFile {
        SourceFile {
            uri: self.uri.clone(),
            relative_path: self.relative_path.clone(),
        }
    }

    /// Text of a zero-based line, split on `\n` only.
    pub fn line(&self, line: u32) -> Option<&str> {
        self.contents.split('\n').nth(line as usize)
    }
}

/// Where file contents come from. Calls may cross a process boundary.
#[async_trait]
pub trait FileProvider: Send + Sync {
    async fn get_files(&self, uris: &[Url]) -> Result<Vec<FileEntry>, ProviderError>;

    async fn get_all_files(&self) -> Result<Vec<FileEntry>, ProviderError>;

    async fn get_relative_path(&self, uri: &Url) -> Result<String, ProviderError>;

    async fn get_file_contents(&self, uri: &Url) -> Result<String, ProviderError> {
        self.get_files(std::slice::from_ref(uri))
            .await?
            .into_iter()
            .find(|file| &file.uri == uri)
            .map(|file| file.contents)
            .ok_or_else(|| ProviderError::NotFound(uri.clone()))
    }
}

/// Cache of known file contents plus the short-lived "just changed" markers.
pub struct FileStore {
    provider: Arc<dyn FileProvider>,
    entries: RwLock<HashMap<Url, FileEntry>>,
    just_changed: Mutex<HashMap<Url, Instant>>,
    grace: Duration,
}

impl FileStore {
    pub fn new(provider: Arc<dyn FileProvider>, grace: Duration) -> Self {
        Self {
            provider,
            entries: RwLock::new(HashMap::new()),
            just_changed: Mutex::new(HashMap::new()),
            grace,
        }
    }

    pub fn provider(&self) -> &Arc<dyn FileProvider> {
        &self.provider
    }

    /// Replace cached entries wholesale.
    pub async fn update<I>(&self, files: I)
    where
        I: IntoIterator<Item = FileEntry>,
    {
        let mut entries = self.entries.write().await;
        for file in files {
            entries.insert(file.uri.clone(), file);
        }
    }

    pub async fn remove(&self, uris: &[Url]) {
        let mut entries = self.entries.write().await;
        for uri in uris {
            entries.remove(uri);
        }
    }

    pub async fn cached(&self, uri: &Url) -> Option<FileEntry> {
        self.entries.read().await.get(uri).cloned()
    }

    /// Cached entry, or fetch it from the provider and cache it.
    pub async fn get(&self, uri: &Url) -> Result<FileEntry, QueryError> {
        if let Some(entry) = self.cached(uri).await {
            return Ok(entry);
        }
        let fetched = self
            .provider
            .get_files(std::slice::from_ref(uri))
            .await?
            .into_iter()
            .find(|file| &file.uri == uri)
            .ok_or_else(|| QueryError::ContentUnavailable(uri.clone()))?;
        self.update([fetched.clone()]).await;
        Ok(fetched)
    }

    pub async fn line(&self, uri: &Url, line: u32) -> Result<String, QueryError> {
        let entry = self.get(uri).await?;
        entry
            .line(line)
            .map(str::to_string)
            .ok_or_else(|| QueryError::LineOutOfRange {
                uri: uri.clone(),
                line,
            })
    }

    pub async fn relative_path(&self, uri: &Url) -> String {
        if let Some(entry) = self.cached(uri).await {
            return entry.relative_path;
        }
        match self.provider.get_relative_path(uri).await {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(%uri, error = %err, "falling back to uri path");
                uri.path().trim_start_matches('/').to_string()
            }
        }
    }

    pub fn mark_just_changed(&self, uri: &Url) {
        let until = Instant::now() + self.grace;
        if let Ok(mut markers) = self.just_changed.lock() {
            markers.retain(|_, expiry| *expiry > Instant::now());
            markers.insert(uri.clone(), until);
        }
    }

    pub fn is_just_changed(&self, uri: &Url) -> bool {
        self.just_changed
            .lock()
            .map(|markers| {
                markers
                    .get(uri)
                    .is_some_and(|expiry| *expiry > Instant::now())
            })
            .unwrap_or(false)
    }
}
