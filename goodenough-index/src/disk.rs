//! File provider reading straight from the workspace folders on disk.

use crate::error::ProviderError;
use crate::files::{FileEntry, FileProvider};
use async_trait::async_trait;
use ignore::WalkBuilder;
use lsp_types::Url;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Walks the workspace roots, honouring `.gitignore`, and keeps files whose name ends in one
/// of the configured extensions.
#[derive(Clone)]
pub struct DiskFileProvider {
    roots: Arc<RwLock<Vec<PathBuf>>>,
    extensions: Arc<Vec<String>>,
}

impl DiskFileProvider {
    pub fn new<I, S>(roots: Vec<PathBuf>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roots: Arc::new(RwLock::new(roots)),
            extensions: Arc::new(extensions.into_iter().map(Into::into).collect()),
        }
    }

    /// Replace the workspace roots, e.g. once the client has announced its folders.
    pub fn set_roots(&self, roots: Vec<PathBuf>) {
        if let Ok(mut current) = self.roots.write() {
            *current = roots;
        }
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.read().map(|roots| roots.clone()).unwrap_or_default()
    }

    fn is_source(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|ext| {
            name.len() > ext.len() + 1
                && name.ends_with(ext.as_str())
                && name[..name.len() - ext.len()].ends_with('.')
        })
    }

    fn relative_path(&self, path: &Path) -> String {
        self.roots()
            .iter()
            .filter(|root| path.starts_with(root))
            .find_map(|root| pathdiff::diff_paths(path, root))
            .unwrap_or_else(|| path.to_path_buf())
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn walk(&self) -> Result<Vec<PathBuf>, ProviderError> {
        let mut paths = Vec::new();
        for root in self.roots() {
            let walker = WalkBuilder::new(&root)
                .hidden(true)
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true)
                .require_git(false)
                .build();
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_some_and(|ft| ft.is_file()) && self.is_source(entry.path())
                {
                    paths.push(entry.into_path());
                }
            }
        }
        paths.sort();
        Ok(paths)
    }

    async fn read(&self, path: &Path) -> Result<FileEntry, ProviderError> {
        let uri = Url::from_file_path(path).map_err(|_| ProviderError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path is not absolute"),
        })?;
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ProviderError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(FileEntry::new(uri, self.relative_path(path), contents))
    }
}

fn to_path(uri: &Url) -> Result<PathBuf, ProviderError> {
    uri.to_file_path()
        .map_err(|_| ProviderError::InvalidUri(uri.clone()))
}

#[async_trait]
impl FileProvider for DiskFileProvider {
    /// Missing or unreadable files are skipped.
    async fn get_files(&self, uris: &[Url]) -> Result<Vec<FileEntry>, ProviderError> {
        let mut files = Vec::with_capacity(uris.len());
        for uri in uris {
            let path = to_path(uri)?;
            match self.read(&path).await {
                Ok(entry) => files.push(entry),
                Err(err) => tracing::debug!(%uri, error = %err, "skipping unreadable file"),
            }
        }
        Ok(files)
    }

    async fn get_all_files(&self) -> Result<Vec<FileEntry>, ProviderError> {
        let provider = self.clone();
        let paths = tokio::task::spawn_blocking(move || provider.walk())
            .await
            .map_err(|err| ProviderError::Request {
                method: "walk".to_string(),
                message: err.to_string(),
            })??;

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read(&path).await {
                Ok(entry) => files.push(entry),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "skipping file"),
            }
        }
        tracing::debug!(count = files.len(), "read workspace files from disk");
        Ok(files)
    }

    async fn get_relative_path(&self, uri: &Url) -> Result<String, ProviderError> {
        Ok(self.relative_path(&to_path(uri)?))
    }
}
