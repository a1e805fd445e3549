//! Custom requests the server sends to the editor extension.
//!
//!     The extension owns the workspace view (open buffers, excludes, remote file systems), so by
//!     default the server asks it for file contents instead of reading the disk. Files come
//!     back keyed by uri.

use goodenough_index::{FileEntry, FileProvider, ProviderError};
use lsp_types::request::Request;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tower_lsp::async_trait;
use tower_lsp::lsp_types::Url;
use tower_lsp::Client;

pub enum GetAllFiles {}

impl Request for GetAllFiles {
    type Params = ();
    type Result = HashMap<Url, FileEntry>;
    const METHOD: &'static str = "goodEnoughScalaGetAllFiles";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetFilesParams {
    pub uris: Vec<Url>,
}

pub enum GetFiles {}

impl Request for GetFiles {
    type Params = GetFilesParams;
    type Result = HashMap<Url, FileEntry>;
    const METHOD: &'static str = "goodEnoughScalaGetFiles";
}

pub enum GetRelPath {}

impl Request for GetRelPath {
    type Params = Url;
    type Result = String;
    const METHOD: &'static str = "goodEnoughScalaGetRelPath";
}

pub enum MachineId {}

impl Request for MachineId {
    type Params = ();
    type Result = String;
    const METHOD: &'static str = "goodEnoughScalaMachineId";
}

fn request_error(method: &str, err: tower_lsp::jsonrpc::Error) -> ProviderError {
    ProviderError::Request {
        method: method.to_string(),
        message: err.message.to_string(),
    }
}

/// Sorted by uri so indexing order does not depend on map iteration.
fn into_entries(files: HashMap<Url, FileEntry>) -> Vec<FileEntry> {
    let mut entries: Vec<FileEntry> = files.into_values().collect();
    entries.sort_by(|a, b| a.uri.cmp(&b.uri));
    entries
}

/// [`FileProvider`] backed by the editor extension.
#[derive(Clone)]
pub struct ClientFileProvider {
    client: Client,
}

impl ClientFileProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileProvider for ClientFileProvider {
    async fn get_files(&self, uris: &[Url]) -> Result<Vec<FileEntry>, ProviderError> {
        let params = GetFilesParams {
            uris: uris.to_vec(),
        };
        self.client
            .send_request::<GetFiles>(params)
            .await
            .map(into_entries)
            .map_err(|err| request_error(GetFiles::METHOD, err))
    }

    async fn get_all_files(&self) -> Result<Vec<FileEntry>, ProviderError> {
        self.client
            .send_request::<GetAllFiles>(())
            .await
            .map(into_entries)
            .map_err(|err| request_error(GetAllFiles::METHOD, err))
    }

    async fn get_relative_path(&self, uri: &Url) -> Result<String, ProviderError> {
        self.client
            .send_request::<GetRelPath>(uri.clone())
            .await
            .map_err(|err| request_error(GetRelPath::METHOD, err))
    }
}
