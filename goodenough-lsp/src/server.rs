//! Main language server implementation

use std::path::PathBuf;
use std::sync::Arc;

use crate::features::code_actions::{organize_imports_action, wants_organize_imports};
use crate::features::definition::definition_locations;
use crate::features::hover::hover_markdown;
use crate::features::workspace_symbols::symbol_information;
use crate::requests::{ClientFileProvider, MachineId};
use goodenough_config::{
    ClientSettings, FeaturesConfig, FileSource, GoodEnoughConfig, IndexingConfig,
    CLIENT_SETTINGS_SECTION,
};
use goodenough_index::{
    DiskFileProvider, FileProvider, ServiceOptions, SymbolService, TracingAnalytics,
    WatchedChange,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::async_trait;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CodeActionKind, CodeActionOptions, CodeActionOrCommand, CodeActionParams,
    CodeActionProviderCapability, CodeActionResponse, ConfigurationItem,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidChangeWatchedFilesParams,
    DidChangeWatchedFilesRegistrationOptions, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, FileChangeType, FileSystemWatcher, GlobPattern,
    GotoDefinitionParams, GotoDefinitionResponse, Hover, HoverContents, HoverParams,
    HoverProviderCapability, InitializeParams, InitializeResult, InitializedParams,
    MarkupContent, MarkupKind, MessageType, OneOf, Registration, SaveOptions, ServerCapabilities,
    ServerInfo, SymbolInformation, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, TextDocumentSyncSaveOptions, WorkspaceSymbolParams,
};
use tower_lsp::Client;

/// The slice of the client connection the server uses. Tests substitute a recording double.
#[async_trait]
pub trait LspClient: Send + Sync + Clone + 'static {
    async fn log_message(&self, typ: MessageType, message: String);

    async fn register_capability(&self, registrations: Vec<Registration>) -> Result<()>;

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>>;

    async fn machine_id(&self) -> Result<String>;
}

#[async_trait]
impl LspClient for Client {
    async fn log_message(&self, typ: MessageType, message: String) {
        Client::log_message(self, typ, message).await
    }

    async fn register_capability(&self, registrations: Vec<Registration>) -> Result<()> {
        Client::register_capability(self, registrations).await
    }

    async fn configuration(&self, items: Vec<ConfigurationItem>) -> Result<Vec<Value>> {
        Client::configuration(self, items).await
    }

    async fn machine_id(&self) -> Result<String> {
        self.send_request::<MachineId>(()).await
    }
}

pub struct GoodEnoughLanguageServer<C = Client> {
    client: C,
    service: SymbolService,
    analytics: Arc<TracingAnalytics>,
    features: RwLock<FeaturesConfig>,
    indexing: IndexingConfig,
    disk: Option<DiskFileProvider>,
}

impl GoodEnoughLanguageServer<Client> {
    /// Build a server reading files from wherever `config` says.
    pub fn new(client: Client, config: GoodEnoughConfig) -> Self {
        match config.indexing.file_source {
            FileSource::Client => {
                let provider = Arc::new(ClientFileProvider::new(client.clone()));
                Self::with_provider(client, provider, config)
            }
            FileSource::Disk => Self::with_disk(client, config),
        }
    }
}

impl<C> GoodEnoughLanguageServer<C>
where
    C: LspClient,
{
    pub fn with_provider(
        client: C,
        provider: Arc<dyn FileProvider>,
        config: GoodEnoughConfig,
    ) -> Self {
        let analytics = Arc::new(TracingAnalytics::new(config.features.analytics_enabled));
        let options = ServiceOptions {
            debounce: config.indexing.debounce(),
            just_changed_grace: config.indexing.just_changed_grace(),
        };
        let service = SymbolService::new(provider, analytics.clone(), options);
        Self {
            client,
            service,
            analytics,
            features: RwLock::new(config.features),
            indexing: config.indexing,
            disk: None,
        }
    }

    /// Read the workspace folders directly. Roots are taken from `initialize`.
    pub fn with_disk(client: C, config: GoodEnoughConfig) -> Self {
        let disk = DiskFileProvider::new(Vec::new(), config.indexing.extensions.clone());
        let mut server = Self::with_provider(client, Arc::new(disk.clone()), config);
        server.disk = Some(disk);
        server
    }

    async fn report(&self, typ: MessageType, message: String) {
        if typ == MessageType::ERROR {
            tracing::error!("{message}");
        } else {
            tracing::info!("{message}");
        }
        self.client.log_message(typ, message).await;
    }

    async fn apply_settings(&self, settings: ClientSettings) {
        let mut features = self.features.write().await;
        settings.apply(&mut features);
        self.analytics.set_enabled(features.analytics_enabled);
        tracing::debug!(?features, "applied client settings");
    }

    async fn pull_settings(&self) {
        let items = vec![ConfigurationItem {
            scope_uri: None,
            section: Some(CLIENT_SETTINGS_SECTION.to_string()),
        }];
        match self.client.configuration(items).await {
            Ok(values) => {
                let settings = values
                    .first()
                    .map(ClientSettings::from_section)
                    .unwrap_or_default();
                self.apply_settings(settings).await;
            }
            Err(err) => tracing::warn!(error = %err, "could not read client settings"),
        }
    }

    async fn register_capabilities(&self) {
        let watchers = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(watch_pattern(&self.indexing.extensions)),
                kind: None,
            }],
        };
        let registrations = vec![
            Registration {
                id: "goodenough-configuration".to_string(),
                method: "workspace/didChangeConfiguration".to_string(),
                register_options: None,
            },
            Registration {
                id: "goodenough-watched-files".to_string(),
                method: "workspace/didChangeWatchedFiles".to_string(),
                register_options: serde_json::to_value(watchers).ok(),
            },
        ];
        if let Err(err) = self.client.register_capability(registrations).await {
            tracing::warn!(error = %err, "dynamic registration rejected");
        }
    }

    async fn index_workspace(&self) {
        match self.service.index_all().await {
            Ok(records) => {
                self.report(
                    MessageType::INFO,
                    format!("Indexed {} scala symbols", records.len()),
                )
                .await
            }
            Err(err) => {
                self.report(
                    MessageType::ERROR,
                    format!("Failed to index workspace: {err}"),
                )
                .await
            }
        }
    }
}

fn watch_pattern(extensions: &[String]) -> String {
    format!("**/*.{{{}}}", extensions.join(","))
}

#[allow(deprecated)]
fn workspace_roots(params: &InitializeParams) -> Vec<PathBuf> {
    let from_folders: Vec<PathBuf> = params
        .workspace_folders
        .iter()
        .flatten()
        .filter_map(|folder| folder.uri.to_file_path().ok())
        .collect();
    if !from_folders.is_empty() {
        return from_folders;
    }
    params
        .root_uri
        .iter()
        .filter_map(|uri| uri.to_file_path().ok())
        .collect()
}

fn watched_change(typ: FileChangeType) -> Option<WatchedChange> {
    if typ == FileChangeType::CREATED {
        Some(WatchedChange::Created)
    } else if typ == FileChangeType::CHANGED {
        Some(WatchedChange::Changed)
    } else if typ == FileChangeType::DELETED {
        Some(WatchedChange::Deleted)
    } else {
        None
    }
}

#[async_trait]
impl<C> tower_lsp::LanguageServer for GoodEnoughLanguageServer<C>
where
    C: LspClient,
{
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(disk) = &self.disk {
            let roots = workspace_roots(&params);
            tracing::info!(?roots, "reading workspace from disk");
            disk.set_roots(roots);
        }

        let capabilities = ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(true),
                    })),
                    ..TextDocumentSyncOptions::default()
                },
            )),
            definition_provider: Some(OneOf::Left(true)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            workspace_symbol_provider: Some(OneOf::Left(true)),
            code_action_provider: Some(CodeActionProviderCapability::Options(
                CodeActionOptions {
                    code_action_kinds: Some(vec![CodeActionKind::SOURCE_ORGANIZE_IMPORTS]),
                    ..CodeActionOptions::default()
                },
            )),
            ..ServerCapabilities::default()
        };

        Ok(InitializeResult {
            capabilities,
            server_info: Some(ServerInfo {
                name: "goodenough-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.register_capabilities().await;
        self.pull_settings().await;
        match self.client.machine_id().await {
            Ok(id) => self.analytics.init(id),
            Err(err) => tracing::debug!(error = %err, "client did not report a machine id"),
        }
        self.index_workspace().await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.service.shutdown().await;
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.service.notify_opened(&document.uri, document.text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        if let Some(change) = params.content_changes.into_iter().last() {
            self.service
                .notify_changed(&params.text_document.uri, change.text)
                .await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.service
            .notify_saved(&params.text_document.uri, params.text)
            .await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = ClientSettings::from_notification(&params.settings);
        if settings == ClientSettings::default() {
            self.pull_settings().await;
        } else {
            self.apply_settings(settings).await;
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let changes = params
            .changes
            .into_iter()
            .filter_map(|event| watched_change(event.typ).map(|kind| (event.uri, kind)))
            .collect();
        self.service.notify_watched_changes(changes).await;
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let position = params.text_document_position_params;
        let records = self
            .service
            .definition_lookup(&position.text_document.uri, position.position)
            .await;
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(GotoDefinitionResponse::Array(definition_locations(
            &records,
        ))))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        if !self.features.read().await.hover_enabled {
            return Ok(None);
        }
        let position = params.text_document_position_params;
        let records = self
            .service
            .hover_lookup(&position.text_document.uri, position.position)
            .await;
        Ok(hover_markdown(&records).map(|value| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: None,
        }))
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> Result<Option<Vec<SymbolInformation>>> {
        let records = self.service.workspace_symbol_search(&params.query).await;
        Ok(Some(symbol_information(&records)))
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        if !wants_organize_imports(params.context.only.as_deref()) {
            return Ok(None);
        }
        let uri = params.text_document.uri;
        let edits = self.service.organize_imports(&uri).await;
        Ok(organize_imports_action(&uri, edits)
            .map(|action| vec![CodeActionOrCommand::CodeAction(action)]))
    }
}
