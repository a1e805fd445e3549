//! The symbol service: owns the index, the file cache and the update scheduler.
//!
//!     Every entry point an editor integration needs lives here. Lookups never fail outward;
//!     missing content degrades to an empty result and a warning. Edits are funnelled through
//!     the debounced scheduler, while full and explicit re-indexing apply immediately.

use crate::analytics::{Analytics, Timer};
use crate::error::ProviderError;
use crate::files::{FileEntry, FileProvider, FileStore};
use crate::imports::{organize_imports, LineEdit};
use crate::index::SymbolIndex;
use crate::query::symbols_for_position;
use crate::scheduler::{BatchSink, UpdateBatch, UpdateScheduler};
use crate::symbol::SymbolRecord;
use async_trait::async_trait;
use lsp_types::{Position, Url};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Timing knobs for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Quiet period before a batch of edits is indexed.
    pub debounce: Duration,
    /// How long an edited file ignores watched-file notifications.
    pub just_changed_grace: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(150),
            just_changed_grace: Duration::from_millis(500),
        }
    }
}

/// What happened to a watched file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchedChange {
    Created,
    Changed,
    Deleted,
}

struct IndexState {
    index: RwLock<SymbolIndex>,
    files: FileStore,
    analytics: Arc<dyn Analytics>,
}

impl IndexState {
    async fn apply_update(&self, files: Vec<FileEntry>, deleted: Vec<Url>) -> Vec<SymbolRecord> {
        let timer = Timer::start("action", "indexChanged");
        self.files.update(files.iter().cloned()).await;
        self.files.remove(&deleted).await;
        let (records, names) = {
            let mut index = self.index.write().await;
            let records = index.update_files(&files, &deleted);
            (records, index.name_count())
        };
        tracing::info!(
            files = files.len(),
            deleted = deleted.len(),
            names,
            "Indexed {} symbols in {} ms",
            records.len(),
            timer.elapsed().as_millis()
        );
        timer.finish(self.analytics.as_ref(), Some(records.len()));
        records
    }
}

#[async_trait]
impl BatchSink for IndexState {
    async fn apply(&self, batch: UpdateBatch) {
        let (files, deleted) = batch.into_parts();
        self.apply_update(files, deleted).await;
    }
}

pub struct SymbolService {
    state: Arc<IndexState>,
    scheduler: UpdateScheduler,
}

impl SymbolService {
    /// Build the service and start its scheduler. Must be called from within a tokio runtime.
    pub fn new(
        provider: Arc<dyn FileProvider>,
        analytics: Arc<dyn Analytics>,
        options: ServiceOptions,
    ) -> Self {
        let state = Arc::new(IndexState {
            index: RwLock::new(SymbolIndex::new()),
            files: FileStore::new(provider, options.just_changed_grace),
            analytics,
        });
        let scheduler = UpdateScheduler::spawn(options.debounce, state.clone());
        Self { state, scheduler }
    }

    fn provider(&self) -> &Arc<dyn FileProvider> {
        self.state.files.provider()
    }

    /// Re-index the whole workspace.
    ///
    /// Edits still waiting in the scheduler are folded in: pending contents replace what the
    /// provider returned and pending deletions drop files. If the provider fails the pending
    /// batch is applied on its own so it is not lost.
    pub async fn index_all(&self) -> Result<Vec<SymbolRecord>, ProviderError> {
        let timer = Timer::start("action", "indexAll");
        let (pending, _applying) = self.scheduler.take_pending().await;

        let mut files = match self.provider().get_all_files().await {
            Ok(files) => files,
            Err(err) => {
                tracing::error!(error = %err, "failed to fetch workspace files");
                if let Some(batch) = pending {
                    let (files, deleted) = batch.into_parts();
                    self.state.apply_update(files, deleted).await;
                }
                return Err(err);
            }
        };

        let mut deleted = Vec::new();
        if let Some(batch) = pending {
            files.retain(|file| !batch.is_deleted(&file.uri) && batch.file(&file.uri).is_none());
            let (pending_files, pending_deleted) = batch.into_parts();
            files.extend(pending_files);
            deleted = pending_deleted;
        }

        self.state.files.remove(&deleted).await;
        self.state.files.update(files.iter().cloned()).await;
        let (records, names) = {
            let mut index = self.state.index.write().await;
            let records = index.rebuild_all(&files);
            (records, index.name_count())
        };
        tracing::info!(
            files = files.len(),
            names,
            "Indexed {} symbols in {} ms",
            records.len(),
            timer.elapsed().as_millis()
        );
        timer.finish(self.state.analytics.as_ref(), Some(records.len()));
        Ok(records)
    }

    /// Index `files` right away, bypassing the debounce window.
    pub async fn index_files(&self, files: Vec<FileEntry>) -> Vec<SymbolRecord> {
        let (pending, _applying) = self.scheduler.take_pending().await;
        let mut batch = pending.unwrap_or_default();
        batch.merge(files, Vec::new());
        let (files, deleted) = batch.into_parts();
        self.state.apply_update(files, deleted).await
    }

    pub async fn definition_lookup(&self, uri: &Url, position: Position) -> Vec<SymbolRecord> {
        self.lookup_at("definition", uri, position).await
    }

    pub async fn hover_lookup(&self, uri: &Url, position: Position) -> Vec<SymbolRecord> {
        self.lookup_at("hover", uri, position).await
    }

    async fn lookup_at(
        &self,
        action: &'static str,
        uri: &Url,
        position: Position,
    ) -> Vec<SymbolRecord> {
        let timer = Timer::start("lookup", action);
        let records =
            match symbols_for_position(&self.state.index, &self.state.files, uri, position).await {
                Ok(records) => records,
                Err(err) => {
                    tracing::warn!(%uri, line = position.line, error = %err, "{action} lookup failed");
                    Vec::new()
                }
            };
        timer.finish(self.state.analytics.as_ref(), Some(records.len()));
        records
    }

    pub async fn workspace_symbol_search(&self, query: &str) -> Vec<SymbolRecord> {
        let timer = Timer::start("lookup", "workspaceSymbol");
        let records = self.state.index.read().await.fuzzy_search(query);
        timer.finish(self.state.analytics.as_ref(), Some(records.len()));
        records
    }

    /// Remember the text of a freshly opened document without re-indexing it.
    pub async fn notify_opened(&self, uri: &Url, text: String) {
        let relative_path = self.state.files.relative_path(uri).await;
        self.state
            .files
            .update([FileEntry::new(uri.clone(), relative_path, text)])
            .await;
    }

    /// A live edit. The full new text is queued for the next debounce flush.
    pub async fn notify_changed(&self, uri: &Url, text: String) {
        self.state.files.mark_just_changed(uri);
        let relative_path = self.state.files.relative_path(uri).await;
        let entry = FileEntry::new(uri.clone(), relative_path, text);
        self.state.files.update([entry.clone()]).await;
        self.scheduler.schedule(vec![entry], Vec::new()).await;
    }

    /// A save. Uses the pushed text when the client sent it, otherwise asks the provider.
    pub async fn notify_saved(&self, uri: &Url, text: Option<String>) {
        match text {
            Some(text) => self.notify_changed(uri, text).await,
            None => {
                let uris = std::slice::from_ref(uri);
                match self.provider().get_files(uris).await {
                    Ok(files) => self.scheduler.schedule(files, Vec::new()).await,
                    Err(err) => tracing::warn!(%uri, error = %err, "failed to fetch saved file"),
                }
            }
        }
    }

    pub async fn notify_watched_change(&self, uri: &Url, kind: WatchedChange) {
        self.notify_watched_changes(vec![(uri.clone(), kind)]).await;
    }

    /// Created and changed files are re-fetched unless an editor just touched them; deleted
    /// files are dropped.
    pub async fn notify_watched_changes(&self, changes: Vec<(Url, WatchedChange)>) {
        let mut refetch = Vec::new();
        let mut deleted = Vec::new();
        for (uri, kind) in changes {
            match kind {
                WatchedChange::Deleted => deleted.push(uri),
                WatchedChange::Created | WatchedChange::Changed => {
                    if self.state.files.is_just_changed(&uri) {
                        tracing::debug!(%uri, "skipping watched change for a live document");
                    } else {
                        refetch.push(uri);
                    }
                }
            }
        }

        let mut files = Vec::new();
        if !refetch.is_empty() {
            match self.provider().get_files(&refetch).await {
                Ok(fetched) => files = fetched,
                Err(err) => {
                    tracing::warn!(count = refetch.len(), error = %err, "failed to fetch changed files")
                }
            }
        }
        self.scheduler.schedule(files, deleted).await;
    }

    /// Line edits that sort the import groups of `uri`.
    pub async fn organize_imports(&self, uri: &Url) -> Vec<LineEdit> {
        let timer = Timer::start("action", "organizeImports");
        let edits = match self.state.files.get(uri).await {
            Ok(entry) => organize_imports(&entry.contents),
            Err(err) => {
                tracing::warn!(%uri, error = %err, "cannot organize imports");
                Vec::new()
            }
        };
        timer.finish(self.state.analytics.as_ref(), Some(edits.len()));
        edits
    }

    /// Apply pending edits now. Returns whether anything was pending.
    pub async fn flush(&self) -> bool {
        self.scheduler.flush_now().await
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        tracing::info!("symbol service stopped");
    }

    pub async fn symbol_count(&self) -> usize {
        self.state.index.read().await.len()
    }

    pub async fn has_pending_updates(&self) -> bool {
        self.scheduler.has_pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{symbol_name, DeclarationKind};
    use crate::testing::{file, uri, MemoryFileProvider, RecordingAnalytics};
    use tokio::time::sleep;

    fn service(provider: Arc<MemoryFileProvider>) -> SymbolService {
        SymbolService::new(
            provider,
            Arc::new(crate::analytics::NoopAnalytics),
            ServiceOptions::default(),
        )
    }

    fn workspace() -> Arc<MemoryFileProvider> {
        Arc::new(MemoryFileProvider::new([
            file("A.scala", "class Foo"),
            file("B.scala", "package b\n\nval x = new Foo()"),
        ]))
    }

    async fn names(service: &SymbolService, raw: &str) -> usize {
        service
            .state
            .index
            .read()
            .await
            .lookup(&symbol_name(raw))
            .len()
    }

    #[tokio::test]
    async fn index_all_then_definition() {
        let provider = workspace();
        let service = service(provider.clone());
        let records = service.index_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(provider.get_all_files_calls(), 1);

        let found = service
            .definition_lookup(&uri("B.scala"), Position::new(2, 13))
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DeclarationKind::Class);
        assert_eq!(found[0].uri(), &uri("A.scala"));

        let own = service
            .definition_lookup(&uri("A.scala"), Position::new(0, 7))
            .await;
        assert!(own.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_are_indexed_once_with_the_last_text() {
        let provider = workspace();
        let analytics = Arc::new(RecordingAnalytics::default());
        let service = SymbolService::new(provider, analytics.clone(), ServiceOptions::default());
        service.index_all().await.unwrap();

        let target = uri("A.scala");
        service.notify_changed(&target, "class Fo".to_string()).await;
        sleep(Duration::from_millis(30)).await;
        service.notify_changed(&target, "class Foa".to_string()).await;
        sleep(Duration::from_millis(30)).await;
        service.notify_changed(&target, "class Foo2".to_string()).await;

        sleep(Duration::from_millis(100)).await;
        assert_eq!(names(&service, "Foo").await, 1);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(names(&service, "Foo").await, 0);
        assert_eq!(names(&service, "Foo2").await, 1);
        assert_eq!(names(&service, "Fo").await, 0);

        let applies = analytics
            .timings
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, action)| action == "indexChanged")
            .count();
        assert_eq!(applies, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn index_all_folds_in_pending_edits_and_deletions() {
        let provider = workspace();
        let service = service(provider);
        service
            .notify_changed(&uri("A.scala"), "class Bar".to_string())
            .await;
        service
            .notify_watched_change(&uri("B.scala"), WatchedChange::Deleted)
            .await;

        service.index_all().await.unwrap();
        assert!(!service.has_pending_updates().await);
        assert_eq!(names(&service, "Foo").await, 0);
        assert_eq!(names(&service, "Bar").await, 1);
        assert_eq!(service.symbol_count().await, 1);
        assert!(service.state.files.cached(&uri("B.scala")).await.is_none());
    }

    #[tokio::test]
    async fn index_all_failure_keeps_pending_work() {
        let provider = workspace();
        let service = service(provider.clone());
        service
            .notify_changed(&uri("C.scala"), "trait Pending".to_string())
            .await;
        provider.set_failing(true);

        assert!(service.index_all().await.is_err());
        assert_eq!(names(&service, "Pending").await, 1);
    }

    #[tokio::test]
    async fn lookups_degrade_to_empty_when_content_is_missing() {
        let provider = workspace();
        let service = service(provider.clone());
        service.index_all().await.unwrap();
        provider.set_failing(true);

        let found = service
            .hover_lookup(&uri("Unknown.scala"), Position::new(0, 0))
            .await;
        assert!(found.is_empty());
        let found = service
            .definition_lookup(&uri("B.scala"), Position::new(99, 0))
            .await;
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn index_files_applies_immediately() {
        let service = service(workspace());
        service.index_all().await.unwrap();
        service
            .index_files(vec![file("C.scala", "object Helpers")])
            .await;
        assert_eq!(names(&service, "Helpers").await, 1);
        assert_eq!(service.symbol_count().await, 2);
    }

    #[tokio::test]
    async fn workspace_search_is_fuzzy() {
        let service = service(Arc::new(MemoryFileProvider::new([file(
            "A.scala",
            "class UserRepository\nclass UserService\ndef render = 1",
        )])));
        service.index_all().await.unwrap();

        let found = service.workspace_symbol_search("usrepo").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_name, "UserRepository");
        assert_eq!(service.workspace_symbol_search("").await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn watched_changes_skip_live_documents() {
        let provider = workspace();
        let service = service(provider.clone());
        service.index_all().await.unwrap();

        service
            .notify_changed(&uri("A.scala"), "class Live".to_string())
            .await;
        provider.put(file("A.scala", "class Disk"));
        provider.put(file("C.scala", "class Created"));
        service
            .notify_watched_changes(vec![
                (uri("A.scala"), WatchedChange::Changed),
                (uri("C.scala"), WatchedChange::Created),
            ])
            .await;
        assert!(service.flush().await);

        assert_eq!(names(&service, "Live").await, 1);
        assert_eq!(names(&service, "Disk").await, 0);
        assert_eq!(names(&service, "Created").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_flush_carries_a_change_and_a_deletion() {
        let provider = Arc::new(MemoryFileProvider::new([
            file("A.scala", "class Foo"),
            file("B.scala", "trait Bar"),
            file("C.scala", "val keep = 1"),
        ]));
        let service = service(provider.clone());
        service.index_all().await.unwrap();
        assert_eq!(service.symbol_count().await, 3);

        provider.put(file("A.scala", "class Fresh"));
        provider.delete(&uri("B.scala"));
        service
            .notify_watched_changes(vec![
                (uri("A.scala"), WatchedChange::Changed),
                (uri("B.scala"), WatchedChange::Deleted),
            ])
            .await;
        assert!(service.has_pending_updates().await);
        assert!(service.flush().await);

        assert_eq!(names(&service, "Foo").await, 0);
        assert_eq!(names(&service, "Bar").await, 0);
        assert_eq!(names(&service, "Fresh").await, 1);
        assert_eq!(names(&service, "keep").await, 1);
        assert_eq!(service.symbol_count().await, 2);
        assert_eq!(service.workspace_symbol_search("fresh").await.len(), 1);
        assert_eq!(provider.get_all_files_calls(), 1);
        assert_eq!(provider.get_files_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn watched_changes_after_the_grace_period_are_refetched() {
        let provider = workspace();
        let service = service(provider.clone());
        service.index_all().await.unwrap();

        service
            .notify_changed(&uri("A.scala"), "class Live".to_string())
            .await;
        sleep(Duration::from_millis(600)).await;
        provider.put(file("A.scala", "class Disk"));
        service
            .notify_watched_change(&uri("A.scala"), WatchedChange::Changed)
            .await;
        service.flush().await;

        assert_eq!(names(&service, "Disk").await, 1);
        assert_eq!(names(&service, "Live").await, 0);
    }

    #[tokio::test]
    async fn save_without_text_refetches() {
        let provider = workspace();
        let service = service(provider.clone());
        service.index_all().await.unwrap();

        provider.put(file("A.scala", "class Saved"));
        service.notify_saved(&uri("A.scala"), None).await;
        service.flush().await;
        assert_eq!(names(&service, "Saved").await, 1);

        service
            .notify_saved(&uri("A.scala"), Some("class Pushed".to_string()))
            .await;
        service.flush().await;
        assert_eq!(names(&service, "Pushed").await, 1);
    }

    #[tokio::test]
    async fn opened_documents_answer_lookups_from_the_cache() {
        let provider = workspace();
        let service = service(provider.clone());
        service.index_all().await.unwrap();
        service
            .notify_opened(&uri("New.scala"), "val y = new Foo".to_string())
            .await;

        let found = service
            .definition_lookup(&uri("New.scala"), Position::new(0, 13))
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(service.symbol_count().await, 1);
    }

    #[tokio::test]
    async fn organize_imports_reads_current_contents() {
        let provider = Arc::new(MemoryFileProvider::new([file(
            "A.scala",
            "import b.B\nimport a.A\nclass A",
        )]));
        let service = service(provider);
        let edits = service.organize_imports(&uri("A.scala")).await;
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].new_text, "import a.A");
        assert!(service.organize_imports(&uri("Missing.scala")).await.is_empty());
    }

    #[tokio::test]
    async fn shutdown_applies_pending_edits() {
        let service = service(workspace());
        service
            .notify_changed(&uri("A.scala"), "class Late".to_string())
            .await;
        service.shutdown().await;
        assert_eq!(names(&service, "Late").await, 1);
    }
}
