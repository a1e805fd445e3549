//! Symbol-at-position queries.

use crate::error::QueryError;
use crate::files::FileStore;
use crate::index::SymbolIndex;
use crate::symbol::SymbolRecord;
use crate::term::{scan_term, Term};
use lsp_types::{Position, Url};
use tokio::sync::RwLock;

/// Records named like `term`, minus the declaration the cursor sits on.
///
/// A record is treated as the cursor's own declaration when it is in the same file, on the same
/// line, and starts inside the term's character range. Kinds are not compared.
pub fn symbols_for_term(
    index: &SymbolIndex,
    uri: &Url,
    line: u32,
    term: &Term,
) -> Vec<SymbolRecord> {
    if term.is_empty() {
        return Vec::new();
    }
    index
        .lookup(&term.name)
        .iter()
        .filter(|record| {
            !(record.uri() == uri
                && record.location.line == line
                && term.range.contains(record.location.character))
        })
        .cloned()
        .collect()
}

/// Resolve the term under `position` and look it up.
pub async fn symbols_for_position(
    index: &RwLock<SymbolIndex>,
    files: &FileStore,
    uri: &Url,
    position: Position,
) -> Result<Vec<SymbolRecord>, QueryError> {
    let line = files.line(uri, position.line).await?;
    let term = scan_term(&line, position.character);
    let index = index.read().await;
    Ok(symbols_for_term(&index, uri, position.line, &term))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::DeclarationKind;
    use crate::testing::{file, uri, MemoryFileProvider};
    use std::sync::Arc;
    use std::time::Duration;

    async fn setup(files: Vec<crate::files::FileEntry>) -> (RwLock<SymbolIndex>, FileStore) {
        let mut index = SymbolIndex::new();
        index.rebuild_all(&files);
        let store = FileStore::new(
            Arc::new(MemoryFileProvider::default()),
            Duration::from_millis(500),
        );
        store.update(files).await;
        (RwLock::new(index), store)
    }

    #[tokio::test]
    async fn cursor_on_declaration_excludes_itself() {
        let (index, store) = setup(vec![file("A.scala", "class Foo")]).await;
        let found = symbols_for_position(&index, &store, &uri("A.scala"), Position::new(0, 7))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn usage_in_another_file_finds_the_declaration() {
        let (index, store) = setup(vec![
            file("A.scala", "class Foo"),
            file("B.scala", "package b\n\nval x = new Foo()"),
        ])
        .await;
        let found = symbols_for_position(&index, &store, &uri("B.scala"), Position::new(2, 13))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uri(), &uri("A.scala"));
        assert_eq!(found[0].location.line, 0);
        assert_eq!(found[0].kind, DeclarationKind::Class);
    }

    #[tokio::test]
    async fn other_declarations_of_the_same_name_survive() {
        let (index, store) = setup(vec![file(
            "A.scala",
            "class Foo\nobject Foo {\n  val Foo = 1\n}",
        )])
        .await;
        let found = symbols_for_position(&index, &store, &uri("A.scala"), Position::new(1, 8))
            .await
            .unwrap();
        let lines: Vec<u32> = found.iter().map(|r| r.location.line).collect();
        assert_eq!(lines, [0, 2]);
    }

    #[tokio::test]
    async fn same_name_on_the_same_line_outside_the_term_is_kept() {
        let (index, store) = setup(vec![file("A.scala", "val ab = 1; def ab = 2")]).await;
        let found = symbols_for_position(&index, &store, &uri("A.scala"), Position::new(0, 5))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, DeclarationKind::Function);
    }

    #[tokio::test]
    async fn punctuation_under_the_cursor_finds_nothing() {
        let (index, store) = setup(vec![
            file("A.scala", "class Foo"),
            file("B.scala", "new Foo()"),
        ])
        .await;
        let found = symbols_for_position(&index, &store, &uri("B.scala"), Position::new(0, 7))
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn unknown_file_is_an_error_for_the_caller_to_degrade() {
        let (index, store) = setup(vec![]).await;
        let result =
            symbols_for_position(&index, &store, &uri("Z.scala"), Position::new(0, 0)).await;
        assert!(matches!(result, Err(QueryError::ContentUnavailable(_))));
    }
}
