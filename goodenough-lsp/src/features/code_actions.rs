//! The organize-imports source action.

use goodenough_index::LineEdit;
use std::collections::HashMap;
use tower_lsp::lsp_types::{
    CodeAction, CodeActionKind, Position, Range, TextEdit, Url, WorkspaceEdit,
};

pub const ORGANIZE_IMPORTS_TITLE: &str = "Organize imports";

/// Whether a `textDocument/codeAction` request with this `only` filter wants the action.
pub fn wants_organize_imports(only: Option<&[CodeActionKind]>) -> bool {
    match only {
        None => true,
        Some(kinds) => kinds.iter().any(|kind| {
            *kind == CodeActionKind::SOURCE || *kind == CodeActionKind::SOURCE_ORGANIZE_IMPORTS
        }),
    }
}

/// Each edit replaces a whole line. `None` when the imports are already sorted.
pub fn organize_imports_action(uri: &Url, edits: Vec<LineEdit>) -> Option<CodeAction> {
    if edits.is_empty() {
        return None;
    }
    let text_edits = edits
        .into_iter()
        .map(|edit| TextEdit {
            range: Range::new(
                Position::new(edit.line, 0),
                Position::new(edit.line, u32::MAX),
            ),
            new_text: edit.new_text,
        })
        .collect();
    Some(CodeAction {
        title: ORGANIZE_IMPORTS_TITLE.to_string(),
        kind: Some(CodeActionKind::SOURCE_ORGANIZE_IMPORTS),
        edit: Some(WorkspaceEdit {
            changes: Some(HashMap::from([(uri.clone(), text_edits)])),
            ..WorkspaceEdit::default()
        }),
        ..CodeAction::default()
    })
}
