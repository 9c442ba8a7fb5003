//! Completion over the static lexicon.
//!
//! Two operations, both independent of document state:
//!
//! - [`static_catalog`] answers `textDocument/completion` with the full fixed
//!   catalog, ignoring cursor position and trigger context entirely;
//! - [`resolve`] answers `completionItem/resolve` by attaching the
//!   human-readable category and the documentation string for the item's
//!   label.

use tower_lsp::lsp_types::{CompletionItem, Documentation};

pub mod lexicon;

use self::lexicon::Category;

/// The initial completion list: every lexicon entry, tagged with its category
/// so the resolve step knows which documentation table to consult.
pub fn static_catalog() -> Vec<CompletionItem> {
    lexicon::CATALOG
        .iter()
        .map(|&(label, category)| CompletionItem {
            label: label.to_string(),
            kind: Some(category.completion_kind()),
            data: serde_json::to_value(category).ok(),
            ..Default::default()
        })
        .collect()
}

/// Enrich a completion item with its category detail and documentation.
///
/// Items whose `data` field carries no recognizable category tag are returned
/// unchanged. A label with no documentation in its category keeps only the
/// category detail.
pub fn resolve(mut item: CompletionItem) -> CompletionItem {
    let category = item
        .data
        .as_ref()
        .and_then(|data| serde_json::from_value::<Category>(data.clone()).ok());
    let Some(category) = category else {
        return item;
    };

    item.detail = Some(category.detail().to_string());
    if let Some(documentation) = lexicon::documentation(category, &item.label) {
        item.documentation = Some(Documentation::String(documentation));
    }
    item
}
