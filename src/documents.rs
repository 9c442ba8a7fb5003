//! Open-document tracking.
//!
//! Documents live here from `didOpen` to `didClose`. Content is stored as a
//! rope so incremental change events splice in O(log n), and so diagnostics
//! can translate flat char offsets back to line/column positions. The store
//! keeps no diagnostics; it only feeds the validator with current full text.

use std::collections::HashMap;

use ropey::Rope;
use tokio::sync::RwLock;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

/// One open text document: current content, version counter and language id.
#[derive(Debug, Clone)]
pub struct Document {
    text: Rope,
    version: i32,
    language_id: String,
}

impl Document {
    pub fn new(text: &str, version: i32, language_id: impl Into<String>) -> Self {
        Document {
            text: Rope::from_str(text),
            version,
            language_id: language_id.into(),
        }
    }

    /// The document's full current text.
    pub fn contents(&self) -> String {
        self.text.to_string()
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Apply one change event: a ranged event splices the rope, an unranged
    /// event replaces the whole content.
    pub fn apply(&mut self, change: &TextDocumentContentChangeEvent) {
        match change.range {
            Some(range) => {
                let start = self.char_offset(range.start);
                let end = self.char_offset(range.end);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            }
            None => self.text = Rope::from_str(&change.text),
        }
    }

    /// Translate a flat char offset into a line/column position. Offsets past
    /// the end of the document clamp to the final position.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len_chars());
        let line = self.text.char_to_line(offset);
        let character = offset - self.text.line_to_char(line);
        Position::new(line as u32, character as u32)
    }

    /// The full range of one line, excluding the terminator, for pointing at
    /// a declaration site.
    pub fn line_range(&self, line: usize) -> (Position, Position) {
        let line = line.min(self.text.len_lines().saturating_sub(1));
        let slice = self.text.line(line);
        let mut len = slice.len_chars();
        while len > 0 && matches!(slice.char(len - 1), '\n' | '\r') {
            len -= 1;
        }
        (
            Position::new(line as u32, 0),
            Position::new(line as u32, len as u32),
        )
    }

    /// Clamped protocol-position to char-offset conversion.
    fn char_offset(&self, position: Position) -> usize {
        let line = (position.line as usize).min(self.text.len_lines().saturating_sub(1));
        let line_start = self.text.line_to_char(line);
        let line_len = self.text.line(line).len_chars();
        line_start + (position.character as usize).min(line_len)
    }
}

/// All currently open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    open: RwLock<HashMap<Url, Document>>,
}

impl DocumentStore {
    /// Track a newly opened document.
    pub async fn open(&self, uri: Url, text: &str, version: i32, language_id: &str) {
        self.open
            .write()
            .await
            .insert(uri, Document::new(text, version, language_id));
    }

    /// Apply a change notification. Returns false when the document is not
    /// open (a stray notification, dropped).
    pub async fn apply_changes(
        &self,
        uri: &Url,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> bool {
        let mut open = self.open.write().await;
        let Some(document) = open.get_mut(uri) else {
            return false;
        };
        for change in changes {
            document.apply(change);
        }
        document.version = version;
        true
    }

    /// Stop tracking a document. Returns whether it was open.
    pub async fn close(&self, uri: &Url) -> bool {
        self.open.write().await.remove(uri).is_some()
    }

    /// Snapshot one open document. Rope clones are cheap (structural
    /// sharing), so validation works on the snapshot without holding the
    /// store lock.
    pub async fn get(&self, uri: &Url) -> Option<Document> {
        self.open.read().await.get(uri).cloned()
    }
}

#[cfg(test)]
mod tests {
    use tower_lsp::lsp_types::Range;

    use super::*;

    fn test_uri() -> Url {
        Url::parse("file:///deck/model.mbd").expect("valid uri")
    }

    fn ranged(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range::new(
                Position::new(start.0, start.1),
                Position::new(end.0, end.1),
            )),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn ranged_change_splices_content() {
        let mut document = Document::new("set: integer n = 1;\nbegin: data;\n", 0, "mbd");
        document.apply(&ranged((0, 13), (0, 14), "count"));
        assert_eq!(
            document.contents(),
            "set: integer count = 1;\nbegin: data;\n"
        );
    }

    #[test]
    fn unranged_change_replaces_content() {
        let mut document = Document::new("begin: data;\n", 3, "mbd");
        document.apply(&TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "end: data;\n".to_string(),
        });
        assert_eq!(document.contents(), "end: data;\n");
    }

    #[test]
    fn change_spanning_lines_joins_them() {
        let mut document = Document::new("first\nsecond\nthird\n", 0, "mbd");
        document.apply(&ranged((0, 5), (1, 6), ""));
        assert_eq!(document.contents(), "first\nthird\n");
    }

    #[test]
    fn out_of_bounds_positions_clamp() {
        let mut document = Document::new("short\n", 0, "mbd");
        document.apply(&ranged((9, 9), (9, 99), " tail"));
        assert_eq!(document.contents(), "short\n tail");
    }

    #[test]
    fn position_mapping_round_trips_across_lines() {
        let document = Document::new("ab\ncdef\ng\n", 0, "mbd");
        assert_eq!(document.position_at(0), Position::new(0, 0));
        assert_eq!(document.position_at(4), Position::new(1, 1));
        assert_eq!(document.position_at(8), Position::new(2, 0));
        // Past-the-end offsets clamp to the final position.
        assert_eq!(document.position_at(99), Position::new(3, 0));
    }

    #[tokio::test]
    async fn store_lifecycle_open_change_close() {
        let store = DocumentStore::default();
        let uri = test_uri();

        store.open(uri.clone(), "set: integer n = 1;\n", 1, "mbd").await;
        let applied = store
            .apply_changes(&uri, 2, &[ranged((0, 17), (0, 18), "2")])
            .await;
        assert!(applied);

        let document = store.get(&uri).await.expect("document open");
        assert_eq!(document.contents(), "set: integer n = 2;\n");
        assert_eq!(document.version(), 2);
        assert_eq!(document.language_id(), "mbd");

        assert!(store.close(&uri).await);
        assert!(store.get(&uri).await.is_none());
        assert!(!store.apply_changes(&uri, 3, &[]).await);
    }
}
