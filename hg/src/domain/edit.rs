//! In-place cell editing
//!
//! An edit starts from a cell's current content, accumulates input, and ends
//! with either a commit (Enter or focus loss) or a cancel (Escape).

use tracing::debug;

/// How an edit was finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    /// Enter or blur
    Commit,
    /// Escape
    Cancel,
}

/// Result of a finished edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// New trimmed content to write
    Committed(String),
    /// Edit discarded; carries the content to restore
    Reverted(String),
}

impl EditOutcome {
    /// Content the cell shows after the edit
    pub fn content(&self) -> &str {
        match self {
            EditOutcome::Committed(s) | EditOutcome::Reverted(s) => s,
        }
    }
}

/// An edit in progress
#[derive(Debug, Clone)]
pub struct CellEdit {
    original: String,
    buffer: String,
}

impl CellEdit {
    /// Start editing a cell; the buffer is seeded with the current content
    pub fn begin(original: impl Into<String>) -> Self {
        let original = original.into();
        Self {
            buffer: original.clone(),
            original,
        }
    }

    /// Replace the edit buffer
    pub fn input(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Finish the edit
    ///
    /// A commit keeps the trimmed buffer only if it is non-empty; a cancel
    /// always restores the original.
    pub fn finish(self, key: EditKey) -> EditOutcome {
        debug!(?key, "CellEdit::finish: called");
        match key {
            EditKey::Commit => {
                let trimmed = self.buffer.trim();
                if trimmed.is_empty() {
                    EditOutcome::Reverted(self.original)
                } else {
                    EditOutcome::Committed(trimmed.to_string())
                }
            }
            EditKey::Cancel => EditOutcome::Reverted(self.original),
        }
    }
}
