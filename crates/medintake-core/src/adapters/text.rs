//! Plain-text adapter: `label: value` lines plus a free-text note.
//!
//! The whole document is a single batch. Lines that are not `label: value`
//! pairs are kept verbatim in a `clinical_note_raw` field. A label with an
//! empty value opens a list: the bulleted lines (`-`, `*`, `•`, `1.`, `1)`)
//! that follow are joined into that label's value. Any other line closes
//! the list.

use tracing::debug;

use crate::models::{FieldValue, RawBatch};

use super::{Extraction, FormatAdapter};

/// Raw field name carrying unmatched free text.
pub const FREE_TEXT_FIELD: &str = "clinical_note_raw";

pub const DEFAULT_MAX_LABEL_LEN: usize = 40;
pub const DEFAULT_LIST_SEPARATOR: &str = "; ";

#[derive(Debug, Clone)]
pub struct TextAdapter {
    max_label_len: usize,
    list_separator: String,
}

impl Default for TextAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LABEL_LEN, DEFAULT_LIST_SEPARATOR)
    }
}

/// A list opened by a label with an empty value.
struct OpenList {
    label: String,
    items: Vec<String>,
}

impl TextAdapter {
    pub fn new(max_label_len: usize, list_separator: impl Into<String>) -> Self {
        Self {
            max_label_len,
            list_separator: list_separator.into(),
        }
    }

    /// Scan already-decoded text into one batch.
    pub fn scan(&self, text: &str, index: usize) -> RawBatch {
        let mut scanner = Scanner::new(self, index);
        for line in text.lines() {
            scanner.line(line);
        }
        scanner.finish()
    }

    /// Split a line into `(label, value)` on its first colon.
    fn split_label<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let (label, value) = line.split_once(':')?;
        let label = label.trim();
        let plausible = !label.is_empty()
            && label.chars().count() <= self.max_label_len
            && label.chars().any(char::is_alphabetic);
        plausible.then(|| (label, value.trim()))
    }
}

impl FormatAdapter for TextAdapter {
    fn extract(&self, bytes: &[u8]) -> Extraction {
        let mut scanner = Scanner::new(self, 0);
        let mut skipped = 0;

        for raw_line in bytes.split(|b| *b == b'\n') {
            match std::str::from_utf8(raw_line) {
                Ok(line) => scanner.line(line.trim_end_matches('\r')),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!(skipped, "Skipped lines that are not valid UTF-8");
        }

        let batch = scanner.finish();
        Extraction {
            batches: if batch.is_empty() { Vec::new() } else { vec![batch] },
            skipped,
        }
    }
}

/// Strip a bullet or enumeration marker, if the line has one.
fn list_item(line: &str) -> Option<&str> {
    let rest = ["-", "*", "\u{2022}"]
        .iter()
        .find_map(|marker| line.strip_prefix(*marker))
        .or_else(|| {
            let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }
            line[digits..]
                .strip_prefix('.')
                .or_else(|| line[digits..].strip_prefix(')'))
        })?;

    // The marker must stand apart from the item text
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Line-by-line state for one batch.
struct Scanner<'a> {
    adapter: &'a TextAdapter,
    batch: RawBatch,
    open: Option<OpenList>,
    free_text: Vec<String>,
}

impl<'a> Scanner<'a> {
    fn new(adapter: &'a TextAdapter, index: usize) -> Self {
        Self {
            adapter,
            batch: RawBatch::new(index),
            open: None,
            free_text: Vec::new(),
        }
    }

    fn line(&mut self, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.close_list();
            return;
        }

        match self.adapter.split_label(trimmed) {
            Some((label, "")) => {
                self.close_list();
                self.open = Some(OpenList {
                    label: label.to_string(),
                    items: Vec::new(),
                });
            }
            Some((label, value)) => {
                self.close_list();
                self.batch.push(label, FieldValue::text(value));
            }
            None => match (self.open.as_mut(), list_item(trimmed)) {
                (Some(list), Some(item)) => list.items.push(item.to_string()),
                _ => {
                    self.close_list();
                    self.free_text.push(line.trim_end().to_string());
                }
            },
        }
    }

    fn close_list(&mut self) {
        if let Some(list) = self.open.take() {
            let value = if list.items.is_empty() {
                FieldValue::Missing
            } else {
                FieldValue::Text(list.items.join(&self.adapter.list_separator))
            };
            self.batch.push(list.label, value);
        }
    }

    fn finish(mut self) -> RawBatch {
        self.close_list();
        if !self.free_text.is_empty() {
            self.batch
                .push(FREE_TEXT_FIELD, FieldValue::Text(self.free_text.join("\n")));
        }
        self.batch
    }
}
