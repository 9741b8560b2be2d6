//! # Structural Diffs
//!
//! `update` operations carry a diff against a sequence value instead of a
//! full replacement. Text is addressed by `char` offset, arrays by element
//! index.
//!
//! A `Delete` diff built by a caller only knows its range. Applying it
//! captures the removed content, and the captured form is what gets
//! recorded, so every recorded diff can be inverted without looking at the
//! document again.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, GraphResult};

/// Content inserted into or removed from a sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sequence {
    Text(String),
    Items(Vec<Value>),
}

impl Sequence {
    pub fn len(&self) -> usize {
        match self {
            Sequence::Text(text) => text.chars().count(),
            Sequence::Items(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sequence edit applied by an `update` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diff {
    Insert {
        offset: usize,
        content: Sequence,
    },
    Delete {
        offset: usize,
        len: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<Sequence>,
    },
}

impl Diff {
    pub fn insert_text(offset: usize, text: impl Into<String>) -> Self {
        Diff::Insert {
            offset,
            content: Sequence::Text(text.into()),
        }
    }

    pub fn insert_items(offset: usize, items: Vec<Value>) -> Self {
        Diff::Insert {
            offset,
            content: Sequence::Items(items),
        }
    }

    /// Removal of `len` elements at `offset`; content is captured on apply
    pub fn delete(offset: usize, len: usize) -> Self {
        Diff::Delete {
            offset,
            len,
            content: None,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            Diff::Insert { offset, .. } | Diff::Delete { offset, .. } => *offset,
        }
    }

    /// Applies the diff to `target` in place.
    ///
    /// Returns the diff in recorded form (deletes carry their removed
    /// content). Nothing is modified when an error is returned.
    pub fn apply(&self, target: &mut Value) -> GraphResult<Diff> {
        match (self, target) {
            (Diff::Insert { offset, content: Sequence::Text(text) }, Value::String(s)) => {
                let at = byte_offset(s, *offset)?;
                s.insert_str(at, text);
                Ok(self.clone())
            }
            (Diff::Insert { offset, content: Sequence::Items(items) }, Value::Array(array)) => {
                if *offset > array.len() {
                    return Err(out_of_range(*offset, 0, array.len()));
                }
                array.splice(*offset..*offset, items.iter().cloned());
                Ok(self.clone())
            }
            (Diff::Delete { offset, len, content }, Value::String(s)) => {
                let end = end_offset(*offset, *len, s.chars().count())?;
                let start = byte_offset(s, *offset)?;
                let end = byte_offset(s, end)?;
                let removed = Sequence::Text(s[start..end].to_string());
                check_captured(content, &removed)?;
                s.replace_range(start..end, "");
                Ok(Diff::Delete {
                    offset: *offset,
                    len: *len,
                    content: Some(removed),
                })
            }
            (Diff::Delete { offset, len, content }, Value::Array(array)) => {
                let end = end_offset(*offset, *len, array.len())?;
                if end > array.len() {
                    return Err(out_of_range(*offset, *len, array.len()));
                }
                let removed = Sequence::Items(array[*offset..end].to_vec());
                check_captured(content, &removed)?;
                array.drain(*offset..end);
                Ok(Diff::Delete {
                    offset: *offset,
                    len: *len,
                    content: Some(removed),
                })
            }
            (diff, target) => Err(GraphError::invalid_diff(format!(
                "{} cannot be applied to {}",
                diff.describe(),
                value_kind(target)
            ))),
        }
    }

    /// Insert of N at K becomes delete of N at K, and vice versa
    pub fn invert(&self) -> GraphResult<Diff> {
        match self {
            Diff::Insert { offset, content } => Ok(Diff::Delete {
                offset: *offset,
                len: content.len(),
                content: Some(content.clone()),
            }),
            Diff::Delete {
                offset,
                content: Some(content),
                ..
            } => Ok(Diff::Insert {
                offset: *offset,
                content: content.clone(),
            }),
            Diff::Delete { content: None, .. } => Err(GraphError::not_invertible(
                "delete diff was recorded without its removed content",
            )),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Diff::Insert { content: Sequence::Text(_), .. } => "text insert",
            Diff::Insert { content: Sequence::Items(_), .. } => "array insert",
            Diff::Delete { .. } => "delete",
        }
    }
}

fn byte_offset(s: &str, char_offset: usize) -> GraphResult<usize> {
    if char_offset == 0 {
        return Ok(0);
    }
    match s.char_indices().nth(char_offset) {
        Some((at, _)) => Ok(at),
        None if s.chars().count() == char_offset => Ok(s.len()),
        None => Err(out_of_range(char_offset, 0, s.chars().count())),
    }
}

fn end_offset(offset: usize, len: usize, available: usize) -> GraphResult<usize> {
    offset
        .checked_add(len)
        .ok_or_else(|| out_of_range(offset, len, available))
}

fn check_captured(expected: &Option<Sequence>, removed: &Sequence) -> GraphResult<()> {
    match expected {
        Some(content) if content != removed => Err(GraphError::invalid_diff(
            "recorded content does not match the sequence being removed",
        )),
        _ => Ok(()),
    }
}

fn out_of_range(offset: usize, len: usize, available: usize) -> GraphError {
    GraphError::invalid_diff(format!(
        "range {}..{} exceeds sequence length {}",
        offset,
        offset.saturating_add(len),
        available
    ))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
