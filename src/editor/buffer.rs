//! Host text buffer synchronisation
//!
//! After each applied action the executor diffs the previous rendering
//! against the new one and hands the host a single range-replace
//! [`BufferEdit`]. [`RopeBuffer`] is an in-memory adapter built on ropey.

use crate::editor::position::{Position, Range};
use crate::error::{EditorError, Result};
use ropey::Rope;
use serde::Serialize;

/// Replace `range` of the old text with `text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferEdit {
    pub range: Range,
    pub text: String,
}

/// Host-side text widget
pub trait TextBufferAdapter {
    /// Apply a range-replace edit
    fn apply(&mut self, edit: &BufferEdit) -> Result<()>;

    /// Current text
    fn text(&self) -> String;

    /// Overwrite everything, used to recover from a failed edit
    fn replace_all(&mut self, text: &str);
}

/// Rope-backed buffer
#[derive(Debug, Clone, Default)]
pub struct RopeBuffer {
    content: Rope,
}

impl RopeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            content: Rope::from_str(text),
        }
    }

    pub fn line_count(&self) -> usize {
        self.content.len_lines()
    }

    /// Char index of a 1-based position
    fn char_index(&self, position: Position) -> Result<usize> {
        let line = position
            .line
            .checked_sub(1)
            .filter(|line| *line < self.content.len_lines())
            .ok_or_else(|| EditorError::BufferRange(format!("line {} out of range", position.line)))?;
        let start = self.content.line_to_char(line);
        let length = self.content.line(line).chars().filter(|ch| *ch != '\n').count();
        let column = position
            .column
            .checked_sub(1)
            .filter(|column| *column <= length)
            .ok_or_else(|| {
                EditorError::BufferRange(format!("column {} out of range", position.column))
            })?;
        Ok(start + column)
    }
}

impl TextBufferAdapter for RopeBuffer {
    fn apply(&mut self, edit: &BufferEdit) -> Result<()> {
        let start = self.char_index(edit.range.start)?;
        let end = self.char_index(edit.range.end)?;
        self.content.remove(start..end);
        self.content.insert(start, &edit.text);
        Ok(())
    }

    fn text(&self) -> String {
        self.content.to_string()
    }

    fn replace_all(&mut self, text: &str) {
        self.content = Rope::from_str(text);
    }
}

/// 1-based position of char offset `offset` in `chars`
fn position_of(chars: &[char], offset: usize) -> Position {
    let mut line = 1;
    let mut column = 1;
    for ch in &chars[..offset] {
        if *ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    Position::new(line, column)
}

/// Smallest single edit turning `old` into `new`, `None` when equal
pub fn diff_texts(old: &str, new: &str) -> Option<BufferEdit> {
    if old == new {
        return None;
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars
        .iter()
        .zip(new_chars.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let start = position_of(&old_chars, prefix);
    let end = position_of(&old_chars, old_chars.len() - suffix);
    let text: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();
    Some(BufferEdit {
        range: Range::new(start, end),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(old: &str, new: &str) -> String {
        let mut buffer = RopeBuffer::from_text(old);
        if let Some(edit) = diff_texts(old, new) {
            buffer.apply(&edit).unwrap();
        }
        buffer.text()
    }

    #[test]
    fn test_diff_is_minimal() {
        let edit = diff_texts("print(___)", "print(x)").unwrap();
        assert_eq!(edit.range, Range::on_line(1, 7, 10));
        assert_eq!(edit.text, "x");
    }

    #[test]
    fn test_diff_across_lines() {
        let old = "if ___:\n    ";
        let new = "if ___:\n    x = ___\ny";
        assert_eq!(apply(old, new), new);
        assert_eq!(apply(new, old), old);
        assert_eq!(apply("", "a\nb"), "a\nb");
    }

    #[test]
    fn test_repeated_characters_stay_consistent() {
        assert_eq!(apply("aaa", "aa"), "aa");
        assert_eq!(apply("ab\nab", "ab\nab\nab"), "ab\nab\nab");
    }

    #[test]
    fn test_out_of_range_edit_is_rejected() {
        let mut buffer = RopeBuffer::from_text("x");
        let edit = BufferEdit {
            range: Range::on_line(3, 1, 2),
            text: String::new(),
        };
        assert!(buffer.apply(&edit).is_err());
        assert_eq!(buffer.text(), "x");
    }
}
