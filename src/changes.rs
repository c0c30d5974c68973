//! Changed-line computation between baseline and current text
//!
//! Scoring heuristics operate on the lines the edit actually touched, never
//! the whole file. This module derives that region with a line diff.

use std::collections::BTreeSet;

use similar::{ChangeTag, TextDiff};

/// One line inserted or rewritten by the edit
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChangedLine {
    /// 1-based line number in the current text
    pub number: u32,
    pub text: String,
}

/// The lines of the current text that differ from the baseline
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ChangedRegion {
    /// Changed lines in ascending order
    pub lines: Vec<ChangedLine>,
}

impl ChangedRegion {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The changed lines joined back into one text block
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Set of changed line numbers
    pub fn line_numbers(&self) -> BTreeSet<u32> {
        self.lines.iter().map(|l| l.number).collect()
    }

    /// Whether the given 1-based line is part of the change
    pub fn contains(&self, line: u32) -> bool {
        self.lines.iter().any(|l| l.number == line)
    }
}

/// Compute the changed region of `after` relative to `before`.
///
/// Insertions count; deletions have no line in the current text to anchor
/// heuristics to, so they only show up indirectly (as the absence of the
/// old line). Identical texts produce an empty region.
pub fn changed_region(before: &str, after: &str) -> ChangedRegion {
    if before == after {
        return ChangedRegion::default();
    }

    let diff = TextDiff::from_lines(before, after);
    let mut lines = Vec::new();

    for change in diff.iter_all_changes() {
        if change.tag() != ChangeTag::Insert {
            continue;
        }
        if let Some(new_index) = change.new_index() {
            lines.push(ChangedLine {
                number: new_index as u32 + 1,
                text: change.value().trim_end_matches('\n').to_string(),
            });
        }
    }

    ChangedRegion { lines }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_texts_empty_region() {
        let region = changed_region("a\nb\nc\n", "a\nb\nc\n");
        assert!(region.is_empty());
    }

    #[test]
    fn test_insertion_detected_with_line_numbers() {
        let region = changed_region("a\nc\n", "a\nb\nc\n");
        assert_eq!(region.len(), 1);
        assert_eq!(region.lines[0].number, 2);
        assert_eq!(region.lines[0].text, "b");
    }

    #[test]
    fn test_rewrite_shows_as_changed() {
        let region = changed_region("let x = 1;\n", "let x = 2;\n");
        assert_eq!(region.len(), 1);
        assert_eq!(region.lines[0].number, 1);
        assert!(region.contains(1));
        assert!(!region.contains(2));
    }

    #[test]
    fn test_pure_deletion_has_no_anchored_lines() {
        let region = changed_region("a\nb\nc\n", "a\nc\n");
        assert!(region.is_empty());
    }

    #[test]
    fn test_text_joins_changed_lines() {
        let region = changed_region("a\n", "a\nb\nc\n");
        assert_eq!(region.text(), "b\nc");
        assert_eq!(
            region.line_numbers().into_iter().collect::<Vec<_>>(),
            vec![2, 3]
        );
    }
}
