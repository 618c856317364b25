use crate::stages::normalize_whitespace;

/// Line-count comparison between a chunk and the oracle's answer for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCountCheck {
    pub expected: usize,
    pub actual: usize,
}

impl LineCountCheck {
    pub fn is_match(&self) -> bool {
        self.expected == self.actual
    }
}

/// Split raw oracle output for one chunk into normalized lines
///
/// Each line is whitespace-normalized, so blank lines stand for empty
/// segments. Trailing blank lines are dropped only while the output is
/// longer than `expected`, which absorbs a final newline without losing
/// empty segments at the end of the chunk.
pub fn output_lines(raw: &str, expected: usize) -> Vec<String> {
    let mut lines: Vec<String> = raw.split('\n').map(normalize_whitespace).collect();

    while lines.len() > expected && lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }

    lines
}

/// Compare the oracle's line count against the chunk's segment count
pub fn check_line_count(raw: &str, expected: usize) -> LineCountCheck {
    LineCountCheck {
        expected,
        actual: output_lines(raw, expected).len(),
    }
}
