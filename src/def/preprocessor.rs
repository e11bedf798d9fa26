// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! DEF preprocessor
//!
//! Pass 1 over the raw text:
//! - Removing comments (`#` at line start or after whitespace, outside quotes)
//! - Splitting logical statements at `;` and at standalone `END ...` lines
//! - Ending a bare `PROPERTYDEFINITIONS` header at its own line
//! - Keeping `BEGINEXT ... ENDEXT` blocks whole
//! - Preserving line number mappings for error reporting
//!
//! The terminating `;` is not part of the statement text.

use std::fmt;

/// Mapping between logical lines and original file lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMapping {
    pub logical_line: usize,   // Index in preprocessed lines
    pub original_start: usize, // Starting line in original file (0-indexed)
    pub original_end: usize,   // Ending line in original file (0-indexed)
}

impl LineMapping {
    pub fn new(logical_line: usize, original_start: usize, original_end: usize) -> Self {
        Self {
            logical_line,
            original_start,
            original_end,
        }
    }
}

/// Preprocessed DEF content with line mappings
#[derive(Debug, Default)]
pub struct PreprocessedDef {
    pub lines: Vec<String>,         // Logical statements
    pub mappings: Vec<LineMapping>, // Mapping to original file lines
}

impl PreprocessedDef {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, text: &str, start: usize, end: usize) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let logical_index = self.lines.len();
        self.lines.push(text.to_string());
        self.mappings
            .push(LineMapping::new(logical_index, start, end));
    }

    /// Original 0-indexed line range of a logical statement
    pub fn get_original_range(&self, logical_line: usize) -> Option<(usize, usize)> {
        self.mappings
            .get(logical_line)
            .map(|m| (m.original_start, m.original_end))
    }

    /// 1-indexed line range, as reported in diagnostics
    pub fn line_range(&self, logical_line: usize) -> (usize, usize) {
        self.get_original_range(logical_line)
            .map(|(start, end)| (start + 1, end + 1))
            .unwrap_or((logical_line + 1, logical_line + 1))
    }

    /// Format error message with original line number
    pub fn format_error(&self, logical_line: usize, message: &str) -> String {
        match self.line_range(logical_line) {
            (start, end) if start == end => format!("Line {start}: {message}"),
            (start, end) => format!("Lines {start}-{end}: {message}"),
        }
    }
}

impl fmt::Display for PreprocessedDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Preprocessed DEF:")?;
        writeln!(f, "  Logical lines: {}", self.lines.len())?;
        writeln!(f, "  Mappings: {}", self.mappings.len())?;
        Ok(())
    }
}

fn is_end_line(trimmed: &str) -> bool {
    trimmed == "END" || trimmed.starts_with("END ") || trimmed.starts_with("END\t")
}

/// Section headers written without a terminating `;`
const BARE_HEADERS: [&str; 1] = ["PROPERTYDEFINITIONS"];

/// Split a bare section header off the front of a line
fn split_bare_header(trimmed: &str) -> Option<(&str, &str)> {
    let (word, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let rest = rest.trim_start();
    if !BARE_HEADERS.contains(&word) || rest.starts_with(';') {
        return None;
    }
    Some((word, rest))
}

/// Preprocess DEF text into logical statements
pub fn preprocess(content: &str) -> PreprocessedDef {
    let mut result = PreprocessedDef::new();
    let mut current = String::new();
    let mut line_start: usize = 0;
    let mut in_quote = false;
    let mut in_ext = false;
    let mut last_line = 0;

    for (i, raw) in content.lines().enumerate() {
        last_line = i;
        if in_ext {
            current.push(' ');
            current.push_str(raw.trim());
            if raw.trim_start().starts_with("ENDEXT") {
                result.push(&current, line_start, i);
                current.clear();
                in_ext = false;
            }
            continue;
        }

        let mut trimmed = remove_comment(raw).trim();
        if trimmed.is_empty() {
            continue;
        }
        if current.trim().is_empty() && !in_quote {
            line_start = i;
            if is_end_line(trimmed) {
                result.push(trimmed, i, i);
                continue;
            }
            if let Some((header, rest)) = split_bare_header(trimmed) {
                result.push(header, i, i);
                if rest.is_empty() {
                    continue;
                }
                trimmed = rest;
            }
            if trimmed.starts_with("BEGINEXT") {
                current.push_str(trimmed);
                in_ext = true;
                if trimmed.contains("ENDEXT") {
                    result.push(&current, i, i);
                    current.clear();
                    in_ext = false;
                }
                continue;
            }
        }

        for c in trimmed.chars() {
            match c {
                '"' => {
                    in_quote = !in_quote;
                    current.push(c);
                }
                ';' if !in_quote => {
                    result.push(&current, line_start, i);
                    current.clear();
                }
                _ => {
                    if current.trim().is_empty() && !c.is_whitespace() {
                        current.clear();
                        line_start = i;
                    }
                    current.push(c);
                }
            }
        }
        if !current.is_empty() {
            current.push(' ');
        }
    }

    // Handle incomplete statement at end of file
    result.push(&current, line_start, last_line);
    result
}

/// Remove comment from a line
///
/// Comments start with `#` at the start of the line or after a space or
/// tab, and never inside a quoted string.
fn remove_comment(line: &str) -> &str {
    match find_comment_start(line) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn find_comment_start(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    let mut in_quote = false;
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_quote = !in_quote,
            b'#' if !in_quote && (i == 0 || bytes[i - 1] == b' ' || bytes[i - 1] == b'\t') => {
                return Some(i)
            }
            _ => {}
        }
    }
    None
}
