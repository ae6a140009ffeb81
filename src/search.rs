//! Line-by-line text search over a `PieceTree`.

use regex::{Regex, RegexBuilder};
use str_indices::utf16;

use crate::piece_tree::PieceTree;
use crate::position::{Position, TextRange};
use crate::{Error, Result};

/// A compiled search pattern.
///
/// Matches never span a line break: the document is searched one line at
/// a time, with the line's terminator removed.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pattern: String,
    is_regex: bool,
    match_case: bool,
    whole_word: bool,
    regex: Regex,
}

impl SearchQuery {
    /// Compiles a search for `pattern`.
    ///
    /// When `is_regex` is false the pattern is matched literally.  When
    /// `whole_word` is true, matches must start and end on a word
    /// boundary.
    ///
    /// # Errors
    ///
    /// `InvalidPattern` if the pattern does not compile.
    pub fn new(pattern: &str, is_regex: bool, match_case: bool, whole_word: bool) -> Result<Self> {
        let mut source = if is_regex {
            pattern.to_string()
        } else {
            regex::escape(pattern)
        };
        if whole_word {
            source = format!(r"\b(?:{})\b", source);
        }
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!match_case)
            .build()?;
        Ok(SearchQuery {
            pattern: pattern.to_string(),
            is_regex,
            match_case,
            whole_word,
            regex,
        })
    }

    /// Shorthand for a case-sensitive literal search.
    pub fn literal(pattern: &str) -> Result<Self> {
        Self::new(pattern, false, true, false)
    }

    #[inline]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    #[inline]
    pub fn match_case(&self) -> bool {
        self.match_case
    }

    #[inline]
    pub fn whole_word(&self) -> bool {
        self.whole_word
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindMatch {
    pub range: TextRange,
    /// The whole match followed by every capture group, with groups that
    /// did not participate as empty strings.  Only filled in when captures
    /// were requested.
    pub captures: Option<Vec<String>>,
}

impl PieceTree {
    /// Finds up to `limit` matches of `query` inside `range`, or inside the
    /// whole document when `range` is `None`.
    ///
    /// Match ranges use one-based lines and UTF-16 columns.  An empty match
    /// is reported at most once per position.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if either end of `range` is not a valid position, or
    /// the range ends before it starts.
    pub fn find_matches(
        &mut self,
        range: Option<TextRange>,
        query: &SearchQuery,
        capture: bool,
        limit: usize,
    ) -> Result<Vec<FindMatch>> {
        let range = match range {
            Some(range) => {
                let start = self.offset_at(range.start.line_number, range.start.column)?;
                let end = self.offset_at(range.end.line_number, range.end.column)?;
                if end < start {
                    return Err(Error::OutOfRange);
                }
                range
            }
            None => {
                let last_line = self.line_count();
                let last_column = self.line_length(last_line)? + 1;
                TextRange::from_coords(1, 1, last_line, last_column)
            }
        };

        let mut matches = Vec::new();
        if limit == 0 {
            return Ok(matches);
        }

        for line_number in range.start.line_number..=range.end.line_number {
            let line = self.line_without_eol(line_number)?;
            let from = if line_number == range.start.line_number {
                utf16::to_byte_idx(&line, range.start.column - 1)
            } else {
                0
            };
            let to = if line_number == range.end.line_number {
                utf16::to_byte_idx(&line, range.end.column - 1)
            } else {
                line.len()
            };
            find_in_line(&query.regex, &line[..to], from, line_number, capture, limit, &mut matches);
            if matches.len() >= limit {
                break;
            }
        }
        Ok(matches)
    }
}

fn find_in_line(
    regex: &Regex,
    haystack: &str,
    mut from: usize,
    line_number: usize,
    capture: bool,
    limit: usize,
    matches: &mut Vec<FindMatch>,
) {
    while from <= haystack.len() && matches.len() < limit {
        let caps = match regex.captures_at(haystack, from) {
            Some(caps) => caps,
            None => return,
        };
        let Some(whole) = caps.get(0) else {
            return;
        };

        let start = utf16::from_byte_idx(haystack, whole.start()) + 1;
        let end = utf16::from_byte_idx(haystack, whole.end()) + 1;
        let captures = capture.then(|| {
            caps.iter()
                .map(|group| group.map_or_else(String::new, |g| g.as_str().to_string()))
                .collect()
        });
        matches.push(FindMatch {
            range: TextRange::new(
                Position::new(line_number, start),
                Position::new(line_number, end),
            ),
            captures,
        });

        from = if whole.is_empty() {
            // Step over one char so the same empty match isn't found again.
            match haystack[whole.end()..].chars().next() {
                Some(c) => whole.end() + c.len_utf8(),
                None => return,
            }
        } else {
            whole.end()
        };
    }
}

//=============================================================
