//! Piecetree is a piece tree text buffer for Rust, designed to be the
//! backing text storage of a text editor.
//!
//! A document is a sequence of immutable text chunks stitched together by
//! lightweight references ("pieces"), indexed by an augmented red-black
//! tree.  Offset lookup, line/column lookup, insertion and removal all run
//! in O(log N) time with respect to the number of pieces.
//!
//! Offsets and lengths throughout the API are counted in UTF-16 code
//! units, and line/column positions are 1-based.  CR, LF and CRLF each
//! count as exactly one line break, and a CRLF pair is never split across
//! two pieces.
//!
//! # Example
//!
//! ```
//! # use piecetree::PieceTree;
//! #
//! let mut tree = PieceTree::from_str("hello world");
//! tree.replace(6, 5, "piece tree").unwrap();
//! tree.insert(16, "!\r\nbye").unwrap();
//!
//! assert_eq!(tree, "hello piece tree!\r\nbye");
//! assert_eq!(tree.line_count(), 2);
//! assert_eq!(tree.line_content(1).unwrap(), "hello piece tree!\r\n");
//! ```

#![allow(clippy::collapsible_if)]
#![allow(clippy::comparison_chain)]
#![allow(clippy::needless_return)]
#![allow(clippy::redundant_field_names)]

pub mod iter;

mod builder;
mod chunk_buffer;
mod crlf;
mod eol;
mod metadata;
mod piece_tree;
mod position;
mod search;
mod search_cache;
mod snapshot;
mod tree;

pub use builder::{BuildOptions, BuildResult, EolCounts, PieceTreeBuilder, TextBufferFactory};
pub use chunk_buffer::{BufferCursor, ChunkBuffer};
pub use eol::{EndOfLine, DEFAULT_CHUNK_SIZE};
pub use piece_tree::{NodeSummary, PieceTree};
pub use position::{Position, TextRange};
pub use search::{FindMatch, SearchQuery};
pub use snapshot::Snapshot;
pub use tree::{Color, Piece};

/// Piecetree's error type.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An offset, length, cursor or line/column position was outside the
    /// bounds of the text it refers to.
    #[error("index out of range")]
    OutOfRange,

    /// An edit offset landed between the two UTF-16 code units of a
    /// surrogate pair.
    #[error("offset is not on a char boundary")]
    NonCharBoundary,

    /// A search pattern failed to compile.
    #[error("invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A structural invariant of the piece tree does not hold.  Only ever
    /// produced by [`PieceTree::check_integrity()`].
    #[error("piece tree integrity violation: {0}")]
    IntegrityViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//=============================================================
// Utilities.

/// Scans right from `byte_idx` to find a char boundary.
///
/// Precondition: `text` must be a well-formed utf8 string.
///
/// Note for convenience, if `byte_idx > text.len()`, this simply
/// returns `text.len()`.
pub(crate) fn find_split_r(mut byte_idx: usize, text: &[u8]) -> usize {
    if byte_idx >= text.len() {
        return text.len();
    }

    while (text[byte_idx] >> 6) == 0b10 {
        byte_idx += 1;
    }

    byte_idx
}

#[inline(always)]
pub(crate) fn starts_with_lf(text: &str) -> bool {
    text.as_bytes().first().map(|&b| b == 0x0A).unwrap_or(false)
}

#[inline(always)]
pub(crate) fn ends_with_cr(text: &str) -> bool {
    text.as_bytes().last().map(|&b| b == 0x0D).unwrap_or(false)
}

/// Applies a signed delta to an unsigned aggregate.
#[inline(always)]
pub(crate) fn apply_delta(value: usize, delta: isize) -> usize {
    (value as isize + delta) as usize
}

//=============================================================
