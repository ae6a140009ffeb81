//! CRLF-aware split points.
//!
//! Text may only be cut at positions that split neither a char (and
//! therefore never a UTF-16 surrogate pair) nor a CRLF pair.

use str_indices::utf16;

use crate::find_split_r;

/// Returns whether `byte_idx` is not in the middle of a CRLF pair.
#[inline]
pub fn is_break(byte_idx: usize, text: &str) -> bool {
    debug_assert!(byte_idx <= text.len());

    if byte_idx == 0 || byte_idx == text.len() {
        return true;
    }
    let bytes = text.as_bytes();
    (bytes[byte_idx - 1] != 0x0D) | (bytes[byte_idx] != 0x0A)
}

/// Returns whether joining `left` and `right` does not fuse a `\r` and a
/// `\n` into one CRLF line break.
#[inline]
pub fn seam_is_break(left: &str, right: &str) -> bool {
    (left.as_bytes().last() != Some(&0x0D)) | (right.as_bytes().first() != Some(&0x0A))
}

/// Finds the byte index at which to cut `text` so that the left part is
/// at most `max_utf16` code units long.
///
/// The cut never splits a char.  If it would split a CRLF pair it moves
/// left by one, so that the pair stays in the right part, unless that
/// would leave the left part empty.  At least one char is always taken,
/// so the result is zero only for empty text.
#[inline]
pub fn find_good_split(text: &str, max_utf16: usize) -> usize {
    let mut byte_idx = utf16::to_byte_idx(text, max_utf16);
    if byte_idx >= text.len() {
        return text.len();
    }
    if byte_idx == 0 {
        byte_idx = find_split_r(1, text.as_bytes());
    }
    if !is_break(byte_idx, text) {
        if byte_idx > 1 {
            byte_idx -= 1;
        } else {
            byte_idx += 1;
        }
    }
    byte_idx
}

/// Iterator over the segments of a text split at most every `max_utf16`
/// code units, see [`find_good_split()`].
pub struct SplitText<'a> {
    text: &'a str,
    max_utf16: usize,
}

impl<'a> SplitText<'a> {
    pub fn new(text: &'a str, max_utf16: usize) -> Self {
        SplitText { text, max_utf16 }
    }
}

impl<'a> Iterator for SplitText<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.text.is_empty() {
            return None;
        }
        let split = find_good_split(self.text, self.max_utf16);
        let (left, right) = self.text.split_at(split);
        self.text = right;
        Some(left)
    }
}

//===========================================================================
