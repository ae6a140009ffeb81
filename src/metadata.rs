//! Cheap whole-text scans whose results are reported as hints by the
//! builder.

/// Returns whether `text` may contain right-to-left characters.
pub(crate) fn contains_rtl(text: &str) -> bool {
    text.chars().any(is_rtl_char)
}

/// Returns whether `text` contains U+2028, U+2029 or U+0085, which some
/// consumers treat as line breaks even though the piece tree does not.
pub(crate) fn contains_unusual_line_terminators(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{2028}' | '\u{2029}' | '\u{0085}'))
}

/// Returns whether `text` consists only of tabs, line breaks and
/// printable ASCII.
pub(crate) fn is_basic_ascii(text: &str) -> bool {
    text.bytes()
        .all(|b| b == b'\t' || b == b'\r' || b == b'\n' || (0x20..=0x7E).contains(&b))
}

#[inline]
fn is_rtl_char(c: char) -> bool {
    matches!(
        c as u32,
        0x0590..=0x08FF
            | 0x200F..=0x202E
            | 0xFB1D..=0xFDFF
            | 0xFE70..=0xFEFC
            | 0x10800..=0x10FFF
            | 0x1E800..=0x1EFFF
    )
}
