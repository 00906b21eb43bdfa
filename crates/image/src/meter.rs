//! Decoded size of base64 payloads.

use crate::payload::strip_prefix;

/// Number of bytes a base64 text decodes to.
///
/// Any `data:` prefix is ignored. The result is
/// `floor(len * 3 / 4) - padding`, where `padding` counts the trailing `=`
/// characters (at most two). Empty input measures 0.
///
/// # Example
/// ```
/// use sheetcell_image::measure;
///
/// assert_eq!(measure("TWFu"), 3);
/// assert_eq!(measure("TWE="), 2);
/// assert_eq!(measure("data:image/jpeg;base64,TQ=="), 1);
/// ```
pub fn measure(encoded: &str) -> usize {
    let data = strip_prefix(encoded);
    let padding = data.bytes().rev().take(2).take_while(|&b| b == b'=').count();
    (data.len() * 3 / 4).saturating_sub(padding)
}

/// Largest byte count whose padded base64 encoding fits in `chars` characters.
pub fn byte_budget_for_chars(chars: usize) -> usize {
    chars / 4 * 3
}

/// Characters needed to base64-encode `bytes` bytes, padding included.
pub fn encoded_len(bytes: usize) -> usize {
    bytes.div_ceil(3) * 4
}
