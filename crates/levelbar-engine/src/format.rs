//! Display formatting for labels.

use crate::constants::ELLIPSIS;

/// Shorten `text` to at most `max_chars` characters plus [`ELLIPSIS`].
///
/// Text that already fits is returned unchanged. Lengths count Unicode scalar
/// values, so multi-byte subjects never split mid-character.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
    }
}

/// Render a count for a value label.
pub fn count_label(value: i64) -> String {
    value.to_string()
}
