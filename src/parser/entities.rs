//! HTML character-reference decoding for attribute payloads.

use std::borrow::Cow;

/// Decode named (full HTML5 table) and numeric character references.
///
/// Input without any reference is returned borrowed.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    html_escape::decode_html_entities(raw)
}
