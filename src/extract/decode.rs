//! HTML-entity decoding and escaped-angle normalization for extracted values

/// Decode HTML entities, then turn literal `<` / `>` back into angle brackets.
///
/// Every string the extractors hand out goes through here.
pub fn normalize_value(raw: &str) -> String {
    unescape_angles(&decode_html_entities(raw))
}

/// Replace the escaped angle-bracket sequences some JSON serializers emit
pub fn unescape_angles(text: &str) -> String {
    if !text.contains("\\u003") {
        return text.to_string();
    }
    text.replace("\\u003c", "<")
        .replace("\\u003C", "<")
        .replace("\\u003e", ">")
        .replace("\\u003E", ">")
}

/// Resolve named (full HTML5 set) and numeric entities. Unknown entities are left untouched.
pub fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}
