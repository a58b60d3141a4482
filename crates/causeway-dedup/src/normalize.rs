//! Text normalization shared by hashing and similarity.

/// Punctuation that carries no meaning for duplicate detection.
const MINOR_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '`', '(', ')'];

/// Lower-case, drop minor punctuation, collapse runs of whitespace.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
///
/// ```
/// use causeway_dedup::normalize;
///
/// assert_eq!(normalize("  Clean   Bedroom! "), "clean bedroom");
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if MINOR_PUNCTUATION.contains(&ch) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    out
}
