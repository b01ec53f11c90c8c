const REPLACEMENT: char = '_';

// Same character range as OpenTSDB accepts in metric names and tags.
fn is_allowed(c: char) -> bool {
    if c.is_ascii() {
        matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '/')
    } else {
        c.is_alphanumeric()
    }
}

/// Replace every run of characters the store would reject with a single `_`.
///
/// The replacement character is itself allowed, so applying this twice gives
/// the same result as applying it once.
pub fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut replaced = false;
    for c in s.chars() {
        if is_allowed(c) {
            out.push(c);
            replaced = false;
        } else if !replaced {
            out.push(REPLACEMENT);
            replaced = true;
        }
    }
    out
}
