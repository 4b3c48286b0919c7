/// Canonicalize a title into the key used to match catalog and watchlist entries.
///
/// Lowercases, drops apostrophes and any character that is not alphanumeric or one of
/// `- , ! ?`, and turns each run of whitespace, `.` or `_` into a single `_`.
/// Leading and trailing separators are dropped. The result is stable under a second pass.
pub fn normalize(title: &str) -> String {
    let mut key = String::with_capacity(title.len());
    let mut separator_pending = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '.' || c == '_' {
            separator_pending = true;
        } else if c.is_alphanumeric() || matches!(c, '-' | ',' | '!' | '?') {
            if separator_pending && !key.is_empty() {
                key.push('_');
            }
            separator_pending = false;
            key.push(c);
        }
    }

    key
}
