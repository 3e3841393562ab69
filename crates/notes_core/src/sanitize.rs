/// Normalizes a directory name into its symbol-free form.
///
/// Keeps alphanumerics, whitespace, `_` and `-`; every other character is
/// dropped. Whitespace runs collapse to a single space and the result is
/// trimmed. The function is total and idempotent.
pub fn sanitize_dir_name(name: &str) -> String {
    let kept: String = name.chars().filter(|c| is_kept(*c)).collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when `name` is already in sanitized form.
pub fn is_sanitized(name: &str) -> bool {
    sanitize_dir_name(name) == name
}

fn is_kept(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-')
}
