use regex::Regex;

fn absolute_reference_patterns() -> &'static [Regex] {
    use std::sync::OnceLock;

    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            vec![
                Regex::new(r"^/").expect("invalid root regex"),
                Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("invalid scheme regex"),
                Regex::new(r"^#").expect("invalid fragment regex"),
            ]
        })
        .as_slice()
}

fn external_url_pattern() -> &'static Regex {
    use std::sync::OnceLock;

    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^https?://").expect("invalid http(s) regex"))
}

/// Determine whether a stylesheet reference is left untouched when rebasing.
///
/// Root-relative paths (including protocol-relative `//host` forms), scheme-qualified URIs such
/// as `data:` or `https:`, and fragment-only references all point at the same resource no
/// matter where the stylesheet lives.
pub fn is_absolute_reference(value: &str) -> bool {
    absolute_reference_patterns()
        .iter()
        .any(|pattern| pattern.is_match(value))
}

/// Determine whether a resolved stylesheet location must be delegated instead of fetched.
pub fn is_external_url(value: &str) -> bool {
    external_url_pattern().is_match(value)
}
