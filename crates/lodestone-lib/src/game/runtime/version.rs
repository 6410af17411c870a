/// Java major version used when no rule matches (legacy clients)
pub const DEFAULT_JAVA_MAJOR: u32 = 8;

/// Client version prefix -> required Java major version.
/// Most specific (longest) matching prefix wins.
const JAVA_VERSION_RULES: &[(&str, u32)] = &[
    ("1.21", 21),
    ("1.20.5", 21),
    ("1.20.6", 21),
    ("1.20", 17),
    ("1.19", 17),
    ("1.18", 17),
    ("1.17", 17),
];

/// Prefix match on dot-segment boundaries: "1.2" matches "1.2" and "1.2.5"
/// but not "1.20.1".
fn matches_prefix(version: &str, prefix: &str) -> bool {
    match version.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('.') || rest.starts_with('-'),
        None => false,
    }
}

/// Resolve the Java major version a client version needs
pub fn required_java_major(client_version: &str) -> u32 {
    let version = client_version.trim();
    JAVA_VERSION_RULES
        .iter()
        .filter(|(prefix, _)| matches_prefix(version, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, major)| *major)
        .unwrap_or(DEFAULT_JAVA_MAJOR)
}
