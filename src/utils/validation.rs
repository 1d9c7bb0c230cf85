//! Input validation utilities

/// Interpret a loosely formatted boolean flag
///
/// Accepts `true/false`, `yes/no`, `on/off` and `1/0` in any letter case,
/// ignoring surrounding whitespace. Anything else is `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Interpret an optional flag, treating absent or unrecognized values as `false`
pub fn flag_enabled(value: Option<&str>) -> bool {
    value.and_then(parse_bool).unwrap_or(false)
}
