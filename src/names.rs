//! Rule-name derivation. Stable and deterministic: the dedup-by-name step in
//! the synthesizer depends on it.

use once_cell::sync::Lazy;
use regex::Regex;

static CAPITAL_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new("[A-Z][^A-Z]*").unwrap());

/// Derive a grammar rule name from a type or field identifier.
///
/// Capitalized runs become hyphen-joined lowercase tokens and underscores turn
/// into hyphens; an identifier without capitals is lowercased wholesale.
/// `StructuredName` → `structured-name`, `snake_case` → `snake-case`.
pub fn format_name(identifier: &str) -> String {
    let parts: Vec<String> = CAPITAL_RUNS
        .find_iter(identifier)
        .map(|m| m.as_str().to_lowercase().replace('_', "-"))
        .collect();
    if parts.is_empty() {
        return identifier.to_lowercase().replace('_', "-");
    }
    parts.join("-")
}

/// Join an owner rule name and a field rule name. A bare field name stands
/// alone at the document root.
pub fn scoped(owner: &str, field: &str) -> String {
    if owner.is_empty() {
        field.to_string()
    } else {
        format!("{owner}-{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_splits_on_capitals() {
        assert_eq!(format_name("Response"), "response");
        assert_eq!(format_name("StructuredName"), "structured-name");
    }

    #[test]
    fn lowercase_and_underscores() {
        assert_eq!(format_name("code"), "code");
        assert_eq!(format_name("snake_case"), "snake-case");
    }

    #[test]
    fn consecutive_capitals_split_individually() {
        // Each capital starts a run, so acronyms fan out.
        assert_eq!(format_name("UserID"), "user-i-d");
    }

    #[test]
    fn scoped_joins_with_hyphen() {
        assert_eq!(scoped("account", "role"), "account-role");
        assert_eq!(scoped("", "model"), "model");
    }
}
