use regex_lite::Regex;
use std::sync::OnceLock;

use crate::error::{LgError, LgResult};

/// Longest AS-path pattern accepted from callers
pub const MAX_ASPATH_LEN: usize = 30;

fn aspath_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9_]+\$?$").ok()).as_ref()
}

/// Validate a caller-supplied AS-path pattern and anchor it the way vendor
/// CLIs expect (`_` prefix, `_` or `$` suffix).
///
/// Only digits, underscores and one trailing `$` pass; this is the only
/// barrier before the pattern is spliced into a device command.
pub fn sanitize_aspath(aspath: &str) -> LgResult<String> {
    if aspath.is_empty() {
        return Err(LgError::AsPathEmpty);
    }
    if aspath.len() > MAX_ASPATH_LEN {
        return Err(LgError::AsPathTooLong);
    }
    if !aspath_regex().is_some_and(|re| re.is_match(aspath)) {
        return Err(LgError::AsPathMalformed);
    }

    let mut pattern = String::with_capacity(aspath.len() + 2);
    if !aspath.starts_with('_') {
        pattern.push('_');
    }
    pattern.push_str(aspath);
    if !pattern.ends_with('_') && !pattern.ends_with('$') {
        pattern.push('$');
    }
    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchored_pattern_unchanged() {
        assert_eq!(sanitize_aspath("_65000_").unwrap(), "_65000_");
        assert_eq!(sanitize_aspath("_65000$").unwrap(), "_65000$");
    }

    #[test]
    fn test_anchors_added() {
        assert_eq!(sanitize_aspath("65000").unwrap(), "_65000$");
        assert_eq!(sanitize_aspath("65000_").unwrap(), "_65000_");
        assert_eq!(sanitize_aspath("65000$").unwrap(), "_65000$");
        assert_eq!(sanitize_aspath("_65000").unwrap(), "_65000$");
        assert_eq!(sanitize_aspath("3356_65000").unwrap(), "_3356_65000$");
    }

    #[test]
    fn test_length_limits() {
        assert!(matches!(sanitize_aspath(""), Err(LgError::AsPathEmpty)));
        let at_limit = "1".repeat(MAX_ASPATH_LEN);
        assert!(sanitize_aspath(&at_limit).is_ok());
        let too_long = "1".repeat(MAX_ASPATH_LEN + 1);
        assert!(matches!(sanitize_aspath(&too_long), Err(LgError::AsPathTooLong)));
    }

    #[test]
    fn test_rejects_metacharacters() {
        for input in [
            "65000; rm -rf",
            "65000 | include",
            ".*",
            "^65000",
            "65000$$",
            "$65000",
            "65000'",
            "65000\n",
            "[0-9]+",
        ] {
            assert!(
                matches!(sanitize_aspath(input), Err(LgError::AsPathMalformed)),
                "accepted {:?}",
                input
            );
        }
    }
}
