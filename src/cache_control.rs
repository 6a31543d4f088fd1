// src/cache_control.rs
use std::collections::HashMap;

/// Used when upstream says nothing usable about freshness: one week.
pub const DEFAULT_MAX_AGE: u64 = 604_800;

/// Splits a `Cache-Control` value into lower-cased `directive -> value` pairs.
/// Values are unquoted; valueless directives map to an empty string.
fn parse_directives(raw: &str) -> HashMap<String, String> {
    raw.split(',')
        .filter_map(|directive| {
            let directive = directive.trim();
            if directive.is_empty() {
                return None;
            }
            let (key, value) = match directive.split_once('=') {
                Some((k, v)) => (k, v.trim().trim_matches('"').to_ascii_lowercase()),
                None => (directive, String::new()),
            };
            Some((key.trim().to_ascii_lowercase(), value))
        })
        .collect()
}

/// Effective max-age in seconds. `s-maxage` wins over `max-age`; a missing or
/// unparseable value falls back to [`DEFAULT_MAX_AGE`].
pub fn parse_max_age(header: Option<&str>) -> u64 {
    let Some(raw) = header else {
        return DEFAULT_MAX_AGE;
    };
    let directives = parse_directives(raw);
    directives
        .get("s-maxage")
        .or_else(|| directives.get("max-age"))
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_MAX_AGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_max_age_takes_precedence() {
        assert_eq!(parse_max_age(Some("s-maxage=10, max-age=20")), 10);
        assert_eq!(parse_max_age(Some("max-age=20, s-maxage=10")), 10);
    }

    #[test]
    fn plain_max_age() {
        assert_eq!(parse_max_age(Some("max-age=20")), 20);
        assert_eq!(parse_max_age(Some("public, MAX-AGE=\"3600\"")), 3600);
    }

    #[test]
    fn missing_or_garbled_falls_back_to_default() {
        assert_eq!(parse_max_age(None), DEFAULT_MAX_AGE);
        assert_eq!(parse_max_age(Some("")), DEFAULT_MAX_AGE);
        assert_eq!(parse_max_age(Some("no-cache")), DEFAULT_MAX_AGE);
        assert_eq!(parse_max_age(Some("max-age=soon")), DEFAULT_MAX_AGE);
        assert_eq!(parse_max_age(Some("max-age=-5")), DEFAULT_MAX_AGE);
    }

    #[test]
    fn garbled_shared_value_does_not_fall_through_to_max_age() {
        assert_eq!(parse_max_age(Some("s-maxage=x, max-age=20")), DEFAULT_MAX_AGE);
    }
}
