//! Default regex sources for metadata extraction
//!
//! Timestamp captures are confined to one line (`[ \t]`, never `\s`) so the
//! line holding a timestamp can be found again afterwards.

use crate::config::TimestampPattern;

const DMY_LOOSE: &str = r"(\d{1,2}[ \t]+[A-Za-z]{3,9}\.?[ \t]+\d{4}(?:[ \t]+\d{1,2}:\d{2}(?::\d{2})?)?)";

/// Shape a timestamp must have under strict validation: day-month-year or
/// ISO 8601, both with seconds
pub const CANONICAL_DATETIME: &str = r"^(?:\d{1,2} (?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]* \d{4} \d{1,2}:\d{2}:\d{2}|\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)$";

/// Lines that are a UI label with at most two trailing tokens
pub const DEFAULT_NOISE: &str = r"(?i)^(?:download|share|copy(?: prompt)?|delete|like|more|edit|remix|reuse|upscale|variations?|creation time|created(?: at| on)?|prompt|model|size|seed|style|aspect ratio|resolution)[ \t]*:?(?:[ \t]+\S+){0,2}[ \t]*$";

/// Lines without a single letter
pub const SYMBOL_ONLY: &str = r"^[^\p{L}]+$";

/// Timestamp patterns, most specific first
pub fn default_timestamp_patterns() -> Vec<TimestampPattern> {
    vec![
        TimestampPattern::new(
            "creation_time",
            format!(r"(?i)creation[ \t]+time[ \t]*:?[ \t]*{DMY_LOOSE}"),
        ),
        TimestampPattern::new(
            "created",
            format!(r"(?i)created(?:[ \t]+(?:at|on))?[ \t]*:?[ \t]*{DMY_LOOSE}"),
        ),
        TimestampPattern::new(
            "date_time",
            format!(r"(?i)\b(?:date|time)[ \t]*:[ \t]*{DMY_LOOSE}"),
        ),
        TimestampPattern::new(
            "iso_8601",
            r"\b(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)",
        ),
        TimestampPattern::new(
            "standalone",
            r"(?i)\b(\d{1,2} (?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]* \d{4} \d{1,2}:\d{2}:\d{2})\b",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_defaults_compile() {
        for p in default_timestamp_patterns() {
            assert!(Regex::new(&p.pattern).is_ok(), "{} failed to compile", p.name);
        }
        for source in [CANONICAL_DATETIME, DEFAULT_NOISE, SYMBOL_ONLY] {
            assert!(Regex::new(source).is_ok());
        }
    }

    #[test]
    fn test_canonical_shapes() {
        let re = Regex::new(CANONICAL_DATETIME).unwrap();
        assert!(re.is_match("25 Aug 2025 02:30:47"));
        assert!(re.is_match("3 September 2024 14:05:00"));
        assert!(re.is_match("2025-08-25T02:30:47Z"));
        assert!(!re.is_match("25 Aug 2025 02:30"));
        assert!(!re.is_match("25 Aug 2025"));
    }

    #[test]
    fn test_noise_lines() {
        let re = Regex::new(DEFAULT_NOISE).unwrap();
        assert!(re.is_match("Download"));
        assert!(re.is_match("Copy prompt"));
        assert!(re.is_match("Aspect ratio: 16:9"));
        assert!(!re.is_match("A vivid market scene with vendors"));
        assert!(!re.is_match("Share your morning coffee with a fox in the garden"));
    }

    #[test]
    fn test_symbol_only() {
        let re = Regex::new(SYMBOL_ONLY).unwrap();
        assert!(re.is_match("★★★ 12:30 — !!"));
        assert!(!re.is_match("★ star"));
    }
}
