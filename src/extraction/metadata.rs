//! Timestamp and prompt extraction from item text
//!
//! Everything here works on plain text, so it can be tested and benchmarked
//! without a page. Regexes are compiled once in [`ContentExtractor::new`].

use crate::browser::PageDriver;
use crate::config::ExtractionConfig;
use crate::error::{ExtractionError, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

const SLOW_EXTRACTION: Duration = Duration::from_millis(50);

const DATETIME_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S",
    "%d %B %Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Structured content of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    /// Timestamp as shown on the page, never empty
    pub creation_time: String,
    /// Descriptive text, possibly empty
    pub prompt: String,
}

impl ExtractedMetadata {
    /// Parse the timestamp, when it has a known shape
    pub fn parsed_time(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.creation_time)
    }
}

/// Parse a day-month-year or ISO 8601 timestamp
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

struct CompiledPattern {
    name: String,
    regex: Regex,
}

/// Fast regex-based metadata extractor
pub struct ContentExtractor {
    config: ExtractionConfig,
    timestamps: Vec<CompiledPattern>,
    canonical: Regex,
    noise: Regex,
    symbol_only: Regex,
}

impl std::fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("patterns", &self.timestamps.iter().map(|p| &p.name).collect::<Vec<_>>())
            .field("strict_validation", &self.config.strict_validation)
            .finish()
    }
}

fn compile(name: &str, source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| {
        ExtractionError::InvalidPattern {
            name: name.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

impl ContentExtractor {
    /// Compile every configured pattern
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let timestamps = config
            .timestamp_patterns
            .iter()
            .map(|p| {
                Ok(CompiledPattern {
                    name: p.name.clone(),
                    regex: compile(&p.name, &p.pattern)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            canonical: compile("canonical_datetime", &config.canonical_datetime)?,
            noise: compile("noise", &config.noise_pattern)?,
            symbol_only: compile("symbol_only", &config.symbol_only_pattern)?,
            timestamps,
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract a timestamp and prompt; `None` when no timestamp is found
    pub fn extract_metadata(&self, raw_text: &str) -> Option<ExtractedMetadata> {
        let started = Instant::now();
        if raw_text.chars().count() < self.config.min_input_len {
            return None;
        }
        let raw_text = match raw_text.char_indices().nth(self.config.max_input_len) {
            Some((cut, _)) => &raw_text[..cut],
            None => raw_text,
        };

        let result = self
            .find_timestamp(raw_text)
            .map(|creation_time| self.extract_with_timestamp(raw_text, creation_time));

        let elapsed = started.elapsed();
        if elapsed > SLOW_EXTRACTION {
            debug!(
                "Extraction took {:?} for {} bytes of text",
                elapsed,
                raw_text.len()
            );
        }
        result
    }

    /// Same as [`Self::extract_metadata`], once per input
    pub fn extract_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<Option<ExtractedMetadata>> {
        texts
            .iter()
            .map(|text| self.extract_metadata(text.as_ref()))
            .collect()
    }

    /// Read an item's text and extract from it
    #[instrument(skip(self, page, item))]
    pub async fn extract_from_item<P: PageDriver>(
        &self,
        page: &P,
        item: &P::Element,
    ) -> Option<ExtractedMetadata> {
        match page.inner_text(item).await {
            Ok(text) => self.extract_metadata(&text),
            Err(e) => {
                debug!("Item text unavailable: {}", e);
                None
            }
        }
    }

    /// Build metadata around an already-known timestamp
    pub fn extract_with_timestamp<T: Into<String>>(
        &self,
        raw_text: &str,
        creation_time: T,
    ) -> ExtractedMetadata {
        let creation_time = creation_time.into();
        let prompt = self
            .prompt_after_timestamp(raw_text, &creation_time)
            .or_else(|| self.longest_valid_line(raw_text, &creation_time))
            .unwrap_or_default();
        ExtractedMetadata {
            creation_time,
            prompt,
        }
    }

    /// First timestamp accepted by the ordered pattern list
    pub fn find_timestamp(&self, text: &str) -> Option<String> {
        for pattern in &self.timestamps {
            let Some(caps) = pattern.regex.captures(text) else {
                continue;
            };
            let Some(matched) = caps.get(1).or_else(|| caps.get(0)) else {
                continue;
            };
            let candidate = matched.as_str().trim();
            if candidate.is_empty() {
                continue;
            }
            if self.config.strict_validation && !self.canonical.is_match(candidate) {
                debug!(
                    "Pattern {} matched '{}' but it is not a canonical datetime",
                    pattern.name, candidate
                );
                continue;
            }
            return Some(candidate.to_string());
        }
        None
    }

    /// Whether a line could be a description
    pub fn is_valid_prompt_line(&self, line: &str) -> bool {
        let line = line.trim();
        let len = line.chars().count();
        len >= self.config.min_prompt_len
            && len <= self.config.max_prompt_len
            && !self.noise.is_match(line)
            && !self.symbol_only.is_match(line)
            && line.split_whitespace().count() >= self.config.min_words
            && line.chars().any(char::is_alphabetic)
    }

    fn prompt_after_timestamp(&self, text: &str, timestamp: &str) -> Option<String> {
        let mut lines = text.lines().skip_while(|line| !line.contains(timestamp));
        lines.next()?;
        lines
            .find(|line| self.is_valid_prompt_line(line))
            .map(|line| line.trim().to_string())
    }

    fn longest_valid_line(&self, text: &str, timestamp: &str) -> Option<String> {
        text.lines()
            .filter(|line| !line.contains(timestamp))
            .filter(|line| self.is_valid_prompt_line(line))
            .map(str::trim)
            .fold(None, |best: Option<&str>, line| match best {
                Some(b) if b.chars().count() >= line.chars().count() => Some(b),
                _ => Some(line),
            })
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimestampPattern;
    use pretty_assertions::assert_eq;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn test_labeled_timestamp_and_following_prompt() {
        let meta = extractor()
            .extract_metadata(
                "Creation Time 25 Aug 2025 02:30:47\nA vivid market scene with vendors and colorful awnings.",
            )
            .unwrap();
        assert_eq!(meta.creation_time, "25 Aug 2025 02:30:47");
        assert_eq!(
            meta.prompt,
            "A vivid market scene with vendors and colorful awnings."
        );
    }

    #[test]
    fn test_rejects_empty_and_dateless() {
        let ex = extractor();
        assert_eq!(ex.extract_metadata(""), None);
        assert_eq!(ex.extract_metadata("short"), None);
        assert_eq!(ex.extract_metadata("Just some unrelated text without dates"), None);
    }

    #[test]
    fn test_timestamp_without_prompt() {
        let meta = extractor()
            .extract_metadata("Creation Time 25 Aug 2025 02:30:47\nDownload\n★★★")
            .unwrap();
        assert_eq!(meta.creation_time, "25 Aug 2025 02:30:47");
        assert_eq!(meta.prompt, "");
    }

    #[test]
    fn test_skips_noise_before_prompt() {
        let text = "Creation Time 25 Aug 2025 02:30:47\nCopy prompt\nok\n\
                    An old lighthouse on a cliff during a storm";
        let meta = extractor().extract_metadata(text).unwrap();
        assert_eq!(meta.prompt, "An old lighthouse on a cliff during a storm");
    }

    #[test]
    fn test_falls_back_to_longest_line_before_timestamp() {
        let text = "short one here\nA child flying a red kite over green hills at noon\n\
                    Created: 1 Mar 2024 09:00:00\nShare";
        let meta = extractor().extract_metadata(text).unwrap();
        assert_eq!(meta.creation_time, "1 Mar 2024 09:00:00");
        assert_eq!(meta.prompt, "A child flying a red kite over green hills at noon");
    }

    #[test]
    fn test_strict_validation_moves_to_next_pattern() {
        // labeled value lacks seconds, the ISO value further down is accepted
        let text = "Creation Time 25 Aug 2025 02:30\n2025-08-25T02:30:47Z\nsome words for a prompt";
        let ex = extractor();
        assert_eq!(ex.find_timestamp(text).as_deref(), Some("2025-08-25T02:30:47Z"));

        let lenient = ContentExtractor::new(ExtractionConfig {
            strict_validation: false,
            ..ExtractionConfig::default()
        })
        .unwrap();
        assert_eq!(lenient.find_timestamp(text).as_deref(), Some("25 Aug 2025 02:30"));
    }

    #[test]
    fn test_standalone_timestamp() {
        let meta = extractor()
            .extract_metadata("posted 7 Jan 2025 18:04:12 by someone\na cat asleep on warm laundry")
            .unwrap();
        assert_eq!(meta.creation_time, "7 Jan 2025 18:04:12");
        assert_eq!(meta.prompt, "a cat asleep on warm laundry");
    }

    #[test]
    fn test_prompt_line_filters() {
        let ex = extractor();
        assert!(ex.is_valid_prompt_line("  three word line  "));
        assert!(!ex.is_valid_prompt_line("two words"));
        assert!(!ex.is_valid_prompt_line("1234 5678 9012"));
        assert!(!ex.is_valid_prompt_line("Download"));
        assert!(!ex.is_valid_prompt_line(&"word ".repeat(500)));
    }

    #[test]
    fn test_batch_is_independent() {
        let ex = extractor();
        let out = ex.extract_batch(&[
            "Creation Time 25 Aug 2025 02:30:47\nA vivid market scene with vendors",
            "",
            "nothing useful in this one",
        ]);
        assert_eq!(out.len(), 3);
        assert!(out[0].is_some());
        assert!(out[1].is_none());
        assert!(out[2].is_none());
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let config = ExtractionConfig {
            timestamp_patterns: vec![TimestampPattern::new("broken", "(unclosed")],
            ..ExtractionConfig::default()
        };
        let err = ContentExtractor::new(config).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_text_past_max_input_len_is_ignored() {
        let text = format!(
            "{}Creation Time 25 Aug 2025 02:30:47\nA lantern floating over a still lake",
            "filler line\n".repeat(10)
        );
        assert!(extractor().extract_metadata(&text).is_some());

        let config = ExtractionConfig {
            max_input_len: 60,
            ..ExtractionConfig::default()
        };
        let short = ContentExtractor::new(config).unwrap();
        assert_eq!(short.extract_metadata(&text), None);
    }

    #[test]
    fn test_parse_timestamp_shapes() {
        assert!(parse_timestamp("25 Aug 2025 02:30:47").is_some());
        assert!(parse_timestamp("3 September 2024 14:05:00").is_some());
        assert!(parse_timestamp("2025-08-25T02:30:47Z").is_some());
        assert!(parse_timestamp("2025-08-25 02:30:47").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }
}
