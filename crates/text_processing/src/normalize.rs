//! Transcript normalization
//!
//! Steps, in order:
//! 1. Unicode NFC
//! 2. Drop U+FFFD and ASCII control characters (U+0000 - U+001F)
//! 3. Collapse whitespace runs to a single space
//! 4. Trim

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{is_nfc, UnicodeNormalization};

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{FFFD}\x00-\x1F]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize a transcript fragment for emission and comparison
///
/// Never fails: every `&str` maps to a string with no control characters,
/// no replacement characters and no double spaces.
pub fn normalize_transcript(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let composed: String = text.nfc().collect();
    let mut stripped = CONTROL_CHARS.replace_all(&composed, "").into_owned();

    // A removed control character may have separated a base from its combining mark
    if stripped.len() != composed.len() && !is_nfc(&stripped) {
        stripped = stripped.nfc().collect();
    }

    WHITESPACE_RUN
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Normalize an optional fragment; missing input is the empty string
pub fn normalize_optional(text: Option<&str>) -> String {
    text.map(normalize_transcript).unwrap_or_default()
}

/// Whether the fragment normalizes to nothing
pub fn is_blank(text: &str) -> bool {
    normalize_transcript(text).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_clean(output: &str) {
        assert!(!output.chars().any(|c| (c as u32) < 0x20), "control char in {:?}", output);
        assert!(!output.contains('\u{FFFD}'), "replacement char in {:?}", output);
        assert!(!output.contains("  "), "double space in {:?}", output);
        assert_eq!(output, output.trim());
    }

    #[test]
    fn test_collapse_and_trim() {
        assert_eq!(normalize_transcript("  I want   to order \u{3000} a coffee  "), "I want to order a coffee");
    }

    #[test]
    fn test_control_characters_removed() {
        // Tabs and newlines are control characters and are removed, not spaced
        assert_eq!(normalize_transcript("hel\u{0}lo\u{1F}"), "hello");
        assert_eq!(normalize_transcript("one\ttwo"), "onetwo");
        assert_eq!(normalize_transcript("line\nbreak"), "linebreak");
    }

    #[test]
    fn test_replacement_character_removed() {
        assert_eq!(normalize_transcript("caf\u{FFFD}e"), "cafe");
    }

    #[test]
    fn test_nfc_composition() {
        let decomposed = "cafe\u{301}";
        assert_eq!(normalize_transcript(decomposed), "caf\u{e9}");
    }

    #[test]
    fn test_composition_across_removed_control() {
        assert_eq!(normalize_transcript("e\u{0}\u{301}"), "\u{e9}");
    }

    #[test]
    fn test_empty_and_missing() {
        assert_eq!(normalize_transcript(""), "");
        assert_eq!(normalize_optional(None), "");
        assert_eq!(normalize_optional(Some("  hi ")), "hi");
        assert!(is_blank("   "));
        assert!(is_blank("\u{FFFD}\n\t"));
        assert!(!is_blank(" ok "));
    }

    #[test]
    fn test_idempotence() {
        let samples = [
            "",
            "   ",
            "Nice to meet you.",
            "  spaced\u{00A0}\u{00A0}out  ",
            "e\u{0}\u{301} and a\u{1}\u{308}",
            "\u{FFFD}\u{FFFD}",
            "tab\tsep\rcarriage",
            "mixed \u{2003}\u{2003} unicode\u{200A}spaces",
            "Ångström vs A\u{30A}ngstro\u{308}m",
        ];

        for sample in samples {
            let once = normalize_transcript(sample);
            let twice = normalize_transcript(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
            assert_clean(&once);
        }
    }

    #[test]
    fn test_safety_on_every_low_codepoint() {
        let input: String = (0u32..0x80).filter_map(char::from_u32).collect();
        let output = normalize_transcript(&input);
        assert_clean(&output);
        assert!(output.starts_with('!'));
    }
}
