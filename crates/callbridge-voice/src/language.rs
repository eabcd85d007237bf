//! Script-based language detection for Indian languages.
//!
//! Detection looks only at Unicode code-point ranges. The first script in
//! [`PRIORITY`] with any character present wins, regardless of how many
//! characters of other scripts the text contains.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Language tags the detector can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LanguageTag {
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "ta")]
    Tamil,
    #[serde(rename = "kn")]
    Kannada,
    #[serde(rename = "ml")]
    Malayalam,
    #[serde(rename = "gu")]
    Gujarati,
    #[serde(rename = "bn")]
    Bengali,
    #[serde(rename = "pa")]
    Punjabi,
    #[serde(rename = "od")]
    Odia,
    #[default]
    #[serde(rename = "en")]
    English,
}

/// Scripts checked by [`detect`], highest priority first.
pub const PRIORITY: [(LanguageTag, RangeInclusive<char>); 9] = [
    (LanguageTag::Telugu, '\u{0C00}'..='\u{0C7F}'),
    (LanguageTag::Hindi, '\u{0900}'..='\u{097F}'),
    (LanguageTag::Tamil, '\u{0B80}'..='\u{0BFF}'),
    (LanguageTag::Kannada, '\u{0C80}'..='\u{0CFF}'),
    (LanguageTag::Malayalam, '\u{0D00}'..='\u{0D7F}'),
    (LanguageTag::Gujarati, '\u{0A80}'..='\u{0AFF}'),
    (LanguageTag::Bengali, '\u{0980}'..='\u{09FF}'),
    (LanguageTag::Punjabi, '\u{0A00}'..='\u{0A7F}'),
    (LanguageTag::Odia, '\u{0B00}'..='\u{0B7F}'),
];

impl LanguageTag {
    /// Short tag, e.g. `"te"`.
    pub fn code(self) -> &'static str {
        match self {
            Self::Telugu => "te",
            Self::Hindi => "hi",
            Self::Tamil => "ta",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Gujarati => "gu",
            Self::Bengali => "bn",
            Self::Punjabi => "pa",
            Self::Odia => "od",
            Self::English => "en",
        }
    }

    /// Locale understood by the TTS provider, e.g. `"te-IN"`.
    pub fn locale(self) -> &'static str {
        match self {
            Self::Telugu => "te-IN",
            Self::Hindi => "hi-IN",
            Self::Tamil => "ta-IN",
            Self::Kannada => "kn-IN",
            Self::Malayalam => "ml-IN",
            Self::Gujarati => "gu-IN",
            Self::Bengali => "bn-IN",
            Self::Punjabi => "pa-IN",
            Self::Odia => "od-IN",
            Self::English => "en-IN",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Detects the language of `text` from the scripts it uses.
///
/// Returns [`LanguageTag::English`] when no recognized script is present.
pub fn detect(text: &str) -> LanguageTag {
    PRIORITY
        .iter()
        .find(|(_, range)| text.chars().any(|c| range.contains(&c)))
        .map(|(tag, _)| *tag)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_script_samples() {
        let cases = [
            ("నమస్కారం", LanguageTag::Telugu),
            ("नमस्ते", LanguageTag::Hindi),
            ("வணக்கம்", LanguageTag::Tamil),
            ("ನಮಸ್ಕಾರ", LanguageTag::Kannada),
            ("നമസ്കാരം", LanguageTag::Malayalam),
            ("નમસ્તે", LanguageTag::Gujarati),
            ("নমস্কার", LanguageTag::Bengali),
            ("ਸਤ ਸ੍ਰੀ ਅਕਾਲ", LanguageTag::Punjabi),
            ("ନମସ୍କାର", LanguageTag::Odia),
        ];
        for (text, expected) in cases {
            assert_eq!(detect(text), expected, "text: {}", text);
        }
    }

    #[test]
    fn every_code_point_in_each_range_is_detected() {
        for (tag, range) in PRIORITY.iter() {
            for c in range.clone() {
                assert_eq!(detect(&c.to_string()), *tag, "code point {:?}", c);
            }
        }
    }

    #[test]
    fn unrecognized_text_defaults_to_english() {
        assert_eq!(detect("Hello there"), LanguageTag::English);
        assert_eq!(detect(""), LanguageTag::English);
        assert_eq!(detect("こんにちは 123 !?"), LanguageTag::English);
    }

    #[test]
    fn mixed_script_follows_priority_not_frequency() {
        // One Telugu character outweighs a long Hindi sentence.
        let text = "नमस्ते नमस्ते नमस्ते नमस्ते న";
        assert_eq!(detect(text), LanguageTag::Telugu);

        // Hindi beats Tamil, Tamil beats Kannada.
        assert_eq!(detect("வணக்கம் वा"), LanguageTag::Hindi);
        assert_eq!(detect("ನಮಸ್ಕಾರ ವ ம"), LanguageTag::Tamil);

        // Bengali outranks Punjabi which outranks Odia.
        assert_eq!(detect("ਸਤ ନ ক"), LanguageTag::Bengali);
        assert_eq!(detect("ନମସ୍କାର ਸ"), LanguageTag::Punjabi);
    }

    #[test]
    fn english_with_one_indic_character() {
        assert_eq!(detect("Order number ௧ confirmed"), LanguageTag::Tamil);
    }

    #[test]
    fn codes_and_locales() {
        assert_eq!(LanguageTag::Odia.code(), "od");
        assert_eq!(LanguageTag::Odia.locale(), "od-IN");
        assert_eq!(LanguageTag::English.locale(), "en-IN");
        assert_eq!(LanguageTag::Hindi.to_string(), "hi");
    }
}
