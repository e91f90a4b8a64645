//! Languages the Qwen3-TTS voice-clone model can speak

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::TtsError;

/// Supported output language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Chinese,
    Japanese,
    Korean,
    German,
    French,
    Russian,
    Spanish,
    Italian,
    Portuguese,
}

impl Language {
    /// Every supported language, in menu order
    pub const ALL: [Language; 10] = [
        Language::English,
        Language::Chinese,
        Language::Japanese,
        Language::Korean,
        Language::German,
        Language::French,
        Language::Russian,
        Language::Spanish,
        Language::Italian,
        Language::Portuguese,
    ];

    /// Name the engine expects (e.g. "English")
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::German => "German",
            Self::French => "French",
            Self::Russian => "Russian",
            Self::Spanish => "Spanish",
            Self::Italian => "Italian",
            Self::Portuguese => "Portuguese",
        }
    }

    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Chinese => "zh",
            Self::Japanese => "ja",
            Self::Korean => "ko",
            Self::German => "de",
            Self::French => "fr",
            Self::Russian => "ru",
            Self::Spanish => "es",
            Self::Italian => "it",
            Self::Portuguese => "pt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = TtsError;

    /// Accepts the English name (any case) or the ISO code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Language::ALL
            .iter()
            .copied()
            .find(|lang| {
                lang.name().eq_ignore_ascii_case(wanted) || lang.code().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| {
                TtsError::validation(
                    "language",
                    format!(
                        "unsupported language '{}' (expected one of: {})",
                        wanted,
                        Language::ALL.map(|l| l.name()).join(", ")
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("English".parse::<Language>().unwrap(), Language::English);
        assert_eq!("japanese".parse::<Language>().unwrap(), Language::Japanese);
        assert_eq!(" zh ".parse::<Language>().unwrap(), Language::Chinese);
        assert_eq!("PT".parse::<Language>().unwrap(), Language::Portuguese);
    }

    #[test]
    fn test_parse_unsupported() {
        let err = "Klingon".parse::<Language>().unwrap_err();
        assert!(matches!(err, TtsError::Validation { .. }));
        assert!(err.to_string().contains("Klingon"));
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn test_all_is_complete() {
        assert_eq!(Language::ALL.len(), 10);
        assert_eq!(Language::default(), Language::English);
        for lang in Language::ALL {
            assert_eq!(lang.name().parse::<Language>().unwrap(), lang);
        }
    }
}
