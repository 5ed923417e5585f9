//! Language detection abstraction
//!
//! Detection is a best-effort collaborator: implementations return an
//! ISO-639-1 code for the dominant language of a text, and callers fall
//! back to English when detection fails.

use crate::errors::{AppError, Result};
use whatlang::Lang;

/// Trait for language detection
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of a text, returning an ISO-639-1 code
    fn detect(&self, text: &str) -> Result<String>;
}

/// Detector backed by the whatlang trigram classifier
#[derive(Debug, Default)]
pub struct WhatlangDetector;

impl WhatlangDetector {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String> {
        let info = whatlang::detect(text).ok_or_else(|| AppError::Detection {
            message: "no language candidate".to_string(),
        })?;

        match iso_639_1(info.lang()) {
            Some(code) => Ok(code.to_string()),
            None => Err(AppError::Detection {
                message: format!("no ISO-639-1 code for {}", info.lang().code()),
            }),
        }
    }
}

// whatlang reports ISO-639-3; retrieval metadata and the translation
// collaborator speak ISO-639-1.
fn iso_639_1(lang: Lang) -> Option<&'static str> {
    let code = match lang {
        Lang::Eng => "en",
        Lang::Spa => "es",
        Lang::Fra => "fr",
        Lang::Deu => "de",
        Lang::Ita => "it",
        Lang::Por => "pt",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Bel => "be",
        Lang::Pol => "pl",
        Lang::Ces => "cs",
        Lang::Slk => "sk",
        Lang::Bul => "bg",
        Lang::Slv => "sl",
        Lang::Hrv => "hr",
        Lang::Srp => "sr",
        Lang::Mkd => "mk",
        Lang::Dan => "da",
        Lang::Swe => "sv",
        Lang::Nob => "nb",
        Lang::Fin => "fi",
        Lang::Est => "et",
        Lang::Lav => "lv",
        Lang::Lit => "lt",
        Lang::Ron => "ro",
        Lang::Hun => "hu",
        Lang::Ell => "el",
        Lang::Tur => "tr",
        Lang::Aze => "az",
        Lang::Kat => "ka",
        Lang::Hye => "hy",
        Lang::Ara => "ar",
        Lang::Heb => "he",
        Lang::Pes => "fa",
        Lang::Urd => "ur",
        Lang::Hin => "hi",
        Lang::Ben => "bn",
        Lang::Tam => "ta",
        Lang::Tel => "te",
        Lang::Mal => "ml",
        Lang::Kan => "kn",
        Lang::Mar => "mr",
        Lang::Guj => "gu",
        Lang::Pan => "pa",
        Lang::Nep => "ne",
        Lang::Sin => "si",
        Lang::Tha => "th",
        Lang::Khm => "km",
        Lang::Mya => "my",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        Lang::Jav => "jv",
        Lang::Tgl => "tl",
        Lang::Kor => "ko",
        Lang::Jpn => "ja",
        Lang::Cmn => "zh",
        Lang::Amh => "am",
        Lang::Afr => "af",
        Lang::Cat => "ca",
        Lang::Lat => "la",
        Lang::Epo => "eo",
        Lang::Uzb => "uz",
        Lang::Tuk => "tk",
        Lang::Yid => "yi",
        _ => return None,
    };
    Some(code)
}

/// Fixed-answer detector for testing
pub struct MockDetector {
    code: Option<String>,
}

impl MockDetector {
    /// Always detect the given code
    pub fn returning(code: &str) -> Self {
        Self {
            code: Some(code.to_string()),
        }
    }

    /// Always fail detection
    pub fn failing() -> Self {
        Self { code: None }
    }
}

impl LanguageDetector for MockDetector {
    fn detect(&self, _text: &str) -> Result<String> {
        match &self.code {
            Some(code) => Ok(code.clone()),
            None => Err(AppError::Detection {
                message: "mock failure".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let detector = WhatlangDetector::new();
        let code = detector
            .detect("The quick brown fox jumps over the lazy dog near the river bank.")
            .unwrap();
        assert_eq!(code, "en");
    }

    #[test]
    fn test_detects_spanish() {
        let detector = WhatlangDetector::new();
        let code = detector
            .detect("El zorro marrón salta rápidamente sobre el perro perezoso en el parque.")
            .unwrap();
        assert_eq!(code, "es");
    }

    #[test]
    fn test_code_is_two_letters() {
        let detector = WhatlangDetector::new();
        let code = detector
            .detect("Dies ist ein ganz normaler deutscher Beispielsatz über das Wetter.")
            .unwrap();
        assert_eq!(code.len(), 2);
    }

    #[test]
    fn test_mock_failure() {
        let detector = MockDetector::failing();
        assert!(detector.detect("anything").is_err());
    }
}
