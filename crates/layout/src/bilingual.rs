//! English/Arabic text pairs
//!
//! Every bilingual value carries an English rendering. The Arabic rendering
//! falls back to the English one, per field, whenever it is absent or blank,
//! so an output document never holds an empty Arabic side for a field that
//! has an English value.

use serde::{Deserialize, Serialize};

/// A pair of English and Arabic renderings of the same text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    pub en: String,
    pub ar: String,
}

impl BilingualText {
    /// Build from two explicit renderings
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// Build from an English value and an optional Arabic value,
    /// substituting the English value for a missing Arabic one
    pub fn with_fallback(en: &str, ar: Option<&str>) -> Self {
        Self {
            en: en.to_string(),
            ar: arabic_or_english(ar, en),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.en.is_empty() && self.ar.is_empty()
    }
}

/// Resolve an Arabic value, falling back to English when absent or blank
pub fn arabic_or_english(ar: Option<&str>, en: &str) -> String {
    match ar {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => en.to_string(),
    }
}

/// Render ASCII digits as Arabic-Indic digits (٠١٢٣٤٥٦٧٨٩)
pub fn to_arabic_indic_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) => char::from_u32(0x0660 + d).unwrap_or(c),
            None => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_when_missing() {
        let text = BilingualText::with_fallback("Acme", None);
        assert_eq!(text.ar, "Acme");
    }

    #[test]
    fn test_fallback_when_blank() {
        let text = BilingualText::with_fallback("Acme", Some("   "));
        assert_eq!(text.ar, "Acme");
    }

    #[test]
    fn test_arabic_kept_when_present() {
        let text = BilingualText::with_fallback("Acme", Some("أكمي"));
        assert_eq!(text.en, "Acme");
        assert_eq!(text.ar, "أكمي");
    }

    #[test]
    fn test_arabic_indic_digits() {
        assert_eq!(to_arabic_indic_digits("30"), "٣٠");
        assert_eq!(to_arabic_indic_digits("01/06/2024"), "٠١/٠٦/٢٠٢٤");
        assert_eq!(to_arabic_indic_digits("ID123"), "ID١٢٣");
    }
}
