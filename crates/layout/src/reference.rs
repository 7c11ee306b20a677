//! Document reference numbers
//!
//! Format: `PAC-{DD}{MM}{YYYY}-{first 8 hex chars of a v4 UUID}`. The Figma
//! generator issues its own `CONT-` references; the two formats are kept
//! apart because stored documents depend on both.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const REFERENCE_PREFIX: &str = "PAC";

/// Generate a reference number stamped with the current date
pub fn generate_reference_number() -> String {
    generate_reference_number_at(Utc::now())
}

/// Generate a reference number stamped with the given date
pub fn generate_reference_number_at(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", REFERENCE_PREFIX, now.format("%d%m%Y"), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_reference_format() {
        let pattern = regex_lite::Regex::new(r"^PAC-\d{8}-[0-9a-f]{8}$").unwrap();
        for _ in 0..20 {
            let reference = generate_reference_number();
            assert!(pattern.is_match(&reference), "bad reference {}", reference);
        }
    }

    #[test]
    fn test_reference_uses_day_month_year() {
        let now = Utc.with_ymd_and_hms(2024, 6, 9, 10, 0, 0).unwrap();
        let reference = generate_reference_number_at(now);
        assert!(reference.starts_with("PAC-09062024-"));
    }

    #[test]
    fn test_references_are_unique() {
        let a = generate_reference_number();
        let b = generate_reference_number();
        assert_ne!(a, b);
    }
}
