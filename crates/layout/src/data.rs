//! Contract input data and its resolved (fallback-applied) view

use crate::bilingual::{to_arabic_indic_digits, BilingualText};
use crate::MS_PER_DAY;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw contract data as entered by users
///
/// English values default to empty strings and Arabic values are optional.
/// Dates are kept as the caller supplied them and parsed leniently when the
/// contract is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractData {
    #[serde(default)]
    pub first_party_name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_party_name_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_party_crn: Option<String>,

    #[serde(default)]
    pub second_party_name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_party_name_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_party_crn: Option<String>,

    #[serde(default)]
    pub promoter_name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoter_name_ar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promoter_id: Option<String>,

    #[serde(default)]
    pub product_name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name_ar: Option<String>,

    #[serde(default)]
    pub location_name_en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name_ar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letterhead_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passport_photo_url: Option<String>,

    /// Selects a registered document template (v2.0 output)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,

    /// Caller-supplied reference number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_number: Option<String>,
}

/// Contract data with every fallback applied and dates interpreted
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedContract {
    pub first_party: BilingualText,
    pub second_party: BilingualText,
    pub first_party_crn: String,
    pub second_party_crn: String,
    pub promoter: BilingualText,
    pub promoter_id: String,
    pub product: BilingualText,
    pub location: BilingualText,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub duration_days: Option<i64>,
    pub letterhead_image_url: String,
    pub id_photo_url: String,
    pub passport_photo_url: String,
}

impl ContractData {
    /// Apply per-field Arabic fallbacks and parse dates
    pub fn resolve(&self) -> ResolvedContract {
        let start = self.start_date.as_deref().and_then(parse_contract_date);
        let end = self.end_date.as_deref().and_then(parse_contract_date);

        ResolvedContract {
            first_party: BilingualText::with_fallback(
                &self.first_party_name_en,
                self.first_party_name_ar.as_deref(),
            ),
            second_party: BilingualText::with_fallback(
                &self.second_party_name_en,
                self.second_party_name_ar.as_deref(),
            ),
            first_party_crn: self.first_party_crn.clone().unwrap_or_default(),
            second_party_crn: self.second_party_crn.clone().unwrap_or_default(),
            promoter: BilingualText::with_fallback(
                &self.promoter_name_en,
                self.promoter_name_ar.as_deref(),
            ),
            promoter_id: self.promoter_id.clone().unwrap_or_default(),
            product: BilingualText::with_fallback(
                &self.product_name_en,
                self.product_name_ar.as_deref(),
            ),
            location: BilingualText::with_fallback(
                &self.location_name_en,
                self.location_name_ar.as_deref(),
            ),
            start,
            end,
            duration_days: match (start, end) {
                (Some(s), Some(e)) => Some(duration_days(s, e)),
                _ => None,
            },
            letterhead_image_url: self.letterhead_image_url.clone().unwrap_or_default(),
            id_photo_url: self.id_photo_url.clone().unwrap_or_default(),
            passport_photo_url: self.passport_photo_url.clone().unwrap_or_default(),
        }
    }
}

impl ResolvedContract {
    pub fn start_display(&self) -> String {
        self.start.map(format_display_date).unwrap_or_default()
    }

    pub fn end_display(&self) -> String {
        self.end.map(format_display_date).unwrap_or_default()
    }

    pub fn start_display_ar(&self) -> String {
        to_arabic_indic_digits(&self.start_display())
    }

    pub fn end_display_ar(&self) -> String {
        to_arabic_indic_digits(&self.end_display())
    }

    pub fn duration_display(&self) -> String {
        self.duration_days.map(|d| d.to_string()).unwrap_or_default()
    }

    pub fn duration_display_ar(&self) -> String {
        to_arabic_indic_digits(&self.duration_display())
    }
}

/// Parse a contract date given as a plain date, an RFC 3339 timestamp or a
/// naive ISO timestamp. Plain dates are taken as midnight UTC.
pub fn parse_contract_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Whole days between two instants, rounded up: `ceil((end - start) / 1 day)`
pub fn duration_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let diff_ms = (end - start).num_milliseconds();
    let days = diff_ms.div_euclid(MS_PER_DAY);
    if diff_ms.rem_euclid(MS_PER_DAY) != 0 {
        days + 1
    } else {
        days
    }
}

/// Date rendering used inside contract prose and placeholders (DD/MM/YYYY)
pub fn format_display_date(date: DateTime<Utc>) -> String {
    date.format("%d/%m/%Y").to_string()
}
