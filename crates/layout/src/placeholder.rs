//! Placeholder substitution
//!
//! Tokens are literal `[FIELD_NAME]` markers inside bilingual strings.
//! Substitution is a single left-to-right scan: every occurrence of a known
//! token is replaced, substituted values are never re-scanned, and unknown
//! bracketed text is copied through untouched.

use crate::data::{format_display_date, ContractData};
use crate::error::{LayoutError, Result};
use crate::reference::generate_reference_number_at;
use crate::template::DocumentTemplate;
use crate::bilingual::arabic_or_english;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// What to do with a known token whose value is missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Replace with an empty string (legacy behaviour)
    #[default]
    EmptyString,
    /// Leave the `[TOKEN]` text in place
    Preserve,
    /// Fail with [`LayoutError::MissingField`]
    Error,
}

/// The fixed placeholder vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    FirstPartyNameEn,
    FirstPartyNameAr,
    FirstPartyCrn,
    SecondPartyNameEn,
    SecondPartyNameAr,
    SecondPartyCrn,
    ProductNameEn,
    ProductNameAr,
    LocationNameEn,
    LocationNameAr,
    PromoterNameEn,
    PromoterNameAr,
    PromoterId,
    StartDate,
    EndDate,
    LetterheadImageUrl,
    IdCardPhotoUrl,
    PassportPhotoUrl,
    RefNumber,
}

impl Placeholder {
    pub const ALL: [Placeholder; 19] = [
        Placeholder::FirstPartyNameEn,
        Placeholder::FirstPartyNameAr,
        Placeholder::FirstPartyCrn,
        Placeholder::SecondPartyNameEn,
        Placeholder::SecondPartyNameAr,
        Placeholder::SecondPartyCrn,
        Placeholder::ProductNameEn,
        Placeholder::ProductNameAr,
        Placeholder::LocationNameEn,
        Placeholder::LocationNameAr,
        Placeholder::PromoterNameEn,
        Placeholder::PromoterNameAr,
        Placeholder::PromoterId,
        Placeholder::StartDate,
        Placeholder::EndDate,
        Placeholder::LetterheadImageUrl,
        Placeholder::IdCardPhotoUrl,
        Placeholder::PassportPhotoUrl,
        Placeholder::RefNumber,
    ];

    /// Token text without brackets
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::FirstPartyNameEn => "FIRST_PARTY_NAME_EN",
            Placeholder::FirstPartyNameAr => "FIRST_PARTY_NAME_AR",
            Placeholder::FirstPartyCrn => "FIRST_PARTY_CRN",
            Placeholder::SecondPartyNameEn => "SECOND_PARTY_NAME_EN",
            Placeholder::SecondPartyNameAr => "SECOND_PARTY_NAME_AR",
            Placeholder::SecondPartyCrn => "SECOND_PARTY_CRN",
            Placeholder::ProductNameEn => "PRODUCT_NAME_EN",
            Placeholder::ProductNameAr => "PRODUCT_NAME_AR",
            Placeholder::LocationNameEn => "LOCATION_NAME_EN",
            Placeholder::LocationNameAr => "LOCATION_NAME_AR",
            Placeholder::PromoterNameEn => "PROMOTER_NAME_EN",
            Placeholder::PromoterNameAr => "PROMOTER_NAME_AR",
            Placeholder::PromoterId => "PROMOTER_ID",
            Placeholder::StartDate => "START_DATE",
            Placeholder::EndDate => "END_DATE",
            Placeholder::LetterheadImageUrl => "LETTERHEAD_IMAGE_URL",
            Placeholder::IdCardPhotoUrl => "ID_CARD_PHOTO_URL",
            Placeholder::PassportPhotoUrl => "PASSPORT_PHOTO_URL",
            Placeholder::RefNumber => "REF_NUMBER",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.token() == token)
    }

    /// Token text with brackets, as it appears in templates
    pub fn marker(&self) -> String {
        format!("[{}]", self.token())
    }
}

/// Resolved placeholder values; a token without an entry is missing
#[derive(Debug, Clone, Default)]
pub struct PlaceholderValues {
    values: HashMap<Placeholder, String>,
}

impl PlaceholderValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; empty values count as missing
    pub fn set(&mut self, placeholder: Placeholder, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&placeholder);
        } else {
            self.values.insert(placeholder, value);
        }
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }

    /// Build the value map for a contract. Each Arabic token falls back to
    /// its English counterpart independently.
    pub fn from_contract(
        data: &ContractData,
        ref_number: &str,
        letterhead_image_url: &str,
        id_card_photo_url: &str,
        passport_photo_url: &str,
    ) -> Self {
        let mut values = Self::new();
        let date = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(crate::data::parse_contract_date)
                .map(format_display_date)
                .unwrap_or_default()
        };

        values.set(Placeholder::FirstPartyNameEn, data.first_party_name_en.as_str());
        values.set(
            Placeholder::FirstPartyNameAr,
            arabic_or_english(data.first_party_name_ar.as_deref(), &data.first_party_name_en),
        );
        values.set(Placeholder::FirstPartyCrn, data.first_party_crn.clone().unwrap_or_default());
        values.set(Placeholder::SecondPartyNameEn, data.second_party_name_en.as_str());
        values.set(
            Placeholder::SecondPartyNameAr,
            arabic_or_english(data.second_party_name_ar.as_deref(), &data.second_party_name_en),
        );
        values.set(Placeholder::SecondPartyCrn, data.second_party_crn.clone().unwrap_or_default());
        values.set(Placeholder::ProductNameEn, data.product_name_en.as_str());
        values.set(
            Placeholder::ProductNameAr,
            arabic_or_english(data.product_name_ar.as_deref(), &data.product_name_en),
        );
        values.set(Placeholder::LocationNameEn, data.location_name_en.as_str());
        values.set(
            Placeholder::LocationNameAr,
            arabic_or_english(data.location_name_ar.as_deref(), &data.location_name_en),
        );
        values.set(Placeholder::PromoterNameEn, data.promoter_name_en.as_str());
        values.set(
            Placeholder::PromoterNameAr,
            arabic_or_english(data.promoter_name_ar.as_deref(), &data.promoter_name_en),
        );
        values.set(Placeholder::PromoterId, data.promoter_id.clone().unwrap_or_default());
        values.set(Placeholder::StartDate, date(&data.start_date));
        values.set(Placeholder::EndDate, date(&data.end_date));
        values.set(Placeholder::LetterheadImageUrl, letterhead_image_url);
        values.set(Placeholder::IdCardPhotoUrl, id_card_photo_url);
        values.set(Placeholder::PassportPhotoUrl, passport_photo_url);
        values.set(Placeholder::RefNumber, ref_number);

        values
    }
}

/// Replace every known token in `text` in a single pass
pub fn substitute(text: &str, values: &PlaceholderValues, policy: MissingFieldPolicy) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let Some(close) = after.find(']') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };

        match Placeholder::from_token(&after[..close]) {
            Some(placeholder) => {
                match (values.get(placeholder), policy) {
                    (Some(value), _) => out.push_str(value),
                    (None, MissingFieldPolicy::EmptyString) => {}
                    (None, MissingFieldPolicy::Preserve) => out.push_str(&rest[open..open + close + 2]),
                    (None, MissingFieldPolicy::Error) => {
                        return Err(LayoutError::MissingField {
                            field: placeholder.token().to_string(),
                        });
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                // Not a token: keep the bracket and rescan from the next character
                out.push('[');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Fill a document template with contract data using the current time for
/// any generated reference number
///
/// Under the default [`MissingFieldPolicy::EmptyString`] a token whose data
/// is missing is erased, not left in place. Pass
/// [`MissingFieldPolicy::Preserve`] to keep the `[TOKEN]` text.
pub fn fill_template(
    template: &DocumentTemplate,
    data: &ContractData,
    policy: MissingFieldPolicy,
) -> Result<DocumentTemplate> {
    fill_template_at(template, data, policy, Utc::now())
}

/// Fill a document template, producing an independent copy
///
/// The reference number is kept from the template, else taken from the
/// data, else generated. Asset URLs come from the data and fall back to the
/// template's defaults.
pub fn fill_template_at(
    template: &DocumentTemplate,
    data: &ContractData,
    policy: MissingFieldPolicy,
    now: DateTime<Utc>,
) -> Result<DocumentTemplate> {
    let mut filled = template.clone();

    let ref_number = filled
        .ref_number
        .clone()
        .or_else(|| data.ref_number.clone().filter(|r| !r.is_empty()))
        .unwrap_or_else(|| generate_reference_number_at(now));
    filled.ref_number = Some(ref_number.clone());

    if let Some(url) = non_empty(&data.letterhead_image_url) {
        filled.letterhead_image_url = url;
    }
    if let Some(url) = non_empty(&data.id_photo_url) {
        filled.id_card_photo_url = url;
    }
    if let Some(url) = non_empty(&data.passport_photo_url) {
        filled.passport_photo_url = url;
    }

    let values = PlaceholderValues::from_contract(
        data,
        &ref_number,
        &filled.letterhead_image_url,
        &filled.id_card_photo_url,
        &filled.passport_photo_url,
    );

    for page in &mut filled.pages {
        for section in &mut page.sections {
            section.title.en = substitute(&section.title.en, &values, policy)?;
            section.title.ar = substitute(&section.title.ar, &values, policy)?;
            section.content.en = substitute(&section.content.en, &values, policy)?;
            section.content.ar = substitute(&section.content.ar, &values, policy)?;
        }
    }

    debug!(ref_number = %ref_number, pages = filled.pages.len(), "Document template filled");
    Ok(filled)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
