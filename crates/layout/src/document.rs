//! Page/section contract documents
//!
//! Two document shapes share one envelope discriminated by `version`:
//! - `1.0`: the legacy contract, two pages of hand-authored bilingual prose
//! - `2.0`: a registered document template with every placeholder filled

use crate::bilingual::BilingualText;
use crate::clauses;
use crate::data::{ContractData, ResolvedContract};
use crate::error::Result;
use crate::placeholder::{fill_template_at, MissingFieldPolicy};
use crate::template::{document_template, DocumentTemplate};
use crate::DEFAULT_TEMPLATE_TYPE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// A generated contract layout document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum ContractLayoutDocument {
    #[serde(rename = "1.0")]
    Legacy(LegacyDocument),
    #[serde(rename = "2.0")]
    TemplateFilled(TemplateDocument),
}

impl ContractLayoutDocument {
    pub fn id(&self) -> Uuid {
        match self {
            ContractLayoutDocument::Legacy(doc) => doc.id,
            ContractLayoutDocument::TemplateFilled(doc) => doc.id,
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            ContractLayoutDocument::Legacy(_) => "1.0",
            ContractLayoutDocument::TemplateFilled(_) => "2.0",
        }
    }

    pub fn metadata(&self) -> &LayoutMetadata {
        match self {
            ContractLayoutDocument::Legacy(doc) => &doc.metadata,
            ContractLayoutDocument::TemplateFilled(doc) => &doc.metadata,
        }
    }

    /// Reference number, when the document carries one
    pub fn ref_number(&self) -> Option<&str> {
        match self {
            ContractLayoutDocument::Legacy(_) => None,
            ContractLayoutDocument::TemplateFilled(doc) => Some(doc.ref_number.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyDocument {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub pages: Vec<LayoutPage>,
    pub metadata: LayoutMetadata,
    pub contract_data: ContractData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    pub id: Uuid,
    pub ref_number: String,
    pub created_at: DateTime<Utc>,
    pub template_type: String,
    pub contract_template: DocumentTemplate,
    pub metadata: LayoutMetadata,
    pub contract_data: ContractData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    pub page_number: u32,
    pub sections: Vec<LayoutSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutSection {
    Title {
        content: BilingualText,
    },
    Text {
        heading: BilingualText,
        content: BilingualText,
    },
    Note {
        content: BilingualText,
    },
    PhotoSection {
        title: BilingualText,
        photos: Vec<Photo>,
    },
    Signature {
        parties: Vec<SignatureParty>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub label: BilingualText,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureParty {
    pub role: BilingualText,
    pub name: BilingualText,
}

/// Denormalised bilingual summary of the contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetadata {
    pub template_type: String,
    pub first_party: BilingualText,
    pub second_party: BilingualText,
    pub promoter: BilingualText,
    pub promoter_id: String,
    pub product: BilingualText,
    pub location: BilingualText,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    pub page_count: usize,
}

impl LayoutMetadata {
    fn from_resolved(template_type: &str, c: &ResolvedContract, page_count: usize) -> Self {
        Self {
            template_type: template_type.to_string(),
            first_party: c.first_party.clone(),
            second_party: c.second_party.clone(),
            promoter: c.promoter.clone(),
            promoter_id: c.promoter_id.clone(),
            product: c.product.clone(),
            location: c.location.clone(),
            start_date: c.start.map(|d| d.to_rfc3339()).unwrap_or_default(),
            end_date: c.end.map(|d| d.to_rfc3339()).unwrap_or_default(),
            duration_days: c.duration_days,
            page_count,
        }
    }
}

/// Generate a layout document for the contract at the current time
pub fn generate_contract_layout(data: &ContractData) -> ContractLayoutDocument {
    generate_contract_layout_at(data, Utc::now())
}

/// Generate a layout document, stamped with `now`
///
/// A `template_type` naming a registered template produces a v2.0 document.
/// Anything else produces the legacy v1.0 document. Missing values are
/// rendered as empty strings.
pub fn generate_contract_layout_at(data: &ContractData, now: DateTime<Utc>) -> ContractLayoutDocument {
    let template = data
        .template_type
        .as_deref()
        .and_then(|name| document_template(name).map(|t| (name, t)));

    match template {
        Some((name, template)) => {
            // The lenient policy cannot fail
            match generate_template_document(data, name, &template, MissingFieldPolicy::EmptyString, now) {
                Ok(doc) => ContractLayoutDocument::TemplateFilled(doc),
                Err(e) => {
                    warn!(error = %e, template_type = name, "Template fill failed, using legacy layout");
                    ContractLayoutDocument::Legacy(generate_legacy_document(data, now))
                }
            }
        }
        None => {
            if let Some(name) = data.template_type.as_deref() {
                warn!(template_type = name, "Unknown template type, using legacy layout");
            }
            ContractLayoutDocument::Legacy(generate_legacy_document(data, now))
        }
    }
}

/// Generate a v2.0 document from a named template with an explicit policy
pub fn generate_template_document(
    data: &ContractData,
    template_type: &str,
    template: &DocumentTemplate,
    policy: MissingFieldPolicy,
    now: DateTime<Utc>,
) -> Result<TemplateDocument> {
    let filled = fill_template_at(template, data, policy, now)?;
    let resolved = data.resolve();
    let ref_number = filled.ref_number.clone().unwrap_or_default();

    let doc = TemplateDocument {
        id: Uuid::new_v4(),
        ref_number,
        created_at: now,
        template_type: template_type.to_string(),
        metadata: LayoutMetadata::from_resolved(template_type, &resolved, filled.pages.len()),
        contract_template: filled,
        contract_data: data.clone(),
    };

    info!(document_id = %doc.id, ref_number = %doc.ref_number, template_type, "Template document generated");
    Ok(doc)
}

/// Generate the legacy v1.0 document
pub fn generate_legacy_document(data: &ContractData, now: DateTime<Utc>) -> LegacyDocument {
    let c = data.resolve();

    let page_one = LayoutPage {
        page_number: 1,
        sections: vec![
            LayoutSection::Title {
                content: clauses::contract_title(),
            },
            LayoutSection::Text {
                heading: clauses::heading("PARTIES", "أطراف العقد"),
                content: clauses::parties(&c),
            },
            LayoutSection::Text {
                heading: clauses::heading("PREAMBLE", "تمهيد"),
                content: clauses::whereas(&c),
            },
            LayoutSection::Text {
                heading: clauses::heading("ASSIGNMENT", "التعيين"),
                content: clauses::assignment(&c),
            },
            LayoutSection::Text {
                heading: clauses::heading("TERM", "مدة العقد"),
                content: clauses::term(&c),
            },
            LayoutSection::Note {
                content: clauses::electronic_issue_note(),
            },
        ],
    };

    let page_two = LayoutPage {
        page_number: 2,
        sections: vec![
            LayoutSection::Text {
                heading: clauses::heading("OBLIGATIONS OF THE FIRST PARTY", "التزامات الطرف الأول"),
                content: clauses::first_party_obligations(),
            },
            LayoutSection::Text {
                heading: clauses::heading("OBLIGATIONS OF THE SECOND PARTY", "التزامات الطرف الثاني"),
                content: clauses::second_party_obligations(),
            },
            LayoutSection::Text {
                heading: clauses::heading("GOVERNING LAW", "القانون الواجب التطبيق"),
                content: clauses::governing_law(),
            },
            LayoutSection::PhotoSection {
                title: BilingualText::new("PROMOTER IDENTIFICATION", "هوية المروج"),
                photos: vec![
                    Photo {
                        label: BilingualText::new("ID Card", "بطاقة الهوية"),
                        image_url: c.id_photo_url.clone(),
                    },
                    Photo {
                        label: BilingualText::new("Passport", "جواز السفر"),
                        image_url: c.passport_photo_url.clone(),
                    },
                ],
            },
            LayoutSection::Signature {
                parties: vec![
                    SignatureParty {
                        role: clauses::first_party_role(),
                        name: c.first_party.clone(),
                    },
                    SignatureParty {
                        role: clauses::second_party_role(),
                        name: c.second_party.clone(),
                    },
                ],
            },
        ],
    };

    let pages = vec![page_one, page_two];
    let doc = LegacyDocument {
        id: Uuid::new_v4(),
        created_at: now,
        metadata: LayoutMetadata::from_resolved(DEFAULT_TEMPLATE_TYPE, &c, pages.len()),
        pages,
        contract_data: data.clone(),
    };

    info!(document_id = %doc.id, "Legacy contract document generated");
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> ContractData {
        ContractData {
            first_party_name_en: "Acme".into(),
            second_party_name_en: "Globex".into(),
            product_name_en: "Widget".into(),
            location_name_en: "Riyadh".into(),
            promoter_name_en: "Jane Doe".into(),
            promoter_id: Some("ID123".into()),
            start_date: Some("2024-06-01".into()),
            end_date: Some("2024-06-30".into()),
            id_photo_url: Some("http://x/id.png".into()),
            passport_photo_url: Some("http://x/pp.png".into()),
            letterhead_image_url: Some("http://x/lh.png".into()),
            ..Default::default()
        }
    }

    fn find_text<'a>(doc: &'a LegacyDocument, heading_en: &str) -> Option<&'a BilingualText> {
        doc.pages
            .iter()
            .flat_map(|p| p.sections.iter())
            .find_map(|s| match s {
                LayoutSection::Text { heading, content } if heading.en == heading_en => Some(content),
                _ => None,
            })
    }

    #[test]
    fn test_end_to_end_legacy_document() {
        let doc = match generate_contract_layout(&scenario()) {
            ContractLayoutDocument::Legacy(doc) => doc,
            other => panic!("expected legacy document, got version {}", other.version()),
        };

        assert_eq!(doc.pages.len(), 2);
        let term = find_text(&doc, "TERM").expect("term section");
        assert!(term.en.contains("30 days"));

        assert_eq!(doc.metadata.first_party.ar, "Acme");
        assert_eq!(doc.metadata.second_party.ar, "Globex");
        assert_eq!(doc.metadata.duration_days, Some(30));

        let signature = doc.pages[1].sections.iter().find_map(|s| match s {
            LayoutSection::Signature { parties } => Some(parties),
            _ => None,
        });
        let parties = signature.expect("signature block");
        assert_eq!(parties.len(), 2);
        assert_eq!(parties[0].name.ar, "Acme");
        assert_eq!(parties[1].name.ar, "Globex");
    }

    #[test]
    fn test_legacy_duration_for_january() {
        let data = ContractData {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let doc = generate_legacy_document(&data, Utc::now());
        assert_eq!(doc.metadata.duration_days, Some(30));
        assert!(find_text(&doc, "TERM").unwrap().en.contains("a period of 30 days"));
    }

    #[test]
    fn test_photo_section_carries_urls() {
        let doc = generate_legacy_document(&scenario(), Utc::now());
        let photos = doc.pages[1].sections.iter().find_map(|s| match s {
            LayoutSection::PhotoSection { photos, .. } => Some(photos),
            _ => None,
        });
        let photos = photos.expect("photo section");
        assert_eq!(photos[0].image_url, "http://x/id.png");
        assert_eq!(photos[1].image_url, "http://x/pp.png");
    }

    #[test]
    fn test_known_template_type_produces_v2() {
        let mut data = scenario();
        data.template_type = Some("promoterAssignment".into());

        let doc = generate_contract_layout(&data);
        assert_eq!(doc.version(), "2.0");

        let ContractLayoutDocument::TemplateFilled(doc) = doc else {
            panic!("expected template document");
        };
        let pattern = regex_lite::Regex::new(r"^PAC-\d{8}-[0-9a-f]{8}$").unwrap();
        assert!(pattern.is_match(&doc.ref_number));
        assert_eq!(doc.contract_template.ref_number.as_deref(), Some(doc.ref_number.as_str()));
        assert_eq!(doc.contract_template.letterhead_image_url, "http://x/lh.png");
        assert_eq!(doc.metadata.promoter.ar, "Jane Doe");

        let parties = &doc.contract_template.pages[0].sections[1].content;
        assert!(parties.en.contains("Acme"));
        assert!(parties.ar.contains("Globex"));
        assert!(!parties.en.contains('['));
    }

    #[test]
    fn test_caller_supplied_reference_is_used() {
        let mut data = scenario();
        data.template_type = Some("promoterAssignment".into());
        data.ref_number = Some("EXT-42".into());

        let doc = generate_contract_layout(&data);
        assert_eq!(doc.ref_number(), Some("EXT-42"));
    }

    #[test]
    fn test_unknown_template_type_falls_back_to_legacy() {
        let mut data = scenario();
        data.template_type = Some("employment".into());
        assert_eq!(generate_contract_layout(&data).version(), "1.0");
    }

    #[test]
    fn test_ids_are_fresh_per_call() {
        let a = generate_contract_layout(&scenario());
        let b = generate_contract_layout(&scenario());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(generate_contract_layout(&scenario())).unwrap();
        assert_eq!(json["version"], "1.0");
        assert_eq!(json["pages"][0]["sections"][0]["type"], "title");
        assert_eq!(json["pages"][1]["sections"][3]["type"], "photo_section");
        assert_eq!(json["pages"][1]["sections"][4]["type"], "signature");
        assert_eq!(json["contract_data"]["first_party_name_en"], "Acme");

        let parsed: ContractLayoutDocument = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.version(), "1.0");
    }
}
