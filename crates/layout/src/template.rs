//! Document templates and the built-in template registry
//!
//! A document template is a fixed set of pages whose section titles and
//! bodies contain `[TOKEN]` placeholders. Filling is done by
//! [`crate::placeholder::fill_template`].

use crate::bilingual::BilingualText;
use serde::{Deserialize, Serialize};

/// A bilingual document template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_number: Option<String>,
    pub letterhead_image_url: String,
    pub id_card_photo_url: String,
    pub passport_photo_url: String,
    pub pages: Vec<ContractPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPage {
    pub page_number: u32,
    pub sections: Vec<ContractSection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSection {
    pub title: BilingualText,
    pub content: BilingualText,
}

impl ContractSection {
    fn new(title_en: &str, title_ar: &str, content_en: &str, content_ar: &str) -> Self {
        Self {
            title: BilingualText::new(title_en, title_ar),
            content: BilingualText::new(content_en, content_ar),
        }
    }
}

/// Names of every registered document template
pub const DOCUMENT_TEMPLATE_NAMES: &[&str] = &["promoterAssignment"];

/// Look up a registered document template by name
pub fn document_template(name: &str) -> Option<DocumentTemplate> {
    match name {
        "promoterAssignment" => Some(promoter_assignment()),
        _ => None,
    }
}

pub fn is_known_template(name: &str) -> bool {
    DOCUMENT_TEMPLATE_NAMES.contains(&name)
}

const DEFAULT_LETTERHEAD_URL: &str = "https://assets.pactforge.app/letterheads/default.png";
const DEFAULT_ID_CARD_URL: &str = "https://assets.pactforge.app/placeholders/id-card.png";
const DEFAULT_PASSPORT_URL: &str = "https://assets.pactforge.app/placeholders/passport.png";

fn promoter_assignment() -> DocumentTemplate {
    DocumentTemplate {
        ref_number: None,
        letterhead_image_url: DEFAULT_LETTERHEAD_URL.to_string(),
        id_card_photo_url: DEFAULT_ID_CARD_URL.to_string(),
        passport_photo_url: DEFAULT_PASSPORT_URL.to_string(),
        pages: vec![
            ContractPage {
                page_number: 1,
                sections: vec![
                    ContractSection::new(
                        "PROMOTER ASSIGNMENT CONTRACT",
                        "عقد تعيين مروج",
                        "Reference No. [REF_NUMBER]",
                        "الرقم المرجعي [REF_NUMBER]",
                    ),
                    ContractSection::new(
                        "PARTIES",
                        "أطراف العقد",
                        "This Contract is made on [START_DATE] between [FIRST_PARTY_NAME_EN], \
                         Commercial Registration No. [FIRST_PARTY_CRN] (the \"First Party\"), and \
                         [SECOND_PARTY_NAME_EN], Commercial Registration No. [SECOND_PARTY_CRN] \
                         (the \"Second Party\").",
                        "أُبرم هذا العقد بتاريخ [START_DATE] بين [FIRST_PARTY_NAME_AR]، سجل تجاري رقم \
                         [FIRST_PARTY_CRN] (\"الطرف الأول\")، و[SECOND_PARTY_NAME_AR]، سجل تجاري رقم \
                         [SECOND_PARTY_CRN] (\"الطرف الثاني\").",
                    ),
                    ContractSection::new(
                        "PREAMBLE",
                        "تمهيد",
                        "Whereas the First Party wishes to promote [PRODUCT_NAME_EN] at \
                         [LOCATION_NAME_EN], and the Second Party is able to provide a qualified \
                         promoter for this purpose, the parties have agreed as follows.",
                        "وحيث إن الطرف الأول يرغب في الترويج لمنتج [PRODUCT_NAME_AR] في \
                         [LOCATION_NAME_AR]، وحيث إن الطرف الثاني قادر على توفير مروج مؤهل لهذا \
                         الغرض، فقد اتفق الطرفان على ما يلي.",
                    ),
                    ContractSection::new(
                        "ASSIGNMENT",
                        "التعيين",
                        "The Second Party assigns [PROMOTER_NAME_EN], ID No. [PROMOTER_ID], to \
                         promote [PRODUCT_NAME_EN] at [LOCATION_NAME_EN] under the supervision of \
                         the First Party.",
                        "يعيّن الطرف الثاني [PROMOTER_NAME_AR]، هوية رقم [PROMOTER_ID]، للترويج لمنتج \
                         [PRODUCT_NAME_AR] في [LOCATION_NAME_AR] تحت إشراف الطرف الأول.",
                    ),
                ],
            },
            ContractPage {
                page_number: 2,
                sections: vec![
                    ContractSection::new(
                        "TERM",
                        "مدة العقد",
                        "This Contract is effective from [START_DATE] until [END_DATE].",
                        "يسري هذا العقد من [START_DATE] حتى [END_DATE].",
                    ),
                    ContractSection::new(
                        "OBLIGATIONS",
                        "الالتزامات",
                        "The First Party provides product materials, training and site access. \
                         The Second Party remains responsible for the promoter's salary, residency \
                         and statutory obligations.",
                        "يلتزم الطرف الأول بتوفير مواد المنتج والتدريب وإتاحة الوصول إلى الموقع. \
                         ويظل الطرف الثاني مسؤولاً عن راتب المروج وإقامته والتزاماته النظامية.",
                    ),
                    ContractSection::new(
                        "PROMOTER IDENTIFICATION",
                        "هوية المروج",
                        "ID card: [ID_CARD_PHOTO_URL]. Passport: [PASSPORT_PHOTO_URL].",
                        "بطاقة الهوية: [ID_CARD_PHOTO_URL]. جواز السفر: [PASSPORT_PHOTO_URL].",
                    ),
                    ContractSection::new(
                        "SIGNATURES",
                        "التوقيعات",
                        "First Party: [FIRST_PARTY_NAME_EN]. Second Party: [SECOND_PARTY_NAME_EN].",
                        "الطرف الأول: [FIRST_PARTY_NAME_AR]. الطرف الثاني: [SECOND_PARTY_NAME_AR].",
                    ),
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert!(document_template("promoterAssignment").is_some());
        assert!(document_template("employment").is_none());
        assert!(is_known_template("promoterAssignment"));
        assert!(!is_known_template(""));
    }

    #[test]
    fn test_promoter_assignment_shape() {
        let template = document_template("promoterAssignment").unwrap();
        assert!(template.ref_number.is_none());
        assert_eq!(template.pages.len(), 2);
        assert_eq!(template.pages[0].page_number, 1);
        assert_eq!(template.pages[1].page_number, 2);
        assert!(template.pages[0].sections[1].content.en.contains("[FIRST_PARTY_NAME_EN]"));
        assert!(template.pages[0].sections[1].content.ar.contains("[FIRST_PARTY_NAME_AR]"));
    }
}
