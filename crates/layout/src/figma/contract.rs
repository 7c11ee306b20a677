//! Contract node-tree generator

use super::nodes::{
    bilingual_body, bilingual_subtitle, bilingual_title, header, image, page_frame,
    signature_section, Signatory,
};
use super::{
    AxisAlign, ContainerKind, FigmaDocument, FrameNode, LayoutMode, PageNode, CONTENT_WIDTH,
};
use crate::bilingual::BilingualText;
use crate::clauses;
use crate::data::{ContractData, ResolvedContract};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const PAGE_COUNT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Contract,
}

/// Contract content as a design-tool node tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaContractDocument {
    pub id: Uuid,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    pub metadata: FigmaMetadata,
    pub figma_document: FigmaDocument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigmaMetadata {
    pub ref_number: String,
    pub first_party: BilingualText,
    pub second_party: BilingualText,
    pub promoter: BilingualText,
    pub promoter_id: String,
    pub product: BilingualText,
    pub location: BilingualText,
    pub start_date: String,
    pub end_date: String,
    pub duration_days: Option<i64>,
    pub generated_at: DateTime<Utc>,
}

/// Figma reference number: `CONT-{last 6 digits of epoch ms}-{0..=999}`
pub fn generate_contract_reference(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    let suffix: u16 = rand::thread_rng().gen_range(0..=999);
    format!("CONT-{:06}-{}", millis, suffix)
}

pub fn generate_figma_contract_json(data: &ContractData) -> FigmaContractDocument {
    generate_figma_contract_json_at(data, Utc::now())
}

/// Build the three-page contract node tree
pub fn generate_figma_contract_json_at(data: &ContractData, now: DateTime<Utc>) -> FigmaContractDocument {
    let c = data.resolve();
    let ref_number = generate_contract_reference(now);

    let frames = vec![
        intro_page(&c, &ref_number),
        promoter_page(&c, &ref_number),
        signature_page(&c, &ref_number),
    ];

    let doc = FigmaContractDocument {
        id: Uuid::new_v4(),
        version: "1.0".to_string(),
        kind: DocumentKind::Contract,
        metadata: FigmaMetadata {
            ref_number: ref_number.clone(),
            first_party: c.first_party.clone(),
            second_party: c.second_party.clone(),
            promoter: c.promoter.clone(),
            promoter_id: c.promoter_id.clone(),
            product: c.product.clone(),
            location: c.location.clone(),
            start_date: c.start.map(|d| d.to_rfc3339()).unwrap_or_default(),
            end_date: c.end.map(|d| d.to_rfc3339()).unwrap_or_default(),
            duration_days: c.duration_days,
            generated_at: now,
        },
        figma_document: FigmaDocument {
            kind: ContainerKind::Document,
            children: vec![PageNode {
                kind: ContainerKind::Page,
                name: "Contract".to_string(),
                children: frames,
            }],
        },
    };

    info!(document_id = %doc.id, ref_number = %ref_number, "Figma contract generated");
    doc
}

fn intro_page(c: &ResolvedContract, ref_number: &str) -> super::FigmaNode {
    let mut children = vec![header(ref_number, 1, PAGE_COUNT)];
    if !c.letterhead_image_url.is_empty() {
        children.push(image("Letterhead", c.letterhead_image_url.clone(), CONTENT_WIDTH, 80.0));
    }
    children.extend([
        bilingual_title(&clauses::contract_title()),
        bilingual_subtitle(&clauses::heading("Parties", "أطراف العقد")),
        bilingual_body("Parties", &clauses::parties(c)),
        bilingual_subtitle(&clauses::heading("Preamble", "تمهيد")),
        bilingual_body("Whereas", &clauses::whereas(c)),
    ]);
    page_frame("Page 1", children)
}

fn promoter_page(c: &ResolvedContract, ref_number: &str) -> super::FigmaNode {
    let documents = FrameNode::new("Promoter Documents", LayoutMode::Horizontal)
        .size(CONTENT_WIDTH, 160.0)
        .spacing(16.0)
        .align(AxisAlign::Min, AxisAlign::Center)
        .child(image("ID Card", c.id_photo_url.clone(), 240.0, 150.0))
        .child(image("Passport", c.passport_photo_url.clone(), 240.0, 150.0))
        .into_node();

    page_frame(
        "Page 2",
        vec![
            header(ref_number, 2, PAGE_COUNT),
            bilingual_subtitle(&clauses::heading("Promoter", "المروج")),
            bilingual_body("Assignment", &clauses::assignment(c)),
            documents,
            bilingual_subtitle(&clauses::heading("Term", "مدة العقد")),
            bilingual_body("Term", &clauses::term(c)),
            bilingual_subtitle(&clauses::heading("Obligations", "الالتزامات")),
            bilingual_body("First Party Obligations", &clauses::first_party_obligations()),
            bilingual_body("Second Party Obligations", &clauses::second_party_obligations()),
        ],
    )
}

fn signature_page(c: &ResolvedContract, ref_number: &str) -> super::FigmaNode {
    let parties = [
        Signatory {
            name: c.first_party.clone(),
            role: clauses::first_party_role(),
        },
        Signatory {
            name: c.second_party.clone(),
            role: clauses::second_party_role(),
        },
    ];

    page_frame(
        "Page 3",
        vec![
            header(ref_number, 3, PAGE_COUNT),
            bilingual_subtitle(&clauses::heading("Governing Law", "القانون الواجب التطبيق")),
            bilingual_body("Governing Law", &clauses::governing_law()),
            bilingual_title(&clauses::heading("Signatures", "التوقيعات")),
            signature_section(&parties, &clauses::signature_label()),
            bilingual_body("Note", &clauses::electronic_issue_note()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figma::{FigmaNode, TextAlignHorizontal, TextNode, PAGE_HEIGHT, PAGE_WIDTH};
    use chrono::TimeZone;

    fn scenario() -> ContractData {
        ContractData {
            first_party_name_en: "Acme".into(),
            second_party_name_en: "Globex".into(),
            product_name_en: "Widget".into(),
            location_name_en: "Riyadh".into(),
            promoter_name_en: "Jane Doe".into(),
            promoter_id: Some("ID123".into()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            letterhead_image_url: Some("http://x/lh.png".into()),
            ..Default::default()
        }
    }

    fn collect_texts<'a>(node: &'a FigmaNode, out: &mut Vec<&'a TextNode>) {
        match node {
            FigmaNode::Text(t) => out.push(t),
            FigmaNode::Frame(f) => f.children.iter().for_each(|c| collect_texts(c, out)),
            _ => {}
        }
    }

    fn collect_bilingual_rows<'a>(node: &'a FigmaNode, out: &mut Vec<&'a FrameNode>) {
        if let FigmaNode::Frame(f) = node {
            let texts: Vec<_> = f.children.iter().filter_map(FigmaNode::as_text).collect();
            if texts.len() == 2 && f.layout_mode == LayoutMode::Horizontal {
                out.push(f);
            }
            f.children.iter().for_each(|c| collect_bilingual_rows(c, out));
        }
    }

    #[test]
    fn test_three_a4_pages() {
        let doc = generate_figma_contract_json(&scenario());
        let frames = &doc.figma_document.children[0].children;
        assert_eq!(frames.len(), 3);

        for frame in frames {
            let frame = frame.as_frame().unwrap();
            assert_eq!(frame.width, PAGE_WIDTH);
            assert_eq!(frame.height, PAGE_HEIGHT);
            assert_eq!(frame.padding_top, 40.0);
            assert_eq!(frame.item_spacing, 24.0);
            assert_eq!(frame.layout_mode, LayoutMode::Vertical);
        }
    }

    #[test]
    fn test_duration_in_metadata() {
        let doc = generate_figma_contract_json(&scenario());
        assert_eq!(doc.metadata.duration_days, Some(30));
    }

    #[test]
    fn test_every_bilingual_row_is_left_english_right_arabic() {
        let doc = generate_figma_contract_json(&scenario());
        let mut rows = Vec::new();
        for frame in &doc.figma_document.children[0].children {
            collect_bilingual_rows(frame, &mut rows);
        }
        assert!(rows.len() > 10);

        for row in rows {
            let en = row.children[0].as_text().unwrap();
            let ar = row.children[1].as_text().unwrap();
            assert_eq!(en.style.text_align_horizontal, TextAlignHorizontal::Left, "{}", row.name);
            assert_eq!(ar.style.text_align_horizontal, TextAlignHorizontal::Right, "{}", row.name);
        }
    }

    #[test]
    fn test_text_fills_are_normalised() {
        let doc = generate_figma_contract_json(&scenario());
        let mut texts = Vec::new();
        for frame in &doc.figma_document.children[0].children {
            collect_texts(frame, &mut texts);
        }

        for text in texts {
            assert!(!text.style.font_family.is_empty());
            let color = text.fills[0].color;
            for channel in [color.r, color.g, color.b] {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn test_arabic_party_names_fall_back() {
        let doc = generate_figma_contract_json(&scenario());
        assert_eq!(doc.metadata.first_party.ar, "Acme");
        assert_eq!(doc.metadata.product.ar, "Widget");
    }

    #[test]
    fn test_contract_reference_format() {
        let now = Utc.timestamp_millis_opt(1_717_000_123_456).unwrap();
        let reference = generate_contract_reference(now);
        let pattern = regex_lite::Regex::new(r"^CONT-123456-\d{1,3}$").unwrap();
        assert!(pattern.is_match(&reference), "{}", reference);

        let early = Utc.timestamp_millis_opt(42).unwrap();
        assert!(generate_contract_reference(early).starts_with("CONT-000042-"));
    }

    #[test]
    fn test_wire_vocabulary() {
        let json = serde_json::to_value(generate_figma_contract_json(&scenario())).unwrap();
        assert_eq!(json["type"], "contract");
        assert_eq!(json["figmaDocument"]["type"], "DOCUMENT");

        let page = &json["figmaDocument"]["children"][0];
        assert_eq!(page["type"], "PAGE");

        let frame = &page["children"][0];
        assert_eq!(frame["type"], "FRAME");
        assert_eq!(frame["layoutMode"], "VERTICAL");
        assert_eq!(frame["primaryAxisAlignItems"], "MIN");
        assert_eq!(frame["paddingLeft"], 40.0);
        assert_eq!(frame["itemSpacing"], 24.0);
        assert_eq!(frame["fills"][0]["type"], "SOLID");
        assert_eq!(frame["children"][1]["type"], "IMAGE");
        assert_eq!(frame["children"][2]["children"][0]["type"], "TEXT");
        assert_eq!(frame["children"][2]["children"][0]["style"]["fontWeight"], 700);
    }
}
