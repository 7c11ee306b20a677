//! Bilingual contract prose shared by the page/section and Figma generators
//!
//! Values are interpolated directly into hand-authored sentences. Arabic
//! sentences use the resolved Arabic names (already falling back to English)
//! and Arabic-Indic digits for dates and durations.

use crate::bilingual::BilingualText;
use crate::data::ResolvedContract;

pub fn contract_title() -> BilingualText {
    BilingualText::new("PROMOTER ASSIGNMENT CONTRACT", "عقد تعيين مروج")
}

pub fn heading(en: &str, ar: &str) -> BilingualText {
    BilingualText::new(en, ar)
}

pub fn parties(c: &ResolvedContract) -> BilingualText {
    BilingualText::new(
        format!(
            "This Contract is made and entered into on {} by and between {}, Commercial \
             Registration No. {} (hereinafter the \"First Party\"), and {}, Commercial \
             Registration No. {} (hereinafter the \"Second Party\").",
            c.start_display(),
            c.first_party.en,
            c.first_party_crn,
            c.second_party.en,
            c.second_party_crn,
        ),
        format!(
            "أُبرم هذا العقد بتاريخ {} بين {}، سجل تجاري رقم {} (ويشار إليه فيما بعد بـ \"الطرف الأول\")، \
             و{}، سجل تجاري رقم {} (ويشار إليه فيما بعد بـ \"الطرف الثاني\").",
            c.start_display_ar(),
            c.first_party.ar,
            c.first_party_crn,
            c.second_party.ar,
            c.second_party_crn,
        ),
    )
}

pub fn whereas(c: &ResolvedContract) -> BilingualText {
    BilingualText::new(
        format!(
            "WHEREAS the First Party wishes to promote {} at {}, and the Second Party is able \
             to provide a qualified promoter for this purpose, the parties have agreed as follows.",
            c.product.en, c.location.en,
        ),
        format!(
            "وحيث إن الطرف الأول يرغب في الترويج لمنتج {} في {}، وحيث إن الطرف الثاني قادر على توفير \
             مروج مؤهل لهذا الغرض، فقد اتفق الطرفان على ما يلي.",
            c.product.ar, c.location.ar,
        ),
    )
}

pub fn assignment(c: &ResolvedContract) -> BilingualText {
    BilingualText::new(
        format!(
            "The Second Party assigns {}, ID No. {}, to work as a promoter for {} at {} under \
             the supervision of the First Party.",
            c.promoter.en, c.promoter_id, c.product.en, c.location.en,
        ),
        format!(
            "يعيّن الطرف الثاني {}، هوية رقم {}، للعمل مروجاً لمنتج {} في {} تحت إشراف الطرف الأول.",
            c.promoter.ar, c.promoter_id, c.product.ar, c.location.ar,
        ),
    )
}

pub fn term(c: &ResolvedContract) -> BilingualText {
    BilingualText::new(
        format!(
            "This Contract is effective from {} until {}, a period of {} days.",
            c.start_display(),
            c.end_display(),
            c.duration_display(),
        ),
        format!(
            "يسري هذا العقد من {} حتى {}، لمدة {} يوماً.",
            c.start_display_ar(),
            c.end_display_ar(),
            c.duration_display_ar(),
        ),
    )
}

pub fn first_party_obligations() -> BilingualText {
    BilingualText::new(
        "The First Party shall provide the promoter with the product materials, training and \
         access to the work location required to perform the assignment.",
        "يلتزم الطرف الأول بتزويد المروج بمواد المنتج والتدريب اللازم وتمكينه من الوصول إلى موقع \
         العمل لأداء المهمة.",
    )
}

pub fn second_party_obligations() -> BilingualText {
    BilingualText::new(
        "The Second Party shall remain responsible for the promoter's salary, residency and all \
         statutory obligations for the duration of this Contract.",
        "يظل الطرف الثاني مسؤولاً عن راتب المروج وإقامته وجميع الالتزامات النظامية طوال مدة هذا العقد.",
    )
}

pub fn governing_law() -> BilingualText {
    BilingualText::new(
        "This Contract is governed by the laws applicable at the place of performance. Any \
         dispute shall first be settled amicably before recourse to the competent courts.",
        "يخضع هذا العقد للأنظمة المعمول بها في مكان التنفيذ، وتتم تسوية أي نزاع ودياً قبل اللجوء إلى \
         المحاكم المختصة.",
    )
}

pub fn electronic_issue_note() -> BilingualText {
    BilingualText::new(
        "This contract is issued electronically and is valid without a seal.",
        "صدر هذا العقد إلكترونياً وهو صالح دون الحاجة إلى ختم.",
    )
}

pub fn first_party_role() -> BilingualText {
    BilingualText::new("First Party", "الطرف الأول")
}

pub fn second_party_role() -> BilingualText {
    BilingualText::new("Second Party", "الطرف الثاني")
}

pub fn signature_label() -> BilingualText {
    BilingualText::new("Signature", "التوقيع")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContractData;

    #[test]
    fn test_term_mentions_duration_in_both_languages() {
        let data = ContractData {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-01-31".into()),
            ..Default::default()
        };
        let text = term(&data.resolve());
        assert!(text.en.contains("a period of 30 days"));
        assert!(text.ar.contains("٣٠ يوماً"));
    }

    #[test]
    fn test_parties_use_fallback_names() {
        let data = ContractData {
            first_party_name_en: "Acme".into(),
            second_party_name_en: "Globex".into(),
            ..Default::default()
        };
        let text = parties(&data.resolve());
        assert!(text.ar.contains("Acme"));
        assert!(text.ar.contains("Globex"));
    }
}
