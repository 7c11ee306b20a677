//! Reusable node builders

use super::{
    AxisAlign, FigmaNode, FrameNode, ImageNode, LayoutMode, Paint, RectangleNode, Rgb, ScaleMode,
    TextAlignHorizontal, TextAlignVertical, TextNode, TextStyle, CONTENT_WIDTH, PAGE_HEIGHT,
    PAGE_ITEM_SPACING, PAGE_PADDING, PAGE_WIDTH,
};
use crate::bilingual::BilingualText;

pub const LATIN_FONT: &str = "Inter";
pub const ARABIC_FONT: &str = "Noto Naskh Arabic";

pub const WEIGHT_REGULAR: u16 = 400;
pub const WEIGHT_BOLD: u16 = 700;

pub const SIGNATURE_BOX_WIDTH: f32 = 240.0;
pub const SIGNATURE_BOX_HEIGHT: f32 = 200.0;

const BILINGUAL_GAP: f32 = 16.0;

impl FrameNode {
    /// An empty auto-layout frame with no padding
    pub fn new(name: impl Into<String>, layout_mode: LayoutMode) -> Self {
        Self {
            name: name.into(),
            layout_mode,
            primary_axis_align_items: AxisAlign::Min,
            counter_axis_align_items: AxisAlign::Min,
            padding_left: 0.0,
            padding_right: 0.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            item_spacing: 0.0,
            width: CONTENT_WIDTH,
            height: 0.0,
            fills: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn padding(mut self, padding: f32) -> Self {
        self.padding_left = padding;
        self.padding_right = padding;
        self.padding_top = padding;
        self.padding_bottom = padding;
        self
    }

    pub fn spacing(mut self, spacing: f32) -> Self {
        self.item_spacing = spacing;
        self
    }

    pub fn size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn align(mut self, primary: AxisAlign, counter: AxisAlign) -> Self {
        self.primary_axis_align_items = primary;
        self.counter_axis_align_items = counter;
        self
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.fills.push(Paint::solid(color));
        self
    }

    pub fn child(mut self, node: FigmaNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = FigmaNode>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn into_node(self) -> FigmaNode {
        FigmaNode::Frame(self)
    }
}

/// A4 page frame: vertical flow, 40pt padding, 24pt spacing, white fill
pub fn page_frame(name: impl Into<String>, children: Vec<FigmaNode>) -> FigmaNode {
    FrameNode::new(name, LayoutMode::Vertical)
        .size(PAGE_WIDTH, PAGE_HEIGHT)
        .padding(PAGE_PADDING)
        .spacing(PAGE_ITEM_SPACING)
        .align(AxisAlign::Min, AxisAlign::Min)
        .fill(Rgb::WHITE)
        .children(children)
        .into_node()
}

pub fn text(
    name: impl Into<String>,
    characters: impl Into<String>,
    width: f32,
    style: TextStyle,
    color: Rgb,
) -> FigmaNode {
    FigmaNode::Text(TextNode {
        name: name.into(),
        characters: characters.into(),
        width,
        style,
        fills: vec![Paint::solid(color)],
    })
}

pub fn style(
    font_family: &str,
    font_size: f32,
    font_weight: u16,
    align: TextAlignHorizontal,
) -> TextStyle {
    TextStyle {
        font_family: font_family.to_string(),
        font_size,
        font_weight,
        text_align_horizontal: align,
        text_align_vertical: TextAlignVertical::Top,
    }
}

/// Page header: reference and page number, right-aligned, 10pt gray
pub fn header(ref_number: &str, page_number: u32, page_count: u32) -> FigmaNode {
    let label = format!("Ref: {} | Page {} of {}", ref_number, page_number, page_count);
    FrameNode::new("Header", LayoutMode::Horizontal)
        .size(CONTENT_WIDTH, 16.0)
        .align(AxisAlign::Max, AxisAlign::Center)
        .child(text(
            "Header Text",
            label,
            CONTENT_WIDTH,
            style(LATIN_FONT, 10.0, WEIGHT_REGULAR, TextAlignHorizontal::Right),
            Rgb::GRAY,
        ))
        .into_node()
}

/// English left, Arabic right, side by side in one horizontal frame
pub fn bilingual_row(
    name: &str,
    value: &BilingualText,
    font_size: f32,
    font_weight: u16,
    width: f32,
) -> FigmaNode {
    let column = (width - BILINGUAL_GAP) / 2.0;
    FrameNode::new(name, LayoutMode::Horizontal)
        .size(width, font_size * 1.6)
        .spacing(BILINGUAL_GAP)
        .align(AxisAlign::SpaceBetween, AxisAlign::Min)
        .child(text(
            format!("{} (EN)", name),
            value.en.clone(),
            column,
            style(LATIN_FONT, font_size, font_weight, TextAlignHorizontal::Left),
            Rgb::BLACK,
        ))
        .child(text(
            format!("{} (AR)", name),
            value.ar.clone(),
            column,
            style(ARABIC_FONT, font_size, font_weight, TextAlignHorizontal::Right),
            Rgb::BLACK,
        ))
        .into_node()
}

pub fn bilingual_title(value: &BilingualText) -> FigmaNode {
    bilingual_row("Title", value, 18.0, WEIGHT_BOLD, CONTENT_WIDTH)
}

pub fn bilingual_subtitle(value: &BilingualText) -> FigmaNode {
    bilingual_row("Subtitle", value, 16.0, WEIGHT_BOLD, CONTENT_WIDTH)
}

pub fn bilingual_body(name: &str, value: &BilingualText) -> FigmaNode {
    bilingual_row(name, value, 12.0, WEIGHT_REGULAR, CONTENT_WIDTH)
}

pub fn image(name: impl Into<String>, url: impl Into<String>, width: f32, height: f32) -> FigmaNode {
    FigmaNode::Image(ImageNode {
        name: name.into(),
        image_url: url.into(),
        width,
        height,
        scale_mode: ScaleMode::Fit,
    })
}

pub fn rectangle(name: impl Into<String>, width: f32, height: f32) -> FigmaNode {
    FigmaNode::Rectangle(RectangleNode {
        name: name.into(),
        width,
        height,
        corner_radius: 4.0,
        fills: vec![Paint::solid(Rgb::LIGHT_GRAY)],
        strokes: vec![Paint::solid(Rgb::BORDER_GRAY)],
    })
}

/// One signatory of the signature block
#[derive(Debug, Clone)]
pub struct Signatory {
    pub name: BilingualText,
    pub role: BilingualText,
}

/// One 240x200 frame per party: name, role, signature box and label
pub fn signature_section(parties: &[Signatory], label: &BilingualText) -> FigmaNode {
    let inner = SIGNATURE_BOX_WIDTH - 2.0 * 12.0;
    let boxes = parties.iter().enumerate().map(|(i, party)| {
        FrameNode::new(format!("Signature Party {}", i + 1), LayoutMode::Vertical)
            .size(SIGNATURE_BOX_WIDTH, SIGNATURE_BOX_HEIGHT)
            .padding(12.0)
            .spacing(8.0)
            .align(AxisAlign::Min, AxisAlign::Min)
            .child(bilingual_row("Party Name", &party.name, 12.0, WEIGHT_BOLD, inner))
            .child(bilingual_row("Party Role", &party.role, 10.0, WEIGHT_REGULAR, inner))
            .child(rectangle("Signature Placeholder", inner, 80.0))
            .child(bilingual_row("Signature Label", label, 10.0, WEIGHT_REGULAR, inner))
            .into_node()
    });

    FrameNode::new("Signatures", LayoutMode::Horizontal)
        .size(CONTENT_WIDTH, SIGNATURE_BOX_HEIGHT)
        .align(AxisAlign::SpaceBetween, AxisAlign::Min)
        .children(boxes)
        .into_node()
}
