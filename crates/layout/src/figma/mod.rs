//! Figma-compatible node trees
//!
//! The node vocabulary (`DOCUMENT`, `PAGE`, `FRAME`, `TEXT`, `IMAGE`,
//! `RECTANGLE`) and property names (`layoutMode`, `primaryAxisAlignItems`,
//! `itemSpacing`, ...) are consumed verbatim by the design-tool plugin and
//! must not be renamed.

mod contract;
pub mod nodes;

pub use contract::{
    generate_contract_reference, generate_figma_contract_json, generate_figma_contract_json_at,
    FigmaContractDocument, FigmaMetadata,
};

use serde::{Deserialize, Serialize};

/// A4 page width in points
pub const PAGE_WIDTH: f32 = 595.0;
/// A4 page height in points
pub const PAGE_HEIGHT: f32 = 842.0;
pub const PAGE_PADDING: f32 = 40.0;
pub const PAGE_ITEM_SPACING: f32 = 24.0;
/// Usable width inside a padded page
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * PAGE_PADDING;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerKind {
    Document,
    Page,
}

/// Root of the node tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigmaDocument {
    #[serde(rename = "type")]
    pub kind: ContainerKind,
    pub children: Vec<PageNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    #[serde(rename = "type")]
    pub kind: ContainerKind,
    pub name: String,
    pub children: Vec<FigmaNode>,
}

/// A node inside a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FigmaNode {
    Frame(FrameNode),
    Text(TextNode),
    Image(ImageNode),
    Rectangle(RectangleNode),
}

impl FigmaNode {
    pub fn name(&self) -> &str {
        match self {
            FigmaNode::Frame(n) => &n.name,
            FigmaNode::Text(n) => &n.name,
            FigmaNode::Image(n) => &n.name,
            FigmaNode::Rectangle(n) => &n.name,
        }
    }

    pub fn as_frame(&self) -> Option<&FrameNode> {
        match self {
            FigmaNode::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            FigmaNode::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    None,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AxisAlign {
    Min,
    Center,
    Max,
    SpaceBetween,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    pub name: String,
    pub layout_mode: LayoutMode,
    pub primary_axis_align_items: AxisAlign,
    pub counter_axis_align_items: AxisAlign,
    pub padding_left: f32,
    pub padding_right: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub item_spacing: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FigmaNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignHorizontal {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignVertical {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub text_align_horizontal: TextAlignHorizontal,
    pub text_align_vertical: TextAlignVertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub name: String,
    pub characters: String,
    pub width: f32,
    pub style: TextStyle,
    pub fills: Vec<Paint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleMode {
    Fill,
    Fit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageNode {
    pub name: String,
    pub image_url: String,
    pub width: f32,
    pub height: f32,
    pub scale_mode: ScaleMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleNode {
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub fills: Vec<Paint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub strokes: Vec<Paint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintKind {
    Solid,
}

/// A solid fill; color channels are normalised to `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: PaintKind,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };
    pub const GRAY: Rgb = Rgb { r: 0.4, g: 0.4, b: 0.4 };
    pub const LIGHT_GRAY: Rgb = Rgb { r: 0.95, g: 0.95, b: 0.95 };
    pub const BORDER_GRAY: Rgb = Rgb { r: 0.8, g: 0.8, b: 0.8 };

    /// Convert 8-bit channels to normalised floats
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }
}

impl Paint {
    pub fn solid(color: Rgb) -> Self {
        Self {
            kind: PaintKind::Solid,
            color,
        }
    }
}
