//! Plaque preview rendering.
//!
//! [`render`] is a pure function from the design choices on a draft to a
//! [`PlaquePreview`] describing how the plaque looks. The description can be
//! serialized for a front end or drawn as a standalone SVG mock-up with
//! [`PlaquePreview::to_svg`].

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::catalog::{self, FontStyle, MaterialType, SizeId};
use crate::qr::HexColor;
use crate::wizard::{OrderDraft, PlaqueColor, Shape};

/// Edge of the QR area inside the plaque, in preview pixels.
const QR_BOX_PX: u32 = 64;

/// Padding between the QR area and its white backing.
const QR_PADDING_PX: u32 = 4;

/// Height of one engraved text line.
const LINE_HEIGHT_PX: u32 = 12;

/// Vertical gap between stacked elements.
const GAP_PX: u32 = 4;

/// Height of the material label band under the plaque.
const LABEL_BAND_PX: u32 = 24;

/// Surface finish drawn for a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Texture {
    /// Warm polished brass.
    Brass,
    /// Cool brushed steel.
    BrushedSteel,
    /// Dark polished marble.
    BlackMarble,
    /// Pale veined marble.
    WhiteMarble,
    /// Matte charcoal slate.
    Slate,
    /// Bright gold composite.
    GoldComposite,
    /// Grey stand-in before a material is chosen.
    Neutral,
}

impl Texture {
    /// Texture for `material`, neutral when none is chosen.
    #[must_use]
    pub fn for_material(material: Option<MaterialType>) -> Self {
        match material {
            Some(MaterialType::Brass) => Self::Brass,
            Some(MaterialType::Steel) => Self::BrushedSteel,
            Some(MaterialType::MarbleBlack) => Self::BlackMarble,
            Some(MaterialType::MarbleWhite) => Self::WhiteMarble,
            Some(MaterialType::Slate) => Self::Slate,
            Some(MaterialType::GoldComposite) => Self::GoldComposite,
            None => Self::Neutral,
        }
    }

    /// Diagonal gradient stops, top-left to bottom-right.
    #[must_use]
    pub const fn gradient(self) -> [HexColor; 3] {
        match self {
            Self::Brass => [
                HexColor::rgb(0xCA, 0x8A, 0x04),
                HexColor::rgb(0xEA, 0xB3, 0x08),
                HexColor::rgb(0xA1, 0x62, 0x07),
            ],
            Self::BrushedSteel | Self::Neutral => [
                HexColor::rgb(0x9C, 0xA3, 0xAF),
                HexColor::rgb(0xD1, 0xD5, 0xDB),
                HexColor::rgb(0x6B, 0x72, 0x80),
            ],
            Self::BlackMarble => [
                HexColor::rgb(0x11, 0x18, 0x27),
                HexColor::rgb(0x1F, 0x29, 0x37),
                HexColor::rgb(0x11, 0x18, 0x27),
            ],
            Self::WhiteMarble => [
                HexColor::rgb(0xF3, 0xF4, 0xF6),
                HexColor::WHITE,
                HexColor::rgb(0xE5, 0xE7, 0xEB),
            ],
            Self::Slate => [
                HexColor::rgb(0x37, 0x41, 0x51),
                HexColor::rgb(0x4B, 0x55, 0x63),
                HexColor::rgb(0x1F, 0x29, 0x37),
            ],
            Self::GoldComposite => [
                HexColor::rgb(0xFA, 0xCC, 0x15),
                HexColor::rgb(0xFD, 0xE0, 0x47),
                HexColor::rgb(0xEA, 0xB3, 0x08),
            ],
        }
    }
}

/// Color the engraved text is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTone {
    /// The customer picked a text color.
    Chosen(PlaqueColor),
    /// Dark text for pale materials.
    Dark,
    /// Light text for everything else.
    Light,
}

impl TextTone {
    /// Resolve the tone: an explicit choice wins, otherwise white marble and
    /// steel get dark text and every other material light text.
    #[must_use]
    pub fn resolve(chosen: Option<PlaqueColor>, material: Option<MaterialType>) -> Self {
        match (chosen, material) {
            (Some(color), _) => Self::Chosen(color),
            (None, Some(MaterialType::MarbleWhite | MaterialType::Steel)) => Self::Dark,
            (None, _) => Self::Light,
        }
    }

    /// Fill color of the text.
    #[must_use]
    pub const fn fill(self) -> HexColor {
        match self {
            Self::Chosen(PlaqueColor::Gold) => HexColor::rgb(0xFA, 0xCC, 0x15),
            Self::Chosen(PlaqueColor::Silver) => HexColor::rgb(0xD1, 0xD5, 0xDB),
            Self::Chosen(PlaqueColor::Black) | Self::Dark => HexColor::rgb(0x11, 0x18, 0x27),
            Self::Chosen(PlaqueColor::White) | Self::Light => HexColor::WHITE,
        }
    }
}

/// Corner treatment of the plaque outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerStyle {
    /// Slightly rounded corners.
    Slight,
    /// Generously rounded corners.
    Large,
}

impl CornerStyle {
    /// Corner style for `shape`; only the rounded shape gets large corners.
    #[must_use]
    pub fn for_shape(shape: Option<Shape>) -> Self {
        match shape {
            Some(Shape::Rounded) => Self::Large,
            Some(Shape::Square | Shape::Rectangle) | None => Self::Slight,
        }
    }

    /// Corner radius in preview pixels.
    #[must_use]
    pub const fn radius_px(self) -> u32 {
        match self {
            Self::Slight => 8,
            Self::Large => 12,
        }
    }
}

/// On-screen size of the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayBox {
    /// Width in preview pixels.
    pub width_px: u32,
    /// Height in preview pixels.
    pub height_px: u32,
}

impl DisplayBox {
    /// Display box for `size`, medium when none is chosen.
    #[must_use]
    pub fn for_size(size: Option<SizeId>) -> Self {
        let (width_px, height_px) = match size {
            Some(SizeId::QrOnly) => (128, 128),
            Some(SizeId::QrNameWords) => (144, 160),
            Some(SizeId::QrName) | None => (144, 144),
        };
        Self {
            width_px,
            height_px,
        }
    }
}

/// One engraved line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    /// Line content.
    pub text: String,
    /// Drawn in bold.
    pub bold: bool,
}

/// Label shown under the plaque once a material is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialLabel {
    /// Material display name.
    pub name: String,
    /// Days from order to dispatch.
    pub lead_time_days: u32,
}

/// The design choices a preview is rendered from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewInput<'a> {
    /// Plaque material.
    pub material: Option<MaterialType>,
    /// Plaque outline.
    pub shape: Option<Shape>,
    /// Plaque size.
    pub size: Option<SizeId>,
    /// QR engraving color.
    pub qr_color: Option<PlaqueColor>,
    /// Text engraving color.
    pub text_color: Option<PlaqueColor>,
    /// Font id.
    pub font_choice: Option<&'a str>,
    /// Engraved lines, name first.
    pub text_lines: Vec<String>,
    /// SVG markup of the QR code, if generated.
    pub qr_svg: Option<&'a str>,
}

impl<'a> PreviewInput<'a> {
    /// Collect the preview inputs from a draft.
    #[must_use]
    pub fn from_draft(draft: &'a OrderDraft, qr_svg: Option<&'a str>) -> Self {
        Self {
            material: draft.material(),
            shape: draft.shape(),
            size: draft.size(),
            qr_color: draft.qr_color(),
            text_color: draft.text_color(),
            font_choice: draft.font_choice(),
            text_lines: draft.text_lines(),
            qr_svg,
        }
    }
}

/// A description of how a plaque looks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaquePreview {
    /// Surface finish.
    pub texture: Texture,
    /// Text color.
    pub text_tone: TextTone,
    /// Corner treatment.
    pub corners: CornerStyle,
    /// On-screen size.
    pub display: DisplayBox,
    /// Whether text is engraved at all.
    pub show_text: bool,
    /// Engraved lines; empty when text is hidden.
    pub lines: Vec<PreviewLine>,
    /// Typeface family.
    pub font_style: FontStyle,
    /// Material label, when the material is known.
    pub material_label: Option<MaterialLabel>,
    /// QR engraving color.
    pub qr_color: Option<PlaqueColor>,
    /// QR code markup, when generated.
    pub qr_svg: Option<String>,
}

/// Describe the plaque for `input`.
#[must_use]
pub fn render(input: &PreviewInput<'_>) -> PlaquePreview {
    let show_text = input.size != Some(SizeId::QrOnly);
    let lines = if show_text {
        input
            .text_lines
            .iter()
            .enumerate()
            .map(|(index, text)| PreviewLine {
                text: text.clone(),
                bold: index == 0,
            })
            .collect()
    } else {
        Vec::new()
    };
    let font_style = input
        .font_choice
        .and_then(catalog::font)
        .map_or(FontStyle::SansSerif, |font| font.style);
    let material_label = input.material.map(|material| {
        let spec = material.spec();
        MaterialLabel {
            name: spec.name.to_string(),
            lead_time_days: spec.lead_time_days,
        }
    });

    PlaquePreview {
        texture: Texture::for_material(input.material),
        text_tone: TextTone::resolve(input.text_color, input.material),
        corners: CornerStyle::for_shape(input.shape),
        display: DisplayBox::for_size(input.size),
        show_text,
        lines,
        font_style,
        material_label,
        qr_color: input.qr_color,
        qr_svg: input.qr_svg.map(str::to_string),
    }
}

impl PlaquePreview {
    /// Draw the preview as a standalone SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let DisplayBox {
            width_px: width,
            height_px: height,
        } = self.display;
        let canvas_height = if self.material_label.is_some() {
            height + LABEL_BAND_PX
        } else {
            height
        };
        let [from, via, to] = self.texture.gradient();
        let family = match self.font_style {
            FontStyle::Serif => "serif",
            FontStyle::SansSerif => "sans-serif",
        };

        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{canvas_height}" viewBox="0 0 {width} {canvas_height}">"#
        );
        let _ = write!(
            svg,
            r#"<defs><linearGradient id="texture" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{from}"/><stop offset="0.5" stop-color="{via}"/><stop offset="1" stop-color="{to}"/></linearGradient></defs>"#
        );
        let _ = write!(
            svg,
            r##"<rect width="{width}" height="{height}" rx="{r}" ry="{r}" fill="url(#texture)" stroke="#000000" stroke-opacity="0.2" stroke-width="2"/>"##,
            r = self.corners.radius_px()
        );

        let qr_height = if self.qr_svg.is_some() { QR_BOX_PX } else { 0 };
        let text_height = u32::try_from(self.lines.len()).unwrap_or(0) * LINE_HEIGHT_PX;
        let gap = if qr_height > 0 && text_height > 0 { GAP_PX } else { 0 };
        let mut y = height.saturating_sub(qr_height + gap + text_height) / 2;

        if let Some(qr_svg) = &self.qr_svg {
            let x = (width - QR_BOX_PX) / 2;
            let inner = QR_BOX_PX - 2 * QR_PADDING_PX;
            let _ = write!(
                svg,
                r##"<rect x="{x}" y="{y}" width="{QR_BOX_PX}" height="{QR_BOX_PX}" rx="4" fill="#FFFFFF"/><image x="{ix}" y="{iy}" width="{inner}" height="{inner}" href="data:image/svg+xml;base64,{data}"/>"##,
                ix = x + QR_PADDING_PX,
                iy = y + QR_PADDING_PX,
                data = STANDARD.encode(qr_svg.as_bytes()),
            );
            y += qr_height + gap;
        }

        let fill = self.text_tone.fill();
        for line in &self.lines {
            y += LINE_HEIGHT_PX;
            let weight = if line.bold { "bold" } else { "normal" };
            let _ = write!(
                svg,
                r#"<text x="{cx}" y="{baseline}" text-anchor="middle" font-family="{family}" font-size="10" font-weight="{weight}" fill="{fill}">{text}</text>"#,
                cx = width / 2,
                baseline = y - 2,
                text = escape_xml(&line.text),
            );
        }

        if let Some(label) = &self.material_label {
            let _ = write!(
                svg,
                r##"<text x="{cx}" y="{ly}" text-anchor="middle" font-family="sans-serif" font-size="10" fill="#111827">{name}</text>"##,
                cx = width / 2,
                ly = height + LABEL_BAND_PX - 8,
                name = escape_xml(&label.name),
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
