//! Static product catalog and pricing.
//!
//! Materials, plaque sizes and engraving fonts are fixed tables compiled into
//! the binary. Prices are [`Decimal`] currency amounts with two decimal places.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Physical material a plaque is made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    /// Polished brass.
    Brass,
    /// Brushed stainless steel.
    Steel,
    /// Black marble.
    MarbleBlack,
    /// White marble.
    MarbleWhite,
    /// Natural slate.
    Slate,
    /// Composite with a gold finish.
    #[serde(rename = "plastic_gold")]
    GoldComposite,
}

impl MaterialType {
    /// Every material, in catalog order.
    pub const ALL: [Self; 6] = [
        Self::Brass,
        Self::MarbleBlack,
        Self::MarbleWhite,
        Self::Steel,
        Self::Slate,
        Self::GoldComposite,
    ];

    /// The type tag used in ids, URLs and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Brass => "brass",
            Self::Steel => "steel",
            Self::MarbleBlack => "marble_black",
            Self::MarbleWhite => "marble_white",
            Self::Slate => "slate",
            Self::GoldComposite => "plastic_gold",
        }
    }

    /// The catalog entry for this material.
    #[must_use]
    pub fn spec(self) -> &'static Material {
        let index = match self {
            Self::Brass => 0,
            Self::MarbleBlack => 1,
            Self::MarbleWhite => 2,
            Self::Steel => 3,
            Self::Slate => 4,
            Self::GoldComposite => 5,
        };
        &MATERIALS[index]
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::UnknownMaterial(s.to_string()))
    }
}

/// Plaque layout, which also fixes its physical dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeId {
    /// QR code only, 5cm × 5cm.
    #[serde(rename = "qr_only_5x5")]
    QrOnly,
    /// QR code and name, 6cm × 6cm.
    #[serde(rename = "qr_name_6x6")]
    QrName,
    /// QR code, name and memorial words, 6cm × 7cm.
    #[serde(rename = "qr_name_words_6x7")]
    QrNameWords,
}

impl SizeId {
    /// Every size, in catalog order.
    pub const ALL: [Self; 3] = [Self::QrOnly, Self::QrName, Self::QrNameWords];

    /// The size id used in storage and draft files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::QrOnly => "qr_only_5x5",
            Self::QrName => "qr_name_6x6",
            Self::QrNameWords => "qr_name_words_6x7",
        }
    }

    /// The catalog entry for this size.
    #[must_use]
    pub fn spec(self) -> &'static Size {
        match self {
            Self::QrOnly => &SIZES[0],
            Self::QrName => &SIZES[1],
            Self::QrNameWords => &SIZES[2],
        }
    }
}

impl fmt::Display for SizeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| Error::UnknownSize(s.to_string()))
    }
}

/// Style family of an engraving font.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    /// Serif typeface.
    Serif,
    /// Sans-serif typeface.
    SansSerif,
}

/// A plaque material offered in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    /// Catalog id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Physical material.
    pub material_type: MaterialType,
    /// Short marketing description.
    pub description: &'static str,
    /// Base price before the size modifier.
    pub price_base: Decimal,
    /// Days from order to dispatch.
    pub lead_time_days: u32,
    /// Engraving depth, e.g. `0.5mm`.
    pub engraving_depth: &'static str,
    /// Selling points, most important first.
    pub features: &'static [&'static str],
}

/// A plaque size offered in the storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Size {
    /// Size id.
    pub id: SizeId,
    /// Display name.
    pub name: &'static str,
    /// Display dimensions.
    pub dimensions: &'static str,
    /// Short description of the layout.
    pub description: &'static str,
    /// Amount added to the material base price.
    pub price_modifier: Decimal,
    /// Physical width in millimetres.
    pub width_mm: u32,
    /// Physical height in millimetres.
    pub height_mm: u32,
}

impl Size {
    /// The shorter physical side, used when sizing the QR code.
    #[must_use]
    pub fn min_side_mm(&self) -> u32 {
        self.width_mm.min(self.height_mm)
    }
}

/// An engraving font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Font {
    /// Font id stored on the draft.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Style family.
    pub style: FontStyle,
}

static MATERIALS: [Material; 6] = [
    Material {
        id: "brass",
        name: "Premium Brass",
        material_type: MaterialType::Brass,
        description: "Elegant brass with deep engraving and protective coating",
        price_base: Decimal::from_parts(8999, 0, 0, false, 2),
        lead_time_days: 5,
        engraving_depth: "0.5mm",
        features: &[
            "Lifetime durability",
            "Weather resistant",
            "Premium finish",
            "Hand-polished",
        ],
    },
    Material {
        id: "marble_black",
        name: "Black Marble",
        material_type: MaterialType::MarbleBlack,
        description: "Sophisticated black marble with precision laser engraving",
        price_base: Decimal::from_parts(12999, 0, 0, false, 2),
        lead_time_days: 7,
        engraving_depth: "1.0mm",
        features: &[
            "Natural stone",
            "Unique grain patterns",
            "Premium feel",
            "Indoor/outdoor use",
        ],
    },
    Material {
        id: "marble_white",
        name: "White Marble",
        material_type: MaterialType::MarbleWhite,
        description: "Classic white marble with elegant black engraving",
        price_base: Decimal::from_parts(12999, 0, 0, false, 2),
        lead_time_days: 7,
        engraving_depth: "1.0mm",
        features: &[
            "Timeless elegance",
            "High contrast",
            "Premium stone",
            "Handcrafted",
        ],
    },
    Material {
        id: "steel",
        name: "Brushed Steel",
        material_type: MaterialType::Steel,
        description: "Brushed stainless steel with crisp laser engraving",
        price_base: Decimal::from_parts(6999, 0, 0, false, 2),
        lead_time_days: 3,
        engraving_depth: "0.3mm",
        features: &[
            "Modern aesthetic",
            "Corrosion resistant",
            "Easy maintenance",
            "Industrial strength",
        ],
    },
    Material {
        id: "slate",
        name: "Natural Slate",
        material_type: MaterialType::Slate,
        description: "Rustic natural slate with deep character engraving",
        price_base: Decimal::from_parts(7999, 0, 0, false, 2),
        lead_time_days: 4,
        engraving_depth: "0.8mm",
        features: &[
            "Natural texture",
            "Unique character",
            "Weather proof",
            "Traditional feel",
        ],
    },
    Material {
        id: "plastic_gold",
        name: "Gold Finish Composite",
        material_type: MaterialType::GoldComposite,
        description: "Durable composite with luxury gold finish",
        price_base: Decimal::from_parts(3999, 0, 0, false, 2),
        lead_time_days: 2,
        engraving_depth: "0.2mm",
        features: &[
            "Budget friendly",
            "Lightweight",
            "Fade resistant",
            "Easy installation",
        ],
    },
];

static SIZES: [Size; 3] = [
    Size {
        id: SizeId::QrOnly,
        name: "QR Only",
        dimensions: "5cm × 5cm",
        description: "Pure QR code design",
        price_modifier: Decimal::ZERO,
        width_mm: 50,
        height_mm: 50,
    },
    Size {
        id: SizeId::QrName,
        name: "QR + Name",
        dimensions: "6cm × 6cm",
        description: "QR code with name",
        price_modifier: Decimal::TEN,
        width_mm: 60,
        height_mm: 60,
    },
    Size {
        id: SizeId::QrNameWords,
        name: "QR + Name + Words",
        dimensions: "6cm × 7cm",
        description: "QR code, name, and memorial words",
        price_modifier: Decimal::from_parts(20, 0, 0, false, 0),
        width_mm: 60,
        height_mm: 70,
    },
];

static FONTS: [Font; 4] = [
    Font {
        id: "playfair",
        name: "Playfair Display",
        style: FontStyle::Serif,
    },
    Font {
        id: "inter",
        name: "Inter",
        style: FontStyle::SansSerif,
    },
    Font {
        id: "crimson",
        name: "Crimson Text",
        style: FontStyle::Serif,
    },
    Font {
        id: "lato",
        name: "Lato",
        style: FontStyle::SansSerif,
    },
];

/// All materials, in catalog order.
#[must_use]
pub fn materials() -> &'static [Material] {
    &MATERIALS
}

/// All sizes, in catalog order.
#[must_use]
pub fn sizes() -> &'static [Size] {
    &SIZES
}

/// All fonts, in catalog order.
#[must_use]
pub fn fonts() -> &'static [Font] {
    &FONTS
}

/// Look up a material by its type tag.
#[must_use]
pub fn material_by_type(material_type: &str) -> Option<&'static Material> {
    MATERIALS
        .iter()
        .find(|m| m.material_type.as_str() == material_type)
}

/// Look up a size by its id.
#[must_use]
pub fn size_by_id(size_id: &str) -> Option<&'static Size> {
    SIZES.iter().find(|s| s.id.as_str() == size_id)
}

/// Look up a font by its id.
#[must_use]
pub fn font(font_id: &str) -> Option<&'static Font> {
    FONTS.iter().find(|f| f.id == font_id)
}

/// Price `quantity` plaques of the given material and size.
///
/// Returns zero when either the material or the size is unknown, so that a
/// preview of a half-configured draft can always show a figure. Use
/// [`try_price_of`] where an unknown product must be an error.
#[must_use]
pub fn price_of(material_type: &str, size_id: &str, quantity: u32) -> Decimal {
    match try_price_of(material_type, size_id, quantity) {
        Ok(price) => price,
        Err(err) => {
            debug!(error = %err, "pricing unknown product as zero");
            Decimal::ZERO
        }
    }
}

/// Price `quantity` plaques, failing on an unknown material or size.
///
/// # Errors
///
/// Returns [`Error::UnknownMaterial`] or [`Error::UnknownSize`].
pub fn try_price_of(material_type: &str, size_id: &str, quantity: u32) -> Result<Decimal> {
    let material = material_by_type(material_type)
        .ok_or_else(|| Error::UnknownMaterial(material_type.to_string()))?;
    let size = size_by_id(size_id).ok_or_else(|| Error::UnknownSize(size_id.to_string()))?;
    Ok(unit_price(material, size) * Decimal::from(quantity))
}

/// Price of a single plaque.
#[must_use]
pub fn unit_price(material: &Material, size: &Size) -> Decimal {
    (material.price_base + size.price_modifier).round_dp(2)
}
