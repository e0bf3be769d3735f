//! QR code generation for memorial pages.
//!
//! This module turns a memorial URL into engraving artwork:
//!
//! - **Encoding**: [`generate`] wraps the `qrcode` crate and produces SVG
//!   markup plus a PNG data URI, both with a four-module quiet zone.
//!
//! - **Async seam**: [`QrEncoder`] is the trait the order wizard talks to;
//!   [`QrCodeEncoder`] runs [`generate`] on Tokio's blocking pool.
//!
//! - **Scannability**: [`validate_scannability`] and [`contrast_ratio`]
//!   estimate whether an engraved code will read.
//!
//! # Example
//!
//! ```
//! use memorial_plaque::qr::{generate, slugify, QrOptions};
//!
//! let slug = slugify("Ada Lovelace");
//! let image = generate(&format!("https://example.com/memorial/{slug}"), &QrOptions::default())?;
//! assert!(image.svg.contains("<svg"));
//! assert!(image.png.starts_with("data:image/png;base64,"));
//! # Ok::<(), memorial_plaque::Error>(())
//! ```

mod color;
pub mod scan;
mod slug;

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use qrcode::render::svg;
use qrcode::{Color as Module, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{QrConfig, SiteConfig};
use crate::error::{Error, Result};

pub use color::{contrast_ratio, HexColor, Palette};
pub use scan::{validate_scannability, ScanReport, ScanWarning};
pub use slug::slugify;

/// Quiet zone around the code, in modules.
pub const QUIET_ZONE_MODULES: usize = 4;

/// Default raster width in pixels.
pub const DEFAULT_WIDTH_PX: u32 = 1000;

/// Path segment memorial pages are served under.
pub const MEMORIAL_PATH: &str = "memorial";

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// Recovers about 7% of damaged modules.
    L,
    /// Recovers about 15%.
    M,
    /// Recovers about 25%.
    Q,
    /// Recovers about 30%; the default for engraved plaques.
    #[default]
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => Self::L,
            ErrorCorrection::M => Self::M,
            ErrorCorrection::Q => Self::Q,
            ErrorCorrection::H => Self::H,
        }
    }
}

/// Options for a single encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrOptions {
    /// Error-correction level.
    pub error_correction: ErrorCorrection,
    /// Module and background colors.
    pub palette: Palette,
    /// Minimum rendered width in pixels.
    pub width_px: u32,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::H,
            palette: Palette::default(),
            width_px: DEFAULT_WIDTH_PX,
        }
    }
}

/// The two renderings of an encoded QR code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrImage {
    /// Standalone SVG document.
    pub svg: String,
    /// `data:image/png;base64,...` URI.
    pub png: String,
}

/// A QR code that points at a memorial page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorialQr {
    /// Slug of the memorial page.
    pub slug: String,
    /// Full URL encoded in the code.
    pub url: String,
    /// Rendered artwork.
    #[serde(flatten)]
    pub image: QrImage,
}

/// Encode `text` into SVG and PNG renderings.
///
/// # Errors
///
/// Returns [`Error::QrGeneration`] if the text cannot be encoded at the
/// requested error-correction level, or if the PNG cannot be written.
pub fn generate(text: &str, options: &QrOptions) -> Result<QrImage> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), options.error_correction.into())
        .map_err(|e| Error::qr_generation(e.to_string()))?;

    let svg = render_svg(&code, options);
    let png = render_png_data_uri(&code, options)?;
    debug!(
        modules = code.width(),
        svg_bytes = svg.len(),
        png_bytes = png.len(),
        "Encoded QR code"
    );
    Ok(QrImage { svg, png })
}

fn render_svg(code: &QrCode, options: &QrOptions) -> String {
    let dark = options.palette.dark.to_string();
    let light = options.palette.light.to_string();
    code.render::<svg::Color<'_>>()
        .min_dimensions(options.width_px, options.width_px)
        .dark_color(svg::Color(&dark))
        .light_color(svg::Color(&light))
        .quiet_zone(true)
        .build()
}

fn render_png_data_uri(code: &QrCode, options: &QrOptions) -> Result<String> {
    let modules = code.width();
    let total = modules + 2 * QUIET_ZONE_MODULES;
    let width = usize::try_from(options.width_px).unwrap_or(usize::MAX);
    let scale = (width / total).max(1);
    let side = u32::try_from(total * scale)
        .map_err(|_| Error::qr_generation("rendered image is too large"))?;

    let colors = code.to_colors();
    let dark = Rgb(options.palette.dark.channels());
    let light = Rgb(options.palette.light.channels());
    let module_at = |pixel: u32| {
        let index = usize::try_from(pixel).unwrap_or(usize::MAX) / scale;
        index
            .checked_sub(QUIET_ZONE_MODULES)
            .filter(|&m| m < modules)
    };
    let image = RgbImage::from_fn(side, side, |x, y| match (module_at(x), module_at(y)) {
        (Some(mx), Some(my)) if colors[my * modules + mx] == Module::Dark => dark,
        _ => light,
    });

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| Error::qr_generation(format!("PNG encoding failed: {e}")))?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&bytes)))
}

/// Build the public URL of a memorial page.
#[must_use]
pub fn build_memorial_url(origin: &str, slug: &str) -> String {
    format!("{}/{MEMORIAL_PATH}/{slug}", origin.trim_end_matches('/'))
}

/// Something that can encode text into QR artwork.
///
/// The order wizard spawns encodes in the background through this trait.
#[async_trait]
pub trait QrEncoder: Send + Sync + fmt::Debug {
    /// Encode `text` with the given options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QrGeneration`] if the text cannot be encoded.
    async fn encode(&self, text: &str, options: &QrOptions) -> Result<QrImage>;
}

/// [`QrEncoder`] backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrCodeEncoder;

#[async_trait]
impl QrEncoder for QrCodeEncoder {
    async fn encode(&self, text: &str, options: &QrOptions) -> Result<QrImage> {
        let text = text.to_string();
        let options = options.clone();
        tokio::task::spawn_blocking(move || generate(&text, &options))
            .await
            .map_err(|e| Error::internal(format!("QR encoder task failed: {e}")))?
    }
}

/// Produces memorial QR codes for a site.
#[derive(Debug, Clone)]
pub struct QrGenerator {
    encoder: Arc<dyn QrEncoder>,
    origin: String,
    error_correction: ErrorCorrection,
    width_px: u32,
}

impl QrGenerator {
    /// A generator for `origin` using the `qrcode` encoder and default options.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self::with_encoder(Arc::new(QrCodeEncoder), origin)
    }

    /// A generator using a custom encoder.
    #[must_use]
    pub fn with_encoder(encoder: Arc<dyn QrEncoder>, origin: impl Into<String>) -> Self {
        Self {
            encoder,
            origin: origin.into(),
            error_correction: ErrorCorrection::default(),
            width_px: DEFAULT_WIDTH_PX,
        }
    }

    /// A generator configured from the site and QR sections.
    #[must_use]
    pub fn from_config(site: &SiteConfig, qr: &QrConfig) -> Self {
        Self::new(site.origin.clone())
            .error_correction(qr.error_correction)
            .width_px(qr.width_px)
    }

    /// Override the error-correction level.
    #[must_use]
    pub fn error_correction(mut self, level: ErrorCorrection) -> Self {
        self.error_correction = level;
        self
    }

    /// Override the raster width.
    #[must_use]
    pub fn width_px(mut self, width_px: u32) -> Self {
        self.width_px = width_px;
        self
    }

    /// Site origin the memorial URLs are built on.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Public URL of the memorial page for `slug`.
    #[must_use]
    pub fn memorial_url(&self, slug: &str) -> String {
        build_memorial_url(&self.origin, slug)
    }

    /// Options for an encode with the given palette.
    #[must_use]
    pub fn options(&self, palette: Palette) -> QrOptions {
        QrOptions {
            error_correction: self.error_correction,
            palette,
            width_px: self.width_px,
        }
    }

    /// Encode arbitrary text.
    ///
    /// # Errors
    ///
    /// Propagates encoder failures.
    pub async fn generate(&self, text: &str, options: &QrOptions) -> Result<QrImage> {
        self.encoder.encode(text, options).await
    }

    /// Encode the memorial URL for `slug`.
    ///
    /// # Errors
    ///
    /// Propagates encoder failures.
    #[instrument(skip(self, palette), fields(origin = %self.origin))]
    pub async fn generate_for_slug(&self, slug: &str, palette: Palette) -> Result<MemorialQr> {
        let url = self.memorial_url(slug);
        let image = self.generate(&url, &self.options(palette)).await?;
        debug!(%url, "Generated memorial QR code");
        Ok(MemorialQr {
            slug: slug.to_string(),
            url,
            image,
        })
    }
}
