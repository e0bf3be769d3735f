//! Engraving scannability heuristics.

use std::fmt;

use serde::Serialize;

/// Smallest module edge, in millimetres, that engraves reliably.
pub const MIN_MODULE_MM: f64 = 2.0;

/// Module grid assumed when estimating the engraved footprint.
pub const ASSUMED_GRID_MODULES: f64 = 25.0;

/// Smallest share of the plaque the QR code should cover.
pub const MIN_FOOTPRINT_RATIO: f64 = 0.2;

/// Lowest dark/light contrast ratio that scans reliably.
pub const MIN_CONTRAST_RATIO: f64 = 4.5;

/// A concern raised by [`validate_scannability`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanWarning {
    /// Modules are below [`MIN_MODULE_MM`].
    ModuleTooSmall,
    /// The code covers less than [`MIN_FOOTPRINT_RATIO`] of the plaque.
    FootprintTooSmall,
    /// Contrast is below [`MIN_CONTRAST_RATIO`].
    LowContrast,
}

impl ScanWarning {
    /// Human-readable explanation.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ModuleTooSmall => "QR modules may be too small for reliable engraving",
            Self::FootprintTooSmall => "QR code may be too small relative to plaque size",
            Self::LowContrast => "Low contrast may affect QR scannability",
        }
    }

    /// Whether this warning makes the design unscannable.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        !matches!(self, Self::FootprintTooSmall)
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of a scannability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// False when any blocking warning was raised.
    pub valid: bool,
    /// Every warning raised, in check order.
    pub warnings: Vec<ScanWarning>,
}

impl ScanReport {
    /// Whether the given warning was raised.
    #[must_use]
    pub fn has(&self, warning: ScanWarning) -> bool {
        self.warnings.contains(&warning)
    }
}

/// Estimate whether an engraved QR code will scan.
///
/// All three checks always run and each adds its own warning. Module size
/// and contrast failures invalidate the design; a small footprint only warns.
#[must_use]
pub fn validate_scannability(module_size_mm: f64, plaque_size_mm: f64, contrast: f64) -> ScanReport {
    let mut warnings = Vec::new();

    if module_size_mm < MIN_MODULE_MM {
        warnings.push(ScanWarning::ModuleTooSmall);
    }

    let footprint_mm = module_size_mm * ASSUMED_GRID_MODULES;
    if footprint_mm < plaque_size_mm * MIN_FOOTPRINT_RATIO {
        warnings.push(ScanWarning::FootprintTooSmall);
    }

    if contrast < MIN_CONTRAST_RATIO {
        warnings.push(ScanWarning::LowContrast);
    }

    let valid = !warnings.iter().any(|w| w.is_blocking());
    ScanReport { valid, warnings }
}
