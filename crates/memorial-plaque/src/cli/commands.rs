//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::catalog::{MaterialType, SizeId};
use crate::qr::ErrorCorrection;
use crate::storage::OrderStatus;
use crate::wizard::PlaqueColor;

/// Catalog command arguments.
#[derive(Debug, Args)]
pub struct CatalogCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Price command arguments.
#[derive(Debug, Args)]
pub struct PriceCommand {
    /// Material type, e.g. `brass` or `marble_black`
    #[arg(short, long)]
    pub material: MaterialType,

    /// Size id, e.g. `qr_name_6x6`
    #[arg(short, long)]
    pub size: SizeId,

    /// Number of plaques
    #[arg(long, default_value = "1")]
    pub quantity: u32,
}

/// QR command arguments.
#[derive(Debug, Args)]
pub struct QrCommand {
    /// Name to derive the memorial slug from
    #[arg(short, long, conflicts_with = "slug", required_unless_present = "slug")]
    pub name: Option<String>,

    /// Memorial slug to encode as-is
    #[arg(long)]
    pub slug: Option<String>,

    /// Engraving color of the QR modules
    #[arg(long, default_value = "black")]
    pub color: PlaqueColor,

    /// Error-correction level (defaults to the configured level)
    #[arg(short, long, value_enum)]
    pub level: Option<LevelArg>,

    /// Write the SVG rendering to this file
    #[arg(long, value_name = "FILE")]
    pub svg: Option<PathBuf>,

    /// Write the PNG rendering to this file
    #[arg(long, value_name = "FILE")]
    pub png: Option<PathBuf>,
}

/// Scannability check arguments.
#[derive(Debug, Args)]
pub struct ScanCheckCommand {
    /// Edge length of one QR module, in millimetres
    #[arg(long)]
    pub module_mm: f64,

    /// Shorter side of the plaque, in millimetres
    #[arg(long, conflicts_with = "size", required_unless_present = "size")]
    pub plaque_mm: Option<f64>,

    /// Take the plaque side from a catalog size
    #[arg(long)]
    pub size: Option<SizeId>,

    /// Contrast ratio between modules and background
    #[arg(long, conflicts_with = "qr_color")]
    pub contrast: Option<f64>,

    /// Take the contrast from an engraving color's palette
    #[arg(long)]
    pub qr_color: Option<PlaqueColor>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Preview command arguments.
#[derive(Debug, Args)]
pub struct PreviewCommand {
    /// Draft file (TOML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub draft: PathBuf,

    /// Write the preview SVG to this file
    #[arg(long, value_name = "FILE")]
    pub svg: Option<PathBuf>,

    /// Output the preview model as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Order commands.
#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Place an order from a draft file
    Create {
        /// Draft file (TOML or JSON)
        #[arg(short, long, value_name = "FILE")]
        draft: PathBuf,

        /// Number of plaques (defaults to the configured quantity)
        #[arg(long)]
        quantity: Option<u32>,
    },

    /// Show an order and its plaques
    Show {
        /// Order id
        id: Uuid,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Move an order to a new status
    Status {
        /// Order id
        id: Uuid,

        /// New status, e.g. `paid` or `shipped`
        status: OrderStatus,
    },
}

/// Memorial page commands.
#[derive(Debug, Subcommand)]
pub enum MemorialCommand {
    /// Show a memorial page
    Show {
        /// Memorial slug
        slug: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Record a visit to a memorial page
    Visit {
        /// Memorial slug
        slug: String,
    },
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Error-correction level argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    /// About 7% recovery
    L,
    /// About 15% recovery
    M,
    /// About 25% recovery
    Q,
    /// About 30% recovery
    H,
}

impl From<LevelArg> for ErrorCorrection {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::L => Self::L,
            LevelArg::M => Self::M,
            LevelArg::Q => Self::Q,
            LevelArg::H => Self::H,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_arg_conversion() {
        assert_eq!(ErrorCorrection::from(LevelArg::L), ErrorCorrection::L);
        assert_eq!(ErrorCorrection::from(LevelArg::M), ErrorCorrection::M);
        assert_eq!(ErrorCorrection::from(LevelArg::Q), ErrorCorrection::Q);
        assert_eq!(ErrorCorrection::from(LevelArg::H), ErrorCorrection::H);
    }

    #[test]
    fn test_order_command_debug() {
        let cmd = OrderCommand::Status {
            id: Uuid::nil(),
            status: OrderStatus::Paid,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Status"));
        assert!(debug_str.contains("Paid"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_level_arg_debug() {
        assert_eq!(format!("{:?}", LevelArg::H), "H");
    }
}
