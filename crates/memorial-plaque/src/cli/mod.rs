//! Command-line interface for memorial-plaque.
//!
//! This module provides the CLI structure for the `plaquectl` binary and
//! the draft-file loader its commands share.

mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use figment::providers::{Format, Json, Toml};
use figment::Figment;

use crate::error::Result;
use crate::logging::Verbosity;
use crate::wizard::{DraftPatch, OrderDraft};

pub use commands::{
    CatalogCommand, ConfigCommand, LevelArg, MemorialCommand, OrderCommand, PreviewCommand,
    PriceCommand, QrCommand, ScanCheckCommand, StatsCommand,
};

/// plaquectl - Configure, price and record memorial plaque orders
///
/// Browse the plaque catalog, generate memorial QR codes, check that an
/// engraving will scan, render previews and place orders.
#[derive(Debug, Parser)]
#[command(name = "plaquectl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List materials, sizes and fonts
    Catalog(CatalogCommand),

    /// Price a material and size
    Price(PriceCommand),

    /// Generate a memorial QR code
    Qr(QrCommand),

    /// Check whether an engraved QR code will scan
    ScanCheck(ScanCheckCommand),

    /// Render a plaque preview from a draft file
    Preview(PreviewCommand),

    /// Place and manage orders
    #[command(subcommand)]
    Order(OrderCommand),

    /// Inspect memorial pages
    #[command(subcommand)]
    Memorial(MemorialCommand),

    /// Show database statistics
    Stats(StatsCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

/// Read a draft from a TOML or JSON file.
///
/// Files ending in `.json` are read as JSON, anything else as TOML. Keys
/// are the [`DraftPatch`] field names.
///
/// # Errors
///
/// Returns an error if the file is missing or holds unknown keys or values.
pub fn load_draft(path: &Path) -> Result<OrderDraft> {
    if !path.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("draft file not found: {}", path.display()),
        )
        .into());
    }

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let figment = if is_json {
        Figment::new().merge(Json::file(path))
    } else {
        Figment::new().merge(Toml::file(path))
    };

    let patch: DraftPatch = figment.extract()?;
    Ok(OrderDraft::new().patched(&patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MaterialType, SizeId};
    use crate::wizard::{PlaqueColor, Privacy};
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "plaquectl");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().verbosity();
        assert_eq!(parse(&["plaquectl", "stats"]), Verbosity::Normal);
        assert_eq!(parse(&["plaquectl", "-v", "stats"]), Verbosity::Verbose);
        assert_eq!(parse(&["plaquectl", "-vv", "stats"]), Verbosity::Debug);
        assert_eq!(parse(&["plaquectl", "-vvv", "stats"]), Verbosity::Trace);
        assert_eq!(parse(&["plaquectl", "-q", "-v", "stats"]), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["plaquectl", "-c", "/custom/config.toml", "catalog"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_price() {
        let args = vec![
            "plaquectl", "price", "--material", "marble_black", "--size", "qr_only_5x5", "-q",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Price(cmd) => {
                assert_eq!(cmd.material, MaterialType::MarbleBlack);
                assert_eq!(cmd.size, SizeId::QrOnly);
                assert_eq!(cmd.quantity, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_price_rejects_unknown_material() {
        let args = vec!["plaquectl", "price", "--material", "wood", "--size", "qr_only_5x5"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_qr_requires_name_or_slug() {
        assert!(Cli::try_parse_from(["plaquectl", "qr"]).is_err());
        assert!(Cli::try_parse_from(["plaquectl", "qr", "--name", "Ada", "--slug", "ada"]).is_err());

        let cli = Cli::try_parse_from(["plaquectl", "qr", "--slug", "ada", "--level", "q"]).unwrap();
        match cli.command {
            Command::Qr(cmd) => {
                assert_eq!(cmd.slug.as_deref(), Some("ada"));
                assert_eq!(cmd.color, PlaqueColor::Black);
                assert_eq!(cmd.level, Some(LevelArg::Q));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_scan_check() {
        let args = vec![
            "plaquectl", "scan-check", "--module-mm", "1.5", "--size", "qr_name_6x6",
            "--qr-color", "gold",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::ScanCheck(cmd) => {
                assert!((cmd.module_mm - 1.5).abs() < f64::EPSILON);
                assert_eq!(cmd.size, Some(SizeId::QrName));
                assert_eq!(cmd.qr_color, Some(PlaqueColor::Gold));
                assert!(cmd.plaque_mm.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let missing_side = vec!["plaquectl", "scan-check", "--module-mm", "2"];
        assert!(Cli::try_parse_from(missing_side).is_err());
    }

    #[test]
    fn test_parse_order_status() {
        let args = vec![
            "plaquectl",
            "order",
            "status",
            "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
            "shipped",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Order(OrderCommand::Status {
                status: crate::storage::OrderStatus::Shipped,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_order_show_rejects_bad_id() {
        let args = vec!["plaquectl", "order", "show", "not-a-uuid"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_memorial_visit() {
        let args = vec!["plaquectl", "memorial", "visit", "ada-lovelace"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Memorial(MemorialCommand::Visit { ref slug }) if slug == "ada-lovelace"
        ));
    }

    #[test]
    fn test_load_draft_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.toml");
        std::fs::write(
            &path,
            r#"
material = "brass"
size = "qr_name_words_6x7"
qr_color = "black"
text_color = "gold"
full_name = "Ada Lovelace"
few_words = "   "
privacy = "private"
"#,
        )
        .unwrap();

        let draft = load_draft(&path).unwrap();
        assert_eq!(draft.material(), Some(MaterialType::Brass));
        assert_eq!(draft.size(), Some(SizeId::QrNameWords));
        assert_eq!(draft.full_name(), Some("Ada Lovelace"));
        assert!(draft.few_words().is_none());
        assert_eq!(draft.privacy(), Privacy::Private);
    }

    #[test]
    fn test_load_draft_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.json");
        std::fs::write(&path, r#"{"material": "steel", "full_name": "Grace"}"#).unwrap();

        let draft = load_draft(&path).unwrap();
        assert_eq!(draft.material(), Some(MaterialType::Steel));
        assert_eq!(draft.slug().as_deref(), Some("grace"));
    }

    #[test]
    fn test_load_draft_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.toml");
        std::fs::write(&path, "engraver = \"laser\"\n").unwrap();

        assert!(load_draft(&path).is_err());
    }

    #[test]
    fn test_load_draft_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_draft(&dir.path().join("nope.toml")).is_err());
    }
}
