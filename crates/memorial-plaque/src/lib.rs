//! `memorial-plaque` - Ordering core for QR-engraved memorial plaques
//!
//! This library provides the plaque catalog and pricing, memorial QR code
//! generation with scannability checks, the three-step order wizard, plaque
//! previews, and `SQLite` storage for orders and memorial pages.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod checkout;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod preview;
pub mod qr;
pub mod storage;
pub mod wizard;

pub use catalog::{price_of, try_price_of, MaterialType, SizeId};
pub use checkout::place_order;
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use preview::PlaquePreview;
pub use qr::{MemorialQr, QrGenerator};
pub use storage::{Storage, StorageStats};
pub use wizard::{OrderDraft, OrderWizard, Step, Transition};
