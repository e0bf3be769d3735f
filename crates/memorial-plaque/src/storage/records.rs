//! Records persisted by [`Storage`](super::Storage).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{MaterialType, SizeId};
use crate::error::{Error, Result};
use crate::wizard::{PlaqueColor, Privacy, Shape};

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Still being assembled.
    Cart,
    /// Placed, waiting for payment.
    PendingPayment,
    /// Payment received.
    Paid,
    /// Being prepared for engraving.
    Processing,
    /// On the engraver.
    Engraving,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled before fulfilment.
    Cancelled,
    /// Payment returned.
    Refunded,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Cart,
        Self::PendingPayment,
        Self::Paid,
        Self::Processing,
        Self::Engraving,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Refunded,
    ];

    /// Stored name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cart => "cart",
            Self::PendingPayment => "pending_payment",
            Self::Paid => "paid",
            Self::Processing => "processing",
            Self::Engraving => "engraving",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::invalid_value("order status", s))
    }
}

/// A stored order with its plaques.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Order id.
    pub id: Uuid,
    /// Customer-facing order number.
    pub order_number: String,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Amount charged for the whole order.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment provider reference, once payment starts.
    pub payment_intent_id: Option<String>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order last changed.
    pub updated_at: DateTime<Utc>,
    /// Plaques on the order.
    pub plaques: Vec<Plaque>,
}

/// A plaque line on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plaque {
    /// Plaque id.
    pub id: Uuid,
    /// Owning order.
    pub order_id: Uuid,
    /// Memorial page the QR code points at.
    pub memorial_page_id: Option<Uuid>,
    /// Material.
    pub material: MaterialType,
    /// Size.
    pub size: SizeId,
    /// Outline.
    pub shape: Shape,
    /// QR engraving color.
    pub qr_color: PlaqueColor,
    /// Text engraving color.
    pub text_color: PlaqueColor,
    /// Engraved lines.
    pub text_lines: Vec<String>,
    /// Font id.
    pub font_choice: Option<String>,
    /// Number of identical plaques.
    pub quantity: u32,
    /// Whether the customer approved the proof.
    pub approved: bool,
    /// When the plaque was recorded.
    pub created_at: DateTime<Utc>,
}

/// A stored memorial page with its QR records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemorialPage {
    /// Page id.
    pub id: Uuid,
    /// URL slug.
    pub slug: String,
    /// Name of the person remembered.
    pub full_name: String,
    /// Nickname.
    pub nick_name: Option<String>,
    /// Birth period.
    pub birth_month_year: Option<String>,
    /// Passing period.
    pub death_month_year: Option<String>,
    /// Short memorial message.
    pub few_words: Option<String>,
    /// Longer biography.
    pub about_text: Option<String>,
    /// Visibility.
    pub privacy: Privacy,
    /// Number of recorded visits.
    pub visits_count: u64,
    /// When the page was created.
    pub created_at: DateTime<Utc>,
    /// When the page last changed.
    pub updated_at: DateTime<Utc>,
    /// QR codes generated for the page, oldest first.
    pub qr_records: Vec<QrRecord>,
}

/// A QR code generated for a memorial page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrRecord {
    /// Record id.
    pub id: Uuid,
    /// Page the code points at.
    pub memorial_page_id: Uuid,
    /// Encoded URL.
    pub qr_value: String,
    /// SVG rendering.
    pub svg: String,
    /// PNG data URI.
    pub png: String,
    /// BLAKE3 hash of the SVG, hex encoded.
    pub content_hash: String,
    /// When the record was stored.
    pub created_at: DateTime<Utc>,
}

/// Fields for a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Initial status.
    pub status: OrderStatus,
    /// Amount charged.
    pub total_amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Payment provider reference.
    pub payment_intent_id: Option<String>,
    /// Plaques on the order.
    pub plaques: Vec<NewPlaque>,
}

/// Fields for a new plaque line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaque {
    /// Memorial page the QR code points at.
    pub memorial_page_id: Option<Uuid>,
    /// Material.
    pub material: MaterialType,
    /// Size.
    pub size: SizeId,
    /// Outline.
    pub shape: Shape,
    /// QR engraving color.
    pub qr_color: PlaqueColor,
    /// Text engraving color.
    pub text_color: PlaqueColor,
    /// Engraved lines.
    pub text_lines: Vec<String>,
    /// Font id.
    pub font_choice: Option<String>,
    /// Number of identical plaques.
    pub quantity: u32,
}

/// Fields for a new memorial page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMemorialPage {
    /// URL slug; must be unused.
    pub slug: String,
    /// Name of the person remembered.
    pub full_name: String,
    /// Nickname.
    pub nick_name: Option<String>,
    /// Birth period.
    pub birth_month_year: Option<String>,
    /// Passing period.
    pub death_month_year: Option<String>,
    /// Short memorial message.
    pub few_words: Option<String>,
    /// Longer biography.
    pub about_text: Option<String>,
    /// Visibility.
    pub privacy: Privacy,
}

/// Edits to a memorial page.
///
/// `None` leaves a field alone. For optional fields a blank string clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemorialPagePatch {
    /// New name; must not be blank.
    pub full_name: Option<String>,
    /// New nickname.
    pub nick_name: Option<String>,
    /// New birth period.
    pub birth_month_year: Option<String>,
    /// New passing period.
    pub death_month_year: Option<String>,
    /// New memorial message.
    pub few_words: Option<String>,
    /// New biography.
    pub about_text: Option<String>,
    /// New visibility.
    pub privacy: Option<Privacy>,
}

impl MemorialPagePatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Result of recording a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRecord {
    /// The stored order.
    pub order: Order,
    /// The memorial page the plaques point at.
    pub memorial_page: MemorialPage,
}
