//! `SQLite` schema definitions for memorial-plaque.
//!
//! Ids are UUID strings, timestamps RFC 3339 strings and money amounts
//! decimal strings.

/// SQL statement to create the orders table.
pub const CREATE_ORDERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    order_number TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    total_amount TEXT NOT NULL,
    currency TEXT NOT NULL,
    payment_intent_id TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the memorial pages table.
pub const CREATE_MEMORIAL_PAGES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS memorial_pages (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    nick_name TEXT,
    birth_month_year TEXT,
    death_month_year TEXT,
    few_words TEXT,
    about_text TEXT,
    privacy TEXT NOT NULL,
    visits_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the plaques table.
///
/// `text_lines` holds a JSON array of strings.
pub const CREATE_PLAQUES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS plaques (
    id TEXT PRIMARY KEY,
    order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    memorial_page_id TEXT REFERENCES memorial_pages(id),
    material TEXT NOT NULL,
    size TEXT NOT NULL,
    shape TEXT NOT NULL,
    qr_color TEXT NOT NULL,
    text_color TEXT NOT NULL,
    text_lines TEXT NOT NULL,
    font_choice TEXT,
    quantity INTEGER NOT NULL,
    approved INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create the QR records table.
pub const CREATE_QR_RECORDS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS qr_records (
    id TEXT PRIMARY KEY,
    memorial_page_id TEXT NOT NULL REFERENCES memorial_pages(id) ON DELETE CASCADE,
    qr_value TEXT NOT NULL,
    svg TEXT NOT NULL,
    png TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
)
";

/// SQL statement to index plaques by order.
pub const CREATE_PLAQUES_ORDER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_plaques_order ON plaques(order_id)
";

/// SQL statement to index QR records by memorial page.
pub const CREATE_QR_RECORDS_PAGE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_qr_records_page ON qr_records(memorial_page_id)
";

/// SQL statement to create an index on `content_hash` for deduplication.
pub const CREATE_QR_RECORDS_HASH_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_qr_records_hash ON qr_records(content_hash)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// SQL statement added by migration 2 to index orders by status.
pub const CREATE_ORDERS_STATUS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ORDERS_TABLE,
    CREATE_MEMORIAL_PAGES_TABLE,
    CREATE_PLAQUES_TABLE,
    CREATE_QR_RECORDS_TABLE,
    CREATE_PLAQUES_ORDER_INDEX,
    CREATE_QR_RECORDS_PAGE_INDEX,
    CREATE_QR_RECORDS_HASH_INDEX,
    CREATE_METADATA_TABLE,
];
