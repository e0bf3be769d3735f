//! Storage layer for memorial-plaque.
//!
//! This module provides `SQLite`-based persistent storage for orders, their
//! plaques, memorial pages and the QR codes generated for them.

pub mod migrations;
mod records;
pub mod schema;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::qr::MemorialQr;

pub use records::{
    CheckoutRecord, MemorialPage, MemorialPagePatch, NewMemorialPage, NewOrder, NewPlaque, Order,
    OrderStatus, Plaque, QrRecord,
};

const ORDER_COLUMNS: &str = "id, order_number, status, total_amount, currency, \
     payment_intent_id, created_at, updated_at";

const PLAQUE_COLUMNS: &str = "id, order_id, memorial_page_id, material, size, shape, \
     qr_color, text_color, text_lines, font_choice, quantity, approved, created_at";

const PAGE_COLUMNS: &str = "id, slug, full_name, nick_name, birth_month_year, \
     death_month_year, few_words, about_text, privacy, visits_count, created_at, updated_at";

const QR_RECORD_COLUMNS: &str =
    "id, memorial_page_id, qr_value, svg, png, content_hash, created_at";

/// Storage engine for orders and memorial pages.
///
/// Provides persistent storage using `SQLite` with support for:
/// - Orders with their plaque lines
/// - Memorial pages with unique slugs and visit counting
/// - QR records deduplicated by content hash
/// - Recording a whole checkout in one transaction
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // Enable WAL mode for better concurrent read performance
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Orders ===

    /// Store a new order and its plaques.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create_order(&self, order: &NewOrder) -> Result<Order> {
        let tx = self.conn.unchecked_transaction()?;
        let id = insert_order(&tx, order, None)?;
        tx.commit()?;
        load_order(&self.conn, id)?.ok_or_else(|| Error::not_found("order", id.to_string()))
    }

    /// Get an order and its plaques by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_order(&self, id: Uuid) -> Result<Option<Order>> {
        load_order(&self.conn, id)
    }

    /// Move an order to a new status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no order has the id.
    pub fn update_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Order> {
        let affected = self.conn.execute(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if affected == 0 {
            return Err(Error::not_found("order", id.to_string()));
        }
        info!(order = %id, %status, "Updated order status");
        load_order(&self.conn, id)?.ok_or_else(|| Error::not_found("order", id.to_string()))
    }

    // === Memorial pages ===

    /// Store a new memorial page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlugTaken`] if the slug is in use.
    pub fn create_memorial_page(&self, page: &NewMemorialPage) -> Result<MemorialPage> {
        let id = insert_page(&self.conn, page)?;
        load_page_by_id(&self.conn, id)?
            .ok_or_else(|| Error::not_found("memorial page", id.to_string()))
    }

    /// Get a memorial page and its QR records by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_memorial_page(&self, slug: &str) -> Result<Option<MemorialPage>> {
        load_page(
            &self.conn,
            &format!("SELECT {PAGE_COLUMNS} FROM memorial_pages WHERE slug = ?1"),
            slug,
        )
    }

    /// Apply `patch` to the page with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no page has the id, or
    /// [`Error::InvalidValue`] if the patch blanks the name.
    pub fn update_memorial_page(&self, id: Uuid, patch: &MemorialPagePatch) -> Result<MemorialPage> {
        let current = load_page_by_id(&self.conn, id)?
            .ok_or_else(|| Error::not_found("memorial page", id.to_string()))?;
        if patch.is_empty() {
            return Ok(current);
        }

        let full_name = match &patch.full_name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::invalid_value("full_name", name.clone()));
            }
            Some(name) => name.clone(),
            None => current.full_name,
        };
        let privacy = patch.privacy.unwrap_or(current.privacy);

        self.conn.execute(
            r"
            UPDATE memorial_pages SET
                full_name = ?1, nick_name = ?2, birth_month_year = ?3,
                death_month_year = ?4, few_words = ?5, about_text = ?6,
                privacy = ?7, updated_at = ?8
            WHERE id = ?9
            ",
            params![
                full_name,
                merge_text(current.nick_name, &patch.nick_name),
                merge_text(current.birth_month_year, &patch.birth_month_year),
                merge_text(current.death_month_year, &patch.death_month_year),
                merge_text(current.few_words, &patch.few_words),
                merge_text(current.about_text, &patch.about_text),
                privacy.as_str(),
                Utc::now().to_rfc3339(),
                id.to_string(),
            ],
        )?;
        debug!(page = %id, "Updated memorial page");

        load_page_by_id(&self.conn, id)?
            .ok_or_else(|| Error::not_found("memorial page", id.to_string()))
    }

    /// Count a visit to the page and return the new total.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no page has the id.
    pub fn increment_visit_count(&self, id: Uuid) -> Result<u64> {
        let visits: Option<i64> = self
            .conn
            .query_row(
                r"
                UPDATE memorial_pages SET visits_count = visits_count + 1
                WHERE id = ?1 RETURNING visits_count
                ",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let visits = visits.ok_or_else(|| Error::not_found("memorial page", id.to_string()))?;
        Ok(u64::try_from(visits).unwrap_or_default())
    }

    /// Check whether a memorial page already uses `slug`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM memorial_pages WHERE slug = ?1",
            [slug],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // === QR records ===

    /// Store a generated QR code for a memorial page.
    ///
    /// Returns `None` if the code was deduplicated (an identical SVG is
    /// already stored).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_qr_record(&self, memorial_page_id: Uuid, qr: &MemorialQr) -> Result<Option<QrRecord>> {
        match insert_qr(&self.conn, memorial_page_id, qr)? {
            Some(id) => load_qr_record(&self.conn, id),
            None => Ok(None),
        }
    }

    // === Checkout ===

    /// Store a memorial page, its QR record and an order pointing at the
    /// page, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlugTaken`] if the slug is in use; nothing is
    /// written in that case.
    pub fn record_checkout(
        &self,
        page: &NewMemorialPage,
        qr: &MemorialQr,
        order: &NewOrder,
    ) -> Result<CheckoutRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let page_id = insert_page(&tx, page)?;
        insert_qr(&tx, page_id, qr)?;
        let order_id = insert_order(&tx, order, Some(page_id))?;
        tx.commit()?;

        let order = load_order(&self.conn, order_id)?
            .ok_or_else(|| Error::not_found("order", order_id.to_string()))?;
        let memorial_page = load_page_by_id(&self.conn, page_id)?
            .ok_or_else(|| Error::not_found("memorial page", page_id.to_string()))?;
        info!(
            order_number = %order.order_number,
            slug = %memorial_page.slug,
            "Recorded checkout"
        );
        Ok(CheckoutRecord {
            order,
            memorial_page,
        })
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let count = |sql: &str| -> Result<i64> { Ok(self.conn.query_row(sql, [], |row| row.get(0))?) };

        let total_orders = count("SELECT COUNT(*) FROM orders")?;
        let pending_orders = count("SELECT COUNT(*) FROM orders WHERE status = 'pending_payment'")?;
        let memorial_pages = count("SELECT COUNT(*) FROM memorial_pages")?;
        let qr_records = count("SELECT COUNT(*) FROM qr_records")?;
        let total_visits = count("SELECT COALESCE(SUM(visits_count), 0) FROM memorial_pages")?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT created_at FROM orders ORDER BY created_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let newest_order = newest.and_then(|s| s.parse::<DateTime<Utc>>().ok());

        // Get database file size
        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_orders,
            pending_orders,
            memorial_pages,
            qr_records,
            total_visits,
            newest_order,
            db_size_bytes,
        })
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Total number of orders.
    pub total_orders: i64,
    /// Orders waiting for payment.
    pub pending_orders: i64,
    /// Total number of memorial pages.
    pub memorial_pages: i64,
    /// Total number of stored QR codes.
    pub qr_records: i64,
    /// Visits across all memorial pages.
    pub total_visits: i64,
    /// Creation time of the newest order.
    pub newest_order: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

fn merge_text(current: Option<String>, edit: &Option<String>) -> Option<String> {
    match edit {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.clone()),
        None => current,
    }
}

fn order_number(id: Uuid, at: DateTime<Utc>) -> String {
    let suffix = id.simple().to_string()[..8].to_uppercase();
    format!("MP-{}-{suffix}", at.format("%Y%m%d"))
}

fn content_hash(svg: &str) -> String {
    blake3::hash(svg.as_bytes()).to_hex().to_string()
}

fn insert_order(conn: &Connection, order: &NewOrder, page_id: Option<Uuid>) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let timestamp = now.to_rfc3339();

    conn.execute(
        &format!("INSERT INTO orders ({ORDER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
        params![
            id.to_string(),
            order_number(id, now),
            order.status.as_str(),
            order.total_amount.to_string(),
            order.currency,
            order.payment_intent_id,
            timestamp,
            timestamp,
        ],
    )?;

    for plaque in &order.plaques {
        conn.execute(
            &format!(
                "INSERT INTO plaques ({PLAQUE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0, ?12)"
            ),
            params![
                Uuid::new_v4().to_string(),
                id.to_string(),
                plaque.memorial_page_id.or(page_id).map(|p| p.to_string()),
                plaque.material.as_str(),
                plaque.size.as_str(),
                plaque.shape.as_str(),
                plaque.qr_color.as_str(),
                plaque.text_color.as_str(),
                serde_json::to_string(&plaque.text_lines)?,
                plaque.font_choice,
                plaque.quantity,
                timestamp,
            ],
        )?;
    }

    debug!(order = %id, plaques = order.plaques.len(), "Inserted order");
    Ok(id)
}

fn insert_page(conn: &Connection, page: &NewMemorialPage) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let timestamp = Utc::now().to_rfc3339();

    conn.execute(
        &format!(
            "INSERT INTO memorial_pages ({PAGE_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)"
        ),
        params![
            id.to_string(),
            page.slug,
            page.full_name,
            page.nick_name,
            page.birth_month_year,
            page.death_month_year,
            page.few_words,
            page.about_text,
            page.privacy.as_str(),
            timestamp,
            timestamp,
        ],
    )
    .map_err(|err| match err {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            Error::SlugTaken(page.slug.clone())
        }
        other => other.into(),
    })?;

    debug!(page = %id, slug = %page.slug, "Inserted memorial page");
    Ok(id)
}

fn insert_qr(conn: &Connection, memorial_page_id: Uuid, qr: &MemorialQr) -> Result<Option<Uuid>> {
    let hash = content_hash(&qr.image.svg);
    let existing: i64 = conn.query_row(
        "SELECT COUNT(*) FROM qr_records WHERE content_hash = ?1",
        [&hash],
        |row| row.get(0),
    )?;
    if existing > 0 {
        debug!("Skipping duplicate QR record with hash {}", &hash[..16]);
        return Ok(None);
    }

    let id = Uuid::new_v4();
    conn.execute(
        &format!("INSERT INTO qr_records ({QR_RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            id.to_string(),
            memorial_page_id.to_string(),
            qr.url,
            qr.image.svg,
            qr.image.png,
            hash,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(Some(id))
}

fn load_order(conn: &Connection, id: Uuid) -> Result<Option<Order>> {
    let order = conn
        .query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            [id.to_string()],
            row_to_order,
        )
        .optional()?;
    let Some(mut order) = order else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAQUE_COLUMNS} FROM plaques WHERE order_id = ?1 ORDER BY created_at, rowid"
    ))?;
    order.plaques = stmt
        .query_map([id.to_string()], row_to_plaque)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(order))
}

fn load_page_by_id(conn: &Connection, id: Uuid) -> Result<Option<MemorialPage>> {
    load_page(
        conn,
        &format!("SELECT {PAGE_COLUMNS} FROM memorial_pages WHERE id = ?1"),
        &id.to_string(),
    )
}

fn load_page(conn: &Connection, sql: &str, key: &str) -> Result<Option<MemorialPage>> {
    let page = conn.query_row(sql, [key], row_to_page).optional()?;
    let Some(mut page) = page else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {QR_RECORD_COLUMNS} FROM qr_records WHERE memorial_page_id = ?1 \
         ORDER BY created_at, rowid"
    ))?;
    page.qr_records = stmt
        .query_map([page.id.to_string()], row_to_qr_record)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(page))
}

fn load_qr_record(conn: &Connection, id: Uuid) -> Result<Option<QrRecord>> {
    let record = conn
        .query_row(
            &format!("SELECT {QR_RECORD_COLUMNS} FROM qr_records WHERE id = ?1"),
            [id.to_string()],
            row_to_qr_record,
        )
        .optional()?;
    Ok(record)
}

/// Parse a TEXT column with `FromStr`.
fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_optional_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        text.parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn row_to_order(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: parse_column(row, 0)?,
        order_number: row.get(1)?,
        status: parse_column(row, 2)?,
        total_amount: parse_column(row, 3)?,
        currency: row.get(4)?,
        payment_intent_id: row.get(5)?,
        created_at: parse_column(row, 6)?,
        updated_at: parse_column(row, 7)?,
        plaques: Vec::new(),
    })
}

fn row_to_plaque(row: &Row<'_>) -> rusqlite::Result<Plaque> {
    let text_lines: String = row.get(8)?;
    let text_lines = serde_json::from_str(&text_lines)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Plaque {
        id: parse_column(row, 0)?,
        order_id: parse_column(row, 1)?,
        memorial_page_id: parse_optional_column(row, 2)?,
        material: parse_column(row, 3)?,
        size: parse_column(row, 4)?,
        shape: parse_column(row, 5)?,
        qr_color: parse_column(row, 6)?,
        text_color: parse_column(row, 7)?,
        text_lines,
        font_choice: row.get(9)?,
        quantity: row.get(10)?,
        approved: row.get(11)?,
        created_at: parse_column(row, 12)?,
    })
}

fn row_to_page(row: &Row<'_>) -> rusqlite::Result<MemorialPage> {
    let visits: i64 = row.get(9)?;
    Ok(MemorialPage {
        id: parse_column(row, 0)?,
        slug: row.get(1)?,
        full_name: row.get(2)?,
        nick_name: row.get(3)?,
        birth_month_year: row.get(4)?,
        death_month_year: row.get(5)?,
        few_words: row.get(6)?,
        about_text: row.get(7)?,
        privacy: parse_column(row, 8)?,
        visits_count: u64::try_from(visits).unwrap_or_default(),
        created_at: parse_column(row, 10)?,
        updated_at: parse_column(row, 11)?,
        qr_records: Vec::new(),
    })
}

fn row_to_qr_record(row: &Row<'_>) -> rusqlite::Result<QrRecord> {
    Ok(QrRecord {
        id: parse_column(row, 0)?,
        memorial_page_id: parse_column(row, 1)?,
        qr_value: row.get(2)?,
        svg: row.get(3)?,
        png: row.get(4)?,
        content_hash: row.get(5)?,
        created_at: parse_column(row, 6)?,
    })
}
