//! SQLite backend: schema, pragmas, migrations, and listing CRUD.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::model::{
    Inquiry, LegalStatus, Listing, ListingFlag, ListingStatus, NewInquiry, NewListing,
};
use crate::search::builder::ListingQuery;
use crate::storage::{ListingBackend, QueryPage};

const SCHEMA_VERSION: i64 = 1;

const MIGRATION_V1: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS listings (
    id INTEGER PRIMARY KEY,
    kode_properti TEXT NOT NULL UNIQUE,
    judul_properti TEXT NOT NULL,
    deskripsi TEXT,
    tipe_properti TEXT,
    status TEXT NOT NULL,
    alamat_lengkap TEXT,
    kabupaten_kota TEXT,
    provinsi TEXT,
    harga INTEGER,
    kamar_tidur INTEGER,
    kamar_mandi INTEGER,
    luas_tanah INTEGER,
    luas_bangunan INTEGER,
    status_legalitas TEXT,
    is_premium INTEGER NOT NULL DEFAULT 0,
    is_featured INTEGER NOT NULL DEFAULT 0,
    is_hot INTEGER NOT NULL DEFAULT 0,
    is_sold INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS inquiries (
    id INTEGER PRIMARY KEY,
    listing_id INTEGER NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    phone TEXT,
    message TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_listings_created
    ON listings(created_at DESC);

CREATE INDEX IF NOT EXISTS idx_listings_status
    ON listings(status, is_sold);

CREATE INDEX IF NOT EXISTS idx_inquiries_listing
    ON inquiries(listing_id);
"#;

const LISTING_COLUMNS: &str = "id, kode_properti, judul_properti, deskripsi, tipe_properti, \
     status, alamat_lengkap, kabupaten_kota, provinsi, harga, kamar_tidur, kamar_mandi, \
     luas_tanah, luas_bangunan, status_legalitas, is_premium, is_featured, is_hot, is_sold, \
     created_at, updated_at";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating db directory {}", parent.display()))?;
        }

        let mut conn = Connection::open(path)
            .with_context(|| format!("opening sqlite db at {}", path.display()))?;

        apply_pragmas(&mut conn)?;
        init_meta(&mut conn)?;
        migrate(&mut conn)?;

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        apply_pragmas(&mut conn)?;
        init_meta(&mut conn)?;
        migrate(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn raw(&self) -> &Connection {
        &self.conn
    }

    /// Insert a new listing; fails when the code is already taken.
    pub fn insert_listing(&self, listing: &NewListing) -> Result<i64> {
        if listing.code.trim().is_empty() {
            bail!("listing code must not be empty");
        }
        let now = now_millis();
        self.conn
            .execute(
                "INSERT INTO listings(
                    kode_properti, judul_properti, deskripsi, tipe_properti, status,
                    alamat_lengkap, kabupaten_kota, provinsi, harga, kamar_tidur,
                    kamar_mandi, luas_tanah, luas_bangunan, status_legalitas,
                    created_at, updated_at
                ) VALUES(?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
                params_from_iter(listing_params(listing, now)),
            )
            .with_context(|| format!("inserting listing {}", listing.code))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert-or-update keyed on the listing code. Flag columns and the
    /// creation timestamp are preserved on update.
    pub fn upsert_listing(&self, listing: &NewListing) -> Result<i64> {
        if listing.code.trim().is_empty() {
            bail!("listing code must not be empty");
        }
        let now = now_millis();
        self.conn.execute(
            "INSERT INTO listings(
                kode_properti, judul_properti, deskripsi, tipe_properti, status,
                alamat_lengkap, kabupaten_kota, provinsi, harga, kamar_tidur,
                kamar_mandi, luas_tanah, luas_bangunan, status_legalitas,
                created_at, updated_at
            ) VALUES(?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(kode_properti) DO UPDATE SET
                judul_properti=excluded.judul_properti,
                deskripsi=excluded.deskripsi,
                tipe_properti=excluded.tipe_properti,
                status=excluded.status,
                alamat_lengkap=excluded.alamat_lengkap,
                kabupaten_kota=excluded.kabupaten_kota,
                provinsi=excluded.provinsi,
                harga=excluded.harga,
                kamar_tidur=excluded.kamar_tidur,
                kamar_mandi=excluded.kamar_mandi,
                luas_tanah=excluded.luas_tanah,
                luas_bangunan=excluded.luas_bangunan,
                status_legalitas=excluded.status_legalitas,
                updated_at=excluded.updated_at",
            params_from_iter(listing_params(listing, now)),
        )?;

        self.conn
            .query_row(
                "SELECT id FROM listings WHERE kode_properti = ?",
                params![&listing.code],
                |row| row.get(0),
            )
            .with_context(|| format!("fetching listing id for {}", listing.code))
    }

    /// Bulk import (CSV path): one transaction, upsert per row.
    pub fn import_listings(&mut self, items: &[NewListing]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let now = now_millis();
        for listing in items {
            if listing.code.trim().is_empty() {
                bail!("listing code must not be empty");
            }
            tx.execute(
                "INSERT INTO listings(
                    kode_properti, judul_properti, deskripsi, tipe_properti, status,
                    alamat_lengkap, kabupaten_kota, provinsi, harga, kamar_tidur,
                    kamar_mandi, luas_tanah, luas_bangunan, status_legalitas,
                    created_at, updated_at
                ) VALUES(?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
                ON CONFLICT(kode_properti) DO UPDATE SET
                    judul_properti=excluded.judul_properti,
                    deskripsi=excluded.deskripsi,
                    tipe_properti=excluded.tipe_properti,
                    status=excluded.status,
                    alamat_lengkap=excluded.alamat_lengkap,
                    kabupaten_kota=excluded.kabupaten_kota,
                    provinsi=excluded.provinsi,
                    harga=excluded.harga,
                    kamar_tidur=excluded.kamar_tidur,
                    kamar_mandi=excluded.kamar_mandi,
                    luas_tanah=excluded.luas_tanah,
                    luas_bangunan=excluded.luas_bangunan,
                    status_legalitas=excluded.status_legalitas,
                    updated_at=excluded.updated_at",
                params_from_iter(listing_params(listing, now)),
            )
            .with_context(|| format!("importing listing {}", listing.code))?;
        }
        tx.commit()?;
        tracing::info!(count = items.len(), "imported listings");
        Ok(items.len())
    }

    pub fn get_by_code(&self, code: &str) -> Result<Option<Listing>> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings WHERE kode_properti = ?");
        Ok(self
            .conn
            .query_row(&sql, params![code], listing_from_row)
            .optional()?)
    }

    /// Flip one soft-state flag. Returns false when the code is unknown.
    pub fn set_flag(&self, code: &str, flag: ListingFlag, value: bool) -> Result<bool> {
        let sql = format!(
            "UPDATE listings SET {} = ?, updated_at = ? WHERE kode_properti = ?",
            flag.column()
        );
        let changed = self
            .conn
            .execute(&sql, params![value as i64, now_millis(), code])?;
        Ok(changed > 0)
    }

    /// Hard delete; cascades to the listing's inquiries.
    pub fn delete_listing(&self, code: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM listings WHERE kode_properti = ?", params![code])?;
        if changed > 0 {
            tracing::info!(code, "deleted listing");
        }
        Ok(changed > 0)
    }

    pub fn insert_inquiry(&self, code: &str, inquiry: &NewInquiry) -> Result<i64> {
        let listing_id: i64 = self
            .conn
            .query_row(
                "SELECT id FROM listings WHERE kode_properti = ?",
                params![code],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| anyhow!("no listing with code {code}"))?;

        self.conn.execute(
            "INSERT INTO inquiries(listing_id, name, phone, message, created_at)
             VALUES(?,?,?,?,?)",
            params![
                listing_id,
                inquiry.name,
                inquiry.phone,
                inquiry.message,
                now_millis()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn inquiries_for(&self, code: &str) -> Result<Vec<Inquiry>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.listing_id, i.name, i.phone, i.message, i.created_at
             FROM inquiries i
             JOIN listings l ON l.id = i.listing_id
             WHERE l.kode_properti = ?
             ORDER BY i.created_at DESC, i.id DESC",
        )?;
        let rows = stmt.query_map(params![code], |row| {
            Ok(Inquiry {
                id: row.get(0)?,
                listing_id: row.get(1)?,
                name: row.get(2)?,
                phone: row.get(3)?,
                message: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count_inquiries(&self, code: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM inquiries i
             JOIN listings l ON l.id = i.listing_id
             WHERE l.kode_properti = ?",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn total_inquiries(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM inquiries", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Full inventory, newest first. Used by export.
    pub fn all_listings(&self) -> Result<Vec<Listing>> {
        let sql =
            format!("SELECT {LISTING_COLUMNS} FROM listings ORDER BY created_at DESC, id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], listing_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

impl ListingBackend for SqliteStore {
    fn query(&self, query: &ListingQuery) -> Result<QueryPage> {
        let (where_sql, where_params) = render_where(query);

        let total = if query.with_count {
            let sql = format!("SELECT COUNT(*) FROM listings{where_sql}");
            let count: i64 = self.conn.query_row(
                &sql,
                params_from_iter(where_params.iter()),
                |row| row.get(0),
            )?;
            Some(count as u64)
        } else {
            None
        };

        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM listings{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut page_params = where_params;
        page_params.push(Value::from(query.page_size as i64));
        page_params.push(Value::from(query.offset as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(page_params.iter()), listing_from_row)?;
        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }

        Ok(QueryPage { listings, total })
    }
}

/// Render the disjunction and structured filters to a parameterized WHERE
/// clause. This is the only place the predicate AST meets SQL.
fn render_where(query: &ListingQuery) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut params: Vec<Value> = Vec::new();

    if let Some(text) = &query.text
        && !text.is_empty()
    {
        let likes: Vec<String> = text
            .iter()
            .map(|m| {
                params.push(Value::from(m.pattern()));
                format!("lower({}) LIKE ?", m.column.db_name())
            })
            .collect();
        clauses.push(format!("({})", likes.join(" OR ")));
    }

    let f = &query.filters;
    if let Some(status) = f.status {
        clauses.push("status = ?".into());
        params.push(Value::from(status.as_db_str().to_string()));
    }
    if let Some(tipe) = &f.property_type {
        clauses.push("lower(tipe_properti) = lower(?)".into());
        params.push(Value::from(tipe.clone()));
    }
    if let Some(min) = f.min_price {
        clauses.push("harga >= ?".into());
        params.push(Value::from(min));
    }
    if let Some(max) = f.max_price {
        clauses.push("harga <= ?".into());
        params.push(Value::from(max));
    }
    if let Some(min) = f.min_bedrooms {
        clauses.push("kamar_tidur >= ?".into());
        params.push(Value::from(min));
    }
    if let Some(min) = f.min_land_area {
        clauses.push("luas_tanah >= ?".into());
        params.push(Value::from(min));
    }
    if let Some(max) = f.max_land_area {
        clauses.push("luas_tanah <= ?".into());
        params.push(Value::from(max));
    }
    if let Some(min) = f.min_building_area {
        clauses.push("luas_bangunan >= ?".into());
        params.push(Value::from(min));
    }
    if let Some(max) = f.max_building_area {
        clauses.push("luas_bangunan <= ?".into());
        params.push(Value::from(max));
    }
    if let Some(legal) = f.legal_status {
        clauses.push("status_legalitas = ?".into());
        params.push(Value::from(legal.as_db_str().to_string()));
    }
    if let Some(province) = &f.province {
        clauses.push("lower(provinsi) = lower(?)".into());
        params.push(Value::from(province.clone()));
    }
    if let Some(city) = &f.city {
        clauses.push("lower(kabupaten_kota) = lower(?)".into());
        params.push(Value::from(city.clone()));
    }
    if !f.include_sold {
        clauses.push("is_sold = 0".into());
    }

    if clauses.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), params)
    }
}

fn listing_params(listing: &NewListing, now: i64) -> Vec<Value> {
    vec![
        Value::from(listing.code.clone()),
        Value::from(listing.title.clone()),
        Value::from(listing.description.clone()),
        Value::from(listing.property_type.clone()),
        Value::from(listing.status.as_db_str().to_string()),
        Value::from(listing.address.clone()),
        Value::from(listing.city.clone()),
        Value::from(listing.province.clone()),
        Value::from(listing.price),
        Value::from(listing.bedrooms),
        Value::from(listing.bathrooms),
        Value::from(listing.land_area),
        Value::from(listing.building_area),
        Value::from(listing.legal_status.map(|l| l.as_db_str().to_string())),
        Value::from(now),
        Value::from(now),
    ]
}

/// Map a snake_case row (the column order of [`LISTING_COLUMNS`]) into the
/// camelCase-serializing domain shape.
fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<Listing> {
    let status_raw: String = row.get(5)?;
    let status = ListingStatus::from_db(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown listing status {status_raw}").into(),
        )
    })?;

    let legal_raw: Option<String> = row.get(14)?;
    let legal_status = match legal_raw {
        Some(raw) => Some(LegalStatus::from_db(&raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                14,
                rusqlite::types::Type::Text,
                format!("unknown legal status {raw}").into(),
            )
        })?),
        None => None,
    };

    Ok(Listing {
        id: row.get(0)?,
        code: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        property_type: row.get(4)?,
        status,
        address: row.get(6)?,
        city: row.get(7)?,
        province: row.get(8)?,
        price: row.get(9)?,
        bedrooms: row.get(10)?,
        bathrooms: row.get(11)?,
        land_area: row.get(12)?,
        building_area: row.get(13)?,
        legal_status,
        premium: row.get::<_, i64>(15)? != 0,
        featured: row.get::<_, i64>(16)? != 0,
        hot: row.get::<_, i64>(17)? != 0,
        sold: row.get::<_, i64>(18)? != 0,
        created_at: row.get(19)?,
        updated_at: row.get(20)?,
    })
}

fn apply_pragmas(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        PRAGMA foreign_keys = ON;
        "#,
    )?;
    Ok(())
}

fn init_meta(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS meta (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
        [],
    )?;

    let existing: Option<i64> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?;

    if existing.is_none() {
        conn.execute(
            "INSERT INTO meta(key, value) VALUES('schema_version', ?)",
            params![SCHEMA_VERSION.to_string()],
        )?;
    }

    Ok(())
}

fn migrate(conn: &mut Connection) -> Result<()> {
    let current: i64 = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0).map(|s| s.parse().unwrap_or(0)),
        )
        .optional()?
        .unwrap_or(0);

    match current {
        0 => {
            conn.execute_batch(MIGRATION_V1)?;
            conn.execute(
                "UPDATE meta SET value = ? WHERE key = 'schema_version'",
                params![SCHEMA_VERSION.to_string()],
            )?;
        }
        v if v == SCHEMA_VERSION => {
            // Tables may not exist yet when meta was just seeded.
            conn.execute_batch(MIGRATION_V1)?;
        }
        v => return Err(anyhow!("unsupported schema version {}", v)),
    }

    Ok(())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
