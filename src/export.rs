//! Export and bulk import of listings.
//!
//! Provides conversion of listings to various output formats:
//! - CSV - the admin bulk-import/export interchange format, keyed by code
//! - JSON - camelCase structured data for programmatic use
//! - Markdown - human-readable table
//!
//! CSV writing and parsing are hand-rolled (RFC-4180-style quoting); the
//! parser tolerates quoted fields containing commas, quotes, and newlines.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use itertools::Itertools;

use crate::model::{LegalStatus, Listing, ListingStatus, NewListing};

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// CSV interchange format (also the bulk-import format)
    #[default]
    Csv,
    /// JSON for programmatic consumption
    Json,
    /// Markdown table
    Markdown,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Json => "JSON",
            Self::Markdown => "Markdown",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::Csv, Self::Json, Self::Markdown]
    }
}

const CSV_HEADER: &str = "code,title,description,propertyType,status,address,city,province,\
     price,bedrooms,bathrooms,landArea,buildingArea,legalStatus,premium,featured,hot,sold,\
     createdAt";

/// Export listings to the specified format.
pub fn export_listings(listings: &[Listing], format: ExportFormat) -> String {
    match format {
        ExportFormat::Csv => export_csv(listings),
        ExportFormat::Json => export_json(listings),
        ExportFormat::Markdown => export_markdown(listings),
    }
}

fn export_csv(listings: &[Listing]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for l in listings {
        let fields = [
            csv_field(&l.code),
            csv_field(&l.title),
            csv_field(l.description.as_deref().unwrap_or("")),
            csv_field(l.property_type.as_deref().unwrap_or("")),
            csv_field(l.status.as_db_str()),
            csv_field(l.address.as_deref().unwrap_or("")),
            csv_field(l.city.as_deref().unwrap_or("")),
            csv_field(l.province.as_deref().unwrap_or("")),
            opt_num(l.price),
            opt_num(l.bedrooms),
            opt_num(l.bathrooms),
            opt_num(l.land_area),
            opt_num(l.building_area),
            csv_field(l.legal_status.map(LegalStatus::as_db_str).unwrap_or("")),
            bool_field(l.premium),
            bool_field(l.featured),
            bool_field(l.hot),
            bool_field(l.sold),
            l.created_at.to_string(),
        ];
        out.push_str(&fields.iter().join(","));
        out.push('\n');
    }
    out
}

fn export_json(listings: &[Listing]) -> String {
    let doc = serde_json::json!({
        "count": listings.len(),
        "listings": listings,
    });
    serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
}

fn export_markdown(listings: &[Listing]) -> String {
    let mut out = String::from("# Property Listings\n\n");
    out.push_str(&format!(
        "Generated: {} | {} listing(s)\n\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        listings.len()
    ));
    out.push_str("| Code | Title | Status | City | Price | Listed |\n");
    out.push_str("|------|-------|--------|------|-------|--------|\n");
    for l in listings {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape_markdown(&l.code),
            escape_markdown(&l.title),
            l.status.as_db_str(),
            escape_markdown(l.city.as_deref().unwrap_or("-")),
            l.price.map_or_else(|| "-".to_string(), format_price),
            format_timestamp(l.created_at),
        ));
    }
    out
}

/// Parse the CSV interchange format into importable listings.
///
/// The header row is required; column order is free and unknown columns are
/// ignored. `code`, `title`, and `status` are mandatory per row. Flag and
/// timestamp columns are ignored on import (flags are flipped through the
/// store, timestamps are owned by it).
pub fn parse_csv(text: &str) -> Result<Vec<NewListing>> {
    let mut records = parse_csv_records(text).into_iter();
    let header = records.next().context("CSV input is empty")?;
    let index = |name: &str| -> Option<usize> {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    let code_idx = index("code").context("CSV header is missing the `code` column")?;
    let title_idx = index("title").context("CSV header is missing the `title` column")?;
    let status_idx = index("status").context("CSV header is missing the `status` column")?;

    let field = |rec: &[String], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| rec.get(i))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let mut out = Vec::new();
    for (line_no, rec) in records.enumerate() {
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let row = line_no + 2; // 1-based, after the header

        let code = field(&rec, Some(code_idx))
            .with_context(|| format!("row {row}: missing listing code"))?;
        let title = field(&rec, Some(title_idx))
            .with_context(|| format!("row {row}: missing title"))?;
        let status_raw = field(&rec, Some(status_idx))
            .with_context(|| format!("row {row}: missing status"))?;
        let status = ListingStatus::parse(&status_raw)
            .with_context(|| format!("row {row}: unknown status `{status_raw}`"))?;

        let num = |name: &str| -> Result<Option<i64>> {
            match field(&rec, index(name)) {
                Some(raw) => raw
                    .parse::<i64>()
                    .map(Some)
                    .with_context(|| format!("row {row}: invalid number in `{name}`: {raw}")),
                None => Ok(None),
            }
        };

        let legal_status = match field(&rec, index("legalStatus").or_else(|| index("legal_status")))
        {
            Some(raw) => Some(
                LegalStatus::from_db(&raw)
                    .with_context(|| format!("row {row}: unknown legal status `{raw}`"))?,
            ),
            None => None,
        };

        out.push(NewListing {
            code,
            title,
            description: field(&rec, index("description")),
            property_type: field(&rec, index("propertyType").or_else(|| index("property_type"))),
            status,
            address: field(&rec, index("address")),
            city: field(&rec, index("city")),
            province: field(&rec, index("province")),
            price: num("price")?,
            bedrooms: num("bedrooms")?,
            bathrooms: num("bathrooms")?,
            land_area: num("landArea")?.or(num("land_area")?),
            building_area: num("buildingArea")?.or(num("building_area")?),
            legal_status,
        });
    }

    Ok(out)
}

/// Split CSV text into records of fields, honoring double-quote quoting.
fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => {
                record.push(std::mem::take(&mut field));
            }
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if !(record.len() == 1 && record[0].is_empty()) {
                    records.push(std::mem::take(&mut record));
                } else {
                    record.clear();
                }
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt_num(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn bool_field(value: bool) -> String {
    if value { "1".into() } else { "0".into() }
}

fn escape_markdown(text: &str) -> String {
    text.replace('\\', "\\\\").replace('|', "\\|")
}

/// Indonesian-style grouped price, e.g. `Rp 1.250.000.000`.
pub fn format_price(price: i64) -> String {
    let digits = price.abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .join(".");
    if price < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| millis.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_listing() -> Listing {
        Listing {
            id: 1,
            code: "KAL001".into(),
            title: "Rumah di Jl. Kaliurang".into(),
            description: Some("Rumah nyaman, dekat kampus".into()),
            property_type: Some("rumah".into()),
            status: ListingStatus::ForSale,
            address: Some("Jl. Kaliurang KM 7".into()),
            city: Some("Sleman".into()),
            province: Some("DI Yogyakarta".into()),
            price: Some(1_250_000_000),
            bedrooms: Some(3),
            bathrooms: Some(2),
            land_area: Some(150),
            building_area: Some(90),
            legal_status: Some(LegalStatus::Shm),
            premium: false,
            featured: true,
            hot: false,
            sold: false,
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Markdown.extension(), "md");
        assert_eq!(ExportFormat::all().len(), 3);
    }

    #[test]
    fn test_csv_quotes_commas() {
        let out = export_csv(&[sample_listing()]);
        assert!(out.starts_with("code,title"));
        assert!(out.contains("\"Rumah nyaman, dekat kampus\""));
        assert!(out.contains("KAL001"));
    }

    #[test]
    fn test_csv_round_trip() {
        let listing = sample_listing();
        let out = export_csv(std::slice::from_ref(&listing));
        let parsed = parse_csv(&out).unwrap();
        assert_eq!(parsed.len(), 1);
        let p = &parsed[0];
        assert_eq!(p.code, "KAL001");
        assert_eq!(p.title, listing.title);
        assert_eq!(p.description, listing.description);
        assert_eq!(p.status, ListingStatus::ForSale);
        assert_eq!(p.price, Some(1_250_000_000));
        assert_eq!(p.legal_status, Some(LegalStatus::Shm));
    }

    #[test]
    fn test_parse_csv_quoted_newline_and_quote() {
        let text = "code,title,status,description\n\
                    A1,\"Rumah \"\"mewah\"\"\",dijual,\"baris satu\nbaris dua\"\n";
        let parsed = parse_csv(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "Rumah \"mewah\"");
        assert_eq!(parsed[0].description.as_deref(), Some("baris satu\nbaris dua"));
    }

    #[test]
    fn test_parse_csv_requires_code() {
        let err = parse_csv("title,status\nRumah,dijual\n").unwrap_err();
        assert!(err.to_string().contains("code"));
    }

    #[test]
    fn test_parse_csv_rejects_unknown_status() {
        let err = parse_csv("code,title,status\nA1,Rumah,tersedia\n").unwrap_err();
        assert!(err.to_string().contains("unknown status"));
    }

    #[test]
    fn test_parse_csv_skips_blank_rows() {
        let parsed = parse_csv("code,title,status\nA1,Rumah,dijual\n\n").unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_export_json_shape() {
        let out = export_json(&[sample_listing()]);
        assert!(out.contains("\"count\": 1"));
        // camelCase field names in the JSON shape
        assert!(out.contains("\"propertyType\": \"rumah\""));
        assert!(out.contains("\"legalStatus\": \"SHM\""));
        assert!(out.contains("\"status\": \"for-sale\""));
    }

    #[test]
    fn test_export_markdown_escapes_pipes() {
        let mut listing = sample_listing();
        listing.title = "Rumah | Ruko".into();
        let out = export_markdown(&[listing]);
        assert!(out.contains("Rumah \\| Ruko"));
        assert!(out.contains("| KAL001 |"));
        assert!(out.contains("Rp 1.250.000.000"));
    }

    #[test]
    fn test_format_price_grouping() {
        assert_eq!(format_price(950), "Rp 950");
        assert_eq!(format_price(1_500_000), "Rp 1.500.000");
        assert_eq!(format_price(1_250_000_000), "Rp 1.250.000.000");
    }
}
