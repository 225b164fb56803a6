//! Domain types for property listings and inquiries.
//!
//! The storage layer speaks the snake_case column names of the listing
//! database; everything above it works with these types, which serialize to
//! camelCase JSON for export and CLI `--json` output.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sale-or-rent status of a listing.
///
/// Stored in the database as the Indonesian strings `dijual` / `disewa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ListingStatus {
    ForSale,
    ForRent,
}

impl ListingStatus {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::ForSale => "dijual",
            Self::ForRent => "disewa",
        }
    }

    pub fn from_db(raw: &str) -> Option<Self> {
        match raw {
            "dijual" => Some(Self::ForSale),
            "disewa" => Some(Self::ForRent),
            _ => None,
        }
    }

    /// Lenient parse for CSV import: accepts both the database strings and
    /// the English aliases.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "dijual" | "for-sale" | "forsale" | "sale" => Some(Self::ForSale),
            "disewa" | "for-rent" | "forrent" | "rent" => Some(Self::ForRent),
            _ => None,
        }
    }
}

/// Land-certificate legal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegalStatus {
    /// Sertifikat Hak Milik.
    Shm,
    /// Hak Guna Bangunan.
    Hgb,
    /// SHM Sarusun (strata title).
    Strata,
    Girik,
    /// Akta Jual Beli only.
    Ajb,
}

impl LegalStatus {
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::Shm => "SHM",
            Self::Hgb => "HGB",
            Self::Strata => "SHMSRS",
            Self::Girik => "GIRIK",
            Self::Ajb => "AJB",
        }
    }

    pub fn from_db(raw: &str) -> Option<Self> {
        match raw.to_uppercase().as_str() {
            "SHM" => Some(Self::Shm),
            "HGB" | "SHGB" => Some(Self::Hgb),
            "SHMSRS" => Some(Self::Strata),
            "GIRIK" => Some(Self::Girik),
            "AJB" => Some(Self::Ajb),
            _ => None,
        }
    }
}

/// Boolean soft-state flags a listing can carry.
///
/// Flag flips are plain column updates, never deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListingFlag {
    Premium,
    Featured,
    Hot,
    Sold,
}

impl ListingFlag {
    pub fn column(self) -> &'static str {
        match self {
            Self::Premium => "is_premium",
            Self::Featured => "is_featured",
            Self::Hot => "is_hot",
            Self::Sold => "is_sold",
        }
    }
}

/// A property listing as returned from storage.
///
/// `code` is the stable, unique, human-facing identifier (e.g. `KAL001`);
/// it is the only field guaranteed present on every record and is the key
/// used in share links and CSV exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: i64,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub property_type: Option<String>,
    pub status: ListingStatus,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub price: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub land_area: Option<i64>,
    pub building_area: Option<i64>,
    pub legal_status: Option<LegalStatus>,
    pub premium: bool,
    pub featured: bool,
    pub hot: bool,
    pub sold: bool,
    /// Unix milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input shape for creating or upserting a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    pub status: ListingStatus,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub bedrooms: Option<i64>,
    #[serde(default)]
    pub bathrooms: Option<i64>,
    #[serde(default)]
    pub land_area: Option<i64>,
    #[serde(default)]
    pub building_area: Option<i64>,
    #[serde(default)]
    pub legal_status: Option<LegalStatus>,
}

impl NewListing {
    pub fn new(code: impl Into<String>, title: impl Into<String>, status: ListingStatus) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            description: None,
            property_type: None,
            status,
            address: None,
            city: None,
            province: None,
            price: None,
            bedrooms: None,
            bathrooms: None,
            land_area: None,
            building_area: None,
            legal_status: None,
        }
    }
}

/// Structured (non-full-text) filters, combined with AND against the
/// keyword disjunction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingFilters {
    pub status: Option<ListingStatus>,
    pub property_type: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i64>,
    pub min_land_area: Option<i64>,
    pub max_land_area: Option<i64>,
    pub min_building_area: Option<i64>,
    pub max_building_area: Option<i64>,
    pub legal_status: Option<LegalStatus>,
    pub province: Option<String>,
    pub city: Option<String>,
    /// Sold listings are excluded from results unless this is set.
    #[serde(default)]
    pub include_sold: bool,
}

/// A buyer inquiry (lead) attached to a listing.
///
/// Deleting the listing hard-deletes its inquiries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: i64,
    pub listing_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInquiry {
    pub name: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}
