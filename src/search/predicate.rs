//! Backend-agnostic match predicates.
//!
//! The original storefront assembled its OR-filter as a comma-joined string
//! of `column.ilike.%term%` triples. Here the same information is carried as
//! plain values; the storage backend renders them into its own query syntax.

use serde::{Deserialize, Serialize};

/// Text columns of the listing table that full-text search may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingColumn {
    Code,
    Title,
    Description,
    PropertyType,
    Status,
    Address,
    City,
    Province,
}

impl ListingColumn {
    pub const ALL: [ListingColumn; 8] = [
        Self::Code,
        Self::Title,
        Self::Description,
        Self::PropertyType,
        Self::Status,
        Self::Address,
        Self::City,
        Self::Province,
    ];

    /// The snake_case column name in the listing database.
    pub fn db_name(self) -> &'static str {
        match self {
            Self::Code => "kode_properti",
            Self::Title => "judul_properti",
            Self::Description => "deskripsi",
            Self::PropertyType => "tipe_properti",
            Self::Status => "status",
            Self::Address => "alamat_lengkap",
            Self::City => "kabupaten_kota",
            Self::Province => "provinsi",
        }
    }

    /// Logical name used in configuration files.
    pub fn logical_name(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Title => "title",
            Self::Description => "description",
            Self::PropertyType => "property_type",
            Self::Status => "status",
            Self::Address => "address",
            Self::City => "city",
            Self::Province => "province",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.logical_name() == name.trim().to_lowercase())
    }
}

/// A case-insensitive "column contains term" predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringMatch {
    pub column: ListingColumn,
    pub term: String,
}

impl SubstringMatch {
    pub fn new(column: ListingColumn, term: impl Into<String>) -> Self {
        Self {
            column,
            term: term.into(),
        }
    }

    /// The wildcard-wrapped LIKE pattern for this match.
    ///
    /// `%`/`_` inside the term are passed through verbatim (documented
    /// policy: user-supplied wildcards are allowed, see `search::keyword`).
    pub fn pattern(&self) -> String {
        format!("%{}%", self.term)
    }
}

/// An OR-combination of substring matches. ANY of them matching admits the
/// row; the whole disjunction is ANDed against structured filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Disjunction {
    conditions: Vec<SubstringMatch>,
}

impl Disjunction {
    pub fn push(&mut self, condition: SubstringMatch) {
        self.conditions.push(condition);
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubstringMatch> {
        self.conditions.iter()
    }
}

impl FromIterator<SubstringMatch> for Disjunction {
    fn from_iter<I: IntoIterator<Item = SubstringMatch>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}
