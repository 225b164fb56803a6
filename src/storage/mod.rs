//! Storage backends for listing queries.

pub mod sqlite;

use anyhow::Result;

use crate::model::Listing;
use crate::search::builder::ListingQuery;

/// Rows for one page plus the optional total count.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub listings: Vec<Listing>,
    pub total: Option<u64>,
}

/// A query interface the search service runs against.
///
/// Implementations render the query's [`crate::search::Disjunction`] and
/// structured filters into their native syntax, order by creation timestamp
/// descending, and return the requested row range. An empty page is a valid
/// result; failures must be returned as errors, never as empty pages.
pub trait ListingBackend {
    fn query(&self, query: &ListingQuery) -> Result<QueryPage>;
}

impl<B: ListingBackend + ?Sized> ListingBackend for &B {
    fn query(&self, query: &ListingQuery) -> Result<QueryPage> {
        (**self).query(query)
    }
}
