//! Search layer facade.
//!
//! The free-text listing search is split into three small pieces:
//!
//! - **[`keyword`]**: keyword normalization and whitespace tokenization.
//! - **[`predicate`]**: the backend-agnostic predicate values: per-column
//!   substring matches collected into a [`predicate::Disjunction`]. Rendering
//!   to concrete query syntax happens at the storage boundary, not here.
//! - **[`builder`]**: turns a keyword plus structured filters into a
//!   [`builder::ListingQuery`] and runs it through an injected
//!   [`crate::storage::ListingBackend`].

pub mod builder;
pub mod keyword;
pub mod predicate;

pub use builder::{ListingQuery, SearchColumns, SearchPage, SearchRequest, SearchService};
pub use predicate::{Disjunction, ListingColumn, SubstringMatch};
