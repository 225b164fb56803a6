//! Keyword-to-query construction and the search service.

use anyhow::Result;
use serde::Serialize;

use crate::model::{Listing, ListingFilters};
use crate::search::keyword;
use crate::search::predicate::{Disjunction, ListingColumn, SubstringMatch};
use crate::storage::ListingBackend;

/// Which columns the keyword is matched against, and the per-word expansion
/// threshold. The three storefront call sites used to each carry their own
/// copy of these lists; they are explicit configuration now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchColumns {
    /// Columns the full trimmed phrase is matched against.
    pub phrase: Vec<ListingColumn>,
    /// Columns each individual word is matched against when the keyword has
    /// more than one word. Deliberately narrower than `phrase` by default:
    /// word expansion over address/type/status columns produced noisy
    /// matches.
    pub word: Vec<ListingColumn>,
    /// Minimum word length (in chars) for per-word expansion.
    pub min_word_len: usize,
}

impl Default for SearchColumns {
    fn default() -> Self {
        Self {
            phrase: ListingColumn::ALL.to_vec(),
            word: vec![
                ListingColumn::Code,
                ListingColumn::Title,
                ListingColumn::Description,
                ListingColumn::City,
                ListingColumn::Province,
            ],
            min_word_len: 3,
        }
    }
}

/// Build the OR-disjunction for a raw keyword, or `None` when the keyword is
/// empty after trimming (structured filters alone then decide the result).
///
/// The full phrase is always matched against every phrase column. When the
/// phrase has more than one word, each word of at least `min_word_len` chars
/// is additionally matched against the word columns, so out-of-order queries
/// like "kaliurang rumah" still hit "Rumah di Jl. Kaliurang". Single-word
/// keywords never duplicate predicates.
pub fn keyword_disjunction(raw: &str, columns: &SearchColumns) -> Option<Disjunction> {
    let phrase = keyword::normalize(raw)?;
    let mut out = Disjunction::default();

    for col in &columns.phrase {
        out.push(SubstringMatch::new(*col, phrase.clone()));
    }

    let words = keyword::tokenize(&phrase);
    if words.len() > 1 {
        for word in words
            .iter()
            .filter(|w| keyword::expandable(w, columns.min_word_len))
        {
            for col in &columns.word {
                out.push(SubstringMatch::new(*col, *word));
            }
        }
    }

    Some(out)
}

/// What a caller asks for: free text plus structured filters plus a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    pub keyword: String,
    pub filters: ListingFilters,
    /// Zero-based row offset of the page start.
    pub offset: u32,
    pub page_size: u32,
    /// Also fetch the total match count (extra query on most backends).
    pub with_count: bool,
}

/// The assembled query handed to a [`ListingBackend`].
///
/// Backends must order by creation timestamp descending and return the rows
/// in `[offset, offset + page_size - 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub text: Option<Disjunction>,
    pub filters: ListingFilters,
    pub offset: u32,
    pub page_size: u32,
    pub with_count: bool,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub listings: Vec<Listing>,
    /// Offset of the following page; `None` when this page was not full.
    pub next_cursor: Option<u32>,
    pub total: Option<u64>,
}

/// Executes listing searches against an injected backend.
///
/// The backend is an explicit parameter rather than an ambient client so the
/// service can be driven by a fake in tests. Backend errors surface to the
/// caller unmodified; an error is never collapsed into an empty page.
pub struct SearchService<B> {
    backend: B,
    columns: SearchColumns,
}

impl<B: ListingBackend> SearchService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_columns(backend, SearchColumns::default())
    }

    pub fn with_columns(backend: B, columns: SearchColumns) -> Self {
        Self { backend, columns }
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let text = keyword_disjunction(&request.keyword, &self.columns);
        tracing::debug!(
            keyword = %request.keyword.trim(),
            predicates = text.as_ref().map_or(0, Disjunction::len),
            offset = request.offset,
            page_size = request.page_size,
            "listing search"
        );

        let query = ListingQuery {
            text,
            filters: request.filters.clone(),
            offset: request.offset,
            page_size: request.page_size,
            with_count: request.with_count,
        };
        let page = self.backend.query(&query)?;

        // A full page means more results are likely; no separate count probe.
        let next_cursor = (request.page_size > 0
            && page.listings.len() as u32 == request.page_size)
            .then(|| request.offset + request.page_size);

        Ok(SearchPage {
            listings: page.listings,
            next_cursor,
            total: page.total,
        })
    }
}
