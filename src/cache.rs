//! Read-through cache for search pages.
//!
//! Sits outside the query builder contract: the builder itself never
//! retries or substitutes results. This wrapper only memoizes successful
//! pages and, when a refresh fails, may serve a stale page it already has.
//! Errors are never cached, and a miss plus a failed load propagates the
//! error untouched.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use anyhow::Result;
use lru::LruCache;

use crate::search::builder::{SearchPage, SearchRequest};

struct CachedPage {
    page: SearchPage,
    fetched_at: Instant,
}

pub struct SearchCache {
    entries: LruCache<String, CachedPage>,
    ttl: Duration,
}

impl SearchCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    /// Cache key for a request: the full request shape, so differing
    /// filters or pages never collide.
    pub fn key(request: &SearchRequest) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            request.keyword.trim().to_lowercase(),
            serde_json::to_string(&request.filters).unwrap_or_default(),
            request.offset,
            request.page_size,
            request.with_count,
        )
    }

    /// Return a fresh cached page, or run `load` and cache its result.
    /// On load failure a stale entry is served when present.
    pub fn fetch<F>(&mut self, key: &str, load: F) -> Result<SearchPage>
    where
        F: FnOnce() -> Result<SearchPage>,
    {
        if let Some(hit) = self.entries.get(key)
            && hit.fetched_at.elapsed() < self.ttl
        {
            tracing::debug!(key, "search cache hit");
            return Ok(hit.page.clone());
        }

        match load() {
            Ok(page) => {
                self.entries.put(
                    key.to_string(),
                    CachedPage {
                        page: page.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                Ok(page)
            }
            Err(err) => {
                if let Some(stale) = self.entries.get(key) {
                    tracing::warn!(key, error = %err, "search refresh failed, serving stale page");
                    return Ok(stale.page.clone());
                }
                Err(err)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
