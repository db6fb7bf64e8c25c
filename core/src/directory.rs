//! Expert directory: lookups and paginated listings.

use crate::error::StoreError;
use crate::types::{Expert, ExpertId};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

/// Default page size for expert listings.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Upper bound on the page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters and paging for an expert listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpertQuery {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Case-insensitive name substring
    pub search: Option<String>,
    /// Exact category
    pub category: Option<String>,
}

impl Default for ExpertQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            category: None,
        }
    }
}

impl ExpertQuery {
    /// Build a query, clamping paging and dropping blank filters.
    #[must_use]
    pub fn new(
        page: Option<u32>,
        limit: Option<u32>,
        search: Option<String>,
        category: Option<String>,
    ) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            search: non_blank(search),
            category: non_blank(category),
        }
    }

    /// Rows to skip for the requested page
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// Whether an expert passes the search and category filters.
    #[must_use]
    pub fn matches(&self, expert: &Expert) -> bool {
        let name_ok = self.search.as_ref().is_none_or(|needle| {
            expert
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let category_ok = self
            .category
            .as_ref()
            .is_none_or(|category| expert.category == *category);
        name_ok && category_ok
    }
}

/// Paging metadata returned alongside a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Matching experts across all pages
    pub total: u64,
    /// Number of pages
    pub pages: u64,
}

impl Pagination {
    /// Paging metadata for `total` matches.
    #[must_use]
    pub const fn new(query: &ExpertQuery, total: u64) -> Self {
        Self {
            page: query.page,
            limit: query.limit,
            total,
            pages: total.div_ceil(query.limit as u64),
        }
    }
}

/// One page of experts.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpertPage {
    /// Experts on this page, newest first
    pub experts: Vec<Expert>,
    /// Paging metadata
    pub pagination: Pagination,
}

/// Read access to experts.
pub trait ExpertDirectory: Send + Sync {
    /// Load one expert with its calendar.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn get_expert(
        &self,
        id: ExpertId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Expert>, StoreError>> + Send + '_>>;

    /// List experts matching a query, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn list_experts<'a>(
        &'a self,
        query: &'a ExpertQuery,
    ) -> Pin<Box<dyn Future<Output = Result<ExpertPage, StoreError>> + Send + 'a>>;

    /// Distinct categories, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails.
    fn categories(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, StoreError>> + Send + '_>>;
}
