//! Paginated list responses
//!
//! # Example
//!
//! ```rust
//! use docstore_crud::crud::{ListResponse, PaginationMeta};
//!
//! let pagination = PaginationMeta::new(2, 10, 25);
//! assert_eq!(pagination.total_pages, 3);
//! assert!(pagination.has_next);
//!
//! let response = ListResponse::new(vec!["a", "b"], pagination);
//! assert_eq!(response.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaginationMeta {
    /// Current page (1-indexed)
    pub page: u64,
    /// Items per page
    pub per_page: u64,
    /// Total matching items across all pages
    pub total: u64,
    /// Total number of pages
    pub total_pages: u64,
    /// Whether a next page exists
    pub has_next: bool,
    /// Whether a previous page exists
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata; a `per_page` of zero is treated as one
    #[must_use]
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_pages = calculate_total_pages(total, per_page);

        Self {
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Metadata for a window starting at `offset`
    ///
    /// `take` of `None` means the window holds every remaining row, which is
    /// reported as a single page of `returned` rows.
    #[must_use]
    pub fn from_window(take: Option<u64>, offset: u64, returned: usize, total: u64) -> Self {
        match take {
            Some(per_page) if per_page > 0 => Self::new(offset / per_page + 1, per_page, total),
            _ => Self::new(1, returned as u64, total),
        }
    }
}

fn calculate_total_pages(total: u64, per_page: u64) -> u64 {
    total.div_ceil(per_page)
}

/// Paginated list of items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Items on this page
    pub data: Vec<T>,
    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T> ListResponse<T> {
    /// Create a new list response
    pub fn new(data: Vec<T>, pagination: PaginationMeta) -> Self {
        Self { data, pagination }
    }

    /// Number of items on this page
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this page is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
