//! Paged results.

use projql_proto::Pagination;
use serde::Serialize;

/// One page of projection results with the size of the whole result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionPage<T> {
    /// Rows of this page.
    pub content: Vec<T>,
    /// Number of rows across all pages.
    pub total_elements: u64,
    /// Zero-based page index.
    pub page_number: u32,
    /// Requested page size; zero when unpaged.
    pub page_size: u32,
}

impl<T> ProjectionPage<T> {
    /// Page with no content.
    pub fn empty() -> Self {
        Self {
            content: Vec::new(),
            total_elements: 0,
            page_number: 0,
            page_size: 0,
        }
    }

    /// Build a page from content, the total count and the paging used.
    pub fn of(content: Vec<T>, total_elements: u64, pagination: Option<Pagination>) -> Self {
        let (page_number, page_size) = match pagination {
            Some(p) => (p.page_number(), p.size),
            None => (0, 0),
        };
        Self {
            content,
            total_elements,
            page_number,
            page_size,
        }
    }

    /// Number of pages, zero when unpaged.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_elements.div_ceil(u64::from(self.page_size))
    }

    /// Check if rows exist after this page.
    pub fn has_next(&self) -> bool {
        if self.page_size == 0 {
            return false;
        }
        (u64::from(self.page_number) + 1) * u64::from(self.page_size) < self.total_elements
    }

    /// Check if this is not the first page.
    pub fn has_previous(&self) -> bool {
        self.page_number > 0
    }

    /// Check if the page has no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Convert the content, keeping the page bounds.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ProjectionPage<U> {
        ProjectionPage {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}

impl<T> Default for ProjectionPage<T> {
    fn default() -> Self {
        Self::empty()
    }
}
