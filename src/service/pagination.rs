//! Page arithmetic for list endpoints.

use crate::schema::DEFAULT_PAGE_LIMIT;
use crate::store::{Page, Record};
use serde::Serialize;

/// Validated `limit` / `pageNumber` query. Page 0 is read as page 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub page_number: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            limit: DEFAULT_PAGE_LIMIT,
            page_number: 1,
        }
    }
}

impl PageRequest {
    pub fn new(limit: u32, page_number: u32) -> Self {
        PageRequest {
            limit: limit.max(1),
            page_number,
        }
    }

    /// From a record produced by the list query schema.
    pub fn from_query(query: &Record) -> Self {
        let read = |key: &str, fallback: u32| {
            query
                .get(key)
                .and_then(|v| v.as_u64())
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(fallback)
        };
        let d = PageRequest::default();
        PageRequest::new(read("limit", d.limit), read("pageNumber", d.page_number))
    }

    /// One-based page actually served.
    pub fn page(&self) -> u32 {
        self.page_number.max(1)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, count: u64) -> u64 {
        count.div_ceil(u64::from(self.limit))
    }

    pub fn to_page(&self) -> Page {
        Page {
            limit: self.limit,
            offset: self.offset(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_pages: u64,
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(request: PageRequest, count: u64) -> Self {
        Pagination {
            total_pages: request.total_pages(count),
            page: request.page(),
            limit: request.limit,
        }
    }
}
