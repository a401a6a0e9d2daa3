//! Page requests and page metadata for the timeline.
//!
//! Pagination is lenient: bad or missing values fall back to defaults and
//! pages past the end are empty, never an error.

use serde::{Deserialize, Serialize};

use crate::models::Post;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Zero values are replaced with the defaults.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    /// Builds a request from raw query-string values. Anything that is not a
    /// positive integer falls back to page 1 / `default_limit`.
    ///
    /// The whole value must be numeric: `"3abc"` is rejected and means page 1,
    /// rather than being read as 3 from its leading digits.
    pub fn from_query(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> Self {
        let parse = |raw: Option<&str>| {
            raw.and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|v| *v > 0)
        };
        let default_limit = if default_limit == 0 { DEFAULT_LIMIT } else { default_limit };
        Self {
            page: parse(page).unwrap_or(DEFAULT_PAGE),
            limit: parse(limit).unwrap_or(default_limit),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_posts: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn compute(request: PageRequest, total_posts: u64) -> Self {
        let total_pages = total_posts.div_ceil(u64::from(request.limit));
        Self {
            current_page: request.page,
            total_pages,
            total_posts,
            has_next_page: u64::from(request.page) < total_pages,
            has_prev_page: request.page > 1,
        }
    }
}

/// One page of the reverse-chronological feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}
