//! Shared Types
//!
//! Common types used across the application

use serde::Deserialize;

/// Upper bound for any page size a client may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,

    /// Falls back to the configured default when absent
    #[serde(default)]
    pub page_size: Option<u32>,
}

fn default_page() -> u32 {
    1
}

impl PaginationParams {
    /// 1-based page number, never 0
    pub fn page(&self) -> u32 {
        self.page.max(1)
    }

    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`
    pub fn page_size_or(&self, default: u32) -> u32 {
        self.page_size.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
    }
}
