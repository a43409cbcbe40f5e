//! Common types for the shared crate

use serde::{Deserialize, Serialize};

/// One page of a deterministic, ordered listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Slice `all` (already ordered) into page `page` (1-based)
    pub fn slice(all: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let total = all.len() as u64;
        let total_pages = if page_size > 0 {
            total.div_ceil(page_size as u64) as u32
        } else {
            1
        };
        let offset = (page - 1) as usize * page_size as usize;
        let items = all
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_slice() {
        let page = Page::slice((1..=45).collect::<Vec<_>>(), 2, 20);
        assert_eq!(page.items.first(), Some(&21));
        assert_eq!(page.items.len(), 20);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);

        let last = Page::slice((1..=45).collect::<Vec<_>>(), 3, 20);
        assert_eq!(last.items, vec![41, 42, 43, 44, 45]);

        let beyond = Page::slice((1..=5).collect::<Vec<_>>(), 9, 20);
        assert!(beyond.items.is_empty());
    }

    #[test]
    fn test_page_zero_treated_as_first() {
        let page = Page::slice(vec!["a", "b"], 0, 1);
        assert_eq!(page.page, 1);
        assert_eq!(page.items, vec!["a"]);
    }
}
