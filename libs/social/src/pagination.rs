//! Page-based pagination for list endpoints

use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Query parameters for paginated lists
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Number of items per page
    pub limit: Option<u32>,
}

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Rows to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1) as i64 * self.limit as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_LIMIT)
    }
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        Self::new(
            query.page.unwrap_or(1),
            query.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let request = PageRequest::from(PageQuery::default());
        assert_eq!(request, PageRequest { page: 1, limit: 10 });

        let request = PageRequest::from(PageQuery {
            page: Some(0),
            limit: Some(1000),
        });
        assert_eq!(request, PageRequest { page: 1, limit: 100 });

        let request = PageRequest::new(3, 0);
        assert_eq!(request.limit, 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 25).offset(), 50);
    }
}
