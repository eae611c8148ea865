//! # Common API Types
//!
//! Shared response wrappers and pagination helpers for list endpoints.

use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};
use crate::repositories::Page;

pub const DEFAULT_LIMIT: u64 = 50;
pub const MAX_LIMIT: u64 = 200;

/// Pagination block returned with every list
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct Pagination {
    /// Total rows matching the filters
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    /// Convenience field indicating if more pages exist
    pub has_more: bool,
}

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Items of the current page
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: Page) -> Self {
        let has_more = page.offset.saturating_add(data.len() as u64) < total;
        Self {
            data,
            pagination: Pagination {
                total,
                limit: page.limit,
                offset: page.offset,
                has_more,
            },
        }
    }
}

/// Validates `limit` (1 to 200, default 50) and `offset` (default 0).
pub fn page_from(limit: Option<u64>, offset: Option<u64>) -> Result<Page, ApiError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(validation_error(
            "limit must be between 1 and 200",
            json!({ "field": "limit", "value": limit }),
        ));
    }
    Ok(Page {
        limit,
        offset: offset.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_page_defaults() {
        assert_eq!(page_from(None, None).unwrap(), Page { limit: 50, offset: 0 });
    }

    #[test]
    fn test_limit_bounds() {
        assert!(page_from(Some(200), None).is_ok());
        assert_eq!(page_from(Some(0), None).unwrap_err().status, StatusCode::BAD_REQUEST);
        assert!(page_from(Some(201), None).is_err());
    }

    #[test]
    fn test_has_more() {
        let page = Page { limit: 2, offset: 0 };
        assert!(PaginatedResponse::new(vec![1, 2], 3, page).pagination.has_more);
        assert!(!PaginatedResponse::new(vec![1, 2], 2, page).pagination.has_more);

        let last = Page { limit: 2, offset: 2 };
        assert!(!PaginatedResponse::new(vec![3], 3, last).pagination.has_more);
    }
}
