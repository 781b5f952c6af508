//! Pagination intent: `page`/`page_size` or `offset`/`limit`, clamped, never failing.

use crate::query::QueryParams;
use crate::response::PaginationMeta;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u32,
    pub page_size: u32,
    pub offset: u64,
    pub limit: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        PaginationParams::from_page(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

impl PaginationParams {
    /// Window from page coordinates; `page_size` is clamped to `1..=MAX_PAGE_SIZE`.
    pub fn from_page(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        PaginationParams {
            page,
            page_size,
            offset: u64::from(page - 1) * u64::from(page_size),
            limit: page_size,
        }
    }

    /// Window from offset coordinates; the page is the one containing `offset`.
    pub fn from_offset(offset: u64, limit: u32) -> Self {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = offset / u64::from(limit) + 1;
        PaginationParams {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            page_size: limit,
            offset,
            limit,
        }
    }
}

/// Positive integer or nothing. Zero, negatives and garbage fall back to the caller's default.
fn positive(q: &QueryParams, key: &str) -> Option<u32> {
    q.get_non_empty(key)
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
}

fn non_negative(q: &QueryParams, key: &str) -> Option<u64> {
    q.get_non_empty(key)
        .and_then(|s| s.parse::<i64>().ok())
        .and_then(|n| u64::try_from(n).ok())
}

/// Extract the pagination window from query parameters.
///
/// `limit`/`offset`, when either is supplied, are authoritative and `page`/`page_size` are
/// derived from them; otherwise `page`/`page_size` (default 1 and 10) drive the window.
/// Sizes above `MAX_PAGE_SIZE` are clamped silently.
pub fn extract_pagination(q: &QueryParams) -> PaginationParams {
    let page = positive(q, "page").unwrap_or(DEFAULT_PAGE);
    let page_size = positive(q, "page_size").unwrap_or(DEFAULT_PAGE_SIZE);
    let limit = positive(q, "limit");
    let offset = non_negative(q, "offset");

    if limit.is_none() && offset.is_none() {
        return PaginationParams::from_page(page, page_size);
    }
    PaginationParams::from_offset(offset.unwrap_or(0), limit.unwrap_or(page_size))
}

pub fn build_pagination(params: &PaginationParams, total: u64) -> PaginationMeta {
    PaginationMeta {
        page: params.page,
        page_size: params.page_size,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> PaginationParams {
        extract_pagination(&QueryParams::parse(raw))
    }

    #[test]
    fn defaults() {
        let p = extract("");
        assert_eq!(p, PaginationParams { page: 1, page_size: 10, offset: 0, limit: 10 });
    }

    #[test]
    fn offset_follows_page_for_valid_inputs() {
        for page in [1u32, 2, 7, 50] {
            for size in [1u32, 10, 33, 100] {
                let p = extract(&format!("page={page}&page_size={size}"));
                assert_eq!(p.offset, u64::from((page - 1) * size));
                assert_eq!(p.limit, size);
                assert_eq!(p.page_size, size);
            }
        }
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        assert_eq!(extract("page_size=101").page_size, 100);
        assert_eq!(extract("page_size=100000").limit, 100);
        assert_eq!(extract("limit=500").limit, 100);
    }

    #[test]
    fn invalid_sizes_keep_default() {
        for raw in ["page_size=0", "page_size=-4", "page_size=abc", "page_size=", "page_size=1.5"] {
            assert_eq!(extract(raw).page_size, 10, "{raw}");
        }
        assert_eq!(extract("page=0").page, 1);
        assert_eq!(extract("page=x").page, 1);
    }

    #[test]
    fn limit_offset_take_precedence() {
        let p = extract("page=9&page_size=50&limit=20&offset=45");
        assert_eq!(p, PaginationParams { page: 3, page_size: 20, offset: 45, limit: 20 });
    }

    #[test]
    fn offset_alone_uses_page_size() {
        let p = extract("page_size=5&offset=12");
        assert_eq!(p, PaginationParams { page: 3, page_size: 5, offset: 12, limit: 5 });
    }

    #[test]
    fn negative_offset_is_ignored() {
        let p = extract("limit=5&offset=-3");
        assert_eq!(p.offset, 0);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn meta_reports_window_and_total() {
        let meta = build_pagination(&extract("page=2&page_size=5"), 42);
        assert_eq!(meta, PaginationMeta { page: 2, page_size: 5, total: 42 });
    }
}
