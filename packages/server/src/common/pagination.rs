//! Page-number pagination types
//!
//! The search API uses classic page/limit pagination: clients send `page` and
//! `limit` as query-string values, the server answers with a page of rows
//! plus the total match count.
//!
//! # Usage
//!
//! ```rust,ignore
//! let window = PageWindow::resolve(params.get("page"), params.get("limit"), &PageDefaults::default());
//! let rows = Property::search(&plan, &pool).await?; // uses window.offset()/window.limit()
//! ```

/// Documented defaults for the pagination window.
///
/// Kept in one place so handlers and the query compiler agree on what an
/// absent or malformed `page`/`limit` resolves to.
#[derive(Debug, Clone)]
pub struct PageDefaults {
    /// Page used when `page` is missing or not a positive integer.
    pub page: u32,
    /// Page size used when `limit` is missing or not a positive integer.
    pub per_page: u32,
    /// Hard cap on the page size, keeping every compiled query bounded.
    pub max_per_page: u32,
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 8,
            max_per_page: 100,
        }
    }
}

/// A resolved pagination window (1-based page number and page size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u32,
    pub per_page: u32,
}

impl PageWindow {
    /// Resolve raw query-string values into a window.
    ///
    /// Malformed input never fails: anything that does not parse as a
    /// positive integer falls back to the defaults, so search stays
    /// available regardless of what the client sends.
    pub fn resolve(
        page: Option<&str>,
        limit: Option<&str>,
        defaults: &PageDefaults,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(defaults.page);
        let per_page = limit
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|l| *l >= 1)
            .unwrap_or(defaults.per_page)
            .min(defaults.max_per_page);
        Self { page, per_page }
    }

    /// Rows to skip: `(page - 1) * per_page`.
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    /// Rows to take.
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> PageDefaults {
        PageDefaults::default()
    }

    #[test]
    fn test_absent_input_uses_defaults() {
        let window = PageWindow::resolve(None, None, &defaults());
        assert_eq!(window, PageWindow { page: 1, per_page: 8 });
        assert_eq!(window.offset(), 0);
        assert_eq!(window.limit(), 8);
    }

    #[test]
    fn test_explicit_page_and_limit() {
        let window = PageWindow::resolve(Some("2"), Some("5"), &defaults());
        assert_eq!(window, PageWindow { page: 2, per_page: 5 });
        assert_eq!(window.offset(), 5);
        assert_eq!(window.limit(), 5);
    }

    #[test]
    fn test_non_numeric_page_falls_back() {
        let window = PageWindow::resolve(Some("abc"), Some("5"), &defaults());
        assert_eq!(window.page, 1);
        assert_eq!(window.per_page, 5);
    }

    #[test]
    fn test_zero_and_negative_pages_fall_back() {
        let window = PageWindow::resolve(Some("0"), None, &defaults());
        assert_eq!(window.page, 1);

        let window = PageWindow::resolve(Some("-3"), None, &defaults());
        assert_eq!(window.page, 1);
    }

    #[test]
    fn test_limit_is_capped() {
        let window = PageWindow::resolve(None, Some("5000"), &defaults());
        assert_eq!(window.per_page, 100);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let window = PageWindow::resolve(Some("4"), Some("10"), &defaults());
        assert_eq!(window.offset(), 30);
    }
}
