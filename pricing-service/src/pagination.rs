//! Page-number pagination for list endpoints
//!
//! A list request carries `page` and `page_size` query parameters. They are
//! resolved in two steps: [`PageParams::resolve`] applies the configured
//! defaults and cap, then [`PageRequest::locate`] checks the page against the
//! total count. Out-of-range and malformed page numbers are a 404 rather than
//! a silent clamp.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn list(
//!     State(state): State<AppState>,
//!     Query(params): Query<PageParams>,
//!     PageUrl(url): PageUrl,
//! ) -> Result<ApiResponse<Paginated<Product>>> {
//!     let request = params.resolve(&state.config().pagination)?;
//!     let count = repo.count(&filter).await?;
//!     let page = request.locate(count)?;
//!     let items = repo.list(&filter, page.pagination()).await?;
//!     Ok(ApiResponse::ok(Paginated::new(count, items, &page, &url)))
//! }
//! ```

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PaginationConfig;
use crate::error::{Error, Result};

/// 404 message for a page that does not exist
pub const INVALID_PAGE: &str = "Invalid page.";

/// Query parameter selecting the page
pub const PAGE_PARAM: &str = "page";

/// Query parameter selecting the page size
pub const PAGE_SIZE_PARAM: &str = "page_size";

/// Offset/limit window handed to repositories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Window for a 1-indexed page number
    ///
    /// ```rust
    /// use pricing_service::pagination::Pagination;
    ///
    /// let page3 = Pagination::page(3, 20);
    /// assert_eq!(page3.offset, 40);
    /// assert_eq!(page3.limit, 20);
    /// ```
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1) * page_size;
        Self {
            offset,
            limit: page_size,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// Raw `page` / `page_size` query parameters
///
/// Both are kept as text so that malformed values can be told apart from
/// absent ones.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    /// Requested page number, or `last`
    pub page: Option<String>,
    /// Requested page size
    pub page_size: Option<String>,
}

/// Which page was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumber {
    /// A 1-indexed page number
    Number(u64),
    /// The last page, whatever its number
    Last,
}

/// Page selection after defaults are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Requested page
    pub number: PageNumber,
    /// Items per page
    pub size: u64,
}

impl PageParams {
    /// Apply defaults and limits
    ///
    /// A missing, malformed or non-positive `page_size` falls back to the
    /// configured default; larger values, including ones too big to parse,
    /// are clamped to the configured cap.
    /// A malformed `page` is a 404.
    pub fn resolve(&self, config: &PaginationConfig) -> Result<PageRequest> {
        let default_size = u64::from(config.default_page_size.max(1));
        let max_size = u64::from(config.max_page_size.max(1));

        let size = self
            .page_size
            .as_deref()
            .map_or(default_size, |raw| page_size(raw, default_size, max_size));

        let number = match self.page.as_deref().map(str::trim) {
            None => PageNumber::Number(1),
            Some("last") => PageNumber::Last,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n >= 1 => PageNumber::Number(n as u64),
                _ => return Err(invalid_page()),
            },
        };

        Ok(PageRequest { number, size })
    }
}

/// Digits too large for `u64` are still above the cap
fn page_size(raw: &str, default_size: u64, max_size: u64) -> u64 {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(0) => default_size,
        Ok(size) => size.min(max_size),
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => max_size,
        Err(_) => default_size,
    }
}

impl PageRequest {
    /// Check the page against the total number of items
    ///
    /// An empty collection still has a first page.
    pub fn locate(&self, count: u64) -> Result<Page> {
        let num_pages = count.div_ceil(self.size).max(1);
        let number = match self.number {
            PageNumber::Last => num_pages,
            PageNumber::Number(n) if n <= num_pages => n,
            PageNumber::Number(_) => return Err(invalid_page()),
        };

        Ok(Page {
            number,
            size: self.size,
            num_pages,
        })
    }
}

/// A page known to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-indexed page number
    pub number: u64,
    /// Items per page
    pub size: u64,
    /// Total pages, at least 1
    pub num_pages: u64,
}

impl Page {
    /// Offset/limit for the repository query
    pub fn pagination(&self) -> Pagination {
        Pagination::page(self.number, self.size)
    }

    /// Whether a following page exists
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// Whether a preceding page exists
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    /// Absolute link to the next page
    pub fn next_link(&self, base: &Url) -> Option<String> {
        self.has_next()
            .then(|| with_page(base, Some(self.number + 1)).to_string())
    }

    /// Absolute link to the previous page
    ///
    /// The link to page 1 drops the `page` parameter altogether.
    pub fn previous_link(&self, base: &Url) -> Option<String> {
        self.has_previous().then(|| {
            let previous = self.number - 1;
            with_page(base, (previous > 1).then_some(previous)).to_string()
        })
    }
}

/// `data` member of a paginated response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Paginated<T> {
    /// Total matching items before pagination
    pub count: u64,
    /// Link to the next page
    pub next: Option<String>,
    /// Link to the previous page
    pub previous: Option<String>,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Assemble a page of results with its links
    pub fn new(count: u64, results: Vec<T>, page: &Page, base: &Url) -> Self {
        Self {
            count,
            next: page.next_link(base),
            previous: page.previous_link(base),
            results,
        }
    }
}

/// Absolute URL of the current request, used to build page links
///
/// Built from the `Host` header and the original request URI, so links stay
/// correct under a nested path prefix.
#[derive(Debug, Clone)]
pub struct PageUrl(pub Url);

impl<S> FromRequestParts<S> for PageUrl
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let OriginalUri(uri) = OriginalUri::from_request_parts(parts, state)
            .await
            .map_err(|e| Error::Internal(format!("Original URI unavailable: {}", e)))?;

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");
        let scheme = uri.scheme_str().unwrap_or("http");
        let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

        let url = Url::parse(&format!("{}://{}{}", scheme, host, path_and_query))
            .map_err(|e| Error::BadRequest(format!("Invalid request URL: {}", e)))?;

        Ok(PageUrl(url))
    }
}

/// Copy of `base` with `page` replaced (or removed when `None`)
///
/// Query parameters are re-emitted sorted by key.
fn with_page(base: &Url, page: Option<u64>) -> Url {
    let mut pairs: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if let Some(number) = page {
        pairs.push((PAGE_PARAM.to_string(), number.to_string()));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut url = base.clone();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    url
}

fn invalid_page() -> Error {
    Error::NotFound(INVALID_PAGE.to_string())
}
