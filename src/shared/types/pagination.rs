//! Listing pagination
//!
//! Every list endpoint goes through [`paginate`]: raw page/limit/sort
//! parameters are normalized into a [`PageWindow`], the total count and the
//! page itself are read concurrently from any store implementing
//! [`Countable`] + [`Fetchable`], and [`PaginationMeta`] is derived from the
//! count.
//!
//! The two reads are not wrapped in a transaction. A row written between
//! them may show up in one result and not the other.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Sort direction for a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = InvalidParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(InvalidParameter(format!(
                "sort_order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

/// Rejected listing input (page/limit out of range, unknown sort field)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidParameter(pub String);

/// Failure of a paginated listing
#[derive(Debug, Error)]
pub enum ListingError<E> {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] InvalidParameter),
    /// Error from the count or the fetch, passed through untouched.
    #[error(transparent)]
    Store(E),
}

/// Raw listing parameters as received from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationParams {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Field to sort by; must be sortable on the target collection
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl PaginationParams {
    pub fn new(page: u32, limit: u32, sort_by: impl Into<String>, sort_order: SortOrder) -> Self {
        Self {
            page,
            limit,
            sort_by: sort_by.into(),
            sort_order,
        }
    }

    /// Compute the offset/limit window for these parameters.
    pub fn normalize(&self) -> Result<PageWindow, InvalidParameter> {
        let page = NonZeroU32::new(self.page)
            .ok_or_else(|| InvalidParameter("page must be >= 1".to_string()))?;
        let limit = NonZeroU32::new(self.limit)
            .ok_or_else(|| InvalidParameter("limit must be >= 1".to_string()))?;

        Ok(PageWindow {
            page,
            limit,
            skip: (page.get() as u64 - 1) * limit.get() as u64,
            take: limit.get() as u64,
            sort_by: self.sort_by.clone(),
            sort_order: self.sort_order,
        })
    }
}

/// Normalized slice of a collection to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    pub page: NonZeroU32,
    pub limit: NonZeroU32,
    /// Zero-based row offset, `(page - 1) * limit`
    pub skip: u64,
    /// Maximum rows to return, equal to `limit`
    pub take: u64,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

/// Page metadata derived from the total count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    /// Matching records across all pages
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn compute(total: u64, page: NonZeroU32, limit: NonZeroU32) -> Self {
        let total_pages = total.div_ceil(limit.get() as u64);
        Self {
            page: page.get(),
            limit: limit.get(),
            total,
            total_pages,
            has_more: (page.get() as u64) < total_pages,
        }
    }
}

/// One page of items plus its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResult<T> {
    /// Convert the items, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

/// Store capability: count the records matching a filter.
#[async_trait]
pub trait Countable<F: Sync>: Send + Sync {
    type Error: Send;

    async fn count(&self, filter: &F) -> Result<u64, Self::Error>;
}

/// Store capability: read one sorted window of the records matching a filter.
#[async_trait]
pub trait Fetchable<F: Sync, T>: Countable<F> {
    /// Related records to load alongside each item. `()` when the store
    /// has nothing to include.
    type Include: Sync;

    /// Whether `field` may be used as `sort_by`.
    fn is_sortable(&self, field: &str) -> bool;

    async fn fetch(
        &self,
        filter: &F,
        include: &Self::Include,
        window: &PageWindow,
    ) -> Result<Vec<T>, Self::Error>;
}

/// List one page of `source`.
///
/// Count and fetch run concurrently; the call fails as a whole if either
/// fails. Dropping the returned future abandons both reads.
pub async fn paginate<S, F, T>(
    source: &S,
    filter: &F,
    include: &S::Include,
    params: &PaginationParams,
) -> Result<PaginatedResult<T>, ListingError<S::Error>>
where
    S: Fetchable<F, T> + ?Sized,
    F: Sync,
    T: Send,
{
    if !source.is_sortable(&params.sort_by) {
        return Err(InvalidParameter(format!("unsupported sort field '{}'", params.sort_by)).into());
    }
    let window = params.normalize()?;

    let started = Instant::now();
    let (total, items) = tokio::try_join!(
        source.count(filter),
        source.fetch(filter, include, &window)
    )
    .map_err(ListingError::Store)?;
    metrics::histogram!("listing_query_duration_seconds").record(started.elapsed().as_secs_f64());

    let pagination = PaginationMeta::compute(total, window.page, window.limit);
    debug!(
        page = pagination.page,
        limit = pagination.limit,
        total = pagination.total,
        returned = items.len(),
        "Listing page fetched"
    );

    Ok(PaginatedResult { items, pagination })
}

// ── Tests ──────────────────────────────────────────────────────
