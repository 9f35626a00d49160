use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_TAKE: i64 = 20;

/// PaginationQuery
///
/// Raw `?page=&take=` parameters shared by every list endpoint. Both are optional;
/// when present `page` must be at least 1 and `take` at least 5.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: Option<i64>,
    #[validate(range(min = 5, message = "take must not be less than 5"))]
    #[param(minimum = 5, example = 20)]
    pub take: Option<i64>,
}

impl PaginationQuery {
    pub fn resolve(&self) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(DEFAULT_PAGE),
            take: self.take.unwrap_or(DEFAULT_TAKE),
        }
    }
}

/// Pagination
///
/// Validated paging window handed to the repository layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub take: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            take: DEFAULT_TAKE,
        }
    }
}

impl Pagination {
    /// Rows before this page. Saturates, so an absurdly large page is simply past the end.
    pub fn skip(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.take)
    }
}

/// Page
///
/// One window of repository rows plus the number of rows matching the filter.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// Paginated
///
/// The list envelope returned by every paginated endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct Paginated<T> {
    pub page: i64,
    pub take: i64,
    pub data: Vec<T>,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn new(pagination: Pagination, page: Page<T>) -> Self {
        Self {
            page: pagination.page,
            take: pagination.take,
            data: page.items,
            total: page.total,
        }
    }
}
