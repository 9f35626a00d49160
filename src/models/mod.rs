//! Persistence rows, request payloads and response projections.
//!
//! Rows (`User`, `Picture`, `Post`, `PostItem`) never leave the service layer
//! directly; handlers answer with the projection structs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

pub mod pagination;
pub mod picture;
pub mod post;
pub mod search;
pub mod user;

pub use pagination::{Page, Paginated, Pagination, PaginationQuery};
pub use picture::*;
pub use post::*;
pub use search::SearchQuery;
pub use user::*;

/// Plain `{message}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
