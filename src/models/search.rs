use std::borrow::Cow;

use serde::Deserialize;
use utoipa::IntoParams;
use validator::{Validate, ValidationError};

use super::pagination::{PaginationQuery, Pagination};

// The empty string is left to the length rule.
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.trim().is_empty() {
        return Err(ValidationError::new("not_blank")
            .with_message(Cow::Borrowed("value should not be empty")));
    }
    Ok(())
}

/// SearchQuery
///
/// `GET /search/posts?value=&page=&take=`. Paging follows the same rules as
/// `PaginationQuery`; the fields are repeated because the query extractor does not
/// support flattened structs.
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[validate(
        length(min = 1, message = "value must be longer than or equal to 1 characters"),
        custom(function = validate_not_blank)
    )]
    #[param(example = "rust")]
    pub value: String,
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: Option<i64>,
    #[validate(range(min = 5, message = "take must not be less than 5"))]
    #[param(minimum = 5, example = 20)]
    pub take: Option<i64>,
}

impl SearchQuery {
    pub fn pagination(&self) -> Pagination {
        PaginationQuery {
            page: self.page,
            take: self.take,
        }
        .resolve()
    }
}
