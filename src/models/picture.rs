use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Picture
///
/// A row of the `pictures` table. `filename` is the name the media store assigned,
/// unique across all owners.
#[derive(Debug, Clone, FromRow)]
pub struct Picture {
    pub id: Uuid,
    pub filename: String,
    pub description: Option<String>,
    // Bytes on disk.
    pub size: i64,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPicture {
    pub filename: String,
    pub description: Option<String>,
    pub size: i64,
    pub owner_id: Uuid,
}

/// PictureRef
///
/// A picture as it appears inside a post (banner or content block).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PictureRef {
    pub id: Uuid,
    pub filename: String,
    pub description: Option<String>,
}

// --- Request Payloads ---

/// CreatePictureRequest
///
/// The non-file fields of the multipart upload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreatePictureRequest {
    #[validate(length(
        max = 255,
        message = "description must be shorter than or equal to 255 characters"
    ))]
    pub description: Option<String>,
}

/// UploadPictureForm
///
/// Documentation-only schema for `POST /picture` (multipart/form-data).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadPictureForm {
    /// jpeg, png, gif or webp; at most 4 MiB.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub description: Option<String>,
}

/// ChangePictureRequest
///
/// `PATCH /picture`. Only the description is mutable.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangePictureRequest {
    #[schema(example = "5e12faa1-a598-4bcb-bcf9-45e31a46d63a")]
    pub id: Uuid,
    #[validate(length(
        max = 255,
        message = "description must be shorter than or equal to 255 characters"
    ))]
    pub description: Option<String>,
}

// --- Response Projections ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PictureResponse {
    pub id: Uuid,
    pub description: Option<String>,
    pub filename: String,
    pub size: i64,
}

impl From<Picture> for PictureResponse {
    fn from(picture: Picture) -> Self {
        Self {
            id: picture.id,
            description: picture.description,
            filename: picture.filename,
            size: picture.size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct PictureMutationResponse {
    pub message: String,
    pub picture: PictureResponse,
}
