use axum::extract::FromRef;
use bytes::Bytes;
use uuid::Uuid;

use super::require_user;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    models::{
        ChangePictureRequest, MessageResponse, NewPicture, Paginated, Pagination,
        PictureMutationResponse, PictureResponse,
    },
    repository::RepositoryState,
    storage::{ALLOWED_IMAGE_TYPES, MAX_UPLOAD_BYTES, StorageState},
};

/// A parsed multipart upload.
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    pub description: Option<String>,
}

/// PictureService
///
/// Owner-scoped picture management. The row and the file on disk live and die together.
#[derive(Clone)]
pub struct PictureService {
    repo: RepositoryState,
    storage: StorageState,
}

impl FromRef<AppState> for PictureService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.repo.clone(), state.storage.clone())
    }
}

impl PictureService {
    pub fn new(repo: RepositoryState, storage: StorageState) -> Self {
        Self { repo, storage }
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> ApiResult<Paginated<PictureResponse>> {
        require_user(&*self.repo, owner_id).await?;
        let page = self.repo.list_pictures(owner_id, pagination).await?;
        Ok(Paginated::new(pagination, page.map(PictureResponse::from)))
    }

    /// upload
    ///
    /// Type and size are checked before anything touches the disk. Once the file is
    /// written, any later failure removes it again.
    pub async fn upload(
        &self,
        owner_id: Uuid,
        upload: PictureUpload,
    ) -> ApiResult<PictureMutationResponse> {
        if !ALLOWED_IMAGE_TYPES.contains(&upload.content_type.as_str()) {
            tracing::warn!(content_type = %upload.content_type, "rejected upload type");
            return Err(ApiError::BadRequest("Invalid file type.".into()));
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ApiError::PayloadTooLarge);
        }

        let stored = self.storage.save(&upload.original_name, upload.bytes).await?;

        if let Err(e) = require_user(&*self.repo, owner_id).await {
            self.storage.remove(&stored.filename).await;
            return Err(e);
        }

        let created = self
            .repo
            .create_picture(NewPicture {
                filename: stored.filename.clone(),
                description: upload.description,
                size: stored.size,
                owner_id,
            })
            .await;

        let picture = match created {
            Ok(picture) => picture,
            Err(e) => {
                tracing::error!(error = %e, filename = %stored.filename, "picture insert failed");
                self.storage.remove(&stored.filename).await;
                return Err(ApiError::BadRequest(
                    "Something went wrong while uploading the image".into(),
                ));
            }
        };

        tracing::info!(picture_id = %picture.id, owner_id = %owner_id, "picture uploaded");
        Ok(PictureMutationResponse {
            message: "Picture uploaded successfully".to_string(),
            picture: picture.into(),
        })
    }

    pub async fn change(
        &self,
        owner_id: Uuid,
        req: ChangePictureRequest,
    ) -> ApiResult<PictureMutationResponse> {
        require_user(&*self.repo, owner_id).await?;

        let picture = self
            .repo
            .update_picture_description(req.id, owner_id, req.description)
            .await?
            .ok_or(ApiError::NotFound("Picture not found"))?;

        tracing::info!(picture_id = %picture.id, "picture changed");
        Ok(PictureMutationResponse {
            message: "Picture changed successfully".to_string(),
            picture: picture.into(),
        })
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> ApiResult<MessageResponse> {
        require_user(&*self.repo, owner_id).await?;

        let picture = self
            .repo
            .find_picture(id, owner_id)
            .await?
            .ok_or(ApiError::NotFound("Picture not found"))?;

        if !self.repo.delete_picture(picture.id, owner_id).await? {
            return Err(ApiError::NotFound("Picture not found"));
        }
        self.storage.remove(&picture.filename).await;

        tracing::info!(picture_id = %picture.id, "picture deleted");
        Ok(MessageResponse::new("Picture deleted successfully"))
    }
}
