use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    extract::{AppJson, AppPath, AppQuery},
    models::{
        ChangePictureRequest, CreatePictureRequest, MessageResponse, Paginated,
        PaginationQuery, PictureMutationResponse, PictureResponse, UploadPictureForm,
    },
    services::{PictureService, PictureUpload},
};

/// list_pictures
///
/// [Authenticated Route] The caller's pictures, newest first.
#[utoipa::path(
    get,
    path = "/picture",
    tag = "picture",
    security(("bearer" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "Pictures", body = Paginated<PictureResponse>),
        (status = 400, description = "Invalid paging", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody)
    )
)]
pub async fn list_pictures(
    AuthUser { id }: AuthUser,
    State(service): State<PictureService>,
    AppQuery(query): AppQuery<PaginationQuery>,
) -> ApiResult<Json<Paginated<PictureResponse>>> {
    query.validate()?;
    Ok(Json(service.list(id, query.resolve()).await?))
}

/// upload_picture
///
/// [Authenticated Route] Multipart upload with a `file` part and an optional
/// `description` part.
#[utoipa::path(
    post,
    path = "/picture",
    tag = "picture",
    security(("bearer" = [])),
    request_body(content = UploadPictureForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Picture uploaded", body = PictureMutationResponse),
        (status = 400, description = "Missing file or invalid file type", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody)
    )
)]
pub async fn upload_picture(
    AuthUser { id }: AuthUser,
    State(service): State<PictureService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<PictureMutationResponse>)> {
    let mut multipart = multipart?;
    let mut file = None;
    let mut description = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let original_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                file = Some((original_name, content_type, bytes));
            }
            Some("description") => {
                let text = field.text().await?;
                description = Some(text).filter(|d| !d.is_empty());
            }
            _ => {}
        }
    }

    let Some((original_name, content_type, bytes)) = file else {
        return Err(ApiError::Validation(vec!["file is required".to_string()]));
    };

    let form = CreatePictureRequest { description };
    form.validate()?;

    let response = service
        .upload(
            id,
            PictureUpload {
                original_name,
                content_type,
                bytes,
                description: form.description,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    patch,
    path = "/picture",
    tag = "picture",
    security(("bearer" = [])),
    request_body = ChangePictureRequest,
    responses(
        (status = 200, description = "Picture changed", body = PictureMutationResponse),
        (status = 404, description = "Picture not found", body = ErrorBody)
    )
)]
pub async fn change_picture(
    AuthUser { id }: AuthUser,
    State(service): State<PictureService>,
    AppJson(payload): AppJson<ChangePictureRequest>,
) -> ApiResult<Json<PictureMutationResponse>> {
    payload.validate()?;
    Ok(Json(service.change(id, payload).await?))
}

/// delete_picture
///
/// [Authenticated Route] Removes the row and the file. Posts using the picture keep
/// existing without it.
#[utoipa::path(
    delete,
    path = "/picture/{id}",
    tag = "picture",
    security(("bearer" = [])),
    params(("id" = Uuid, Path, description = "Picture id")),
    responses(
        (status = 200, description = "Picture deleted", body = MessageResponse),
        (status = 404, description = "Picture not found", body = ErrorBody)
    )
)]
pub async fn delete_picture(
    AuthUser { id: owner_id }: AuthUser,
    State(service): State<PictureService>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    Ok(Json(service.delete(owner_id, id).await?))
}
