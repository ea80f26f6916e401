use crate::AppState;
use crate::api::models::uploads::{DirectUploadQuery, UploadHandleResponse, UploadResponse};
use crate::errors::{Error, Result};
use crate::storage::{ObjectAclPolicy, ObjectVisibility};
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "uploads",
    summary = "Request upload handle",
    description = "Issue a fresh upload token and the URL to perform the direct upload against. \
                   Nothing is reserved on disk until the upload itself happens.",
    responses(
        (status = 201, description = "Upload handle issued", body = UploadHandleResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn request_upload(State(state): State<AppState>) -> Result<(StatusCode, Json<UploadHandleResponse>)> {
    let handle = state.storage.new_upload_handle();
    Ok((StatusCode::CREATED, Json(UploadHandleResponse::from_handle(&handle))))
}

#[utoipa::path(
    post,
    path = "/api/upload/direct",
    tag = "uploads",
    summary = "Direct upload",
    description = "Persist an uploaded file under a freshly minted object path and return its URL. \
                   The body is multipart/form-data with a single `file` field.",
    request_body(
        content_type = "multipart/form-data",
        description = "File upload"
    ),
    params(DirectUploadQuery),
    responses(
        (status = 201, description = "Object stored", body = UploadResponse),
        (status = 400, description = "Invalid request"),
        (status = 413, description = "Payload too large"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn direct_upload(
    State(state): State<AppState>,
    Query(query): Query<DirectUploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let max_upload_size = state.config.storage.max_upload_size;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() != Some("file") {
            // Ignore unknown fields (forward compatibility)
            continue;
        }

        let original_filename = field.file_name().map(str::to_string).unwrap_or_default();
        let data = field.bytes().await.map_err(|e| Error::BadRequest {
            message: format!("Failed to read file data: {e}"),
        })?;

        if data.len() as u64 > max_upload_size {
            return Err(Error::PayloadTooLarge {
                message: format!(
                    "File size exceeds maximum allowed size of {} bytes ({} MB)",
                    max_upload_size,
                    max_upload_size / (1024 * 1024)
                ),
            });
        }

        upload = Some((original_filename, data.to_vec()));
        break;
    }

    let Some((original_filename, data)) = upload else {
        return Err(Error::BadRequest {
            message: "Missing required field: 'file'".to_string(),
        });
    };

    if matches!(query.visibility, ObjectVisibility::Private) && query.owner_id.is_none() {
        return Err(Error::BadRequest {
            message: "Private uploads require an ownerId".to_string(),
        });
    }

    let raw_path = state
        .storage
        .save_buffer(&data, &original_filename, query.owner_id.as_deref(), query.visibility)
        .await?;

    // A cloud object-store backend would set a real ACL here; the local shim
    // only normalizes the path.
    let policy = ObjectAclPolicy {
        owner: query.owner_id.clone().unwrap_or_default(),
        visibility: query.visibility,
    };
    let object_path = state.storage.set_access_policy(&raw_path, &policy);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            object_path,
            size: data.len() as u64,
        }),
    ))
}
