use crate::storage::{ObjectVisibility, UploadHandle};
use crate::types::{OwnerId, UploadId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for the direct upload endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct DirectUploadQuery {
    /// Token previously issued by `POST /api/uploads`
    #[serde(rename = "uploadId")]
    #[param(value_type = String, format = "uuid")]
    pub upload_id: UploadId,

    /// Visibility class for the stored object (default: public)
    #[serde(default)]
    pub visibility: ObjectVisibility,

    /// Owning user id; required when visibility is private
    #[serde(rename = "ownerId")]
    pub owner_id: Option<OwnerId>,
}

/// Response for an issued upload handle
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadHandleResponse {
    pub id: String,
    /// URL path the client performs the direct upload against
    pub upload_url: String,
}

impl UploadHandleResponse {
    pub fn from_handle(handle: &UploadHandle) -> Self {
        Self {
            id: handle.id.to_string(),
            upload_url: handle.upload_url.clone(),
        }
    }
}

/// Response for a completed direct upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Externally addressable URL of the stored object
    pub object_path: String,
    /// Stored byte count
    pub size: u64,
}
