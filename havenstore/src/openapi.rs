//! OpenAPI documentation configuration.
//!
//! The rendered docs are served at `/docs` via Scalar.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::uploads::request_upload,
        crate::api::handlers::uploads::direct_upload,
        crate::api::handlers::objects::serve_object,
        crate::api::handlers::objects::serve_public_asset,
    ),
    components(schemas(
        crate::api::models::uploads::UploadHandleResponse,
        crate::api::models::uploads::UploadResponse,
        crate::storage::ObjectVisibility,
    )),
    tags(
        (name = "uploads", description = "Upload handle issuance and direct uploads"),
        (name = "objects", description = "Stored object retrieval and public-asset probing")
    ),
    info(
        title = "havenstore",
        description = "Local object storage for the Haven marketplace"
    )
)]
pub struct ApiDoc;
