use crate::AppState;
use crate::errors::{Error, Result};
use crate::storage::{AccessPermission, AccessRequest, ResolvedObject};
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};
use futures::TryStreamExt;
use tokio_util::io::ReaderStream;

#[utoipa::path(
    get,
    path = "/storage/{path}",
    tag = "objects",
    summary = "Serve stored object",
    description = "Resolve a stored object by its external path and stream its bytes. The route is \
                   mounted at the configured storage base URL (default `/storage`).",
    params(
        ("path" = String, Path, description = "Object path: `public/<name>` or `private/<ownerId>/<name>`")
    ),
    responses(
        (status = 200, description = "Object bytes"),
        (status = 404, description = "Object not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn serve_object(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let object = state.storage.resolve(&path).await?;

    // Authorization happens upstream; this check keeps the enforcement seam a
    // real object-store backend plugs into.
    let request = AccessRequest {
        user_id: None,
        object: &object,
        permission: AccessPermission::Read,
    };
    if !state.storage.can_access(&request) {
        return Err(Error::object_not_found(path));
    }

    stream_object(&object, state.config.storage.cache_ttl_secs).await
}

#[utoipa::path(
    get,
    path = "/public-objects/{path}",
    tag = "objects",
    summary = "Serve public asset",
    description = "Probe for a file under the public subdirectory and stream it. Missing assets are \
                   a plain 404, so callers can fall back to defaults without treating it as an error.",
    params(
        ("path" = String, Path, description = "Path relative to the public subdirectory")
    ),
    responses(
        (status = 200, description = "Asset bytes"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn serve_public_asset(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    match state.storage.find_public(&path).await {
        Some(object) => stream_object(&object, state.config.storage.cache_ttl_secs).await,
        None => Err(Error::NotFound {
            resource: "Public asset".to_string(),
            id: path,
        }),
    }
}

/// Pipe an object's bytes from disk into a response.
///
/// Failing to open the file surfaces as a 500 before any header is sent. An
/// I/O error after streaming has begun can only be logged: the status line and
/// headers are already committed, so the client sees a truncated body.
async fn stream_object(object: &ResolvedObject, cache_ttl_secs: u64) -> Result<Response> {
    let file = tokio::fs::File::open(&object.path).await?;

    let stream = ReaderStream::new(file).inspect_err(|error| {
        tracing::error!(%error, "I/O error while streaming object body");
    });

    Response::builder()
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CONTENT_LENGTH, object.size)
        .header(header::CACHE_CONTROL, format!("public, max-age={cache_ttl_secs}"))
        .body(Body::from_stream(stream))
        .map_err(|_| Error::Internal {
            operation: "build object response".to_string(),
        })
}
