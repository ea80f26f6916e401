//! Filesystem-backed object storage.
//!
//! `LocalObjectStorage` maps logical object URLs onto a local directory tree,
//! standing in for a networked object-storage service. The layout under the
//! storage root is fixed:
//!
//! ```text
//! <root_dir>/
//!   public/<uuid><ext>                # publicly served objects
//!   uploads/                          # scratch space for direct uploads
//!   private/<ownerId>/<uuid><ext>     # owner-scoped objects
//! ```
//!
//! The mapping from URL to disk path is pure and deterministic: an object's
//! identity IS its path. There is no metadata index, no rename, and no delete;
//! logical existence is defined entirely by filesystem existence. The only
//! shared mutable resource is the filesystem itself, and every write target is
//! freshly and randomly named, so concurrent saves never collide.

use crate::config::StorageConfig;
use crate::errors::{Error, Result};
use crate::storage::content_type::{content_type_for_filename, extension_of};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const PUBLIC_SUBDIR: &str = "public";
const PRIVATE_SUBDIR: &str = "private";
const UPLOADS_SUBDIR: &str = "uploads";

/// Extension used when the original filename carries none.
const DEFAULT_EXTENSION: &str = ".bin";

/// Visibility class of a stored object.
///
/// `Public` objects are served without authorization; `Private` objects are
/// path-scoped by owner, though access is not enforced by this component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObjectVisibility {
    #[default]
    Public,
    Private,
}

impl fmt::Display for ObjectVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectVisibility::Public => write!(f, "public"),
            ObjectVisibility::Private => write!(f, "private"),
        }
    }
}

/// A stored object located on disk, with the metadata needed to serve it.
#[derive(Debug, Clone)]
pub struct ResolvedObject {
    /// Absolute (or root-relative) path of the file on disk.
    pub path: PathBuf,
    /// Exact byte size, reported as `Content-Length`.
    pub size: u64,
    /// Extension-inferred content-type.
    pub content_type: &'static str,
}

/// Token identifying a future direct-upload attempt.
///
/// Issued before any bytes are transferred; nothing is reserved on disk.
#[derive(Debug, Clone)]
pub struct UploadHandle {
    pub id: Uuid,
    pub upload_url: String,
}

/// Access policy attached to an object at upload-completion time.
///
/// The local shim does not persist ACLs anywhere; this type exists to keep the
/// interface shape a cloud object-store backend would actually use.
#[derive(Debug, Clone)]
pub struct ObjectAclPolicy {
    pub owner: String,
    pub visibility: ObjectVisibility,
}

/// Permission requested when checking access to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPermission {
    Read,
    Write,
}

/// An access-control query against a resolved object.
#[derive(Debug)]
pub struct AccessRequest<'a> {
    pub user_id: Option<&'a str>,
    pub object: &'a ResolvedObject,
    pub permission: AccessPermission,
}

/// Local-disk object storage partitioned into public and private trees.
///
/// Configuration is resolved once at construction and immutable afterwards, so
/// independent stores can run in parallel (tests rely on this). All operations
/// are stateless functions of their inputs plus this fixed configuration.
pub struct LocalObjectStorage {
    root_dir: PathBuf,
    public_dir: PathBuf,
    base_url: String,
}

impl LocalObjectStorage {
    /// Create a store over the configured root, ensuring the directory layout
    /// exists.
    ///
    /// Idempotent: safe to call repeatedly, never fails if the directories are
    /// already present. An unwritable filesystem that nevertheless has the
    /// layout in place surfaces errors on first write, not here.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let root_dir = config.root_dir.clone();
        let public_dir = config
            .public_dir
            .clone()
            .unwrap_or_else(|| root_dir.join(PUBLIC_SUBDIR));
        let base_url = config.base_url.trim_end_matches('/').to_string();

        std::fs::create_dir_all(&root_dir)?;
        std::fs::create_dir_all(&public_dir)?;
        // Scratch space for in-flight direct uploads; part of the fixed layout.
        std::fs::create_dir_all(root_dir.join(UPLOADS_SUBDIR))?;
        std::fs::create_dir_all(root_dir.join(PRIVATE_SUBDIR))?;

        Ok(Self {
            root_dir,
            public_dir,
            base_url,
        })
    }

    /// Issue a fresh upload handle.
    ///
    /// Pure: no disk activity, nothing reserved. The token is a v4 UUID, so
    /// the returned URL is unguessable and collisions are negligible.
    pub fn new_upload_handle(&self) -> UploadHandle {
        let id = Uuid::new_v4();
        UploadHandle {
            upload_url: format!("/api/upload/direct?uploadId={id}"),
            id,
        }
    }

    /// Persist `bytes` verbatim under a freshly minted path and return the
    /// externally addressable URL of the saved object.
    ///
    /// The extension is taken from `original_filename` (`.bin` when absent);
    /// private saves create the owner's subdirectory on demand. The write is a
    /// single whole-buffer call with no temp-file staging, so a crash mid-write
    /// can leave a truncated file. Filesystem errors propagate to the caller.
    pub async fn save_buffer(
        &self,
        bytes: &[u8],
        original_filename: &str,
        owner: Option<&str>,
        visibility: ObjectVisibility,
    ) -> Result<String> {
        let extension = extension_of(original_filename).unwrap_or(DEFAULT_EXTENSION);
        let object_name = format!("{}{extension}", Uuid::new_v4());

        let (disk_path, url) = match visibility {
            ObjectVisibility::Public => (
                self.public_dir.join(&object_name),
                format!("{}/{PUBLIC_SUBDIR}/{object_name}", self.base_url),
            ),
            ObjectVisibility::Private => {
                let owner = owner.ok_or_else(|| Error::BadRequest {
                    message: "Private uploads require an owner id".to_string(),
                })?;
                validate_owner(owner)?;
                let owner_dir = self.root_dir.join(PRIVATE_SUBDIR).join(owner);
                fs::create_dir_all(&owner_dir).await?;
                (
                    owner_dir.join(&object_name),
                    format!("{}/{PRIVATE_SUBDIR}/{owner}/{object_name}", self.base_url),
                )
            }
        };

        fs::write(&disk_path, bytes).await?;

        Ok(url)
    }

    /// Resolve an externally visible object path to its file on disk.
    ///
    /// The path is accepted with or without the configured base-URL prefix. It
    /// must deconstruct into a known visibility segment plus at least one
    /// relative segment, and the file must exist; anything else is Not-Found.
    pub async fn resolve(&self, object_path: &str) -> Result<ResolvedObject> {
        let relative = strip_url_prefix(object_path, &self.base_url);
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        if segments.len() < 2 {
            return Err(Error::object_not_found(object_path));
        }

        let (visibility, rest) = (segments[0], &segments[1..]);
        if rest.iter().any(|s| *s == "." || *s == "..") {
            return Err(Error::object_not_found(object_path));
        }

        let disk_path = match visibility {
            PUBLIC_SUBDIR => join_segments(&self.public_dir, rest),
            PRIVATE_SUBDIR => join_segments(&self.root_dir.join(PRIVATE_SUBDIR), rest),
            _ => return Err(Error::object_not_found(object_path)),
        };

        // Stat failures of any kind mean the object is not servable.
        let metadata = match fs::metadata(&disk_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Err(Error::object_not_found(object_path)),
        };

        let file_name = rest.last().expect("segment count checked above");
        Ok(ResolvedObject {
            size: metadata.len(),
            content_type: content_type_for_filename(file_name),
            path: disk_path,
        })
    }

    /// Probe for a file under the public subdirectory by relative path.
    ///
    /// Unlike [`resolve`](Self::resolve), a missing file is `None`, not an
    /// error: public-asset lookups are optimistic (e.g. to decide whether to
    /// fall back to a default image), whereas object fetches are expected to
    /// exist.
    pub async fn find_public(&self, relative_path: &str) -> Option<ResolvedObject> {
        let segments: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() || segments.iter().any(|s| *s == "." || *s == "..") {
            return None;
        }

        let disk_path = join_segments(&self.public_dir, &segments);
        let metadata = match fs::metadata(&disk_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return None,
        };

        let file_name = segments.last().expect("segments checked non-empty");
        Some(ResolvedObject {
            size: metadata.len(),
            content_type: content_type_for_filename(file_name),
            path: disk_path,
        })
    }

    /// Best-effort canonicalization of a path string into this store's URL
    /// shape.
    ///
    /// Lossy by design and never fails: paths already under the base URL pass
    /// through unchanged, absolute http(s) URLs are reduced to their path
    /// component (malformed ones are returned as-is), and anything else is
    /// treated as a bare filename for a public object.
    pub fn normalize_url(&self, raw_path: &str) -> String {
        if raw_path == self.base_url
            || raw_path.starts_with(&format!("{}/", self.base_url))
        {
            return raw_path.to_string();
        }

        if raw_path.starts_with("http://") || raw_path.starts_with("https://") {
            return match url::Url::parse(raw_path) {
                Ok(url) => url.path().to_string(),
                Err(_) => raw_path.to_string(),
            };
        }

        format!(
            "{}/{PUBLIC_SUBDIR}/{}",
            self.base_url,
            raw_path.trim_start_matches('/')
        )
    }

    /// Record an access policy for an object.
    ///
    /// On the local shim this is path normalization and nothing more: no ACL
    /// is persisted, the file is not checked for existence, and ownership is
    /// not verified. A cloud object-store backend would set a real object ACL
    /// here.
    pub fn set_access_policy(&self, raw_path: &str, _policy: &ObjectAclPolicy) -> String {
        self.normalize_url(raw_path)
    }

    /// Check whether a request may access an object.
    ///
    /// Always grants: authorization happens in the HTTP layer above this
    /// component (session and role checks run before it is invoked), and
    /// per-object enforcement is deferred to a real object-store backend.
    pub fn can_access(&self, _request: &AccessRequest<'_>) -> bool {
        true
    }
}

/// Strip `prefix` from `path` only on a segment boundary, so `/storagex/...`
/// is not mistaken for a base-URL-prefixed path.
fn strip_url_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    match path.strip_prefix(prefix) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

fn join_segments(base: &Path, segments: &[&str]) -> PathBuf {
    segments.iter().fold(base.to_path_buf(), |path, segment| path.join(segment))
}

/// Owner ids become path segments, so they must be single, plain components.
fn validate_owner(owner: &str) -> Result<()> {
    if owner.is_empty()
        || owner == "."
        || owner == ".."
        || owner.contains('/')
        || owner.contains('\\')
    {
        return Err(Error::BadRequest {
            message: format!("Invalid owner id: {owner:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store(root: &Path) -> LocalObjectStorage {
        let config = StorageConfig {
            root_dir: root.to_path_buf(),
            ..StorageConfig::default()
        };
        LocalObjectStorage::new(&config).unwrap()
    }

    #[test]
    fn initialization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            root_dir: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };

        for _ in 0..3 {
            LocalObjectStorage::new(&config).unwrap();
        }

        for subdir in ["public", "uploads", "private"] {
            assert!(dir.path().join(subdir).is_dir(), "missing {subdir}");
        }
    }

    #[tokio::test]
    async fn save_and_resolve_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let body = b"listing photo bytes";

        let url = store
            .save_buffer(body, "photo.png", None, ObjectVisibility::Public)
            .await
            .unwrap();
        assert!(url.starts_with("/storage/public/"));
        assert!(url.ends_with(".png"));

        let object = store.resolve(&url).await.unwrap();
        assert_eq!(object.size, body.len() as u64);
        assert_eq!(object.content_type, "image/png");
        assert_eq!(std::fs::read(&object.path).unwrap(), body);
    }

    #[tokio::test]
    async fn resolve_accepts_paths_without_base_url_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let url = store
            .save_buffer(b"data", "doc.pdf", None, ObjectVisibility::Public)
            .await
            .unwrap();
        let unprefixed = url.strip_prefix("/storage").unwrap();

        let object = store.resolve(unprefixed).await.unwrap();
        assert_eq!(object.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn private_saves_are_owner_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let url = store
            .save_buffer(b"deed scan", "deed.pdf", Some("user-7"), ObjectVisibility::Private)
            .await
            .unwrap();
        assert!(url.starts_with("/storage/private/user-7/"));

        let object = store.resolve(&url).await.unwrap();
        assert!(object.path.starts_with(dir.path().join("private").join("user-7")));

        // The same object is not reachable through a path omitting the owner.
        let file_name = url.rsplit('/').next().unwrap();
        let without_owner = format!("/storage/private/{file_name}");
        assert!(store.resolve(&without_owner).await.is_err());

        // And public saves never land under private/.
        let public_url = store
            .save_buffer(b"photo", "p.jpg", None, ObjectVisibility::Public)
            .await
            .unwrap();
        let public_object = store.resolve(&public_url).await.unwrap();
        assert!(public_object.path.starts_with(dir.path().join("public")));
        assert!(!public_object.path.starts_with(dir.path().join("private")));
    }

    #[tokio::test]
    async fn private_save_without_owner_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let result = store
            .save_buffer(b"x", "x.txt", None, ObjectVisibility::Private)
            .await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let traversal = store
            .save_buffer(b"x", "x.txt", Some("../escape"), ObjectVisibility::Private)
            .await;
        assert!(matches!(traversal, Err(Error::BadRequest { .. })));
    }

    #[tokio::test]
    async fn missing_extension_defaults_to_bin() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let url = store
            .save_buffer(b"blob", "", None, ObjectVisibility::Public)
            .await
            .unwrap();
        assert!(url.ends_with(".bin"));

        let object = store.resolve(&url).await.unwrap();
        assert_eq!(object.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn not_found_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        // Too few segments.
        assert!(store.resolve("/storage/public").await.is_err());
        assert!(store.resolve("/storage").await.is_err());
        // Unrecognized visibility segment.
        assert!(store.resolve("/storage/shared/a.txt").await.is_err());
        // Nonexistent file under a well-shaped path.
        assert!(store.resolve("/storage/public/nope.png").await.is_err());
        // Traversal segments are structurally invalid.
        assert!(store.resolve("/storage/public/../private/x").await.is_err());
    }

    #[tokio::test]
    async fn resolve_never_errors_for_existing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let url = store
            .save_buffer(b"ok", "ok.txt", None, ObjectVisibility::Public)
            .await
            .unwrap();
        assert!(store.resolve(&url).await.is_ok());
    }

    #[tokio::test]
    async fn find_public_probes_without_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        assert!(store.find_public("banner.png").await.is_none());
        assert!(store.find_public("../private/x").await.is_none());
        assert!(store.find_public("").await.is_none());

        std::fs::write(dir.path().join("public").join("banner.png"), b"img").unwrap();
        let found = store.find_public("banner.png").await.unwrap();
        assert_eq!(found.size, 3);
        assert_eq!(found.content_type, "image/png");
    }

    #[test]
    fn normalize_url_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        // Already-normalized paths pass through unchanged.
        let normalized = "/storage/public/abc.png";
        assert_eq!(store.normalize_url(normalized), normalized);
        assert_eq!(store.normalize_url(&store.normalize_url("photo.png")), store.normalize_url("photo.png"));

        // Absolute URLs reduce to their path component.
        assert_eq!(
            store.normalize_url("https://cdn.haven.example/storage/public/abc.png"),
            "/storage/public/abc.png"
        );

        // Malformed URLs fall back to the input unchanged.
        let malformed = "http://[not-a-host/abc";
        assert_eq!(store.normalize_url(malformed), malformed);

        // Bare filenames become public-object URLs.
        assert_eq!(store.normalize_url("photo.png"), "/storage/public/photo.png");

        // A base-URL look-alike is not treated as prefixed.
        assert_eq!(store.normalize_url("/storagex/a"), "/storage/public/storagex/a");
    }

    #[test]
    fn set_access_policy_only_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let policy = ObjectAclPolicy {
            owner: "user-1".to_string(),
            visibility: ObjectVisibility::Private,
        };

        // No file exists and none is checked; the path is merely normalized.
        assert_eq!(store.set_access_policy("photo.png", &policy), "/storage/public/photo.png");
    }

    #[test]
    fn check_access_always_grants() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let object = ResolvedObject {
            path: dir.path().join("private/user-1/x.bin"),
            size: 0,
            content_type: "application/octet-stream",
        };

        for user_id in [None, Some("user-1"), Some("someone-else")] {
            assert!(store.can_access(&AccessRequest {
                user_id,
                object: &object,
                permission: AccessPermission::Read,
            }));
        }
    }

    #[test]
    fn upload_handles_are_distinct_and_disk_free() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());

        let first = store.new_upload_handle();
        let second = store.new_upload_handle();
        assert_ne!(first.id, second.id);
        assert_eq!(first.upload_url, format!("/api/upload/direct?uploadId={}", first.id));

        // Nothing is reserved on disk for an issued handle.
        let entries: Vec<_> = std::fs::read_dir(dir.path().join("uploads")).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn uppercase_extension_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(dir.path());
        let body = vec![0u8; 1024];

        let url = store
            .save_buffer(&body, "photo.PNG", Some("user-42"), ObjectVisibility::Private)
            .await
            .unwrap();
        assert!(url.starts_with("/storage/private/user-42/"));
        assert!(url.ends_with(".PNG"));

        let file_name = url.rsplit('/').next().unwrap();
        let stem = file_name.strip_suffix(".PNG").unwrap();
        assert!(stem.parse::<Uuid>().is_ok());

        let object = store.resolve(&url).await.unwrap();
        assert_eq!(object.size, 1024);
        // The extension table is case-sensitive, so .PNG is not image/png.
        assert_eq!(object.content_type, "application/octet-stream");
    }
}
