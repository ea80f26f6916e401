//! Durable storage and retrieval of uploaded binary content on local disk.
//!
//! This module is the marketplace's stand-in for a networked object-storage
//! service: uploads (listing photos, documents, avatars) land here, addressed
//! by a URL-shaped scheme the rest of the application consumes. See
//! [`LocalObjectStorage`] for the contract.

mod content_type;
mod local;

pub use content_type::{content_type_for_extension, content_type_for_filename, extension_of};
pub use local::{
    AccessPermission, AccessRequest, LocalObjectStorage, ObjectAclPolicy, ObjectVisibility,
    ResolvedObject, UploadHandle,
};
