//! Common type definitions.
//!
//! IDs are aliased rather than wrapped: upload ids are plain v4 UUIDs, and
//! owner ids are opaque strings minted by the marketplace application above
//! this service - their only meaning here is as a path segment in the private
//! tree.

use uuid::Uuid;

/// Token identifying a pending direct upload.
pub type UploadId = Uuid;

/// Marketplace user identifier owning a private object.
pub type OwnerId = String;
