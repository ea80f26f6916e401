//! Extension-based content-type inference for stored objects.
//!
//! Objects are opaque blobs; the only content-type signal we keep is the file
//! extension carried over from the original upload filename. The table below
//! covers the formats the marketplace actually serves (listing photos and
//! documents) and everything else degrades to `application/octet-stream`.
//! This is a best-effort guess, not a verified MIME sniff: a mislabeled
//! extension produces a mislabeled content-type.

/// Map a file extension (with leading dot) to a content-type.
///
/// Matching is case-sensitive: `.PNG` does not match `.png` and falls through
/// to the default.
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".pdf" => "application/pdf",
        ".txt" => "text/plain",
        ".json" => "application/json",
        _ => "application/octet-stream",
    }
}

/// Infer the content-type for a filename from its extension.
///
/// Filenames without an extension report `application/octet-stream`.
pub fn content_type_for_filename(filename: &str) -> &'static str {
    match extension_of(filename) {
        Some(extension) => content_type_for_extension(extension),
        None => "application/octet-stream",
    }
}

/// Extract the extension of a filename, including the leading dot.
///
/// Dotfiles (`.gitignore`) and trailing dots yield `None`, matching
/// `Path::extension` semantics except that the dot is kept.
pub fn extension_of(filename: &str) -> Option<&str> {
    match filename.rfind('.') {
        Some(index) if index > 0 && index + 1 < filename.len() => Some(&filename[index..]),
        _ => None,
    }
}
