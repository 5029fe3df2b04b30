//! Storage key derivation.
//!
//! | type     | key                                              |
//! |----------|--------------------------------------------------|
//! | `avatar` | `avatars/{owner}.{ext}`                          |
//! | `post`   | `posts/{context or "draft"}-{YYYYMMDD}/{id}.{ext}` |
//! | `site`   | `site/{id}.{ext}`                                |
//! | `other`  | `others/{YYYYMMDD}/{id}.{ext}`                   |

use chrono::NaiveDate;
use uuid::Uuid;

use super::error::MediaError;
use super::types::MediaType;

/// Everything that determines a storage key.
#[derive(Debug, Clone, Copy)]
pub struct PathParams<'a> {
    /// Category.
    pub media_type: MediaType,
    /// Uploading user.
    pub owner_id: Option<&'a str>,
    /// Path namespace.
    pub context_id: Option<&'a str>,
    /// File extension without the dot.
    pub extension: &'a str,
    /// Upload date (UTC).
    pub date: NaiveDate,
    /// Fresh object id.
    pub object_id: Uuid,
}

/// Derive the storage key for an upload.
///
/// # Errors
///
/// Returns `MediaError::Validation` for an avatar without an owner id, or
/// with one that is not a single safe key segment.
pub fn derive_path(params: &PathParams<'_>) -> Result<String, MediaError> {
    let ext = params.extension;
    let day = params.date.format("%Y%m%d");
    let id = params.object_id;

    let path = match params.media_type {
        MediaType::Avatar => {
            let owner = params
                .owner_id
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| MediaError::validation("avatar uploads require an owner id"))?;
            // Owner ids map one-to-one onto avatar keys.
            if sanitize_segment(owner) != owner {
                return Err(MediaError::validation(
                    "owner id may only contain letters, digits, '-' and '_'",
                ));
            }
            format!("avatars/{owner}.{ext}")
        }
        MediaType::Post => {
            let context = params
                .context_id
                .map(sanitize_segment)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "draft".to_string());
            format!("posts/{context}-{day}/{id}.{ext}")
        }
        MediaType::Site => format!("site/{id}.{ext}"),
        MediaType::Other => format!("others/{day}/{id}.{ext}"),
    };
    Ok(path)
}

/// Pick the file extension for a content type.
///
/// The filename's own extension is kept only when it is one of the spellings
/// of that type (`jpeg` for `image/jpeg`); otherwise the canonical one is used.
/// Unknown types yield `None`.
#[must_use]
pub fn file_extension(filename: &str, content_type: &str) -> Option<String> {
    let known = extensions_for_mime(content_type)?;
    let from_name = filename
        .rsplit_once('.')
        .filter(|(stem, _)| !stem.is_empty())
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| known.contains(&ext.as_str()));

    from_name.or_else(|| known.first().map(|ext| (*ext).to_string()))
}

/// Accepted extensions per image type; the first is canonical.
fn extensions_for_mime(content_type: &str) -> Option<&'static [&'static str]> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some(&["jpg", "jpeg"]),
        "image/png" => Some(&["png"]),
        "image/gif" => Some(&["gif"]),
        "image/webp" => Some(&["webp"]),
        "image/svg+xml" => Some(&["svg"]),
        "image/avif" => Some(&["avif"]),
        _ => None,
    }
}

/// Restrict an id to characters that are safe inside a single key segment.
///
/// Only ASCII alphanumeric characters, hyphens, and underscores survive.
/// Distinct inputs may collapse to the same segment; post keys stay unique
/// through their object id.
pub(crate) fn sanitize_segment(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
