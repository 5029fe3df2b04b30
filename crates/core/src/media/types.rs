//! Media types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Upload category, used for filtering and storage-path routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    /// User avatar; one object per owner and extension.
    Avatar,
    /// Article image.
    Post,
    /// Site asset (logo, banner, favicon).
    Site,
    /// Anything else.
    #[default]
    Other,
}

/// Category stored for `post` uploads; the older schema only knows `blog`.
pub const LEGACY_POST_CATEGORY: &str = "blog";

impl MediaType {
    /// Convert to the API string value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avatar => "avatar",
            Self::Post => "post",
            Self::Site => "site",
            Self::Other => "other",
        }
    }

    /// Parse from the API string value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "avatar" => Some(Self::Avatar),
            "post" | "blog" => Some(Self::Post),
            "site" => Some(Self::Site),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Parse, routing unknown categories to [`MediaType::Other`].
    #[must_use]
    pub fn parse_or_other(s: &str) -> Self {
        Self::parse(s.trim()).unwrap_or_default()
    }

    /// Category written on the first insert attempt.
    #[must_use]
    pub fn record_category(&self) -> &'static str {
        match self {
            Self::Post => LEGACY_POST_CATEGORY,
            other => other.as_str(),
        }
    }

    /// Category for the single retry after a constraint rejection.
    #[must_use]
    pub fn fallback_category(&self) -> &'static str {
        match self {
            Self::Post => LEGACY_POST_CATEGORY,
            _ => "other",
        }
    }

    /// Stored category used when filtering records of this type.
    #[must_use]
    pub fn filter_category(&self) -> &'static str {
        self.record_category()
    }
}

/// A raw upload as received from the client.
#[derive(Debug, Clone)]
pub struct UploadInput {
    /// File bytes.
    pub data: Bytes,
    /// Declared MIME type.
    pub content_type: String,
    /// Original filename.
    pub filename: String,
    /// Category.
    pub media_type: MediaType,
    /// Namespace for the storage path (e.g. article id).
    pub context_id: Option<String>,
    /// Uploading user; required for avatars.
    pub owner_id: Option<String>,
}

impl UploadInput {
    /// Upload with only the required fields set.
    #[must_use]
    pub fn new(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        filename: impl Into<String>,
        media_type: MediaType,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            filename: filename.into(),
            media_type,
            context_id: None,
            owner_id: None,
        }
    }

    /// Set the context id.
    #[must_use]
    pub fn with_context(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    /// Set the owner id.
    #[must_use]
    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

/// Successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    /// Record id.
    pub id: Uuid,
    /// Public URL.
    pub url: String,
    /// Storage key.
    pub path: String,
}

/// Row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaRecord {
    /// Original filename.
    pub filename: String,
    /// Public URL.
    pub url: String,
    /// Storage key.
    pub path: String,
    /// Byte length.
    pub size: i64,
    /// Stored category.
    pub category: String,
}

/// Media record domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Original filename.
    pub filename: String,
    /// Public URL.
    pub url: String,
    /// Storage key.
    pub path: String,
    /// Byte length of the original upload.
    pub size: i64,
    /// Stored category.
    #[serde(rename = "type")]
    pub category: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An object deletion that failed during a batch delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectFailure {
    /// Record id.
    pub id: Uuid,
    /// Storage key.
    pub path: String,
    /// Failure description.
    pub error: String,
}

/// Outcome of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Rows removed from the repository.
    pub records_deleted: u64,
    /// Objects removed from the store.
    pub objects_deleted: usize,
    /// Objects that were already gone.
    pub objects_missing: usize,
    /// Objects that could not be removed; their records are gone regardless.
    pub object_failures: Vec<ObjectFailure>,
}
