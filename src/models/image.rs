//! Represents a stored picture asset and its metadata.

use super::ppoi::Ppoi;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A picture that can be placed in carousels.
///
/// The `Image` row stores metadata only; the bytes live on disk under the
/// media root at the relative path held in `image`.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Image {
    /// System-assigned row id.
    pub id: i64,

    /// When this image was first uploaded.
    pub date_created: DateTime<Utc>,

    /// Optional caption, at most 256 characters.
    pub title: Option<String>,

    /// Asset path relative to the media root (e.g. `carousel_image/3f/a2/...`).
    pub image: String,

    /// Pixel height as reported by the image processor at upload time.
    pub height: Option<u32>,

    /// Pixel width as reported by the image processor at upload time.
    pub width: Option<u32>,

    /// Focal point used by renderers when cropping.
    #[sqlx(try_from = "String")]
    pub ppoi: Ppoi,
}
