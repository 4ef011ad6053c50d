//! Represents a carousel: a named slot that groups images for display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A named collection of images shown in one UI slot (e.g. `homepage-banner`).
///
/// `identifier` is a lookup key, not a unique one: two carousels may share it,
/// in which case lookups by identifier see the placements of both.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Carousel {
    /// System-assigned row id.
    pub id: i64,

    /// When this carousel was created.
    pub date_created: DateTime<Utc>,

    /// Human-meaningful lookup key, at most 256 characters.
    pub identifier: String,
}
