//! Represents a placement: one image appearing in one carousel.

use super::{image::Image, ppoi::Ppoi};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Join record between a carousel and an image.
///
/// `date_created` doubles as the display order within a carousel: oldest first.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Placement {
    pub id: i64,
    pub date_created: DateTime<Utc>,
    pub carousel_id: i64,
    pub image_id: i64,
}

/// Flat row produced by joining `placements` with `images`.
#[derive(FromRow, Debug)]
pub(crate) struct PlacementImageRow {
    pub placement_id: i64,
    pub placement_date_created: DateTime<Utc>,
    pub carousel_id: i64,
    pub image_id: i64,
    pub image_date_created: DateTime<Utc>,
    pub title: Option<String>,
    pub image: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
    #[sqlx(try_from = "String")]
    pub ppoi: Ppoi,
}

impl PlacementImageRow {
    pub(crate) fn into_pair(self) -> (Image, Placement) {
        let image = Image {
            id: self.image_id,
            date_created: self.image_date_created,
            title: self.title,
            image: self.image,
            height: self.height,
            width: self.width,
            ppoi: self.ppoi,
        };
        let placement = Placement {
            id: self.placement_id,
            date_created: self.placement_date_created,
            carousel_id: self.carousel_id,
            image_id: self.image_id,
        };
        (image, placement)
    }
}
