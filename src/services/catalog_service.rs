//! src/services/catalog_service.rs
//!
//! CatalogService: the data-access layer for carousels, images and
//! placements. Metadata lives in SQLite; image payloads go through the
//! `ImageProcessor` for their dimensions and are kept on disk by `AssetStore`.
//!
//! Deleting a carousel or an image removes its placements in the same
//! transaction, so a placement never outlives either side.
//!
//! Every transaction that reads before it writes opens with
//! `BEGIN IMMEDIATE`. A deferred transaction would take a shared lock on its
//! first read and SQLite refuses to upgrade it while another writer is
//! pending, failing with `database is locked` instead of waiting.

use crate::{
    models::{
        carousel::Carousel,
        image::Image,
        placement::{Placement, PlacementImageRow},
        ppoi::Ppoi,
    },
    services::{
        asset_store::AssetStore,
        image_processor::{Dimensions, ImageProcessor},
    },
};
use bytes::Bytes;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::{io, sync::Arc};
use thiserror::Error;
use tokio::fs::File;
use tracing::{debug, info, warn};

/// Upper bound, in characters, for `identifier` and `title`.
pub const MAX_TEXT_LEN: usize = 256;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("carousel `{0}` not found")]
    CarouselNotFound(i64),
    #[error("image `{0}` not found")]
    ImageNotFound(i64),
    #[error("placement `{0}` not found")]
    PlacementNotFound(i64),
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// An upload waiting to become an `Image`.
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Client-supplied file name; only its sanitized final component is kept.
    pub filename: String,
    pub data: Bytes,
    pub title: Option<String>,
    /// Defaults to the center when absent.
    pub ppoi: Option<Ppoi>,
}

#[derive(Clone)]
pub struct CatalogService {
    /// Shared SQLite connection pool used for all metadata.
    pub db: Arc<SqlitePool>,

    /// On-disk store for image payloads.
    pub assets: AssetStore,

    processor: Arc<dyn ImageProcessor>,
}

fn ensure_text_len(field: &'static str, value: &str) -> CatalogResult<()> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(CatalogError::Validation {
            field,
            reason: format!("must be at most {} characters", MAX_TEXT_LEN),
        });
    }
    Ok(())
}

impl CatalogService {
    pub fn new(
        db: Arc<SqlitePool>,
        assets: AssetStore,
        processor: Arc<dyn ImageProcessor>,
    ) -> Self {
        Self {
            db,
            assets,
            processor,
        }
    }

    /// Open a transaction that holds the write lock from its first statement.
    async fn begin_write(&self) -> CatalogResult<Transaction<'static, Sqlite>> {
        Ok(self.db.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Remove an asset that no row references any more, logging on failure.
    async fn discard_asset(&self, relative: &str) {
        if let Err(err) = self.assets.remove(relative).await {
            warn!("failed to remove unreferenced asset {}: {}", relative, err);
        }
    }

    /// Run the processor over an upload, rejecting empty or unreadable assets.
    fn process_asset(&self, data: &[u8]) -> CatalogResult<Dimensions> {
        if data.is_empty() {
            return Err(CatalogError::Validation {
                field: "image",
                reason: "an image file is required".into(),
            });
        }
        self.processor
            .dimensions(data)
            .map_err(|err| CatalogError::Validation {
                field: "image",
                reason: err.to_string(),
            })
    }

    // --- Carousels ---

    /// Create a carousel. Identifiers are not unique; a duplicate simply
    /// produces a second carousel.
    pub async fn create_carousel(&self, identifier: &str) -> CatalogResult<Carousel> {
        ensure_text_len("identifier", identifier)?;

        let carousel = sqlx::query_as::<_, Carousel>(
            "INSERT INTO carousels (date_created, identifier) VALUES (?, ?)
             RETURNING id, date_created, identifier",
        )
        .bind(Utc::now())
        .bind(identifier)
        .fetch_one(&*self.db)
        .await?;

        info!(id = carousel.id, identifier, "created carousel");
        Ok(carousel)
    }

    pub async fn get_carousel(&self, id: i64) -> CatalogResult<Carousel> {
        sqlx::query_as::<_, Carousel>(
            "SELECT id, date_created, identifier FROM carousels WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(CatalogError::CarouselNotFound(id))
    }

    /// List carousels newest first, optionally only those with `identifier`.
    pub async fn list_carousels(&self, identifier: Option<&str>) -> CatalogResult<Vec<Carousel>> {
        let rows = match identifier {
            Some(identifier) => {
                sqlx::query_as::<_, Carousel>(
                    "SELECT id, date_created, identifier FROM carousels
                     WHERE identifier = ? ORDER BY date_created DESC, id DESC",
                )
                .bind(identifier)
                .fetch_all(&*self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, Carousel>(
                    "SELECT id, date_created, identifier FROM carousels
                     ORDER BY date_created DESC, id DESC",
                )
                .fetch_all(&*self.db)
                .await?
            }
        };
        Ok(rows)
    }

    /// Delete a carousel and all of its placements in one transaction.
    pub async fn delete_carousel(&self, id: i64) -> CatalogResult<Carousel> {
        let mut tx = self.begin_write().await?;

        let carousel = sqlx::query_as::<_, Carousel>(
            "SELECT id, date_created, identifier FROM carousels WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CatalogError::CarouselNotFound(id))?;

        let removed = sqlx::query("DELETE FROM placements WHERE carousel_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM carousels WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id, placements = removed, "deleted carousel");
        Ok(carousel)
    }

    // --- Images ---

    /// Process, store and record a new image.
    ///
    /// Nothing is written if validation or processing fails. If the row
    /// insert fails the freshly stored asset is removed again.
    pub async fn create_image(&self, upload: NewImage) -> CatalogResult<Image> {
        if let Some(title) = upload.title.as_deref() {
            ensure_text_len("title", title)?;
        }
        let dims = self.process_asset(&upload.data)?;
        let relative = self.assets.store(&upload.filename, &upload.data).await?;
        let ppoi = upload.ppoi.unwrap_or_default();

        let insert_result = sqlx::query_as::<_, Image>(
            "INSERT INTO images (date_created, title, image, height, width, ppoi)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, date_created, title, image, height, width, ppoi",
        )
        .bind(Utc::now())
        .bind(upload.title.as_deref())
        .bind(&relative)
        .bind(dims.height)
        .bind(dims.width)
        .bind(ppoi.to_string())
        .fetch_one(&*self.db)
        .await;

        match insert_result {
            Ok(image) => {
                info!(
                    id = image.id,
                    path = %image.image,
                    width = dims.width,
                    height = dims.height,
                    "created image"
                );
                Ok(image)
            }
            Err(err) => {
                self.discard_asset(&relative).await;
                Err(CatalogError::Sqlx(err))
            }
        }
    }

    pub async fn get_image(&self, id: i64) -> CatalogResult<Image> {
        sqlx::query_as::<_, Image>(
            "SELECT id, date_created, title, image, height, width, ppoi
             FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(CatalogError::ImageNotFound(id))
    }

    /// List images newest first.
    pub async fn list_images(&self) -> CatalogResult<Vec<Image>> {
        let rows = sqlx::query_as::<_, Image>(
            "SELECT id, date_created, title, image, height, width, ppoi
             FROM images ORDER BY date_created DESC, id DESC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    pub async fn set_image_title(&self, id: i64, title: Option<&str>) -> CatalogResult<Image> {
        if let Some(title) = title {
            ensure_text_len("title", title)?;
        }
        sqlx::query_as::<_, Image>(
            "UPDATE images SET title = ? WHERE id = ?
             RETURNING id, date_created, title, image, height, width, ppoi",
        )
        .bind(title)
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(CatalogError::ImageNotFound(id))
    }

    /// Move the focal point of an image.
    pub async fn set_image_ppoi(&self, id: i64, ppoi: Ppoi) -> CatalogResult<Image> {
        let image = sqlx::query_as::<_, Image>(
            "UPDATE images SET ppoi = ? WHERE id = ?
             RETURNING id, date_created, title, image, height, width, ppoi",
        )
        .bind(ppoi.to_string())
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(CatalogError::ImageNotFound(id))?;

        debug!(id, ppoi = %image.ppoi, "updated image ppoi");
        Ok(image)
    }

    /// Re-upload the asset behind an image.
    ///
    /// Dimensions are recomputed from the new bytes, so they never describe
    /// a previous asset. The old path is read and the row updated under one
    /// write lock; the old file is removed after commit.
    pub async fn replace_image_asset(
        &self,
        id: i64,
        filename: &str,
        data: &[u8],
    ) -> CatalogResult<Image> {
        let dims = self.process_asset(data)?;
        let relative = self.assets.store(filename, data).await?;

        let (previous, image) = match self.swap_asset(id, &relative, dims).await {
            Ok(swapped) => swapped,
            Err(err) => {
                self.discard_asset(&relative).await;
                return Err(err);
            }
        };

        self.discard_asset(&previous).await;

        info!(id, path = %image.image, "replaced image asset");
        Ok(image)
    }

    /// Point image `id` at `relative`, returning the path it pointed at before.
    async fn swap_asset(
        &self,
        id: i64,
        relative: &str,
        dims: Dimensions,
    ) -> CatalogResult<(String, Image)> {
        let mut tx = self.begin_write().await?;

        let previous = sqlx::query_scalar::<_, String>("SELECT image FROM images WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CatalogError::ImageNotFound(id))?;

        let image = sqlx::query_as::<_, Image>(
            "UPDATE images SET image = ?, height = ?, width = ? WHERE id = ?
             RETURNING id, date_created, title, image, height, width, ppoi",
        )
        .bind(relative)
        .bind(dims.height)
        .bind(dims.width)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((previous, image))
    }

    /// Fetch an image together with an open handle on its asset.
    ///
    /// A row whose file has gone missing is reported as not found.
    pub async fn open_image_asset(&self, id: i64) -> CatalogResult<(Image, File)> {
        let image = self.get_image(id).await?;
        let file = self.assets.open(&image.image).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                CatalogError::ImageNotFound(id)
            } else {
                CatalogError::Io(err)
            }
        })?;
        Ok((image, file))
    }

    /// Delete an image and every placement of it, across all carousels, in
    /// one transaction. The asset file is removed after commit.
    pub async fn delete_image(&self, id: i64) -> CatalogResult<Image> {
        let mut tx = self.begin_write().await?;

        let image = sqlx::query_as::<_, Image>(
            "SELECT id, date_created, title, image, height, width, ppoi
             FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CatalogError::ImageNotFound(id))?;

        let removed = sqlx::query("DELETE FROM placements WHERE image_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.discard_asset(&image.image).await;

        info!(id, placements = removed, "deleted image");
        Ok(image)
    }

    // --- Placements ---

    /// Place an image in a carousel.
    ///
    /// Both ends are checked inside the inserting transaction, so a missing
    /// carousel or image yields a not-found error and no placement.
    pub async fn place(&self, carousel_id: i64, image_id: i64) -> CatalogResult<Placement> {
        let mut tx = self.begin_write().await?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM carousels WHERE id = ?")
            .bind(carousel_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CatalogError::CarouselNotFound(carousel_id))?;

        sqlx::query_scalar::<_, i64>("SELECT id FROM images WHERE id = ?")
            .bind(image_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CatalogError::ImageNotFound(image_id))?;

        let placement = sqlx::query_as::<_, Placement>(
            "INSERT INTO placements (date_created, carousel_id, image_id) VALUES (?, ?, ?)
             RETURNING id, date_created, carousel_id, image_id",
        )
        .bind(Utc::now())
        .bind(carousel_id)
        .bind(image_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = placement.id,
            carousel_id, image_id, "placed image in carousel"
        );
        Ok(placement)
    }

    pub async fn get_placement(&self, id: i64) -> CatalogResult<Placement> {
        sqlx::query_as::<_, Placement>(
            "SELECT id, date_created, carousel_id, image_id FROM placements WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(CatalogError::PlacementNotFound(id))
    }

    /// Remove a single placement, leaving its carousel and image alone.
    pub async fn delete_placement(&self, id: i64) -> CatalogResult<Placement> {
        let placement = sqlx::query_as::<_, Placement>(
            "DELETE FROM placements WHERE id = ?
             RETURNING id, date_created, carousel_id, image_id",
        )
        .bind(id)
        .fetch_optional(&*self.db)
        .await?
        .ok_or(CatalogError::PlacementNotFound(id))?;

        info!(id, "deleted placement");
        Ok(placement)
    }

    /// Images placed in carousels named `identifier`, in display order.
    ///
    /// Display order is placement `date_created` ascending, ties broken by
    /// placement id. When several carousels share the identifier their
    /// placements are merged into one sequence. An unknown identifier and a
    /// carousel without placements both give an empty list.
    pub async fn list_placements(
        &self,
        carousel_identifier: &str,
    ) -> CatalogResult<Vec<(Image, Placement)>> {
        let rows = sqlx::query_as::<_, PlacementImageRow>(
            "SELECT p.id AS placement_id,
                    p.date_created AS placement_date_created,
                    p.carousel_id AS carousel_id,
                    p.image_id AS image_id,
                    i.date_created AS image_date_created,
                    i.title AS title,
                    i.image AS image,
                    i.height AS height,
                    i.width AS width,
                    i.ppoi AS ppoi
             FROM placements p
             JOIN carousels c ON c.id = p.carousel_id
             JOIN images i ON i.id = p.image_id
             WHERE c.identifier = ?
             ORDER BY p.date_created ASC, p.id ASC",
        )
        .bind(carousel_identifier)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows.into_iter().map(PlacementImageRow::into_pair).collect())
    }
}
