//! Image processing collaborator: turns raw upload bytes into the pixel
//! dimensions recorded on an `Image` row.

use image::{ImageError, ImageReader};
use std::io::{self, Cursor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("unrecognized image format")]
    UnknownFormat,
    #[error(transparent)]
    Decode(#[from] ImageError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Pixel size of an uploaded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Computes the dimensions of an uploaded asset.
///
/// `CatalogService` calls this before anything is written, so an asset the
/// processor rejects never reaches disk or the database.
pub trait ImageProcessor: Send + Sync {
    fn dimensions(&self, data: &[u8]) -> Result<Dimensions, ProcessingError>;
}

/// Default processor: sniffs the format and reads only the image header.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderDimensions;

impl ImageProcessor for HeaderDimensions {
    fn dimensions(&self, data: &[u8]) -> Result<Dimensions, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        if reader.format().is_none() {
            return Err(ProcessingError::UnknownFormat);
        }
        let (width, height) = reader.into_dimensions()?;
        Ok(Dimensions { width, height })
    }
}
