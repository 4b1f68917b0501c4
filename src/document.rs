//! Image acquisition and export collaborators for the editor core.
//!
//! Decoding happens up front; the editor only ever sees fully decoded RGBA
//! pixels. Anything that fails to decode is reported as a non-image input
//! and leaves editor state untouched.

use std::io;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

pub type DocumentResult<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("not an image file: {path}")]
    NotAnImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("not an image: {0}")]
    InvalidImageData(#[source] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// A decoded image with known pixel dimensions, ready for editing.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn from_path(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| DocumentError::NotAnImage {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            pixels: decoded.to_rgba8(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> DocumentResult<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(DocumentError::InvalidImageData)?;
        Ok(Self {
            pixels: decoded.to_rgba8(),
        })
    }

    pub fn from_pixels(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Writes a composed raster as a PNG file.
pub fn save_png(path: impl AsRef<Path>, raster: &RgbaImage) -> DocumentResult<()> {
    raster
        .save_with_format(path.as_ref(), ImageFormat::Png)
        .map_err(DocumentError::Encode)
}
