//! [`ImageProbe`] backed by the `image` crate.
//!
//! `image::image_dimensions` only reads the file header, so probing a large
//! photo costs about as much as opening it. Formats: JPEG, PNG, GIF, WebP,
//! TIFF, BMP (the decoders enabled in `Cargo.toml`).

use super::backend::{Dimensions, ImageProbe, ProbeError};
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateProbe;

impl ImageCrateProbe {
    pub fn new() -> Self {
        Self
    }
}

impl ImageProbe for ImageCrateProbe {
    fn dimensions(&self, path: &Path) -> Result<Dimensions, ProbeError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| match e {
            image::ImageError::IoError(io) => ProbeError::Io(io),
            other => ProbeError::Unreadable {
                path: path.display().to_string(),
                message: other.to_string(),
            },
        })?;
        Ok(Dimensions { width, height })
    }
}
