//! Image loading utilities for texture data

use std::path::Path;

use thiserror::Error;

/// Image decoding errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// File could not be read
    #[error("failed to read image {path}: {source}")]
    File {
        /// Image path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Bytes are not a decodable image
    #[error("failed to decode image {path}: {source}")]
    Decode {
        /// Image path
        path: String,
        /// Underlying error
        source: image::ImageError,
    },

    /// Rows are not tightly packed RGBA
    #[error("unsupported stride: expected {expected} bytes per row, got {actual}")]
    UnsupportedStride {
        /// `width * 4`
        expected: usize,
        /// Actual row length
        actual: usize,
    },
}

/// Loaded image data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load an image from a file path and convert it to RGBA8
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path_ref = path.as_ref();
        let display = path_ref.display().to_string();

        log::debug!("Loading image from: {:?}", path_ref);

        let bytes = std::fs::read(path_ref).map_err(|source| ImageError::File {
            path: display.clone(),
            source,
        })?;
        let img = image::load_from_memory(&bytes)
            .map_err(|source| ImageError::Decode { path: display, source })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::info!("Loaded image {}x{} from {:?}", width, height, path_ref);

        Self::from_rgba(width, height, rgba_img.into_raw())
    }

    /// Wrap raw pixels, checking that every row is `width * 4` bytes
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = width as usize * 4;
        let actual = if height == 0 { 0 } else { data.len() / height as usize };
        if actual != expected || actual * height as usize != data.len() {
            return Err(ImageError::UnsupportedStride { expected, actual });
        }
        Ok(Self { data, width, height })
    }

    /// Create a solid color image (useful for testing and defaults)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);

        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }

        Self { data, width, height }
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        if self.height == 0 {
            0
        } else {
            self.data.len() / self.height as usize
        }
    }
}
