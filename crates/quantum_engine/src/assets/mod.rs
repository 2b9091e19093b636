//! Asset decoding
//!
//! File formats that are decoded on the CPU before being handed to a cache.

pub mod image_loader;

pub use image_loader::{ImageData, ImageError};
