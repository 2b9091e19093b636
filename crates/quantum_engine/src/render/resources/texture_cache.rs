//! Texture cache
//!
//! Decodes PNG files and uploads each logical name to the GPU once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::assets::{ImageData, ImageError};
use crate::render::device::{GpuId, GraphicsDevice, TextureParams};

/// Default location of texture files
pub const DEFAULT_TEXTURE_DIR: &str = "assets/textures/";

/// Texture loading errors
#[derive(Error, Debug)]
pub enum TextureError {
    /// Texture file could not be read
    #[error("failed to read texture {path}: {source}")]
    File {
        /// Texture path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Bytes are not a decodable image
    #[error("failed to decode texture {path}: {message}")]
    Decode {
        /// Texture path
        path: String,
        /// Decoder message
        message: String,
    },

    /// Rows are not tightly packed RGBA
    #[error("unsupported stride: expected {expected}, got {actual}")]
    UnsupportedStride {
        /// `width * 4`
        expected: usize,
        /// Actual row length
        actual: usize,
    },
}

impl From<ImageError> for TextureError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::File { path, source } => Self::File { path, source },
            ImageError::Decode { path, source } => Self::Decode { path, message: source.to_string() },
            ImageError::UnsupportedStride { expected, actual } => {
                Self::UnsupportedStride { expected, actual }
            }
        }
    }
}

/// An uploaded texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    name: String,
    id: GpuId,
}

impl Texture {
    /// Logical name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Driver texture id
    pub fn id(&self) -> GpuId {
        self.id
    }
}

/// Thread-safe texture cache keyed by logical name
pub struct TextureCache {
    source_dir: PathBuf,
    params: TextureParams,
    textures: RwLock<HashMap<String, Arc<Texture>>>,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new(DEFAULT_TEXTURE_DIR)
    }
}

impl TextureCache {
    /// Create an empty cache; relative paths resolve against `source_dir`
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            params: TextureParams::default(),
            textures: RwLock::new(HashMap::new()),
        }
    }

    /// Directory relative paths are resolved against
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Load `path` under `name`, or return the texture already cached for `name`
    pub fn load(
        &self,
        device: &mut dyn GraphicsDevice,
        path: impl AsRef<Path>,
        name: &str,
    ) -> Result<Arc<Texture>, TextureError> {
        if let Some(texture) = self.get(name) {
            return Ok(texture);
        }

        let image = ImageData::from_file(self.resolve(path.as_ref()))?;
        self.upload(device, &image, name)
    }

    /// Upload already decoded pixels under `name`, or return the cached texture
    pub fn load_image(
        &self,
        device: &mut dyn GraphicsDevice,
        image: &ImageData,
        name: &str,
    ) -> Result<Arc<Texture>, TextureError> {
        if let Some(texture) = self.get(name) {
            return Ok(texture);
        }
        self.upload(device, image, name)
    }

    /// Look up a texture by name
    pub fn get(&self, name: &str) -> Option<Arc<Texture>> {
        self.textures.read().get(name).cloned()
    }

    /// Number of cached textures
    pub fn len(&self) -> usize {
        self.textures.read().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn upload(
        &self,
        device: &mut dyn GraphicsDevice,
        image: &ImageData,
        name: &str,
    ) -> Result<Arc<Texture>, TextureError> {
        let expected = image.width as usize * 4;
        if image.stride() != expected {
            return Err(TextureError::UnsupportedStride { expected, actual: image.stride() });
        }

        let id = device.create_texture(image.width, image.height, &image.data, &self.params);
        log::info!("Uploaded texture '{}' ({}x{}, id {})", name, image.width, image.height, id);

        let texture = Arc::new(Texture { name: name.to_string(), id });
        let mut textures = self.textures.write();
        Ok(Arc::clone(textures.entry(name.to_string()).or_insert(texture)))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.starts_with(&self.source_dir) {
            path.to_path_buf()
        } else {
            self.source_dir.join(path)
        }
    }
}
