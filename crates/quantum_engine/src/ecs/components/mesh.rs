//! Mesh component
//!
//! Vertex data plus the names of the texture and shaders it is drawn with.
//! Mesh files are JSON documents stored under the models directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::component::{impl_component, ComponentKind, ComponentType};

/// Default location of mesh files
pub const DEFAULT_MESH_DIR: &str = "assets/models/";

/// Fewest floats per vertex: position then texture coordinates
pub const MIN_VERT_SIZE: i32 = 5;

/// Most floats per vertex whose byte stride still fits an `i32`
pub const MAX_VERT_SIZE: i32 = i32::MAX / 4;

/// Mesh loading errors
#[derive(Error, Debug)]
pub enum MeshError {
    /// `load` was called on a mesh that already holds file data
    #[error("mesh already loaded")]
    AlreadyLoaded,

    /// Mesh file could not be read
    #[error("failed to read mesh file {path}: {source}")]
    File {
        /// Resolved path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Mesh file is not a valid mesh document
    #[error("failed to parse mesh file {path}: {source}")]
    Parse {
        /// Resolved path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// `vertSize` cannot hold a position and texture coordinates
    #[error(
        "mesh file {path} has vertSize {vert_size}, expected {min}..={max}",
        min = MIN_VERT_SIZE,
        max = MAX_VERT_SIZE
    )]
    InvalidVertexSize {
        /// Resolved path
        path: PathBuf,
        /// Value read from the file
        vert_size: i32,
    },
}

/// Raw mesh document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeshData {
    /// Whether `indices` should be used for drawing
    pub indexed: bool,
    /// Interleaved vertex floats: position (3) then texture coordinates (2)
    pub verts: Vec<f32>,
    /// Element indices
    pub indices: Vec<u32>,
    /// Floats per vertex
    pub vert_size: i32,
    /// Texture file name, empty for none
    pub texture_file: String,
    /// Fragment shader file name
    pub frag_shader_file: String,
    /// Vertex shader file name
    pub vert_shader_file: String,
}

/// How a mesh is submitted to the GPU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// Indexed triangle fan over the element buffer
    IndexedFan,
    /// Plain triangle list
    Triangles,
}

/// Primitive mode and element count for a draw call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawInfo {
    /// Primitive mode
    pub mode: DrawMode,
    /// Number of indices or vertices
    pub count: i32,
}

impl MeshData {
    /// Whether `vert_size` fits the vertex layout the renderer binds
    pub fn has_valid_vert_size(&self) -> bool {
        (MIN_VERT_SIZE..=MAX_VERT_SIZE).contains(&self.vert_size)
    }

    /// Draw call parameters for this data
    pub fn draw_info(&self) -> DrawInfo {
        if self.indexed {
            DrawInfo {
                mode: DrawMode::IndexedFan,
                count: i32::try_from(self.indices.len()).unwrap_or(i32::MAX),
            }
        } else {
            let vertices = if self.vert_size > 0 {
                self.verts.len() / self.vert_size as usize
            } else {
                0
            };
            DrawInfo {
                mode: DrawMode::Triangles,
                count: i32::try_from(vertices).unwrap_or(i32::MAX),
            }
        }
    }
}

#[derive(Debug, Default)]
struct MeshState {
    data: Arc<MeshData>,
    loaded: bool,
}

/// ECS mesh component
#[derive(Debug)]
pub struct Mesh {
    source_dir: PathBuf,
    state: RwLock<MeshState>,
}

impl ComponentKind for Mesh {
    const TYPE: ComponentType = ComponentType::Mesh;
}

impl_component!(Mesh);

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Empty mesh resolving files against [`DEFAULT_MESH_DIR`]
    pub fn new() -> Self {
        Self::with_source_dir(DEFAULT_MESH_DIR)
    }

    /// Empty mesh resolving files against `dir`
    pub fn with_source_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: dir.into(),
            state: RwLock::new(MeshState::default()),
        }
    }

    /// Mesh holding the given data
    pub fn from_data(data: MeshData) -> Self {
        let mesh = Self::new();
        mesh.set(data);
        mesh
    }

    /// Current mesh data
    pub fn data(&self) -> Arc<MeshData> {
        Arc::clone(&self.state.read().data)
    }

    /// Replace the mesh data
    pub fn set(&self, data: MeshData) {
        self.state.write().data = Arc::new(data);
    }

    /// Whether `load` has succeeded
    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    /// Load mesh data from a file, once
    ///
    /// Names already inside the source directory are used as given; others
    /// are joined onto it. A second call fails with [`MeshError::AlreadyLoaded`]
    /// and keeps the first data.
    pub fn load(&self, file_name: impl AsRef<Path>) -> Result<(), MeshError> {
        let mut state = self.state.write();
        if state.loaded {
            return Err(MeshError::AlreadyLoaded);
        }

        let path = self.resolve(file_name.as_ref());
        let contents = std::fs::read_to_string(&path).map_err(|source| MeshError::File {
            path: path.clone(),
            source,
        })?;
        let data: MeshData =
            serde_json::from_str(&contents).map_err(|source| MeshError::Parse { path: path.clone(), source })?;
        if !data.has_valid_vert_size() {
            return Err(MeshError::InvalidVertexSize { path, vert_size: data.vert_size });
        }

        state.data = Arc::new(data);
        state.loaded = true;
        Ok(())
    }

    fn resolve(&self, file_name: &Path) -> PathBuf {
        if file_name.starts_with(&self.source_dir) {
            file_name.to_path_buf()
        } else {
            self.source_dir.join(file_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = r#"{
        "indexed": true,
        "verts": [0,0,0, 0,0,  1,0,0, 1,0,  1,1,0, 1,1,  0,1,0, 0,1],
        "indices": [0, 1, 2, 3],
        "vertSize": 5,
        "textureFile": "",
        "fragShaderFile": "basic.frag",
        "vertShaderFile": "basic.vert"
    }"#;

    #[test]
    fn test_load_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("quad.json"), QUAD).unwrap();
        std::fs::write(dir.path().join("other.json"), r#"{"vertSize": 8}"#).unwrap();

        let mesh = Mesh::with_source_dir(dir.path());
        mesh.load("quad.json").unwrap();
        assert!(mesh.is_loaded());
        assert_eq!(mesh.data().vert_size, 5);
        assert_eq!(mesh.data().vert_shader_file, "basic.vert");

        assert!(matches!(mesh.load("other.json"), Err(MeshError::AlreadyLoaded)));
        assert_eq!(mesh.data().vert_size, 5);
    }

    #[test]
    fn test_path_inside_source_dir_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("quad.json");
        std::fs::write(&full, QUAD).unwrap();

        let mesh = Mesh::with_source_dir(dir.path());
        mesh.load(&full).unwrap();
        assert_eq!(mesh.data().indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_failed_load_can_be_retried() {
        let dir = tempfile::tempdir().unwrap();
        let mesh = Mesh::with_source_dir(dir.path());
        assert!(matches!(mesh.load("missing.json"), Err(MeshError::File { .. })));

        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(mesh.load("broken.json"), Err(MeshError::Parse { .. })));
        assert!(!mesh.is_loaded());
    }

    #[test]
    fn test_short_vertex_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("points.json"), r#"{"verts": [0, 0, 0], "vertSize": 3}"#).unwrap();
        std::fs::write(dir.path().join("huge.json"), r#"{"vertSize": 2147483647}"#).unwrap();

        let mesh = Mesh::with_source_dir(dir.path());
        assert!(matches!(
            mesh.load("points.json"),
            Err(MeshError::InvalidVertexSize { vert_size: 3, .. })
        ));
        assert!(matches!(mesh.load("huge.json"), Err(MeshError::InvalidVertexSize { .. })));
        assert!(!mesh.is_loaded());
        assert_eq!(mesh.data().vert_size, 0);

        std::fs::write(dir.path().join("quad.json"), QUAD).unwrap();
        mesh.load("quad.json").unwrap();
        assert!(mesh.is_loaded());
    }

    #[test]
    fn test_draw_info() {
        let indexed: MeshData = serde_json::from_str(QUAD).unwrap();
        assert_eq!(indexed.draw_info(), DrawInfo { mode: DrawMode::IndexedFan, count: 4 });

        let plain = MeshData { verts: vec![0.0; 15], vert_size: 5, ..MeshData::default() };
        assert_eq!(plain.draw_info(), DrawInfo { mode: DrawMode::Triangles, count: 3 });
    }
}
