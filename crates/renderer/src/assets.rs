//! Named, read-only assets: the two fractal shader sources and the four
//! palette ramps. The renderer only ever asks for assets by file name.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::AssetError;

pub const VERTEX_SHADER_ASSET: &str = "vertexshader.glsl";
pub const FRAGMENT_SHADER_ASSET: &str = "fragmentshader.glsl";

/// Source of named asset bytes.
pub trait AssetLoader: Send + Sync {
    fn load_bytes(&self, name: &str) -> Result<Vec<u8>, AssetError>;

    fn load_text(&self, name: &str) -> Result<String, AssetError> {
        let bytes = self.load_bytes(name)?;
        String::from_utf8(bytes).map_err(|_| AssetError::Encoding(name.to_string()))
    }
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetLoader for DirectoryAssets {
    fn load_bytes(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        validate_name(name)?;
        let path = self.root.join(name);
        match fs::read(&path) {
            Ok(bytes) => {
                tracing::debug!(asset = name, bytes = bytes.len(), "loaded asset");
                Ok(bytes)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(AssetError::Missing {
                name: name.to_string(),
                root: self.root.clone(),
            }),
            Err(source) => Err(AssetError::Io {
                name: name.to_string(),
                source,
            }),
        }
    }
}

/// In-memory asset table, handy for tests and for embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn insert(&mut self, name: &str, bytes: impl Into<Vec<u8>>) {
        self.entries.insert(name.to_string(), bytes.into());
    }
}

impl AssetLoader for MemoryAssets {
    fn load_bytes(&self, name: &str) -> Result<Vec<u8>, AssetError> {
        validate_name(name)?;
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::Missing {
                name: name.to_string(),
                root: PathBuf::from("<memory>"),
            })
    }
}

fn validate_name(name: &str) -> Result<(), AssetError> {
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !Path::new(name).is_absolute();
    if plain {
        Ok(())
    } else {
        Err(AssetError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn directory_assets_read_files_by_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("firehue.rgba"), [1u8, 2, 3, 4]).unwrap();
        fs::write(dir.path().join(VERTEX_SHADER_ASSET), "#version 450\n").unwrap();

        let assets = DirectoryAssets::new(dir.path());
        assert_eq!(assets.load_bytes("firehue.rgba").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(
            assets.load_text(VERTEX_SHADER_ASSET).unwrap(),
            "#version 450\n"
        );
    }

    #[test]
    fn missing_assets_name_the_root() {
        let dir = TempDir::new().unwrap();
        let assets = DirectoryAssets::new(dir.path());
        let err = assets.load_bytes("icehue.rgba").unwrap_err();
        match err {
            AssetError::Missing { name, root } => {
                assert_eq!(name, "icehue.rgba");
                assert_eq!(root, dir.path());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn names_cannot_escape_the_root() {
        let assets = MemoryAssets::new().with("ok.glsl", "void main() {}");
        for name in ["", "..", "../secret", "nested/file", "/etc/passwd"] {
            assert!(
                matches!(assets.load_bytes(name), Err(AssetError::InvalidName(_))),
                "{name}"
            );
        }
        assert!(assets.load_text("ok.glsl").is_ok());
    }

    #[test]
    fn non_utf8_text_is_rejected() {
        let assets = MemoryAssets::new().with(FRAGMENT_SHADER_ASSET, vec![0xff, 0xfe]);
        assert!(matches!(
            assets.load_text(FRAGMENT_SHADER_ASSET),
            Err(AssetError::Encoding(_))
        ));
    }
}
