//! Static asset lookup (QR code image, badge artwork, brand font).
//!
//! Assets are searched across a fixed list of candidate directories and
//! cached for the process lifetime; they are read-only once deployed, so
//! the cache cannot go stale.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// No candidate directory holds the asset. Callers degrade on this
    /// (skip the element) instead of aborting the render.
    #[error("asset missing: {0}")]
    Missing(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

static BYTE_CACHE: Lazy<Mutex<HashMap<PathBuf, Arc<Vec<u8>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Clone, Debug)]
pub struct AssetResolver {
    candidates: Vec<PathBuf>,
}

impl AssetResolver {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Standard chain: ASSET_DIR override, deployment root, its public/
    /// subdirectory, then the assets directory next to the crate.
    pub fn from_env() -> Self {
        let mut candidates = Vec::new();
        if let Ok(dir) = std::env::var("ASSET_DIR") {
            candidates.push(PathBuf::from(dir));
        }
        let project_root = std::env::var("PROJECT_ROOT").ok().unwrap_or_else(|| {
            let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
            manifest_dir.to_string_lossy().to_string()
        });
        let root = PathBuf::from(project_root);
        candidates.push(root.clone());
        candidates.push(root.join("public"));
        candidates.push(Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"));
        Self::new(candidates)
    }

    /// First existing `name` across the candidate directories.
    pub fn resolve(&self, name: &str) -> Result<Arc<Vec<u8>>, AssetError> {
        for dir in &self.candidates {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            if let Some(bytes) = BYTE_CACHE.lock().get(&path) {
                return Ok(Arc::clone(bytes));
            }
            let bytes = Arc::new(std::fs::read(&path)?);
            BYTE_CACHE.lock().insert(path, Arc::clone(&bytes));
            return Ok(bytes);
        }
        Err(AssetError::Missing(name.to_string()))
    }
}
