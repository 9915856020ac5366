//! Persisted operator text overrides.
//!
//! Operators configure up to three lines per format ahead of time; the
//! store keeps them in a small JSON file so they survive restarts and
//! apply to generations triggered without inline text.

use std::{fs, path::PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::generator::TextBlock3;
use crate::layout::AdFormat;

#[derive(Debug, Error)]
pub enum OverrideError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct StoredOverrides {
    #[serde(default)]
    pub square: Option<TextBlock3>,
    #[serde(default)]
    pub story: Option<TextBlock3>,
}

pub struct OverrideStore {
    path: PathBuf,
    inner: RwLock<StoredOverrides>,
}

impl OverrideStore {
    /// Missing file means no overrides; a later `set` creates it.
    pub fn load(path: Option<&str>) -> Result<Self, OverrideError> {
        let path = path
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/text-overrides.json"));

        let stored = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredOverrides::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            inner: RwLock::new(stored),
        })
    }

    pub fn get(&self, format: AdFormat) -> Option<TextBlock3> {
        let inner = self.inner.read();
        match format {
            AdFormat::Square => inner.square.clone(),
            AdFormat::Story => inner.story.clone(),
        }
    }

    pub fn snapshot(&self) -> StoredOverrides {
        self.inner.read().clone()
    }

    pub fn set(&self, format: AdFormat, block: TextBlock3) -> Result<(), OverrideError> {
        let mut inner = self.inner.write();
        match format {
            AdFormat::Square => inner.square = Some(block),
            AdFormat::Story => inner.story = Some(block),
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let pretty = serde_json::to_string_pretty(&*inner)?;
        fs::write(&self.path, pretty)?;
        Ok(())
    }
}
