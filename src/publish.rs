//! Downstream publishing boundary.
//!
//! The engine hands finished PNG bytes to a `Publisher` and gets back a
//! public URL. `LocalStore` is the built-in filesystem implementation
//! serving the deployment's `public/generated` directory; a CDN-backed
//! implementation plugs in through the same trait.

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("image: {0}")]
    Image(String),
    #[error("upstream: {0}")]
    Upstream(String),
}

#[derive(Clone, Debug)]
pub struct PublishedAsset {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

pub trait Publisher: Send + Sync {
    fn upload(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> impl std::future::Future<Output = Result<PublishedAsset, PublishError>> + Send;
}

#[derive(Clone, Debug)]
pub struct LocalStore {
    dir: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_env() -> Self {
        let dir = std::env::var("PUBLISH_DIR").unwrap_or_else(|_| "public/generated".to_string());
        let base_url =
            std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        Self::new(dir, base_url)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Publisher for LocalStore {
    async fn upload(&self, bytes: &[u8], filename: &str) -> Result<PublishedAsset, PublishError> {
        std::fs::create_dir_all(&self.dir)?;

        // Lossless recompression before the bytes go public.
        // Can be disabled with PUBLISH_OPTIMIZE=0.
        let optimize = std::env::var("PUBLISH_OPTIMIZE").unwrap_or_else(|_| "1".to_string());
        let optimize = !(optimize == "0" || optimize.eq_ignore_ascii_case("false"));

        let out: Vec<u8> = if optimize {
            let level = std::env::var("PUBLISH_OXIPNG_LEVEL")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(2)
                .min(6);

            let mut opts = oxipng::Options::from_preset(level);
            opts.fix_errors = true;

            match oxipng::optimize_from_memory(bytes, &opts) {
                Ok(out) => out,
                Err(_) => bytes.to_vec(),
            }
        } else {
            bytes.to_vec()
        };

        let path = self.dir.join(filename);
        std::fs::write(&path, &out)?;

        let (width, height) = image::ImageReader::new(Cursor::new(out.as_slice()))
            .with_guessed_format()
            .map_err(|e| PublishError::Image(e.to_string()))?
            .into_dimensions()
            .map_err(|e| PublishError::Image(e.to_string()))?;

        let url = format!(
            "{}/generated/{}",
            self.base_url.trim_end_matches('/'),
            filename
        );

        Ok(PublishedAsset { url, width, height })
    }
}
