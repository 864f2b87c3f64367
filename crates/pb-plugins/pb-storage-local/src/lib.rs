//! # pb-storage-local
//! pinboard/crates/pb-plugins/pb-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and size probing.

use std::io::Cursor;
use std::path::PathBuf;

use anyhow::{bail, Context};
use async_trait::async_trait;
use image::io::Reader as ImageReader;
use pb_core::models::StoredImage;
use pb_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use tokio::fs;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/media")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/media")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self { root_path: root, url_prefix: url_prefix.trim_end_matches('/').to_string() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root_path
    }

    /// Generates a sharded path: "ab/cd/abcdef....png"
    fn get_sharded_path(&self, media_id: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&media_id[0..2]);
        path.push(&media_id[2..4]);
        path.push(media_id);
        path
    }
}

/// Decodes only the header: returns size and the canonical file extension.
fn probe(data: &[u8], content_type: &str) -> anyhow::Result<(u32, u32, String)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("failed to inspect upload")?;
    let extension = reader
        .format()
        .and_then(|f| f.extensions_str().first().copied())
        .or_else(|| mime_guess::get_mime_extensions_str(content_type).and_then(|e| e.first().copied()))
        .unwrap_or("bin")
        .to_string();
    let (w, h) = reader.into_dimensions().context("upload is not a supported image")?;
    Ok((w, h, extension))
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<StoredImage> {
        if data.is_empty() {
            bail!("upload is empty");
        }

        // 1. Probe dimensions (rejects anything that is not an image)
        let (w, h, extension) = probe(&data, content_type)?;

        // 2. Calculate Hash
        let hash = hex::encode(Sha256::digest(&data));
        let media_id = format!("{hash}.{extension}");
        let target_path = self.get_sharded_path(&media_id);

        // 3. Save Original (if not exists)
        if fs::metadata(&target_path).await.is_err() {
            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&target_path, &data).await?;
            tracing::info!(media_id = %media_id, bytes = data.len(), w, h, "stored upload");
        }

        Ok(StoredImage { url: self.url_for(&media_id), media_id, w, h })
    }

    fn url_for(&self, media_id: &str) -> String {
        if media_id.len() < 4 {
            return format!("{}/{}", self.url_prefix, media_id);
        }
        format!("{}/{}/{}/{}", self.url_prefix, &media_id[0..2], &media_id[2..4], media_id)
    }
}
