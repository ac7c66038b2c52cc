use crate::app::ports::DownloadSinkPort;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Saves documents into a download directory. Bytes land in a transient
/// part file first and are renamed into place, so a partial write never
/// shows up under the final name.
pub struct FsDownloadSink {
    dir: PathBuf,
}

impl FsDownloadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSinkPort for FsDownloadSink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, String> {
        let name = Path::new(filename)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| format!("invalid download filename: {:?}", filename))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| e.to_string())?;
        let target = self.dir.join(name);
        let part = self.dir.join(format!(".{}.{}.part", name, Uuid::new_v4()));

        tokio::fs::write(&part, bytes).await.map_err(|e| e.to_string())?;
        if let Err(e) = tokio::fs::rename(&part, &target).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.to_string());
        }
        tracing::info!("Saved {} ({} bytes)", target.display(), bytes.len());
        Ok(target)
    }
}
