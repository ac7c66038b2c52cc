use crate::app::ports::StaticAssetPort;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

/// Bundled documents read from an asset directory.
pub struct BundledAssets {
    root: PathBuf,
}

impl BundledAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        // Asset paths must stay inside the root
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl StaticAssetPort for BundledAssets {
    async fn fetch(&self, path: &str) -> Result<Bytes, String> {
        let full = self.resolve(path).ok_or_else(|| format!("invalid asset path: {}", path))?;
        tracing::debug!("Reading bundled asset {}", full.display());
        tokio::fs::read(&full).await.map(Bytes::from).map_err(|e| format!("{}: {}", full.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn reads_assets_relative_to_root() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mock-data")).unwrap();
        std::fs::write(dir.path().join("mock-data/esg-metrics.json"), b"{}").unwrap();
        let assets = BundledAssets::new(dir.path());

        assert_eq!(assets.fetch("/mock-data/esg-metrics.json").await.unwrap(), Bytes::from_static(b"{}"));
        assert!(assets.fetch("missing.pdf").await.is_err());
    }

    #[tokio::test]
    async fn rejects_paths_escaping_the_root() {
        let dir = tempdir().unwrap();
        let assets = BundledAssets::new(dir.path().join("assets"));
        let err = assets.fetch("../secret.json").await.unwrap_err();
        assert!(err.contains("invalid asset path"));
    }
}
