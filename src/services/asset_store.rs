//! src/services/asset_store.rs
//!
//! AssetStore: on-disk storage for uploaded image payloads. Files live under
//! `base_path/carousel_image/{shard}/{shard}/{uuid}-{filename}`; the path
//! relative to `base_path` is what the `images.image` column records.

use std::{
    io::{self, ErrorKind},
    path::{Component, Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// Directory under the media root that holds carousel uploads.
pub const UPLOAD_DIR: &str = "carousel_image";

const MAX_FILENAME_LEN: usize = 100;

#[derive(Clone, Debug)]
pub struct AssetStore {
    base_path: PathBuf,
}

impl AssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Generate two-level shard identifiers for a stored file name.
    ///
    /// Uses MD5(name) and returns the first two bytes as lowercase hex.
    fn shards(name: &str) -> (String, String) {
        let digest = md5::compute(name);
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Build a fresh relative path for an upload named `filename`.
    fn new_relative_path(filename: &str) -> String {
        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(filename));
        let (shard_a, shard_b) = Self::shards(&stored_name);
        format!("{UPLOAD_DIR}/{shard_a}/{shard_b}/{stored_name}")
    }

    /// Map a relative asset path onto the filesystem.
    ///
    /// Only plain components are accepted, so stored paths can never escape
    /// the media root.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let rel = Path::new(relative);
        if relative.is_empty()
            || !rel
                .components()
                .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid asset path `{}`", relative),
            ));
        }
        Ok(self.base_path.join(rel))
    }

    /// Write `data` to a new asset file and return its relative path.
    ///
    /// Bytes go to a temporary file first, are synced, then renamed into
    /// place. The temporary file is removed on any failure.
    pub async fn store(&self, filename: &str, data: &[u8]) -> io::Result<String> {
        let relative = Self::new_relative_path(filename);
        let file_path = self.resolve(&relative)?;
        let parent = file_path.parent().map(Path::to_path_buf).ok_or_else(|| {
            io::Error::new(ErrorKind::Other, "asset path missing parent directory")
        })?;
        fs::create_dir_all(&parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = match File::create(&tmp_path).await {
            // a concurrent removal pruned the shard directory we just made
            Err(err) if err.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&parent).await?;
                File::create(&tmp_path).await?
            }
            created => created?,
        };
        let written = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_all().await
        }
        .await;
        drop(file);
        if let Err(err) = written {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }

        debug!("stored asset {} ({} bytes)", file_path.display(), data.len());
        Ok(relative)
    }

    /// Open a stored asset for reading.
    pub async fn open(&self, relative: &str) -> io::Result<File> {
        File::open(self.resolve(relative)?).await
    }

    /// Remove a stored asset and prune the shard directories it leaves empty.
    ///
    /// A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> io::Result<()> {
        let file_path = self.resolve(relative)?;
        match fs::remove_file(&file_path).await {
            Ok(_) => debug!("removed asset {}", file_path.display()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("asset {} already missing", file_path.display());
            }
            Err(err) => return Err(err),
        }

        if let Some(parent) = file_path.parent() {
            let upload_root = self.base_path.join(UPLOAD_DIR);
            self.prune_empty_dirs(parent, &upload_root).await;
        }
        Ok(())
    }

    /// Remove empty directories from `start` upwards, stopping at `stop`.
    async fn prune_empty_dirs(&self, start: &Path, stop: &Path) {
        let mut current = start.to_path_buf();
        while current.starts_with(stop) && current != stop {
            match fs::remove_dir(&current).await {
                Ok(_) => {
                    if let Some(parent) = current.parent() {
                        current = parent.to_path_buf();
                    } else {
                        break;
                    }
                }
                Err(err) if err.kind() == ErrorKind::NotFound => break,
                Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => break,
                Err(err) => {
                    debug!("failed to prune directory {}: {}", current.display(), err);
                    break;
                }
            }
        }
    }
}

/// Reduce an uploaded file name to a safe, bounded final path component.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(MAX_FILENAME_LEN)
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("banner.png"), "banner.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\photos\\my pic.jpg"), "my_pic.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename(&"a".repeat(300)).len(), MAX_FILENAME_LEN);
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let store = AssetStore::new("/media");
        assert!(store.resolve("../secret").is_err());
        assert!(store.resolve("/etc/passwd").is_err());
        assert!(store.resolve("./carousel_image/a.png").is_err());
        assert!(store.resolve("").is_err());
        assert_eq!(
            store.resolve("carousel_image/aa/bb/x.png").unwrap(),
            PathBuf::from("/media/carousel_image/aa/bb/x.png")
        );
    }

    #[tokio::test]
    async fn test_store_open_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());

        let relative = store.store("banner.png", b"payload").await.unwrap();
        assert!(relative.starts_with("carousel_image/"));
        assert!(relative.ends_with("-banner.png"));
        assert_eq!(relative.split('/').count(), 4);

        let mut file = store.open(&relative).await.unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await.unwrap();
        assert_eq!(contents, b"payload");

        store.remove(&relative).await.unwrap();
        assert!(!store.resolve(&relative).unwrap().exists());
        // shard directories are pruned, the upload root stays
        assert!(dir.path().join(UPLOAD_DIR).exists());
        let leftover = std::fs::read_dir(dir.path().join(UPLOAD_DIR))
            .unwrap()
            .count();
        assert_eq!(leftover, 0);

        // removing twice is fine
        store.remove(&relative).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_gives_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        let a = store.store("same.png", b"a").await.unwrap();
        let b = store.store("same.png", b"b").await.unwrap();
        assert_ne!(a, b);
    }
}
