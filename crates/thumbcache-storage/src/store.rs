//! Local-disk artifact store.
//!
//! Rooted at a configured cache directory: `<root>/<video-id>/<offset>.webp`
//! plus an optional `<offset>.txt` title sibling. No atomic rename is used
//! for the image write; partial writes on crash are tolerated because an
//! undersized image is discarded on read, never served.

use std::path::{Path, PathBuf};

use thumbcache_models::{Artifact, Fingerprint, TimeOffset, VideoId, MIN_ARTIFACT_BYTES};
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

const IMAGE_EXT: &str = "webp";
const TITLE_EXT: &str = "txt";
const LIVE_SUFFIX: &str = "-live";

#[derive(Debug, Clone)]
pub struct ArtifactStoreConfig {
    pub root: PathBuf,
}

/// What [`ArtifactStore::list_latest`] found in a video's folder.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestEntry {
    pub offset: TimeOffset,
    pub has_title: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FolderSize {
    pub bytes: u64,
    pub file_count: u64,
}

#[derive(Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(config: ArtifactStoreConfig) -> Self {
        Self { root: config.root }
    }

    pub fn folder_path(&self, video_id: &VideoId) -> PathBuf {
        self.root.join(video_id.as_str())
    }

    fn image_filename(offset: &TimeOffset, is_live: bool) -> String {
        if is_live {
            format!("{}{LIVE_SUFFIX}.{IMAGE_EXT}", offset.canonical())
        } else {
            format!("{}.{IMAGE_EXT}", offset.canonical())
        }
    }

    fn title_filename(offset: &TimeOffset) -> String {
        format!("{}.{TITLE_EXT}", offset.canonical())
    }

    /// Read an artifact, trying the non-livestream filename first and the
    /// livestream-suffixed one second. Never infers `is_live` from which
    /// variant matched - that bit is not reported back to the caller.
    pub async fn read(&self, fp: &Fingerprint) -> StorageResult<Artifact> {
        let folder = self.folder_path(&fp.video_id);

        let candidates = [
            folder.join(Self::image_filename(&fp.time, false)),
            folder.join(Self::image_filename(&fp.time, true)),
        ];

        let mut image_path = None;
        for candidate in &candidates {
            if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                image_path = Some(candidate.clone());
                break;
            }
        }

        let image_path = match image_path {
            Some(p) => p,
            None => match self.scan_for_offset(&folder, &fp.time).await {
                Some(p) => p,
                None => return Err(StorageError::not_found(fp.job_id())),
            },
        };

        let image = tokio::fs::read(&image_path).await?;
        if image.is_empty() {
            warn!(path = %image_path.display(), "discarding zero-byte artifact");
            let _ = tokio::fs::remove_file(&image_path).await;
            return Err(StorageError::not_found(fp.job_id()));
        }
        if image.len() < MIN_ARTIFACT_BYTES {
            warn!(path = %image_path.display(), size = image.len(), "discarding undersized artifact");
            let _ = tokio::fs::remove_file(&image_path).await;
            return Err(StorageError::not_found(fp.job_id()));
        }

        let title_path = folder.join(Self::title_filename(&fp.time));
        let title = match tokio::fs::read_to_string(&title_path).await {
            Ok(t) => Some(t),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Artifact {
            image,
            offset: fp.time,
            title,
        })
    }

    /// Repair float-formatting drift: scan the folder for any image whose
    /// name begins with the offset truncated to millisecond precision.
    async fn scan_for_offset(&self, folder: &Path, time: &TimeOffset) -> Option<PathBuf> {
        let prefix = time.millis_prefix();
        let mut entries = tokio::fs::read_dir(folder).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(prefix.as_str()) && name.ends_with(IMAGE_EXT) {
                return Some(entry.path());
            }
        }
        None
    }

    pub async fn write(
        &self,
        fp: &Fingerprint,
        image: &[u8],
        title: Option<&str>,
        is_livestream: bool,
    ) -> StorageResult<()> {
        let folder = self.folder_path(&fp.video_id);
        tokio::fs::create_dir_all(&folder).await?;

        let image_path = folder.join(Self::image_filename(&fp.time, is_livestream));
        tokio::fs::write(&image_path, image).await?;
        debug!(path = %image_path.display(), bytes = image.len(), "wrote artifact");

        if let Some(title) = title {
            let title_path = folder.join(Self::title_filename(&fp.time));
            tokio::fs::write(&title_path, title).await?;
        }

        Ok(())
    }

    /// Newest title-bearing artifact if any, else the newest image.
    pub async fn list_latest(&self, video_id: &VideoId) -> StorageResult<LatestEntry> {
        let folder = self.folder_path(video_id);
        let mut images: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
        let mut titles: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();

        let mut entries = tokio::fs::read_dir(&folder)
            .await
            .map_err(|_| StorageError::not_found(video_id.as_str()))?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let meta = match entry.metadata().await {
                Ok(m) => m,
                Err(_) => continue,
            };
            let mtime = meta.modified().unwrap_or(std::time::UNIX_EPOCH);
            match path.extension().and_then(|e| e.to_str()) {
                Some(TITLE_EXT) => titles.push((path, mtime)),
                Some(IMAGE_EXT) => images.push((path, mtime)),
                _ => {}
            }
        }

        titles.sort_by_key(|(_, mtime)| std::cmp::Reverse(*mtime));
        images.sort_by_key(|(_, mtime)| std::cmp::Reverse(*mtime));

        if let Some((path, _)) = titles.first() {
            return Ok(LatestEntry {
                offset: offset_from_filename(path)?,
                has_title: true,
            });
        }
        if let Some((path, _)) = images.first() {
            return Ok(LatestEntry {
                offset: offset_from_filename(path)?,
                has_title: false,
            });
        }

        Err(StorageError::not_found(video_id.as_str()))
    }

    pub async fn delete_video(&self, video_id: &VideoId) -> StorageResult<()> {
        let folder = self.folder_path(video_id);
        match tokio::fs::remove_dir_all(&folder).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Full recursive walk of `root`, used only by cleanup.
    pub async fn folder_size(&self, root: &Path) -> StorageResult<FolderSize> {
        let mut total = FolderSize::default();
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(e) => e,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let meta = match entry.metadata().await {
                    Ok(m) => m,
                    Err(_) => continue,
                };
                if meta.is_dir() {
                    stack.push(entry.path());
                } else {
                    total.bytes += meta.len();
                    total.file_count += 1;
                }
            }
        }
        Ok(total)
    }

    /// Video ids present as folders directly under the cache root.
    pub async fn list_video_ids(&self) -> StorageResult<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(name.to_string());
                }
            }
        }
        Ok(ids)
    }
}

fn offset_from_filename(path: &Path) -> StorageResult<TimeOffset> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| StorageError::not_found(path.display().to_string()))?;
    let stem = stem.strip_suffix(LIVE_SUFFIX).unwrap_or(stem);
    let seconds: f64 = stem
        .parse()
        .map_err(|_| StorageError::not_found(path.display().to_string()))?;
    TimeOffset::parse(seconds).map_err(|_| StorageError::not_found(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbcache_models::Priority;

    fn fp(video: &str, time: f64) -> Fingerprint {
        Fingerprint::new(
            VideoId::parse(video).unwrap(),
            TimeOffset::parse(time).unwrap(),
        )
    }

    #[tokio::test]
    async fn write_then_read_roundtrips_bytes_and_title() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            root: dir.path().to_path_buf(),
        });
        let fp = fp("jNQXAC9IVRw", 5.3);
        let image = vec![0xAB; 512];
        store
            .write(&fp, &image, Some("Me at the zoo"), false)
            .await
            .unwrap();

        let artifact = store.read(&fp).await.unwrap();
        assert_eq!(artifact.image, image);
        assert_eq!(artifact.title.as_deref(), Some("Me at the zoo"));
    }

    #[tokio::test]
    async fn empty_file_is_treated_as_not_found_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            root: dir.path().to_path_buf(),
        });
        let fp = fp("jNQXAC9IVRw", 0.0);
        let folder = store.folder_path(&fp.video_id);
        tokio::fs::create_dir_all(&folder).await.unwrap();
        let image_path = folder.join("0.0.webp");
        tokio::fs::write(&image_path, b"").await.unwrap();

        let result = store.read(&fp).await;
        assert!(result.is_err());
        assert!(!tokio::fs::try_exists(&image_path).await.unwrap());
    }

    #[tokio::test]
    async fn undersized_file_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            root: dir.path().to_path_buf(),
        });
        let fp = fp("jNQXAC9IVRw", 1.0);
        store.write(&fp, &[1, 2, 3], None, false).await.unwrap();
        assert!(store.read(&fp).await.is_err());
    }

    #[tokio::test]
    async fn livestream_write_uses_suffix_but_read_does_not_require_it() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            root: dir.path().to_path_buf(),
        });
        let fp = fp("jNQXAC9IVRw", 2.0);
        let image = vec![7u8; 200];
        store.write(&fp, &image, None, true).await.unwrap();

        let folder = store.folder_path(&fp.video_id);
        assert!(tokio::fs::try_exists(folder.join("2.0-live.webp"))
            .await
            .unwrap());

        let artifact = store.read(&fp).await.unwrap();
        assert_eq!(artifact.image, image);
    }

    #[tokio::test]
    async fn list_latest_prefers_title_bearing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            root: dir.path().to_path_buf(),
        });
        let video_id = VideoId::parse("jNQXAC9IVRw").unwrap();
        store
            .write(&fp("jNQXAC9IVRw", 1.0), &vec![1u8; 200], None, false)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        store
            .write(
                &fp("jNQXAC9IVRw", 2.0),
                &vec![1u8; 200],
                Some("t"),
                false,
            )
            .await
            .unwrap();

        let latest = store.list_latest(&video_id).await.unwrap();
        assert!(latest.has_title);
        assert_eq!(latest.offset.canonical(), "2.0");
    }

    #[tokio::test]
    async fn delete_video_removes_folder() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(ArtifactStoreConfig {
            root: dir.path().to_path_buf(),
        });
        let video_id = VideoId::parse("jNQXAC9IVRw").unwrap();
        store
            .write(&fp("jNQXAC9IVRw", 1.0), &vec![1u8; 200], None, false)
            .await
            .unwrap();
        store.delete_video(&video_id).await.unwrap();
        assert!(!tokio::fs::try_exists(store.folder_path(&video_id))
            .await
            .unwrap());
    }

    #[test]
    fn priority_queue_names_used_elsewhere_stay_stable() {
        // sanity check that the shared model crate's priority names haven't drifted
        assert_eq!(Priority::High.queue_name(), "high");
        assert_eq!(Priority::Normal.queue_name(), "normal");
    }
}
