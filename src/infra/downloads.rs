use crate::config::{DownloadConfig, RetirePolicy};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Watches the download directory for a named artifact and retires it once
/// it has been consumed, so the next query never reads a stale file.
#[derive(Debug, Clone)]
pub struct ArtifactWatcher {
    dir: PathBuf,
    poll_interval: Duration,
    retire: RetirePolicy,
}

impl ArtifactWatcher {
    pub fn new(dir: impl Into<PathBuf>, poll_interval: Duration, retire: RetirePolicy) -> Self {
        Self {
            dir: dir.into(),
            poll_interval,
            retire,
        }
    }

    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(config.dir.clone(), config.poll_interval(), config.retire)
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub fn ensure_dir(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)
    }

    /// Polls until `name` exists or `timeout` passes.
    pub async fn wait_for(&self, name: &str, timeout: Duration) -> Option<PathBuf> {
        let path = self.path_of(name);
        let deadline = Instant::now() + timeout;
        loop {
            if tokio::fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false) {
                debug!("Artifact arrived: {}", path.display());
                return Some(path);
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Moves a leftover artifact out of the way before a new download.
    pub fn clear_stale(&self, name: &str) -> io::Result<()> {
        let path = self.path_of(name);
        if path.exists() {
            warn!("Found stale artifact {}, retiring it", path.display());
            self.retire(&path, "stale")?;
        }
        Ok(())
    }

    /// Renames the artifact to `<stem>-<tag>-<uuid>.<ext>` or deletes it.
    pub fn retire(&self, path: &Path, tag: &str) -> io::Result<Option<PathBuf>> {
        match self.retire {
            RetirePolicy::Delete => {
                std::fs::remove_file(path)?;
                Ok(None)
            }
            RetirePolicy::Rename => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("artifact");
                let mut name = format!("{stem}-{tag}-{}", uuid::Uuid::new_v4().simple());
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    name.push('.');
                    name.push_str(ext);
                }
                let target = path.with_file_name(name);
                std::fs::rename(path, &target)?;
                debug!("Retired {} to {}", path.display(), target.display());
                Ok(Some(target))
            }
        }
    }
}
