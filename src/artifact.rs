//! Publishing finished files into the asset directory.
//!
//! Artifacts are written under a `*.part` name and renamed onto their final
//! name only when complete.  [`PartialFile`] deletes the `*.part` file when it
//! is dropped uncommitted, which covers error returns as well as futures
//! cancelled by a stage timeout.

use std::io;
use std::path::{Path, PathBuf};

/// `narration.mp3` → `narration.mp3.part`
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// An in-progress file that is removed on drop unless committed.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    /// Guard the `*.part` sibling of `destination`.
    pub fn for_destination(destination: &Path) -> Self {
        Self {
            path: partial_path(destination),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename onto `destination`.  On failure the partial file is removed.
    pub async fn commit(mut self, destination: &Path) -> io::Result<()> {
        tokio::fs::rename(&self.path, destination).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => log::debug!("artifact: removed partial {}", self.path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("artifact: cannot remove {}: {e}", self.path.display()),
            }
        }
    }
}

/// Move a finished file from scratch space onto `destination`.
///
/// Tries a rename first; across filesystems it falls back to copying into a
/// guarded `*.part` file and renaming that.
pub async fn persist(source: &Path, destination: &Path) -> io::Result<()> {
    if tokio::fs::rename(source, destination).await.is_ok() {
        return Ok(());
    }

    let partial = PartialFile::for_destination(destination);
    tokio::fs::copy(source, partial.path()).await?;
    partial.commit(destination).await
}
