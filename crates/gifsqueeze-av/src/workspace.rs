//! Run workspace and scoped temp artifacts.
//!
//! A [`Workspace`] is a temporary directory that lives for one compression
//! run. Every candidate output is a [`TempArtifact`] inside it. An artifact
//! is deleted when discarded or dropped, and survives only by being promoted
//! to a destination path. Dropping the workspace removes the directory and
//! anything still in it.

use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, TempPath};

/// Temporary directory owning the artifacts of one run.
///
/// # Example
///
/// ```no_run
/// use gifsqueeze_av::Workspace;
///
/// let workspace = Workspace::new()?;
/// let artifact = workspace.artifact()?;
/// // ... let the encoder write to artifact.path() ...
/// artifact.promote(std::path::Path::new("/out/small.gif"))?;
/// # Ok::<(), gifsqueeze_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
}

impl Workspace {
    /// Create a workspace in the system temp directory.
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("gifsqueeze-")
            .tempdir()
            .map_err(|e| Error::Workspace(format!("failed to create temp dir: {e}")))?;
        Ok(Self { temp_dir })
    }

    /// Create a workspace under `parent`.
    pub fn new_in(parent: &Path) -> Result<Self> {
        let temp_dir = tempfile::Builder::new()
            .prefix("gifsqueeze-")
            .tempdir_in(parent)
            .map_err(|e| {
                Error::Workspace(format!(
                    "failed to create temp dir in {}: {e}",
                    parent.display()
                ))
            })?;
        Ok(Self { temp_dir })
    }

    /// Path to the workspace directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a new, empty artifact file inside the workspace.
    pub fn artifact(&self) -> Result<TempArtifact> {
        TempArtifact::create_in(self.temp_dir.path())
    }

    /// Remove the workspace directory, reporting failure.
    pub fn close(self) -> Result<()> {
        let shown = self.temp_dir.path().display().to_string();
        self.temp_dir
            .close()
            .map_err(|e| Error::Workspace(format!("failed to remove {shown}: {e}")))
    }
}

/// One ephemeral output file.
///
/// Exactly one of [`discard`](Self::discard) (or drop) and
/// [`promote`](Self::promote) ends its life.
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    /// Create a new, empty, uniquely-named `.gif` file in `dir`.
    pub fn create_in(dir: &Path) -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("candidate-")
            .suffix(".gif")
            .tempfile_in(dir)
            .map_err(|e| {
                Error::Workspace(format!("failed to create artifact in {}: {e}", dir.display()))
            })?
            .into_temp_path();
        Ok(Self { path })
    }

    /// Location of the artifact on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the artifact in bytes.
    pub fn size(&self) -> Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    /// Delete the artifact now.
    pub fn discard(self) -> Result<()> {
        let shown = self.path.display().to_string();
        self.path
            .close()
            .map_err(|e| Error::Workspace(format!("failed to delete {shown}: {e}")))
    }

    /// Move the artifact to `dest`, replacing anything already there.
    ///
    /// Tries a rename first and falls back to copy + delete when `dest` is on
    /// another filesystem.
    pub fn promote(self, dest: &Path) -> Result<PathBuf> {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Workspace(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        match self.path.persist(dest) {
            Ok(()) => Ok(dest.to_path_buf()),
            Err(err) => {
                let path = err.path;
                std::fs::copy(&path, dest).map_err(|e| {
                    Error::Workspace(format!(
                        "failed to copy output to {}: {e}",
                        dest.display()
                    ))
                })?;
                path.close().map_err(|e| {
                    Error::Workspace(format!("failed to delete promoted artifact: {e}"))
                })?;
                Ok(dest.to_path_buf())
            }
        }
    }
}

impl fmt::Debug for TempArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TempArtifact").field(&self.path()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn artifacts_live_inside_workspace() {
        let ws = Workspace::new().unwrap();
        let artifact = ws.artifact().unwrap();
        assert!(artifact.path().starts_with(ws.path()));
        assert_eq!(artifact.path().extension().unwrap(), "gif");
        assert!(artifact.path().exists());
    }

    #[test]
    fn discard_deletes_file() {
        let ws = Workspace::new().unwrap();
        let artifact = ws.artifact().unwrap();
        let path = artifact.path().to_path_buf();
        artifact.discard().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn drop_deletes_file() {
        let ws = Workspace::new().unwrap();
        let path = {
            let artifact = ws.artifact().unwrap();
            artifact.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn size_reports_written_bytes() {
        let ws = Workspace::new().unwrap();
        let artifact = ws.artifact().unwrap();
        fs::write(artifact.path(), vec![0u8; 1234]).unwrap();
        assert_eq!(artifact.size().unwrap(), 1234);
    }

    #[test]
    fn promote_moves_file_and_creates_parent() {
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("nested").join("small.gif");

        let ws = Workspace::new().unwrap();
        let artifact = ws.artifact().unwrap();
        let src = artifact.path().to_path_buf();
        fs::write(&src, b"GIF89a").unwrap();

        let final_path = artifact.promote(&dest).unwrap();
        assert_eq!(final_path, dest);
        assert_eq!(fs::read(&dest).unwrap(), b"GIF89a");
        assert!(!src.exists());
    }

    #[test]
    fn promote_replaces_existing_destination() {
        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("small.gif");
        fs::write(&dest, b"old").unwrap();

        let ws = Workspace::new().unwrap();
        let artifact = ws.artifact().unwrap();
        fs::write(artifact.path(), b"new").unwrap();
        artifact.promote(&dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"new");
    }

    #[test]
    fn dropping_workspace_removes_directory() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path()).unwrap();
        let dir = ws.path().to_path_buf();
        let artifact = ws.artifact().unwrap();
        std::mem::forget(artifact);
        drop(ws);
        assert!(!dir.exists());
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }
}
