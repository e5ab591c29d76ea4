//! Run-scoped workspace directories.
//!
//! Every execution gets its own freshly created directory under the
//! configured root. [`Workspace::release`] removes it off the async runtime;
//! dropping an unreleased workspace removes it synchronously as a fallback
//! for cancelled or panicking runs.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

/// Directory name prefix; only entries carrying it are ever purged.
const WORKSPACE_PREFIX: &str = "run-";

/// An isolated, uniquely named directory owned by one execution.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    path: PathBuf,
    released: bool,
}

impl Workspace {
    /// Create a new workspace under `root`.
    ///
    /// Fails rather than reusing an existing directory.
    pub async fn create(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root).await?;

        let id = Uuid::new_v4();
        let path = root.join(format!("{WORKSPACE_PREFIX}{id}"));

        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        builder.mode(0o700);
        builder.create(&path).await?;

        tracing::debug!(workspace = %path.display(), "Workspace created");
        Ok(Self {
            id,
            path,
            released: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the workspace.
    pub fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Write a file into the workspace, returning its path.
    pub async fn write_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.join(name);
        fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Remove the directory and everything in it.
    pub async fn release(mut self) {
        self.released = true;
        log_removal(&self.path, fs::remove_dir_all(&self.path).await);
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.released {
            log_removal(&self.path, std::fs::remove_dir_all(&self.path));
        }
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => tracing::debug!(workspace = %path.display(), "Workspace removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            workspace = %path.display(),
            error = %e,
            "Failed to remove workspace"
        ),
    }
}

/// Remove workspaces left behind by a previous process under `root`.
///
/// Returns the number of directories removed. A missing root is not an error.
pub fn purge_stale(root: &Path) -> io::Result<usize> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let is_workspace = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(WORKSPACE_PREFIX));
        if is_workspace && entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
