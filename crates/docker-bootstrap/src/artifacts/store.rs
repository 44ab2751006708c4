//! Persistence of rendered artefacts.

use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

use super::RenderedArtifact;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Storage collaborator that persists rendered artefacts.
pub trait ArtifactStore {
    /// Writes the artefact, fully replacing any previous content.
    fn persist(&self, artifact: &RenderedArtifact) -> io::Result<()>;
}

/// Filesystem store that swaps content into place atomically.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsArtifactStore;

impl ArtifactStore for FsArtifactStore {
    fn persist(&self, artifact: &RenderedArtifact) -> io::Result<()> {
        atomic_write(artifact.path().as_std_path(), artifact.payload())
    }
}

/// Writes the provided bytes to the path using an atomic persist step.
///
/// Data is flushed and fsync'd before the temporary file is renamed into
/// place so readers never observe a partially written payload.
fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("artifact"),
    );
    let mut file = builder.tempfile_in(directory)?;
    // Generated configuration is read by other processes in the container.
    #[cfg(unix)]
    file.as_file()
        .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
