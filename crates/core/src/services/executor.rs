//! Filesystem mutation for a single rename candidate.
//!
//! Extension-only mode is one rename in place. Full mode moves the file into
//! a new directory carrying its old name, going through a temporary name so
//! the directory can take the file's place:
//!
//! ```text
//! dir/current  ->  dir/<uuid>  ->  dir/current/ (mkdir)  ->  dir/current/proposed
//! ```
//!
//! A failure after the first step is rolled back so the file ends up under
//! its original name again.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::model::RenamingCandidate;
use crate::util::concise_io_error;

/// Filesystem primitives used by the rename protocol.
pub trait FileOps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileOps`] backed by `std::fs`.
pub struct StdFileOps;

impl FileOps for StdFileOps {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }
}

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("cannot rename {} to {}: {}", .from.display(), .to.display(), concise_io_error(.source))]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot create directory {}: {}", .path.display(), concise_io_error(.source))]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot rename {} to {}: destination exists", .from.display(), .to.display())]
    DestinationExists { from: PathBuf, to: PathBuf },
    #[error("{cause}; file left at {} ({})", .temp.display(), concise_io_error(.restore))]
    Stranded {
        temp: PathBuf,
        #[source]
        cause: Box<RenameError>,
        restore: io::Error,
    },
    #[error("cannot write report: {}", concise_io_error(.0))]
    Report(#[source] io::Error),
}

/// Outcome of a successful (or simulated) rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRename {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// True when nothing was touched because the run is a dry run.
    pub simulated: bool,
}

/// Where `candidate` ends up under the active mode.
pub fn destination_path(candidate: &RenamingCandidate, config: &RunConfig) -> PathBuf {
    if config.extension_only {
        candidate.directory.join(&candidate.proposed_name)
    } else {
        candidate.source_path().join(&candidate.proposed_name)
    }
}

/// Apply one candidate on the real filesystem.
pub fn apply(
    candidate: &RenamingCandidate,
    config: &RunConfig,
    out: &mut dyn Write,
) -> Result<AppliedRename, RenameError> {
    apply_with(candidate, config, &StdFileOps, out)
}

/// Apply one candidate through `fs`.
///
/// The `Renaming <source> → <destination>` line is written to `out` in dry-run
/// and verbose modes, before any mutation.
pub fn apply_with(
    candidate: &RenamingCandidate,
    config: &RunConfig,
    fs: &dyn FileOps,
    out: &mut dyn Write,
) -> Result<AppliedRename, RenameError> {
    let source = candidate.source_path();
    let destination = destination_path(candidate, config);

    if config.dry_run || config.verbose {
        writeln!(out, "Renaming {} → {}", source.display(), destination.display()).map_err(RenameError::Report)?;
    }
    if config.dry_run {
        return Ok(AppliedRename { source, destination, simulated: true });
    }

    if config.extension_only {
        // A case-only change may report the source itself as existing.
        let case_only = candidate.current_name.to_lowercase() == candidate.proposed_name.to_lowercase();
        if !case_only && fs.exists(&destination) {
            return Err(RenameError::DestinationExists { from: source, to: destination });
        }
        rename_step(fs, &source, &destination)?;
    } else {
        wrap_in_directory(fs, &source, &destination)?;
    }

    Ok(AppliedRename { source, destination, simulated: false })
}

fn rename_step(fs: &dyn FileOps, from: &Path, to: &Path) -> Result<(), RenameError> {
    fs.rename(from, to).map_err(|source| RenameError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// Replace the file at `source` with a directory of the same name holding
/// the file as `destination`.
pub fn wrap_in_directory(fs: &dyn FileOps, source: &Path, destination: &Path) -> Result<(), RenameError> {
    let parent = source.parent().unwrap_or_else(|| Path::new("."));
    let temp = parent.join(Uuid::new_v4().to_string());

    rename_step(fs, source, &temp)?;
    debug!("Moved {} to temporary {}", source.display(), temp.display());

    let created = fs.create_dir_all(source).map_err(|err| RenameError::CreateDir { path: source.to_path_buf(), source: err });
    let result = created.and_then(|()| rename_step(fs, &temp, destination));

    match result {
        Ok(()) => Ok(()),
        Err(cause) => Err(roll_back(fs, source, &temp, cause)),
    }
}

fn roll_back(fs: &dyn FileOps, source: &Path, temp: &Path, cause: RenameError) -> RenameError {
    // Only succeeds while the directory is still empty.
    if let Err(err) = fs.remove_dir(source) {
        debug!("Leaving {} in place: {}", source.display(), concise_io_error(&err));
    }
    match fs.rename(temp, source) {
        Ok(()) => cause,
        Err(restore) => RenameError::Stranded { temp: temp.to_path_buf(), cause: Box::new(cause), restore },
    }
}
