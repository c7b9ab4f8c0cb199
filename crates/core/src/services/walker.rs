//! Recursive tree walk producing rename candidates.

use std::collections::hash_map;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::RunConfig;
use crate::model::{file_name_of, names_equal, split_extension, CanonicalName, RenamingCandidate};
use crate::services::inspector::BinaryInspector;
use crate::services::resolver::{resolve_version, NameResolver};
use crate::services::similarity::score;
use crate::util::concise_io_error;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("{}: {}", .path.display(), concise_io_error(.source))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    /// Path whose stat or listing failed.
    pub fn path(&self) -> &Path {
        match self {
            WalkError::Io { path, .. } => path,
        }
    }

    fn from_walkdir(err: walkdir::Error, root: &Path) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        let message = err.to_string();
        let source = err.into_io_error().unwrap_or_else(|| io::Error::other(message));
        WalkError::Io { path, source }
    }
}

/// Pending renames keyed by absolute source path.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet(HashMap<PathBuf, RenamingCandidate>);

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a candidate, replacing any earlier one for the same path.
    pub fn insert(&mut self, candidate: RenamingCandidate) -> Option<RenamingCandidate> {
        self.0.insert(candidate.source_path(), candidate)
    }

    pub fn get(&self, path: &Path) -> Option<&RenamingCandidate> {
        self.0.get(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenamingCandidate> {
        self.0.values()
    }
}

impl IntoIterator for CandidateSet {
    type Item = RenamingCandidate;
    type IntoIter = hash_map::IntoValues<PathBuf, RenamingCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

impl FromIterator<RenamingCandidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = RenamingCandidate>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for candidate in iter {
            set.insert(candidate);
        }
        set
    }
}

/// Name a file should get under the active mode.
///
/// Full mode takes the canonical file name. Extension-only mode keeps the
/// current name and swaps its extension for the canonical one; a current
/// extension counts as replaceable when it is 1-4 characters and not all
/// digits, otherwise the canonical extension is appended.
pub fn proposed_name(current: &str, canonical: &CanonicalName, config: &RunConfig) -> String {
    if !config.extension_only {
        return canonical.file_name();
    }

    let (stem, ext) = split_extension(current);
    let tail = ext.strip_prefix('.').unwrap_or("");
    let tail_len = tail.chars().count();
    let replaceable =
        !stem.is_empty() && (1..=4).contains(&tail_len) && !tail.chars().all(|c| c.is_ascii_digit());

    if replaceable {
        format!("{stem}{}", canonical.extension)
    } else {
        format!("{current}{}", canonical.extension)
    }
}

/// Walk `root` depth-first and collect a candidate for every module whose
/// name differs from its canonical one.
///
/// Failing to stat the root or list any directory aborts the walk.
pub fn walk(root: &Path, config: &RunConfig, inspector: &dyn BinaryInspector) -> Result<CandidateSet, WalkError> {
    let root = fs::canonicalize(root).map_err(|source| WalkError::Io { path: root.to_path_buf(), source })?;
    let resolver = NameResolver::new();
    let mut candidates = CandidateSet::new();

    for entry in WalkDir::new(&root).follow_links(false) {
        let entry = entry.map_err(|err| WalkError::from_walkdir(err, &root))?;
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            debug!("Skipping non-regular entry: {}", path.display());
            continue;
        }

        debug!("File: {}", path.display());
        let identity = match inspector.inspect(path) {
            Ok(identity) => identity,
            Err(err) => {
                debug!("{err}");
                continue;
            }
        };

        let canonical = resolver.resolve(path, &identity);
        debug!(
            "Resolved {} (version {}, source {})",
            canonical.file_name(),
            resolve_version(&identity),
            canonical.source.as_str()
        );

        let current = file_name_of(path);
        let proposed = proposed_name(&current, &canonical, config);
        if names_equal(&current, &proposed, config.ignore_case) {
            continue;
        }

        let scored = score(&current, &canonical.file_name(), config.ignore_case);
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
        candidates.insert(RenamingCandidate {
            directory,
            current_name: current,
            proposed_name: proposed,
            extension_matches: scored.extension_matches,
            similarity: scored.similarity,
        });
    }

    Ok(candidates)
}
