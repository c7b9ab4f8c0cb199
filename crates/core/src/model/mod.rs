//! Core data model for canonical names and rename candidates.
//!
//! This module contains:
//! - Binary kind classification and structural version values
//! - `CanonicalName`: the filename a module should bear, and where it came from
//! - `RenamingCandidate`: one pending rename produced by a tree walk
//! - Small filename helpers shared by the resolver, scorer, and walker

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extensions accepted as-is on a resolved name (compared case-insensitively).
pub const RECOGNIZED_EXTENSIONS: [&str; 7] = [".exe", ".dll", ".sys", ".ocx", ".cpl", ".drv", ".scr"];

/// Coarse classification of a binary module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryKind {
    Library,
    Executable,
    Driver,
    Unknown,
}

impl BinaryKind {
    /// Extension appended when a resolved name carries no recognized extension.
    pub fn default_extension(self) -> &'static str {
        match self {
            BinaryKind::Library => ".dll",
            BinaryKind::Executable => ".exe",
            BinaryKind::Driver => ".sys",
            BinaryKind::Unknown => ".bin",
        }
    }
}

/// Dotted version number read from a binary structure (export table,
/// resource directory, or assembly table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleVersion {
    pub parts: Vec<u16>,
}

impl ModuleVersion {
    pub fn new(parts: impl Into<Vec<u16>>) -> Self {
        Self { parts: parts.into() }
    }

    pub fn is_zero(&self) -> bool {
        self.parts.iter().all(|p| *p == 0)
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", joined.join("."))
    }
}

/// Which metadata source produced a canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrigin {
    Export,
    ModuleMetadata,
    VersionResource,
    Fallback,
}

impl NameOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            NameOrigin::Export => "export",
            NameOrigin::ModuleMetadata => "module_metadata",
            NameOrigin::VersionResource => "version_resource",
            NameOrigin::Fallback => "fallback",
        }
    }
}

/// The filename a binary is believed to have been shipped under.
///
/// `extension` is lowercase and includes the leading dot; it is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalName {
    pub name: String,
    pub extension: String,
    pub source: NameOrigin,
}

impl CanonicalName {
    /// Full file name (`name` followed by `extension`).
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name, self.extension)
    }
}

/// A pending rename for one file, produced by the tree walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenamingCandidate {
    pub directory: PathBuf,
    pub current_name: String,
    pub proposed_name: String,
    pub extension_matches: bool,
    pub similarity: f64,
}

impl RenamingCandidate {
    /// Path of the file as it currently exists.
    pub fn source_path(&self) -> PathBuf {
        self.directory.join(&self.current_name)
    }
}

/// Split a file name at its last dot into `(stem, extension)`.
///
/// The extension keeps its dot; a name without a dot has an empty extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Compare two names under the given case policy.
pub fn names_equal(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// Whether `ext` (with dot) is one of the recognized module extensions.
pub fn is_recognized_extension(ext: &str) -> bool {
    RECOGNIZED_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext))
}

/// Base name of `path` as a string, or an empty string when it has none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
