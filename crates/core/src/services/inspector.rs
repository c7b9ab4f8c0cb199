use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{BinaryKind, ModuleVersion};
use crate::util::concise_io_error;

/// One `StringFileInfo` table from a version resource (key -> value).
pub type VersionEntries = BTreeMap<String, String>;

/// Identity facts read from a binary module.
///
/// Produced per file by a [`BinaryInspector`]; every field is optional because
/// real-world modules carry any subset of these structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryIdentity {
    pub kind: BinaryKind,
    /// DLL name recorded in the export directory.
    pub export_name: Option<String>,
    /// Module name from CLI metadata (managed assemblies).
    pub module_name: Option<String>,
    /// Version-resource string tables, one per language/codepage block.
    pub version_entries: Vec<VersionEntries>,
    pub export_version: Option<ModuleVersion>,
    pub resource_version: Option<ModuleVersion>,
    pub assembly_version: Option<ModuleVersion>,
}

impl BinaryIdentity {
    /// An identity with only a kind; everything else absent.
    pub fn new(kind: BinaryKind) -> Self {
        Self {
            kind,
            export_name: None,
            module_name: None,
            version_entries: Vec::new(),
            export_version: None,
            resource_version: None,
            assembly_version: None,
        }
    }

    /// First value stored under `key` across all version-resource tables.
    pub fn version_value(&self, key: &str) -> Option<&str> {
        self.version_entries.iter().find_map(|table| table.get(key).map(String::as_str))
    }
}

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Error opening file {}: {}", .path.display(), concise_io_error(.source))]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("File is not in PE format: {0}")]
    NotAContainer(String),
}

/// Trait implemented by binary container readers.
pub trait BinaryInspector: Send + Sync {
    fn inspect(&self, path: &Path) -> Result<BinaryIdentity, InspectError>;
    fn name(&self) -> &'static str;
}
