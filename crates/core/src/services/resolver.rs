//! Canonical name resolution.
//!
//! The resolver walks an ordered chain of [`NameSource`] strategies and takes
//! the first non-empty name, then repairs the extension from the binary kind
//! when the name ends in neither a recognized module extension nor the kind's
//! own default extension.

use std::path::Path;

use crate::model::{file_name_of, is_recognized_extension, split_extension, CanonicalName, NameOrigin};
use crate::services::inspector::BinaryIdentity;

/// Version-resource key carrying the name a module was linked as.
pub const ORIGINAL_FILENAME_KEY: &str = "OriginalFilename";

/// Placeholder reported when no version information exists.
pub const UNKNOWN_VERSION: &str = "*";

/// One step of the name priority chain.
pub trait NameSource: Send + Sync {
    fn extract(&self, identity: &BinaryIdentity) -> Option<String>;
    fn origin(&self) -> NameOrigin;
}

/// DLL name from the export directory.
pub struct ExportNameSource;

impl NameSource for ExportNameSource {
    fn extract(&self, identity: &BinaryIdentity) -> Option<String> {
        identity.export_name.clone()
    }

    fn origin(&self) -> NameOrigin {
        NameOrigin::Export
    }
}

/// Module name from CLI metadata.
pub struct ModuleMetadataSource;

impl NameSource for ModuleMetadataSource {
    fn extract(&self, identity: &BinaryIdentity) -> Option<String> {
        identity.module_name.clone()
    }

    fn origin(&self) -> NameOrigin {
        NameOrigin::ModuleMetadata
    }
}

/// `OriginalFilename` from the first version-resource table that has one.
pub struct OriginalFilenameSource;

impl NameSource for OriginalFilenameSource {
    fn extract(&self, identity: &BinaryIdentity) -> Option<String> {
        identity
            .version_entries
            .iter()
            .filter_map(|table| table.get(ORIGINAL_FILENAME_KEY))
            .find(|value| !value.trim().is_empty())
            .cloned()
    }

    fn origin(&self) -> NameOrigin {
        NameOrigin::VersionResource
    }
}

/// Ordered name sources; the first to yield a usable name wins.
pub struct NameResolver {
    sources: Vec<Box<dyn NameSource>>,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl NameResolver {
    /// Resolver with the standard chain: export, module metadata, version resource.
    pub fn new() -> Self {
        Self::with_sources(vec![
            Box::new(ExportNameSource),
            Box::new(ModuleMetadataSource),
            Box::new(OriginalFilenameSource),
        ])
    }

    pub fn with_sources(sources: Vec<Box<dyn NameSource>>) -> Self {
        Self { sources }
    }

    /// Derive the canonical name for the file at `path`.
    ///
    /// Falls back to the file's current base name when no source yields a name.
    pub fn resolve(&self, path: &Path, identity: &BinaryIdentity) -> CanonicalName {
        let (resolved, origin) = self
            .sources
            .iter()
            .find_map(|source| source.extract(identity).and_then(clean_name).map(|n| (n, source.origin())))
            .unwrap_or_else(|| (file_name_of(path), NameOrigin::Fallback));

        let default_extension = identity.kind.default_extension();
        let (stem, ext) = split_extension(&resolved);
        // A name already carrying the kind's extension keeps it.
        if !ext.is_empty() && (is_recognized_extension(ext) || ext.eq_ignore_ascii_case(default_extension)) {
            CanonicalName { name: stem.to_string(), extension: ext.to_lowercase(), source: origin }
        } else {
            CanonicalName {
                name: resolved,
                extension: default_extension.to_string(),
                source: origin,
            }
        }
    }
}

/// Trim a metadata name and keep only its last path component.
fn clean_name(raw: String) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    let last = trimmed.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(trimmed).trim();
    if last.is_empty() {
        None
    } else {
        Some(last.to_string())
    }
}

/// Best available version string for diagnostics.
///
/// Order: export table, resource directory, assembly table, then the
/// `FileVersion` / `ProductVersion` resource strings; `*` when none apply.
pub fn resolve_version(identity: &BinaryIdentity) -> String {
    let structural = [&identity.export_version, &identity.resource_version]
        .into_iter()
        .flatten()
        .find(|v| !v.is_zero())
        .or(identity.assembly_version.as_ref());
    if let Some(version) = structural {
        return version.to_string();
    }

    ["FileVersion", "ProductVersion"]
        .iter()
        .find_map(|key| identity.version_value(key).map(str::trim).filter(|v| !v.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
