use serde::{Deserialize, Serialize};

/// Settings for one rename run.
///
/// Built once by the frontend and shared read-only by every stage of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Report each planned operation before performing it.
    pub verbose: bool,
    /// Compute and report operations without touching the filesystem.
    pub dry_run: bool,
    /// Only repair the extension; keep the file where it is.
    pub extension_only: bool,
    /// Compare names case-insensitively.
    pub ignore_case: bool,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_extension_only(mut self, extension_only: bool) -> Self {
        self.extension_only = extension_only;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }
}
