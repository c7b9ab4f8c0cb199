use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::model::RenamingCandidate;
use crate::services::executor::{apply_with, FileOps, StdFileOps};
use crate::services::inspector::BinaryInspector;
use crate::services::ranker::rank;
use crate::services::walker::{walk, WalkError};

/// Counts for one executed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub candidates: usize,
    /// Renames performed, or reported when dry-running.
    pub applied: usize,
    pub failed: usize,
}

/// Walks a tree, ranks what it finds, and applies the renames in order.
pub struct RenameRunner<'a> {
    config: &'a RunConfig,
    inspector: &'a dyn BinaryInspector,
}

impl<'a> RenameRunner<'a> {
    pub fn new(config: &'a RunConfig, inspector: &'a dyn BinaryInspector) -> Self {
        Self { config, inspector }
    }

    pub fn config(&self) -> &RunConfig {
        self.config
    }

    /// Collect and order the candidates under `root` without touching anything.
    pub fn plan(&self, root: &Path) -> Result<Vec<RenamingCandidate>, WalkError> {
        let candidates = walk(root, self.config, self.inspector)?;
        Ok(rank(candidates))
    }

    pub fn execute(&self, plan: &[RenamingCandidate], out: &mut dyn Write) -> RunSummary {
        self.execute_with(plan, &StdFileOps, out)
    }

    /// Apply `plan` in order through `fs`. A failed candidate is logged and
    /// skipped; the rest still run.
    pub fn execute_with(&self, plan: &[RenamingCandidate], fs: &dyn FileOps, out: &mut dyn Write) -> RunSummary {
        let mut summary = RunSummary { candidates: plan.len(), ..RunSummary::default() };

        for candidate in plan {
            if self.config.verbose {
                if let Err(err) = writeln!(
                    out,
                    "{} -> {} (extension matches: {}, similarity: {:.1}%)",
                    candidate.current_name, candidate.proposed_name, candidate.extension_matches, candidate.similarity
                ) {
                    warn!("cannot write report: {err}");
                }
            }

            match apply_with(candidate, self.config, fs, out) {
                Ok(_) => summary.applied += 1,
                Err(err) => {
                    warn!("{err}");
                    summary.failed += 1;
                }
            }
        }

        info!(
            candidates = summary.candidates,
            applied = summary.applied,
            failed = summary.failed,
            dry_run = self.config.dry_run,
            "rename run finished"
        );
        summary
    }

    /// Plan and execute in one go.
    pub fn run(&self, root: &Path, out: &mut dyn Write) -> Result<RunSummary, WalkError> {
        let plan = self.plan(root)?;
        Ok(self.execute(&plan, out))
    }
}
