use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use renamer_core::model::RenamingCandidate;
use renamer_core::services::backends::PeInspector;
use renamer_core::services::executor::destination_path;
use renamer_core::services::runner::{RenameRunner, RunSummary};
use renamer_core::RunConfig;
use serde::Serialize;
use tracing::debug;

/// One entry of the `--json` plan.
#[derive(Debug, Serialize)]
pub struct PlannedRename<'a> {
    #[serde(flatten)]
    pub candidate: &'a RenamingCandidate,
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl<'a> PlannedRename<'a> {
    pub fn new(candidate: &'a RenamingCandidate, config: &RunConfig) -> Self {
        Self { candidate, source: candidate.source_path(), destination: destination_path(candidate, config) }
    }
}

/// Rename every module under `root`, reporting on stdout.
pub fn rename_command(root: &Path, config: RunConfig, json: bool) -> Result<RunSummary> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_rename(root, &config, json, &mut out)
}

/// Plan and apply renames under `root`, writing the report (or the JSON plan)
/// to `out`.
///
/// A failed walk is returned as-is so its message stays a single
/// `<path>: <reason>` line.
pub fn run_rename(root: &Path, config: &RunConfig, json: bool, out: &mut dyn Write) -> Result<RunSummary> {
    let inspector = PeInspector;
    let runner = RenameRunner::new(config, &inspector);
    let plan = runner.plan(root)?;
    debug!("Planned {} rename(s) under {}", plan.len(), root.display());

    if !json {
        return Ok(runner.execute(&plan, out));
    }

    let entries: Vec<PlannedRename> = plan.iter().map(|c| PlannedRename::new(c, config)).collect();
    serde_json::to_writer_pretty(&mut *out, &entries).context("Failed to serialize plan to JSON")?;
    writeln!(out)?;
    Ok(runner.execute(&plan, &mut io::sink()))
}
