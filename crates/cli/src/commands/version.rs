use std::env::consts::{ARCH, OS};
use std::io::{self, Write};

use anyhow::Result;

use crate::build_tag;

/// Lines printed by `--version`.
pub fn version_lines() -> [String; 3] {
    [format!("OS: {OS}"), format!("ARCH: {ARCH}"), format!("TAG: {}", build_tag())]
}

pub fn version_command() -> Result<()> {
    let mut out = io::stdout().lock();
    for line in version_lines() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
