use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pe_renamer::commands::{rename_command, version_command};
use pe_renamer::init_logging;
use renamer_core::RunConfig;

/// Restore the canonical file names of renamed Windows modules.
///
/// Every PE file under PATH is inspected; its export name, .NET module name, or
/// `OriginalFilename` version string decides the name it should carry. By
/// default the file is moved into a directory bearing its old name.
#[derive(Parser, Debug)]
#[command(name = "pe-renamer", disable_version_flag = true)]
struct Cli {
    /// Print OS, architecture, and build tag, then exit.
    #[arg(short = 'V', long = "version", default_value_t = false)]
    version: bool,

    /// Print each planned rename with its similarity score.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Report renames without touching the filesystem.
    #[arg(short = 'n', long, default_value_t = false)]
    dry_run: bool,

    /// Compare names case-insensitively.
    #[arg(short, long, default_value_t = false)]
    ignore_case: bool,

    /// Only fix the extension; leave the file where it is.
    #[arg(short, long, default_value_t = false)]
    extension_only: bool,

    /// Print the ranked plan as JSON instead of report lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// File or directory to process.
    path: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.version {
        return match version_command() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("pe-renamer: {err}");
                ExitCode::FAILURE
            }
        };
    }

    let Some(path) = cli.path else {
        eprintln!("pe-renamer: path is required");
        return ExitCode::from(2);
    };

    let config = RunConfig::new()
        .with_verbose(cli.verbose)
        .with_dry_run(cli.dry_run)
        .with_extension_only(cli.extension_only)
        .with_ignore_case(cli.ignore_case);

    match rename_command(&path, config, cli.json) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pe-renamer: {err}");
            ExitCode::FAILURE
        }
    }
}
