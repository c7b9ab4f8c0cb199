use std::io;

use tracing_subscriber::EnvFilter;

pub mod commands;

/// Build tag reported by `--version`: `PE_RENAMER_TAG` at compile time, else
/// the crate version.
pub fn build_tag() -> &'static str {
    option_env!("PE_RENAMER_TAG").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Default log filter when `RUST_LOG` is not set.
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "pe_renamer=debug,renamer_core=debug"
    } else {
        "pe_renamer=info,renamer_core=info"
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over `verbose`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_log_filter(verbose))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
