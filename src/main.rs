#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! viseca-export — export Viseca credit card transactions as delimited text.

mod cli;
mod commands;
mod cookies;
mod types;
mod viseca;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, OutputCtx, write_error, write_usage};
use viseca::ExportError;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let usage = ExportError::Usage(err.render().to_string());
            write_usage(&usage.to_string());
            std::process::exit(usage.exit_code());
        }
        // --help and --version
        Err(err) => err.exit(),
    };

    init_logging(cli.debug);

    let ctx = OutputCtx::new(cli.no_header);

    if let Err(err) = commands::export::run(&cli, &ctx) {
        write_error(&err);
        std::process::exit(err.exit_code());
    }
}

/// Log to stderr; stdout carries only the report.
///
/// `RUST_LOG` overrides the default of `warn` (or `debug` for this crate with `--debug`).
fn init_logging(debug: bool) {
    let default = if debug {
        "warn,viseca_export=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
