#![forbid(unsafe_code)]

//! Autostack demo binary entry point.

use std::process::ExitCode;

use autostack_demo::cli;
use autostack_demo::page::{DemoError, DemoPage, SCRIPT, format_row};
use autostack_runtime::StackConfig;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AUTOSTACK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(opts: &cli::Opts) -> Result<(), DemoError> {
    let config = StackConfig::from_env();
    let mut page = DemoPage::build(opts.viewport, config)?;
    if !opts.json {
        println!("{:<16} {:>3}  offsets", "action", "steps");
    }
    for action in SCRIPT {
        let record = page.perform(*action)?;
        if opts.json {
            println!("{}", serde_json::to_string(&record)?);
        } else {
            println!("{}", format_row(&record));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let opts = cli::Opts::parse();
    init_tracing();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "demo failed");
            ExitCode::FAILURE
        }
    }
}
