//! `siffbench`: times reading frames and histograms out of a
//! small and a large `.siff` file and prints the mean latency
//! of each block.

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use siffbench::harness::{self, BenchConfig, BenchError};
use siffbench::SiffReader;

#[derive(Parser, Debug)]
#[command(
    name = "siffbench",
    version,
    about = "Mean latency of reading frames and arrival-time histograms from .siff files"
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "TOML file with sample paths and trial blocks")]
    config : Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Small sample file (overrides the config file)")]
    small : Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Large sample file (overrides the config file)")]
    large : Option<PathBuf>,

    #[arg(long, help = "Print the resolved configuration as TOML and exit")]
    print_config : bool,

    #[arg(short, long, action = ArgAction::Count, help = "Log more (repeatable)")]
    verbose : u8,
}

fn init_tracing(verbose : u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("siffbench={default_level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let stdout = std::io::stdout();
    std::process::exit(exit_code(run(cli, &mut stdout.lock())));
}

/// 0 on success, otherwise reports the error on stderr and returns 1
fn exit_code(result : Result<(), BenchError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        },
    }
}

fn run<W : Write>(cli : Cli, out : &mut W) -> Result<(), BenchError> {
    let config = BenchConfig::load(cli.config.as_deref(), cli.small, cli.large)?;

    if cli.print_config {
        out.write_all(config.to_toml()?.as_bytes())?;
        return Ok(());
    }

    harness::run::<SiffReader, _>(&config, out)?;
    Ok(())
}
