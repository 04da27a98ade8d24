#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use cmd::{decode, encode, info};
use human_panic::setup_panic;

use crate::logging::init_logging;
use crate::opts::open_output;

mod cli;
mod cmd;
mod logging;
mod opts;

fn main() -> anyhow::Result<()> {
    setup_panic!();

    let cli: Cli = Cli::parse();

    init_logging(cli.verbose.log_level_filter()).expect("Could not initialize logging");

    match &cli.command {
        Commands::Encode {
            input,
            output,
            binarization,
            params,
            context_offset,
            bypass,
            contexts,
        } => {
            let output_path = input.output_path(output.as_deref(), "gabac")?;
            let reader = input.open()?;
            let writer = open_output(&output_path, true)?;

            encode::encode(
                reader,
                writer,
                binarization.into(),
                params,
                *context_offset,
                *bypass,
                *contexts,
            )
            .context("Failed to encode given file")?;
        }
        Commands::Decode { input, output } => {
            let output_path = input.output_path(output.as_deref(), "txt")?;
            let reader = input.open()?;
            let writer = open_output(&output_path, false)?;

            decode::decode(reader, writer)
                .context("Failed to decode given file")?;
        }
        Commands::Info { input } => {
            info::info(input.open()?).context("Failed to read given file")?;
        }
    }

    Ok(())
}
