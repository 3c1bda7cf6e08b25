//! Create command implementation.

use anyhow::Context;
use anyhow::Result;
use arcflow_core::Compressor;

use crate::cli::CreateArgs;
use crate::commands::progress_bar;
use crate::commands::run_to_completion;
use crate::output::OutputFormatter;

pub fn execute(
    args: &CreateArgs,
    formatter: &dyn OutputFormatter,
    quiet: bool,
    json: bool,
) -> Result<()> {
    let compressor = Compressor::to_disk(&args.output);
    compressor.set_block_size(args.block_size);
    if let Some(level) = args.compression_level {
        compressor.set_compression_level(level);
    }
    if let Some(password) = &args.password {
        compressor.set_password(password.clone());
    }
    compressor.add_files(args.sources.iter().cloned());
    compressor.start();

    let bar = progress_bar(quiet, json);
    let (_, totals) = run_to_completion(compressor.events(), &bar)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    bar.finish_and_clear();

    formatter.creation_done(&args.output, totals.entries, totals.bytes)
}
