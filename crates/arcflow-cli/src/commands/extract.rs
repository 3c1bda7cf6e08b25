//! Extract command implementation.

use std::env;

use anyhow::Context;
use anyhow::Result;
use arcflow_core::Extractor;

use crate::cli::ExtractArgs;
use crate::commands::progress_bar;
use crate::commands::run_to_completion;
use crate::output::OutputFormatter;

pub fn execute(
    args: &ExtractArgs,
    formatter: &dyn OutputFormatter,
    quiet: bool,
    json: bool,
) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let extractor = Extractor::to_disk(&output_dir);
    extractor.set_archive(&args.archive);
    extractor.set_block_size(args.block_size);
    if let Some(password) = &args.password {
        extractor.set_password(password.clone());
    }
    extractor.add_filters(args.only.iter().cloned());
    for pattern in &args.include {
        extractor.add_include_pattern(pattern.clone());
    }
    for pattern in &args.exclude {
        extractor.add_exclude_pattern(pattern.clone());
    }
    if let Some(base) = &args.base_path {
        extractor.set_base_path(base);
    }
    extractor.start();

    let bar = progress_bar(quiet, json);
    let (_, totals) = run_to_completion(extractor.events(), &bar)
        .with_context(|| format!("failed to extract {}", args.archive.display()))?;
    bar.finish_and_clear();

    formatter.extraction_done(&args.archive, &output_dir, totals.entries, totals.bytes)
}
