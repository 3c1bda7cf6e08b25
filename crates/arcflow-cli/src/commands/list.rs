//! List command implementation.

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use arcflow_core::Event;
use arcflow_core::Extractor;

use crate::cli::ListArgs;
use crate::output::OutputFormatter;

pub fn execute(args: &ListArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let extractor = Extractor::to_memory();
    extractor.set_archive(&args.archive);
    if let Some(password) = &args.password {
        extractor.set_password(password.clone());
    }
    extractor.get_info();

    loop {
        let event = extractor
            .events()
            .recv()
            .context("engine stopped unexpectedly")?;
        match event {
            Event::Info(info) => return formatter.listing(&info),
            Event::PasswordRequired { .. } => {
                bail!("archive requires a password (pass one with --password)")
            }
            Event::Error(e) => {
                bail!("failed to list {}: {e}", args.archive.display())
            }
            _ => {}
        }
    }
}
