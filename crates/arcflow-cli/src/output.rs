//! Result formatting: human-readable or JSON.

use std::path::Path;

use anyhow::Result;
use arcflow_core::ArchiveInfo;
use console::style;

pub trait OutputFormatter {
    fn extraction_done(&self, archive: &Path, dest: &Path, entries: u64, bytes: u64)
    -> Result<()>;
    fn creation_done(&self, archive: &Path, entries: u64, bytes: u64) -> Result<()>;
    fn listing(&self, info: &ArchiveInfo) -> Result<()>;
}

pub fn create_formatter(json: bool, quiet: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter { quiet })
    }
}

struct HumanFormatter {
    quiet: bool,
}

impl OutputFormatter for HumanFormatter {
    fn extraction_done(
        &self,
        archive: &Path,
        dest: &Path,
        entries: u64,
        _bytes: u64,
    ) -> Result<()> {
        if !self.quiet {
            println!(
                "{} extracted {} ({} entries) to {}",
                style("ok").green().bold(),
                archive.display(),
                entries,
                dest.display()
            );
        }
        Ok(())
    }

    fn creation_done(&self, archive: &Path, entries: u64, bytes: u64) -> Result<()> {
        if !self.quiet {
            println!(
                "{} created {} ({} entries, {} bytes in)",
                style("ok").green().bold(),
                archive.display(),
                entries,
                bytes
            );
        }
        Ok(())
    }

    fn listing(&self, info: &ArchiveInfo) -> Result<()> {
        for (path, entry) in info {
            let size = if entry.size_unit == "None" {
                String::from("-")
            } else {
                format!("{} {}", entry.size, entry.size_unit)
            };
            let excluded = if entry.excluded { " (excluded)" } else { "" };
            println!(
                "{:<12} {:>10}  {}  {}{}",
                entry.file_type, size, entry.last_modified_time, path, excluded
            );
        }
        Ok(())
    }
}

struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn extraction_done(&self, archive: &Path, dest: &Path, entries: u64, bytes: u64)
    -> Result<()> {
        let value = serde_json::json!({
            "status": "ok",
            "action": "extract",
            "archive": archive.display().to_string(),
            "output_dir": dest.display().to_string(),
            "entries": entries,
            "bytes": bytes,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }

    fn creation_done(&self, archive: &Path, entries: u64, bytes: u64) -> Result<()> {
        let value = serde_json::json!({
            "status": "ok",
            "action": "create",
            "archive": archive.display().to_string(),
            "entries": entries,
            "bytes": bytes,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }

    fn listing(&self, info: &ArchiveInfo) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(info)?);
        Ok(())
    }
}
