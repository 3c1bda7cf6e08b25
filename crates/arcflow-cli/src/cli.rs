//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arcflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract archive contents
    Extract(ExtractArgs),
    /// Create a new archive
    Create(CreateArgs),
    /// List archive contents without extraction
    List(ListArgs),
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: current directory)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Password for encrypted archives
    #[arg(short, long)]
    pub password: Option<String>,

    /// Extract only these exact entry paths (can be repeated)
    #[arg(long = "only", value_name = "ENTRY")]
    pub only: Vec<String>,

    /// Include pattern (glob, can be repeated)
    #[arg(long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Exclude pattern (glob, can be repeated)
    #[arg(long = "exclude", short = 'x', value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Rewrite entry paths relative to this base path
    #[arg(long, value_name = "PATH")]
    pub base_path: Option<PathBuf>,

    /// Block size in bytes for streaming transfers
    #[arg(long, default_value = "10240")]
    pub block_size: usize,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Output archive file path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Source files or directories to include
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Compression level (1-9)
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub compression_level: Option<u8>,

    /// Password (zip format only)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Block size in bytes for streaming transfers
    #[arg(long, default_value = "10240")]
    pub block_size: usize,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Password for encrypted archives
    #[arg(short, long)]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::parse_from(["arcflow", "extract", "a.tar.gz", "/tmp/out"]);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.archive, PathBuf::from("a.tar.gz"));
                assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/out")));
                assert_eq!(args.block_size, 10240);
            }
            _ => panic!("expected extract command"),
        }
    }

    #[test]
    fn test_parse_create_with_level() {
        let cli = Cli::parse_from(["arcflow", "create", "-l", "9", "out.zip", "src"]);
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.output, PathBuf::from("out.zip"));
                assert_eq!(args.compression_level, Some(9));
                assert_eq!(args.sources, vec![PathBuf::from("src")]);
            }
            _ => panic!("expected create command"),
        }
    }

    #[test]
    fn test_parse_repeated_excludes() {
        let cli = Cli::parse_from([
            "arcflow", "extract", "-x", "*.log", "-x", "*.tmp", "a.zip",
        ]);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.exclude, vec!["*.log", "*.tmp"]);
            }
            _ => panic!("expected extract command"),
        }
    }
}
