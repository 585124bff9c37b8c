//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "archivit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output and debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack a directory into a new archive
    Create(CreateArgs),
    /// Extract archive contents
    Extract(ExtractArgs),
    /// List archive contents without extraction
    List(ListArgs),
    /// Decode every entry and check it without writing anything
    Verify(VerifyArgs),
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Directory to archive
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Output archive file path
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Encrypt entries with this password (6 to 16 characters)
    #[arg(value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Store every entry uncompressed
    #[arg(long)]
    pub no_compression: bool,

    /// Omit per-entry integrity records
    #[arg(long)]
    pub no_integrity: bool,

    /// Plaintext bytes per encrypted chunk (suffixes K, M accepted)
    #[arg(long, value_name = "BYTES", value_parser = parse_byte_size)]
    pub chunk_size: Option<u64>,

    /// Skip files with this extension (can be repeated)
    #[arg(long = "exclude-ext", short = 'x', value_name = "EXT")]
    pub exclude_ext: Vec<String>,

    /// Append the .archivit extension when DESTINATION has none
    #[arg(long)]
    pub append_extension: bool,
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory, created if missing
    #[arg(value_name = "DESTINATION")]
    pub destination: PathBuf,

    /// Password of a protected archive
    #[arg(value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Skip integrity checks
    #[arg(long)]
    pub no_verify: bool,

    /// Leave existing files untouched instead of replacing them
    #[arg(long)]
    pub keep_existing: bool,

    /// Refuse entries larger than this (suffixes K, M, G, T accepted)
    #[arg(long, value_name = "BYTES", value_parser = parse_byte_size)]
    pub max_entry_size: Option<u64>,

    /// Extract into a subdirectory named after the archive
    #[arg(long)]
    pub subdirectory: bool,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Show detailed entry information
    #[arg(short, long)]
    pub long: bool,

    /// Show sizes in human-readable format
    #[arg(short = 'H', long)]
    pub human_readable: bool,
}

#[derive(clap::Args)]
pub struct VerifyArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Password of a protected archive
    #[arg(value_name = "PASSWORD")]
    pub password: Option<String>,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Parse byte size with optional suffix (K, M, G, T)
#[allow(clippy::option_if_let_else)]
fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty byte size".to_string());
    }

    let (num_str, multiplier) = if let Some(stripped) = s.strip_suffix('T') {
        (stripped, 1024_u64.pow(4))
    } else if let Some(stripped) = s.strip_suffix('G') {
        (stripped, 1024_u64.pow(3))
    } else if let Some(stripped) = s.strip_suffix('M') {
        (stripped, 1024_u64.pow(2))
    } else if let Some(stripped) = s.strip_suffix('K') {
        (stripped, 1024)
    } else {
        (s, 1)
    };

    num_str
        .parse::<u64>()
        .map_err(|_| format!("invalid byte size: {s}"))
        .and_then(|n| {
            n.checked_mul(multiplier)
                .ok_or_else(|| format!("byte size overflow: {s}"))
        })
}
