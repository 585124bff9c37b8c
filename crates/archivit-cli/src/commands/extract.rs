//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::error::parse_password;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use archivit_core::NoopProgress;
use archivit_core::extract_archive_with_progress;
use archivit_core::extraction::ExtractionConfig;

pub fn execute(
    args: &ExtractArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<()> {
    let password = parse_password(args.password.as_deref())?;

    let config = ExtractionConfig::default()
        .with_password(password)
        .with_verify_integrity(!args.no_verify)
        .with_overwrite(!args.keep_existing)
        .with_max_entry_size(args.max_entry_size)
        .with_archive_subdirectory(args.subdirectory);

    let report = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Extracting");
        extract_archive_with_progress(&args.archive, &args.destination, &config, &mut progress)
    } else {
        extract_archive_with_progress(&args.archive, &args.destination, &config, &mut NoopProgress)
    };
    let report = add_archive_context(report, &args.archive)?;

    formatter.format_extraction_result(&report)
}
