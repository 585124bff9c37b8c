//! Create command implementation.

use crate::cli::CreateArgs;
use crate::error::add_archive_context;
use crate::error::parse_password;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use archivit_core::NoopProgress;
use archivit_core::create_archive_with_progress;
use archivit_core::creation::CreationConfig;

pub fn execute(
    args: &CreateArgs,
    formatter: &dyn OutputFormatter,
    show_progress: bool,
) -> Result<()> {
    let password = parse_password(args.password.as_deref())?;

    let mut config = CreationConfig::default()
        .with_password(password)
        .with_compression(!args.no_compression)
        .with_integrity(!args.no_integrity)
        .with_exclude_extensions(args.exclude_ext.clone())
        .with_append_extension(args.append_extension);
    if let Some(chunk_size) = args.chunk_size {
        let chunk_size = usize::try_from(chunk_size).context("chunk size does not fit in memory")?;
        config = config.with_chunk_size(chunk_size);
    }

    let report = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Creating");
        create_archive_with_progress(&args.source, &args.destination, &config, &mut progress)
    } else {
        create_archive_with_progress(&args.source, &args.destination, &config, &mut NoopProgress)
    };
    let report = add_archive_context(report, &args.destination)?;

    formatter.format_creation_result(&report)
}
