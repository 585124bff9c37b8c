//! Verify command implementation

use crate::cli::VerifyArgs;
use crate::error::add_archive_context;
use crate::error::parse_password;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::bail;
use archivit_core::inspection::VerificationStatus;
use archivit_core::verify_archive;

pub fn execute(args: &VerifyArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let password = parse_password(args.password.as_deref())?;

    let report = add_archive_context(
        verify_archive(&args.archive, password.as_ref()),
        &args.archive,
    )?;

    formatter.format_verification_report(&report)?;

    match report.status {
        // Entries without integrity records still decoded cleanly.
        VerificationStatus::Pass | VerificationStatus::Warning => Ok(()),
        VerificationStatus::Fail => {
            bail!(
                "Archive verification failed: {} issue(s) in '{}'",
                report.issues.len(),
                args.archive.display()
            )
        }
    }
}
