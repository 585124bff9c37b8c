//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::progress::humanize_bytes;
use anyhow::Result;
use archivit_core::ExtractionReport;
use archivit_core::creation::CreationReport;
use archivit_core::inspection::ArchiveEntry;
use archivit_core::inspection::ArchiveManifest;
use archivit_core::inspection::VerificationReport;
use archivit_core::inspection::VerificationStatus;
use console::Term;
use console::style;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    fn heading(&self, text: &str) {
        if self.use_colors {
            self.line(&format!("{} {text}", style("✓").green().bold()));
        } else {
            self.line(text);
        }
    }

    fn warnings(&self, warnings: &[String]) {
        if warnings.is_empty() {
            return;
        }
        self.line("");
        if self.use_colors {
            self.line(&format!("{}", style("Warnings:").yellow().bold()));
        } else {
            self.line("Warnings:");
        }
        for warning in warnings {
            self.line(&format!("  - {warning}"));
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn permissions(entry: &ArchiveEntry) -> String {
        [
            (entry.readable, 'r'),
            (entry.writable, 'w'),
            (entry.executable, 'x'),
        ]
        .iter()
        .map(|&(set, c)| if set { c } else { '-' })
        .collect()
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.heading("Extraction complete");
        self.line(&format!("  Files extracted: {}", report.files_extracted));
        self.line(&format!("  Directories: {}", report.directories_created));
        self.line(&format!(
            "  Total size: {}",
            humanize_bytes(report.bytes_written)
        ));

        if self.verbose {
            self.line(&format!("  Files verified: {}", report.files_verified));
            self.line(&format!("  Duration: {:?}", report.duration));
        }

        self.warnings(&report.warnings);
        Ok(())
    }

    fn format_creation_result(&self, report: &CreationReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        self.heading(&format!(
            "Archive created: {}",
            report.archive_path.display()
        ));
        self.line("");
        self.line(&format!(
            "  Files added:      {}",
            Self::format_number(report.files_added)
        ));
        self.line(&format!(
            "  Directories:      {}",
            Self::format_number(report.directories_seen)
        ));
        self.line(&format!(
            "  Total size:       {}",
            humanize_bytes(report.bytes_read)
        ));
        self.line(&format!(
            "  Archive size:     {}",
            humanize_bytes(report.archive_size)
        ));

        if report.files_compressed > 0 {
            self.line(&format!(
                "  Compression:      {:.1}% ({} files)",
                report.compression_percentage(),
                report.files_compressed
            ));
        }

        if report.files_excluded > 0 {
            self.line(&format!("  Files excluded:   {}", report.files_excluded));
        }

        if self.verbose {
            self.line(&format!("  Duration:         {:?}", report.duration));
        }

        self.warnings(&report.warnings);
        Ok(())
    }

    fn format_manifest_short(&self, manifest: &ArchiveManifest) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for entry in &manifest.entries {
            self.line(&entry.host_path(manifest.separator).display().to_string());
        }

        Ok(())
    }

    fn format_manifest_long(&self, manifest: &ArchiveManifest, human_readable: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let size = |bytes: u64| {
            if human_readable {
                humanize_bytes(bytes)
            } else {
                bytes.to_string()
            }
        };

        self.line(&format!(
            "Format {}, {}{}{}",
            manifest.version,
            if manifest.is_protected() {
                "encrypted"
            } else {
                "not encrypted"
            },
            if manifest.flags.compression() {
                ", compressed"
            } else {
                ""
            },
            if manifest.flags.integrity() {
                ", integrity"
            } else {
                ""
            },
        ));
        self.line("");

        for entry in &manifest.entries {
            let flag = if entry.compressed { 'z' } else { '-' };
            self.line(&format!(
                "{}{flag} {:>10} {:>10}  {}",
                Self::permissions(entry),
                size(entry.size),
                size(entry.stored_size),
                entry.host_path(manifest.separator).display()
            ));
        }

        self.line("");
        self.line(&format!(
            "Total: {} files, {} ({} stored)",
            Self::format_number(manifest.total_entries),
            size(manifest.total_size),
            size(manifest.total_stored_size)
        ));

        Ok(())
    }

    fn format_verification_report(&self, report: &VerificationReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let status_str = match report.status {
                VerificationStatus::Pass => style("PASSED").green().bold(),
                VerificationStatus::Warning => style("WARNING").yellow().bold(),
                VerificationStatus::Fail => style("FAILED").red().bold(),
            };
            self.line(&format!("Archive verification: {status_str}"));
        } else {
            self.line(&format!("Archive verification: {}", report.status));
        }

        self.line(&format!(
            "  Total entries: {}",
            Self::format_number(report.total_entries)
        ));
        self.line(&format!("  Verified: {}", report.entries_verified));
        if report.entries_unchecked > 0 {
            self.line(&format!(
                "  Without integrity record: {}",
                report.entries_unchecked
            ));
        }
        if self.verbose {
            self.line(&format!("  Duration: {:?}", report.duration));
        }

        if !report.issues.is_empty() {
            self.line("");
            self.line("Issues:");

            for issue in &report.issues {
                let kind = if self.use_colors {
                    style(issue.kind.to_string().to_uppercase()).red().to_string()
                } else {
                    format!("[{}]", issue.kind)
                };
                self.line(&format!("  {kind} {}: {}", issue.path, issue.message));
            }
        }

        Ok(())
    }

    fn format_error(&self, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}
