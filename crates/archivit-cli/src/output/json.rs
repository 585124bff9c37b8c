//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use archivit_core::ExtractionReport;
use archivit_core::creation::CreationReport;
use archivit_core::inspection::ArchiveManifest;
use archivit_core::inspection::VerificationReport;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct EntryOutput {
    path: String,
    size: u64,
    stored_size: u64,
    compressed: bool,
    readable: bool,
    writable: bool,
    executable: bool,
    modified_millis: i64,
    crc32: Option<u32>,
}

#[derive(Serialize)]
struct ManifestOutput {
    version: String,
    encrypted: bool,
    compression: bool,
    integrity: bool,
    total_entries: usize,
    total_size: u64,
    total_stored_size: u64,
    archive_size: u64,
    entries: Vec<EntryOutput>,
}

impl ManifestOutput {
    fn new(manifest: &ArchiveManifest, with_details: bool) -> Self {
        let entries = manifest
            .entries
            .iter()
            .map(|entry| EntryOutput {
                path: entry.host_path(manifest.separator).display().to_string(),
                size: entry.size,
                stored_size: entry.stored_size,
                compressed: entry.compressed,
                readable: entry.readable,
                writable: entry.writable,
                executable: entry.executable,
                modified_millis: entry.modified_millis,
                crc32: entry
                    .integrity
                    .as_ref()
                    .filter(|_| with_details)
                    .map(|record| record.checksum),
            })
            .collect();

        Self {
            version: manifest.version.to_string(),
            encrypted: manifest.is_protected(),
            compression: manifest.flags.compression(),
            integrity: manifest.flags.integrity(),
            total_entries: manifest.total_entries,
            total_size: manifest.total_size,
            total_stored_size: manifest.total_stored_size,
            archive_size: manifest.archive_size,
            entries,
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput<'a> {
            files_extracted: usize,
            directories_created: usize,
            files_verified: usize,
            bytes_written: u64,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = ExtractionOutput {
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            files_verified: report.files_verified,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        };

        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_creation_result(&self, report: &CreationReport) -> Result<()> {
        #[derive(Serialize)]
        struct CreationOutput<'a> {
            output_path: String,
            files_added: usize,
            directories: usize,
            files_compressed: usize,
            files_excluded: usize,
            symlinks_skipped: usize,
            bytes_read: u64,
            bytes_stored: u64,
            archive_size: u64,
            compression_ratio: f64,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = CreationOutput {
            output_path: report.archive_path.display().to_string(),
            files_added: report.files_added,
            directories: report.directories_seen,
            files_compressed: report.files_compressed,
            files_excluded: report.files_excluded,
            symlinks_skipped: report.symlinks_skipped,
            bytes_read: report.bytes_read,
            bytes_stored: report.bytes_stored,
            archive_size: report.archive_size,
            compression_ratio: report.compression_ratio(),
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        };

        Self::output(&JsonOutput::success("create", data))
    }

    fn format_manifest_short(&self, manifest: &ArchiveManifest) -> Result<()> {
        Self::output(&JsonOutput::success(
            "list",
            ManifestOutput::new(manifest, false),
        ))
    }

    fn format_manifest_long(
        &self,
        manifest: &ArchiveManifest,
        _human_readable: bool,
    ) -> Result<()> {
        Self::output(&JsonOutput::success(
            "list",
            ManifestOutput::new(manifest, true),
        ))
    }

    fn format_verification_report(&self, report: &VerificationReport) -> Result<()> {
        #[derive(Serialize)]
        struct IssueOutput<'a> {
            path: &'a str,
            kind: String,
            message: &'a str,
        }

        #[derive(Serialize)]
        struct VerificationOutput<'a> {
            status: String,
            total_entries: usize,
            entries_verified: usize,
            entries_unchecked: usize,
            total_size: u64,
            duration_ms: u128,
            issues: Vec<IssueOutput<'a>>,
        }

        let data = VerificationOutput {
            status: report.status.to_string(),
            total_entries: report.total_entries,
            entries_verified: report.entries_verified,
            entries_unchecked: report.entries_unchecked,
            total_size: report.total_size,
            duration_ms: report.duration.as_millis(),
            issues: report
                .issues
                .iter()
                .map(|issue| IssueOutput {
                    path: &issue.path,
                    kind: issue.kind.to_string(),
                    message: &issue.message,
                })
                .collect(),
        };

        Self::output(&JsonOutput::success("verify", data))
    }

    fn format_error(&self, error: &anyhow::Error) {
        let output = JsonOutput::error("error", format!("{error:#}"));
        let _ = Self::output(&output);
    }
}
