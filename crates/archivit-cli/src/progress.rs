//! Progress bar implementation for CLI operations.

use archivit_core::ProgressCallback;
use console::Term;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use std::path::Path;
use std::time::Duration;

const BAR_TEMPLATE: &str = "{prefix} [{bar:40.cyan/blue}] {pos}/{len} files ({msg}, {elapsed})";
const SPINNER_TEMPLATE: &str = "{spinner} {prefix} {pos} files ({msg}, {elapsed})";

/// CLI progress bar wrapper implementing `ProgressCallback`.
///
/// Starts as a spinner because extraction does not know the entry count up
/// front; switches to a bar as soon as a callback reports a total. Bytes
/// processed are shown in the message. Cleans up on drop.
pub struct CliProgress {
    bar: ProgressBar,
    bytes_processed: u64,
    sized: bool,
}

impl CliProgress {
    /// Creates a new progress indicator labelled `message`
    /// (e.g. "Extracting", "Creating").
    #[must_use]
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template(SPINNER_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix(message.to_string());
        bar.set_message(humanize_bytes(0));
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            bytes_processed: 0,
            sized: false,
        }
    }

    /// Checks if we should show progress (TTY detection).
    #[must_use]
    pub fn should_show() -> bool {
        Term::stdout().is_term()
    }

    fn switch_to_bar(&mut self, total: usize) {
        self.bar.disable_steady_tick();
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        self.sized = true;
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for CliProgress {
    fn on_entry_start(&mut self, _path: &Path, total: usize, _current: usize) {
        if total > 0 && !self.sized {
            self.switch_to_bar(total);
        }
    }

    fn on_bytes_written(&mut self, bytes: u64) {
        self.bytes_processed += bytes;
        self.bar.set_message(humanize_bytes(self.bytes_processed));
    }

    fn on_entry_complete(&mut self, _path: &Path) {
        self.bar.inc(1);
    }

    fn on_complete(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Converts bytes to human-readable format (KB, MB, GB, TB).
#[allow(clippy::cast_precision_loss)]
pub fn humanize_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_bytes() {
        assert_eq!(humanize_bytes(0), "0 B");
        assert_eq!(humanize_bytes(512), "512 B");
        assert_eq!(humanize_bytes(1024), "1.0 KB");
        assert_eq!(humanize_bytes(1536), "1.5 KB");
        assert_eq!(humanize_bytes(1024 * 1024), "1.0 MB");
        assert_eq!(humanize_bytes(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(humanize_bytes(1024_u64.pow(4)), "1.0 TB");
    }

    #[test]
    fn test_progress_switches_to_bar() {
        let mut progress = CliProgress::new("Testing");
        assert!(!progress.sized);

        progress.on_entry_start(Path::new("test.txt"), 0, 1);
        assert!(!progress.sized);

        progress.on_entry_start(Path::new("test.txt"), 3, 1);
        progress.on_bytes_written(1024);
        progress.on_entry_complete(Path::new("test.txt"));

        assert!(progress.sized);
        assert_eq!(progress.bytes_processed, 1024);
        assert_eq!(progress.bar.position(), 1);
        assert_eq!(progress.bar.length(), Some(3));
    }
}
