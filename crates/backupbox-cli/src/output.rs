//! Terminal output for the `backupbox` commands
//!
//! Every command prints through a [`Printer`]. In human mode it writes
//! status lines with a leading mark; in JSON mode it writes exactly one
//! document per outcome and drops the decorative lines.

use backupbox_core::domain::SyncResult;
use serde_json::{json, Value};

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Writes command outcomes in the selected format
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format.is_json()
    }

    /// A finished action
    pub fn done(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("\u{2713} {message}"),
            OutputFormat::Json => println!("{}", json!({ "ok": true, "message": message })),
        }
    }

    /// An action that could not be carried out
    pub fn fail(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("\u{2717} {message}"),
            OutputFormat::Json => eprintln!("{}", json!({ "ok": false, "error": message })),
        }
    }

    pub fn warn(&self, message: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("! {message}"),
            OutputFormat::Json => eprintln!("{}", json!({ "warning": message })),
        }
    }

    /// Indented detail line, human mode only
    pub fn note(&self, message: &str) {
        if !self.is_json() {
            println!("  {message}");
        }
    }

    /// Structured result, JSON mode only
    pub fn value(&self, value: &Value) {
        if self.is_json() {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_default()
            );
        }
    }

    /// Progress line printed before each upload, human mode only
    pub fn progress(&self, done: u64, total: u64, path: &str) {
        if !self.is_json() {
            println!("  [{}/{}] {path}", done + 1, total);
        }
    }

    /// Summary of a backup run
    pub fn sync_result(&self, result: &SyncResult) {
        if self.is_json() {
            self.value(&json!({ "ok": result.failed == 0, "result": result }));
            return;
        }

        if result.is_up_to_date() {
            self.done("Everything is up to date");
        } else if result.failed == 0 {
            self.done(&format!(
                "Uploaded {} file(s) ({})",
                result.uploaded,
                format_bytes(result.uploaded_bytes)
            ));
        } else {
            self.warn(&format!(
                "Uploaded {} file(s), {} failed",
                result.uploaded, result.failed
            ));
        }
        self.note(&format!("Skipped (unchanged): {}", result.skipped));
        self.note(&format!("Backed up: {}", backed_up(result)));
    }

    /// Result of a file count over `dirs` directories
    pub fn count(&self, count: u64, dirs: usize) {
        if self.is_json() {
            self.value(&json!({ "count": count, "dirs": dirs }));
        } else {
            self.done(&format!(
                "{count} file(s) in {dirs} director{}",
                if dirs == 1 { "y" } else { "ies" }
            ));
        }
    }
}

/// `"<files> file(s), <size>"` for the remote totals of a run
pub fn backed_up(result: &SyncResult) -> String {
    format!(
        "{} file(s), {}",
        result.total_files,
        format_bytes(result.total_bytes)
    )
}

/// Binary-prefixed size, e.g. `8.0 KiB`
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
