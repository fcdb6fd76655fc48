/// Output formatting: the delimited transaction report and error messages.
use std::io::{self, Write};

use crate::types::{REPORT_COLUMNS, ReportRow};
use crate::viseca::{ExportError, TransactionList};

/// Output context passed to the formatter.
pub struct OutputCtx {
    pub no_header: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(no_header: bool) -> Self {
        Self { no_header }
    }
}

// --- Transaction report ---

/// Write the header and one line per transaction, in list order.
///
/// Every field is wrapped in double quotes and fields are joined by `;`.
/// Embedded quotes and semicolons are written as-is.
///
/// # Errors
///
/// Returns any I/O error from `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    transactions: &TransactionList,
    ctx: &OutputCtx,
) -> io::Result<()> {
    if !ctx.no_header {
        write_line(out, &REPORT_COLUMNS)?;
    }
    for transaction in &transactions.transactions {
        write_line(out, &ReportRow::from_transaction(transaction).fields())?;
    }
    out.flush()
}

fn write_line<W: Write>(out: &mut W, fields: &[&str]) -> io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.write_all(b";")?;
        }
        write!(out, "\"{field}\"")?;
    }
    writeln!(out)
}

// --- Error output ---

/// Write an error to stderr.
pub fn write_error(err: &ExportError) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "Error: {err}");
}

/// Write a usage message to stdout.
pub fn write_usage(usage: &str) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let _ = write!(out, "{usage}");
    let _ = out.flush();
}

// --- Debug timer ---

/// A RAII timer that logs elapsed milliseconds at debug level on drop.
pub struct DebugTimer {
    label: &'static str,
    start: std::time::Instant,
}

impl DebugTimer {
    /// Start timing the stage named `label`.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(stage = self.label, "finished in {ms:.2}ms");
    }
}
