//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Static tables use
//! the `Tabled` derive; entity tables have metadata-defined columns and go
//! through `tabled::builder::Builder`. Also hosts the loading spinner and
//! the stderr failure notifier.

use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use metadmin_core::Notifier;

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ───────────────────────────────────────────────────

/// Whether color output should be enabled on stderr.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render serializable items with a derived `Tabled` row type.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
        structured => render_structured(structured, data),
    }
}

/// Render items whose columns are only known at runtime.
///
/// `data` is what structured formats serialize; `headers` and `rows`
/// feed the table printed under `title`.
pub fn render_dynamic<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    title: &str,
    headers: &[String],
    rows: &[Vec<String>],
    ids: &[String],
) -> String {
    match format {
        OutputFormat::Table => format!("{title}\n{}", dynamic_table(headers, rows)),
        OutputFormat::Plain => ids.join("\n"),
        structured => render_structured(structured, data),
    }
}

/// Render a single item; table mode uses `detail_fn`.
pub fn render_single<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String {
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Plain => id_fn(data),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

/// Rounded table with a header row.
pub fn dynamic_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Two-column label/value table under a title line.
pub fn key_value_table(title: &str, pairs: &[(String, String)]) -> String {
    let mut builder = Builder::default();
    for (key, value) in pairs {
        builder.push_record([key.clone(), value.clone()]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    format!("{title}\n{table}")
}

fn render_structured<T: Serialize + ?Sized>(format: OutputFormat, data: &T) -> String {
    let rendered = match format {
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| e.to_string()),
        _ => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
    };
    rendered.unwrap_or_else(|e| format!("<serialization failed: {e}>"))
}

// ── Loading indicator ───────────────────────────────────────────────

/// Run `fut` behind a spinner on stderr.
///
/// The spinner is hidden in quiet mode and when stderr is not a terminal.
pub async fn with_spinner<F: Future>(message: &str, quiet: bool, fut: F) -> F::Output {
    let bar = if quiet || !io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(80));

    let out = fut.await;
    bar.finish_and_clear();
    out
}

// ── Notifications ───────────────────────────────────────────────────

/// One-line failure notice on stderr.
#[derive(Debug, Clone, Copy)]
pub struct StderrNotifier {
    color: bool,
    quiet: bool,
}

impl StderrNotifier {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }
}

impl Notifier for StderrNotifier {
    fn notify_error(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.color {
            eprintln!("{} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("✗ {message}");
        }
    }
}
