//! Rendering for `--output`.
//!
//! Device lists become a `tabled` table, a serde document (JSON, compact
//! JSON, YAML), or one key per line for scripts.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use devpick_core::CompatibilityState;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// `auto` colors only an interactive stdout, and honors `NO_COLOR`.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

/// Compatibility label, red for errors and yellow for warnings.
pub fn paint_compatibility(state: &CompatibilityState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        CompatibilityState::Ok => label.green().to_string(),
        CompatibilityState::Warning { .. } => label.yellow().to_string(),
        CompatibilityState::Error { .. } => label.red().to_string(),
    }
}

pub fn paint_heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_owned()
    }
}

// ── Formats ──────────────────────────────────────────────────────────

/// Structured formats serialize `items` as-is; `table` goes through `row`,
/// `plain` prints `key` of each item.
pub fn render_list<T, R>(
    format: &OutputFormat,
    items: &[T],
    row: impl Fn(&T) -> R,
    key: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    if let Some(doc) = structured(format, items)? {
        return Ok(doc);
    }
    Ok(match format {
        OutputFormat::Plain => items.iter().map(key).collect::<Vec<_>>().join("\n"),
        _ => Table::new(items.iter().map(row))
            .with(Style::rounded())
            .to_string(),
    })
}

/// Like [`render_list`] for one item; `table` uses the hand-built `detail`.
pub fn render_single<T>(
    format: &OutputFormat,
    item: &T,
    detail: impl Fn(&T) -> String,
    key: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    if let Some(doc) = structured(format, item)? {
        return Ok(doc);
    }
    Ok(match format {
        OutputFormat::Plain => key(item),
        _ => detail(item),
    })
}

fn structured<T: serde::Serialize + ?Sized>(
    format: &OutputFormat,
    value: &T,
) -> Result<Option<String>, CliError> {
    Ok(match format {
        OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
        OutputFormat::JsonCompact => Some(serde_json::to_string(value)?),
        OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
        OutputFormat::Table | OutputFormat::Plain => None,
    })
}

/// Write to stdout unless `--quiet`. Broken pipes are ignored.
pub fn print_output(rendered: &str, quiet: bool) {
    if quiet || rendered.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{rendered}");
    let _ = stdout.flush();
}
