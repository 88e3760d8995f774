//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables are built from
//! the core column descriptors with `tabled`, structured formats use serde,
//! plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{builder::Builder, settings::Style};

use marquee_core::{Notification, NotificationLevel};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stderr().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// One notification line for stderr.
pub fn format_notification(n: &Notification, color: bool) -> String {
    let text = &n.message;
    let icon = match n.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Info => "·",
        NotificationLevel::Warning => "!",
        NotificationLevel::Error => "✗",
    };
    if !color {
        return format!("{icon} {text}");
    }
    match n.level {
        NotificationLevel::Success => format!("{} {text}", icon.green()),
        NotificationLevel::Info => format!("{} {text}", icon.cyan()),
        NotificationLevel::Warning => format!("{} {text}", icon.yellow()),
        NotificationLevel::Error => format!("{} {}", icon.red(), text.red()),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list in the chosen format.
///
/// - `table`: `headers` + pre-rendered `rows` as a rounded table
/// - `json` / `json-compact` / `yaml`: serializes `data` via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T>(
    format: &OutputFormat,
    data: &[T],
    headers: &[&str],
    rows: Vec<Vec<String>>,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => render_table(headers, rows),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are a
/// key/value listing rather than a grid.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => id_fn(data),
    }
}

/// `Label:  value` lines with the values aligned.
pub fn render_detail(pairs: &[(&str, String)]) -> String {
    let width = pairs.iter().map(|(k, _)| k.len()).max().unwrap_or(0) + 1;
    pairs
        .iter()
        .map(|(k, v)| format!("{:<width$} {v}", format!("{k}:")))
        .collect::<Vec<_>>()
        .join("\n")
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

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Serialize)]
    struct Item {
        id: String,
    }

    #[test]
    fn plain_prints_one_id_per_line() {
        let items = vec![Item { id: "a".into() }, Item { id: "b".into() }];
        let out = render_list(&OutputFormat::Plain, &items, &["ID"], vec![], |i| i.id.clone());
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn table_includes_headers_and_cells() {
        let items = vec![Item { id: "g-1".into() }];
        let out = render_list(
            &OutputFormat::Table,
            &items,
            &["ID", "Name"],
            vec![vec!["g-1".into(), "Drama".into()]],
            |i| i.id.clone(),
        );
        assert!(out.contains("Name"));
        assert!(out.contains("Drama"));
    }

    #[test]
    fn detail_aligns_values() {
        let out = render_detail(&[("ID", "1".into()), ("Title", "Heat".into())]);
        assert_eq!(out, "ID:    1\nTitle: Heat");
    }

    #[test]
    fn uncolored_notification_has_icon() {
        let line = format_notification(&Notification::success("Genre created"), false);
        assert_eq!(line, "✓ Genre created");
    }
}
