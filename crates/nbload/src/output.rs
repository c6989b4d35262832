//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact` / `yaml`: serializes the original data
/// - `plain`: calls `id_fn` on each item, one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single items don't use the
/// `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => Ok(id_fn(data)),
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

pub(crate) fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: String,
        count: usize,
    }

    #[derive(Tabled)]
    struct ItemRow {
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Count")]
        count: usize,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "applied".into(),
                count: 3,
            },
            Item {
                name: "failed".into(),
                count: 1,
            },
        ]
    }

    fn row(item: &Item) -> ItemRow {
        ItemRow {
            name: item.name.clone(),
            count: item.count,
        }
    }

    #[test]
    fn list_formats() {
        let data = items();

        let table = render_list(OutputFormat::Table, &data, row, |i| i.name.clone()).unwrap();
        assert!(table.contains("Name"));
        assert!(table.contains("applied"));

        let json = render_list(OutputFormat::JsonCompact, &data, row, |i| i.name.clone()).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"applied","count":3},{"name":"failed","count":1}]"#
        );

        let plain = render_list(OutputFormat::Plain, &data, row, |i| i.name.clone()).unwrap();
        assert_eq!(plain, "applied\nfailed");

        let yaml = render_list(OutputFormat::Yaml, &data, row, |i| i.name.clone()).unwrap();
        assert!(yaml.contains("name: applied"));
    }

    #[test]
    fn single_uses_detail_for_tables() {
        let item = &items()[0];
        let out = render_single(
            OutputFormat::Table,
            item,
            |i| format!("{} = {}", i.name, i.count),
            |i| i.name.clone(),
        )
        .unwrap();
        assert_eq!(out, "applied = 3");
    }
}
