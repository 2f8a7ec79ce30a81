use anyhow::Result;
use clap::ValueEnum;
use semconview_protocol::{serialize_json, serialize_toml, SemconvDependencies};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    Json,
    Toml,
    #[default]
    Table,
}

pub fn render(dependencies: &SemconvDependencies, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serialize_json(dependencies).map(|mut out| {
            out.push('\n');
            out
        }),
        OutputFormat::Toml => serialize_toml(dependencies),
        OutputFormat::Table => Ok(render_table(dependencies)),
    }
}

const COLUMN_GAP: usize = 2;

/// Left-aligned `TYPE  KEY  VERSION` table
pub fn render_table(dependencies: &SemconvDependencies) -> String {
    let header = ["TYPE", "KEY", "VERSION"];
    let rows: Vec<[&str; 3]> = dependencies
        .iter()
        .map(|attr| [attr.kind.as_str(), attr.key.as_str(), attr.version.as_str()])
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(rows.iter()) {
        let mut line = String::new();
        for (idx, cell) in row.iter().enumerate() {
            if idx + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}", width = widths[idx] + COLUMN_GAP));
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
