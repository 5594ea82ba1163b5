use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A command result: serialized as-is for JSON, shown as `fields` otherwise.
pub trait Report: Serialize {
    fn fields(&self) -> Vec<(&'static str, String)>;
}

pub fn print_report(report: &impl Report, format: OutputFormat) {
    println!("{}", render(report, format));
}

pub fn render(report: &impl Report, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (name, value) in report.fields() {
                table.add_row(vec![name.to_string(), value]);
            }
            table.to_string()
        }
        OutputFormat::Pretty => report
            .fields()
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Upper-case hex, or `-` for nothing.
pub fn hex_or_dash(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        "-".to_string()
    } else {
        hex::encode_upper(bytes)
    }
}
