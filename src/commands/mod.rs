//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod category;
mod expense;
mod init;
mod report;

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use tracing::{debug, info};

pub use category::{category_add, category_delete, category_list, category_reset, category_update};
pub use expense::{expense_add, expense_delete, expense_list, expense_update};
pub use init::init;
pub use report::report;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

impl Out<Rows> {
    /// Print the message to `info!` and the rows to stdout.
    pub fn print_rows(&self) {
        info!("{}", self.message);
        if let Some(rows) = self.structure() {
            println!("{rows}");
        }
    }
}

/// How records and reports are printed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON with every detail.
    Json,
    /// A markdown table.
    #[default]
    Table,
    /// Comma separated values with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Output rows in the requested format.
#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rows {
    /// The full structure as JSON.
    Json(serde_json::Value),
    /// Markdown table as a single formatted string.
    Table(String),
    /// CSV data as a properly escaped string.
    Csv(String),
}

impl Rows {
    /// Renders `structure` as JSON, or `table` as markdown or CSV.
    pub(crate) fn render<T>(format: OutputFormat, structure: &T, table: &Table) -> Result<Self>
    where
        T: Serialize,
    {
        Ok(match format {
            OutputFormat::Json => {
                Rows::Json(serde_json::to_value(structure).context("Unable to serialize output")?)
            }
            OutputFormat::Table => Rows::Table(table.markdown()),
            OutputFormat::Csv => Rows::Csv(table.csv()?),
        })
    }
}

impl Debug for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => write!(f, "Rows::Json({:?})", v),
            Rows::Table(s) => write!(f, "Rows::Table({} chars)", s.len()),
            Rows::Csv(s) => write!(f, "Rows::Csv({} chars)", s.len()),
        }
    }
}

impl Display for Rows {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Rows::Json(v) => {
                if let Ok(s) = serde_json::to_string_pretty(v) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "{:?}", v)
                }
            }
            Rows::Table(s) => write!(f, "{}", s),
            Rows::Csv(s) => write!(f, "{}", s),
        }
    }
}

/// A flat grid of strings with a header row.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub(crate) struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Short rows are padded with empty cells.
    pub(crate) fn push<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let mut row: Vec<String> = row.into_iter().map(|cell| cell.to_string()).collect();
        row.resize(self.headers.len().max(row.len()), String::new());
        self.rows.push(row);
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    fn markdown(&self) -> String {
        let escape = |s: &str| s.replace('|', "\\|");
        let mut out = String::new();
        out.push_str("| ");
        out.push_str(
            &self
                .headers
                .iter()
                .map(|h| escape(h))
                .collect::<Vec<_>>()
                .join(" | "),
        );
        out.push_str(" |\n|");
        out.push_str(&vec![" --- |"; self.headers.len()].concat());
        for row in &self.rows {
            out.push_str("\n| ");
            out.push_str(
                &row.iter()
                    .map(|cell| escape(cell))
                    .collect::<Vec<_>>()
                    .join(" | "),
            );
            out.push_str(" |");
        }
        out
    }

    fn csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .context("Unable to write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("Unable to write CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Unable to flush CSV output: {e}"))?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        let mut t = Table::new(["Date", "Description", "Amount"]);
        t.push(["2018-01-10", "hat (on credit)", "-$10.00"]);
        t.push(["2018-01-11", "a | b, c", "$10.00"]);
        t
    }

    #[test]
    fn test_markdown() {
        let expected = "| Date | Description | Amount |\n\
                        | --- | --- | --- |\n\
                        | 2018-01-10 | hat (on credit) | -$10.00 |\n\
                        | 2018-01-11 | a \\| b, c | $10.00 |";
        assert_eq!(table().markdown(), expected);
    }

    #[test]
    fn test_csv() {
        let expected = "Date,Description,Amount\n\
                        2018-01-10,hat (on credit),-$10.00\n\
                        2018-01-11,\"a | b, c\",$10.00\n";
        assert_eq!(table().csv().unwrap(), expected);
    }

    #[test]
    fn test_push_pads_short_rows() {
        let mut t = Table::new(["A", "B"]);
        t.push(["x"]);
        assert_eq!(t.rows[0], vec!["x".to_string(), String::new()]);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_render_json_uses_structure() {
        let rows = Rows::render(OutputFormat::Json, &vec![1, 2], &table()).unwrap();
        assert_eq!(rows.to_string(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn test_output_format_strings() {
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    }
}
