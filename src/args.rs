//! These structs provide the CLI interface for the budget CLI.

use crate::commands::OutputFormat;
use crate::model::{parse_date, Amount, CategoryType};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// budget: A command-line tool for keeping a household budget.
///
/// Expenses are recorded against spending categories in a local SQLite database. Reports list
/// them with a running balance, or group them by month, by category or both.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the budget home directory with its configuration and a new database.
    ///
    /// This is the first command you should run. The new database holds the default spending
    /// categories and no expenses. By default the budget home is $HOME/budget; pass
    /// --budget-home or set BUDGET_HOME to put it somewhere else.
    Init(InitArgs),
    /// List, add, change or delete spending categories.
    Category(CategoryArgs),
    /// List, add, change or delete expenses.
    Expense(ExpenseArgs),
    /// Show expenses with a running balance, optionally grouped by month and/or category.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the budget configuration and database are held. Defaults to ~/budget
    #[arg(long, env = "BUDGET_HOME", default_value_t = default_budget_home())]
    budget_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: PathBuf) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &DisplayPath {
        &self.budget_home
    }
}

/// Args for the `budget init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// Replace an existing budget. Everything in it is lost.
    #[arg(long)]
    force: bool,
}

impl InitArgs {
    pub fn new(force: bool) -> Self {
        Self { force }
    }

    pub fn force(&self) -> bool {
        self.force
    }
}

/// Args for the `budget category` command.
#[derive(Debug, Parser, Clone)]
pub struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
}

impl CategoryArgs {
    pub fn new(command: CategoryCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &CategoryCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// Print every category in the order they were added.
    List(ListArgs),
    /// Add a category.
    Add(CategoryFields),
    /// Change the description and type of a category.
    Update(CategoryUpdateArgs),
    /// Delete a category. Categories that expenses still refer to are kept.
    Delete(IdArgs),
    /// Delete every unused category and add the default categories.
    Reset,
}

/// The editable fields of a category.
#[derive(Debug, Parser, Clone)]
pub struct CategoryFields {
    /// The name of the category, e.g. "Groceries".
    #[arg(long)]
    description: String,

    /// What kind of money flow the category tracks.
    #[arg(long = "type", value_enum, default_value_t = CategoryType::Expense)]
    category_type: CategoryType,
}

impl CategoryFields {
    pub fn new(description: impl Into<String>, category_type: CategoryType) -> Self {
        Self {
            description: description.into(),
            category_type,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category_type(&self) -> CategoryType {
        self.category_type
    }
}

/// Args for `budget category update`.
#[derive(Debug, Parser, Clone)]
pub struct CategoryUpdateArgs {
    /// The id of the category to change.
    #[arg(long)]
    id: i64,

    #[clap(flatten)]
    fields: CategoryFields,
}

impl CategoryUpdateArgs {
    pub fn new(id: i64, fields: CategoryFields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn fields(&self) -> &CategoryFields {
        &self.fields
    }
}

/// Args for the `budget expense` command.
#[derive(Debug, Parser, Clone)]
pub struct ExpenseArgs {
    #[command(subcommand)]
    command: ExpenseCommand,
}

impl ExpenseArgs {
    pub fn new(command: ExpenseCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ExpenseCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseCommand {
    /// Print every expense in the order they were added.
    List(ListArgs),
    /// Record an expense.
    Add(ExpenseFields),
    /// Replace every field of an expense.
    Update(ExpenseUpdateArgs),
    /// Delete an expense.
    Delete(IdArgs),
}

/// The editable fields of an expense.
#[derive(Debug, Parser, Clone)]
pub struct ExpenseFields {
    /// When the money moved: YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS".
    #[arg(long, value_parser = parse_date)]
    date: NaiveDateTime,

    /// The id of the category this expense belongs to.
    #[arg(long)]
    category_id: i64,

    /// The signed amount, e.g. -12.50 for money spent. A dollar sign and commas are allowed.
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,

    /// A short description, e.g. "groceries".
    #[arg(long)]
    description: String,
}

impl ExpenseFields {
    pub fn new(
        date: NaiveDateTime,
        category_id: i64,
        amount: Amount,
        description: impl Into<String>,
    ) -> Self {
        Self {
            date,
            category_id,
            amount,
            description: description.into(),
        }
    }

    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    pub fn category_id(&self) -> i64 {
        self.category_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Args for `budget expense update`.
#[derive(Debug, Parser, Clone)]
pub struct ExpenseUpdateArgs {
    /// The id of the expense to change.
    #[arg(long)]
    id: i64,

    #[clap(flatten)]
    fields: ExpenseFields,
}

impl ExpenseUpdateArgs {
    pub fn new(id: i64, fields: ExpenseFields) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn fields(&self) -> &ExpenseFields {
        &self.fields
    }
}

/// Args that identify a single record.
#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The id of the record.
    #[arg(long)]
    id: i64,
}

impl IdArgs {
    pub fn new(id: i64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

/// Args for the list subcommands.
#[derive(Debug, Parser, Clone)]
pub struct ListArgs {
    /// How to print the records.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl ListArgs {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// Args for the `budget report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// Only include expenses dated after this: YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS".
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDateTime>,

    /// Only include expenses dated before this: YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS".
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDateTime>,

    /// Only include expenses in this category.
    #[arg(long)]
    category_id: Option<i64>,

    /// Group expenses by calendar month.
    #[arg(long)]
    by_month: bool,

    /// Group expenses by category.
    #[arg(long)]
    by_category: bool,

    /// How to print the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Only show expenses whose description or amount contains this text. Cannot be combined
    /// with --by-month or --by-category.
    #[arg(long)]
    search: Option<String>,
}

impl ReportArgs {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self {
            start,
            end,
            category_id: None,
            by_month: false,
            by_category: false,
            format: OutputFormat::Table,
            search: None,
        }
    }

    pub fn with_category_id(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_grouping(mut self, by_month: bool, by_category: bool) -> Self {
        self.by_month = by_month;
        self.by_category = by_category;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    pub fn by_month(&self) -> bool {
        self.by_month
    }

    pub fn by_category(&self) -> bool {
        self.by_category
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

fn default_budget_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("budget"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --budget-home or BUDGET_HOME instead of relying on the default \
                budget home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("budget")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
