//! The budget aggregation engine.
//!
//! Every report starts from the same stream: expenses inner-joined to their categories, limited
//! to a date window with exclusive ends, ordered by date and then by expense id, and optionally
//! restricted to a single category. From that stream the engine builds
//!
//! - a flat list of `BudgetItem`s with a running balance,
//! - one `MonthSummary` per calendar month,
//! - one `CategorySummary` per category,
//! - a category by month pivot that ends in a `TOTALS` row.
//!
//! Empty results are valid answers and never errors.

mod pivot;
mod search;
mod window;

pub use search::{search, SearchResult};

use crate::db::{Categories, Db};
use crate::model::{date, Amount, BudgetItem, CategorySummary, MonthSummary, PivotRow};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::trace;
use window::Window;

/// The arguments shared by every report.
///
/// When `filter_flag` is false, `category_id` is ignored entirely.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportQuery {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub filter_flag: bool,
    pub category_id: i64,
}

impl ReportQuery {
    pub fn new(
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
        filter_flag: bool,
        category_id: i64,
    ) -> Self {
        Self {
            start,
            end,
            filter_flag,
            category_id,
        }
    }

    /// Everything, unfiltered.
    pub fn all() -> Self {
        Self::default()
    }

    /// The category filter, if one is active.
    fn category_filter(&self) -> Option<i64> {
        self.filter_flag.then_some(self.category_id)
    }

    fn window(&self) -> Window {
        Window::exclusive(self.start, self.end)
    }
}

/// Which report shape to produce.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    #[default]
    Items,
    ByMonth,
    ByCategory,
    ByCategoryAndMonth,
}

serde_plain::derive_display_from_serialize!(ReportKind);
serde_plain::derive_fromstr_from_deserialize!(ReportKind);

impl ReportKind {
    /// Chooses a report from the two grouping toggles a user interface offers.
    pub fn from_toggles(by_category: bool, by_month: bool) -> Self {
        match (by_category, by_month) {
            (true, true) => ReportKind::ByCategoryAndMonth,
            (true, false) => ReportKind::ByCategory,
            (false, true) => ReportKind::ByMonth,
            (false, false) => ReportKind::Items,
        }
    }
}

/// The output of any of the four reports.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "report", content = "rows")]
pub enum Report {
    Items(Vec<BudgetItem>),
    ByMonth(Vec<MonthSummary>),
    ByCategory(Vec<CategorySummary>),
    ByCategoryAndMonth(Vec<PivotRow>),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Items(_) => ReportKind::Items,
            Report::ByMonth(_) => ReportKind::ByMonth,
            Report::ByCategory(_) => ReportKind::ByCategory,
            Report::ByCategoryAndMonth(_) => ReportKind::ByCategoryAndMonth,
        }
    }

    /// The number of top-level rows.
    pub fn len(&self) -> usize {
        match self {
            Report::Items(v) => v.len(),
            Report::ByMonth(v) => v.len(),
            Report::ByCategory(v) => v.len(),
            Report::ByCategoryAndMonth(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One row of the joined expense/category stream.
#[derive(Debug, Clone)]
struct JoinedRow {
    category_id: i64,
    expense_id: i64,
    date: NaiveDateTime,
    category: String,
    description: String,
    amount: Amount,
}

type JoinedTuple = (i64, i64, String, String, String, f64);

/// Produces reports from a budget database. Read-only.
#[derive(Debug, Clone)]
pub struct Reports {
    db: Db,
}

impl Reports {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Runs the report of the given kind.
    pub async fn run(&self, kind: ReportKind, query: &ReportQuery) -> Result<Report> {
        Ok(match kind {
            ReportKind::Items => Report::Items(self.budget_items(query).await?),
            ReportKind::ByMonth => Report::ByMonth(self.budget_items_by_month(query).await?),
            ReportKind::ByCategory => {
                Report::ByCategory(self.budget_items_by_category(query).await?)
            }
            ReportKind::ByCategoryAndMonth => {
                Report::ByCategoryAndMonth(self.budget_by_category_and_month(query).await?)
            }
        })
    }

    /// Every expense in range, in date order, each carrying the running balance of the amounts
    /// emitted so far. Rows skipped by the category filter do not count toward the balance.
    pub async fn budget_items(&self, query: &ReportQuery) -> Result<Vec<BudgetItem>> {
        self.items_in(query.window(), query.category_filter()).await
    }

    /// The items of each calendar month that has activity in range, oldest month first. Each
    /// month's balances start again from zero.
    pub async fn budget_items_by_month(&self, query: &ReportQuery) -> Result<Vec<MonthSummary>> {
        let window = query.window();
        let filter = query.category_filter();

        let mut months: Vec<(String, NaiveDateTime)> = Vec::new();
        for row in self.joined_rows(window, filter).await? {
            let key = date::month_key(row.date);
            if !months.iter().any(|(k, _)| *k == key) {
                months.push((key, row.date));
            }
        }
        trace!("Found {} months with activity", months.len());

        let mut summaries = Vec::with_capacity(months.len());
        for (month, first_date) in months {
            let slice = Window::month_of(first_date).intersect(window);
            let items = self.items_in(slice, filter).await?;
            let total = items.iter().map(|item| item.amount).sum();
            summaries.push(MonthSummary {
                month,
                items,
                total,
            });
        }
        Ok(summaries)
    }

    /// The items of each category that has activity in range, in the order the categories are
    /// first seen when scanning by date.
    pub async fn budget_items_by_category(
        &self,
        query: &ReportQuery,
    ) -> Result<Vec<CategorySummary>> {
        let window = query.window();

        let mut categories: Vec<(i64, String)> = Vec::new();
        for row in self.joined_rows(window, query.category_filter()).await? {
            if !categories.iter().any(|(id, _)| *id == row.category_id) {
                categories.push((row.category_id, row.category));
            }
        }
        trace!("Found {} categories with activity", categories.len());

        let mut summaries = Vec::with_capacity(categories.len());
        for (category_id, category) in categories {
            let items = self.items_in(window, Some(category_id)).await?;
            let total = items.iter().map(|item| item.amount).sum();
            summaries.push(CategorySummary {
                category,
                items,
                total,
            });
        }
        Ok(summaries)
    }

    /// One pivot row per month with a subtotal and the items of each category active in that
    /// month, followed by a `TOTALS` row of per-category grand totals.
    pub async fn budget_by_category_and_month(&self, query: &ReportQuery) -> Result<Vec<PivotRow>> {
        let months = self.budget_items_by_month(query).await?;
        let categories = Categories::new(self.db.clone()).list().await?;
        Ok(pivot::build(months, &categories))
    }

    async fn items_in(&self, window: Window, filter: Option<i64>) -> Result<Vec<BudgetItem>> {
        let mut balance = Amount::ZERO;
        let items = self
            .joined_rows(window, filter)
            .await?
            .into_iter()
            .map(|row| {
                balance += row.amount;
                BudgetItem {
                    category_id: row.category_id,
                    expense_id: row.expense_id,
                    date: row.date,
                    category: row.category,
                    short_description: row.description,
                    amount: row.amount,
                    balance,
                }
            })
            .collect();
        Ok(items)
    }

    /// The joined stream for `window`, date ascending with ties in id order, minus rows the
    /// category filter rejects.
    async fn joined_rows(&self, window: Window, filter: Option<i64>) -> Result<Vec<JoinedRow>> {
        let (conditions, binds) = window.sql_conditions("e.date");
        let mut sql = String::from(
            "SELECT e.categoryId, e.id, e.date, c.description, e.description, e.amount \
             FROM expenses e JOIN categories c ON e.categoryId = c.id",
        );
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY e.date, e.id");

        let mut q = sqlx::query_as::<_, JoinedTuple>(&sql);
        for bind in binds {
            q = q.bind(bind);
        }
        let tuples = q
            .fetch_all(self.db.pool())
            .await
            .context("Failed to query budget items")?;

        let mut rows = Vec::with_capacity(tuples.len());
        for (category_id, expense_id, date, category, description, amount) in tuples {
            if filter.is_some_and(|wanted| wanted != category_id) {
                continue;
            }
            rows.push(JoinedRow {
                category_id,
                expense_id,
                date: date::from_sql(&date)
                    .with_context(|| format!("Expense {expense_id} has a bad date"))?,
                category,
                description,
                amount: Amount::from_f64(amount).with_context(|| {
                    format!("Expense {expense_id} has an amount that is not a number")
                })?,
            });
        }
        trace!("Selected {} budget rows", rows.len());
        Ok(rows)
    }
}
