//! The derived report shapes produced by the aggregation engine. None of these are persisted.

use crate::model::Amount;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The month key of the terminal pivot row.
pub const TOTALS: &str = "TOTALS";

/// One expense joined to its category, with the running balance of the report it belongs to.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BudgetItem {
    pub category_id: i64,
    pub expense_id: i64,
    pub date: NaiveDateTime,
    /// The category's description.
    pub category: String,
    /// The expense's description.
    pub short_description: String,
    pub amount: Amount,
    /// Sum of `amount` over this item and every item before it in the same report.
    pub balance: Amount,
}

/// All items that fall in one calendar month.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthSummary {
    /// `YYYY/MM`
    pub month: String,
    pub items: Vec<BudgetItem>,
    pub total: Amount,
}

/// All items that belong to one category.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategorySummary {
    pub category: String,
    pub items: Vec<BudgetItem>,
    pub total: Amount,
}

/// One month of the category by month pivot. Maps are keyed by category description and iterate
/// alphabetically.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MonthPivot {
    /// `YYYY/MM`
    pub month: String,
    pub total: Amount,
    pub category_totals: BTreeMap<String, Amount>,
    pub category_details: BTreeMap<String, Vec<BudgetItem>>,
}

/// A category's grand total across every month of a pivot.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryTotal {
    pub category: String,
    pub total: Amount,
}

/// A row of the category by month pivot: one per month, then a single `Totals` row.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PivotRow {
    Month(MonthPivot),
    /// Per-category grand totals, in category list order.
    Totals { totals: Vec<CategoryTotal> },
}

impl PivotRow {
    /// The month key, or `TOTALS` for the terminal row.
    pub fn month(&self) -> &str {
        match self {
            PivotRow::Month(m) => &m.month,
            PivotRow::Totals { .. } => TOTALS,
        }
    }

    /// The amount for `category` in this row, if the category had any activity.
    pub fn category_total(&self, category: &str) -> Option<Amount> {
        match self {
            PivotRow::Month(m) => m.category_totals.get(category).copied(),
            PivotRow::Totals { totals } => totals
                .iter()
                .find(|t| t.category == category)
                .map(|t| t.total),
        }
    }
}
