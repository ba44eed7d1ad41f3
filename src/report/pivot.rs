//! Builds the category by month pivot from monthly summaries.

use crate::model::{Amount, Category, CategoryTotal, MonthPivot, MonthSummary, PivotRow};
use std::collections::{HashMap, HashSet};

/// One `PivotRow::Month` per summary, in the order given, then the `Totals` row.
///
/// Grand totals are listed in the order of `categories`; a description that appears more than
/// once is only listed the first time. Categories that had no items in any month are left out.
pub(super) fn build(months: Vec<MonthSummary>, categories: &[Category]) -> Vec<PivotRow> {
    let mut grand_totals: HashMap<String, Amount> = HashMap::new();
    let mut rows = Vec::with_capacity(months.len() + 1);

    for summary in months {
        let mut pivot = MonthPivot {
            month: summary.month,
            total: summary.total,
            ..MonthPivot::default()
        };
        for item in summary.items {
            *pivot
                .category_totals
                .entry(item.category.clone())
                .or_default() += item.amount;
            pivot
                .category_details
                .entry(item.category.clone())
                .or_default()
                .push(item);
        }
        for (category, subtotal) in &pivot.category_totals {
            *grand_totals.entry(category.clone()).or_default() += *subtotal;
        }
        rows.push(PivotRow::Month(pivot));
    }

    let mut seen = HashSet::new();
    let totals = categories
        .iter()
        .filter(|c| seen.insert(c.description()))
        .filter_map(|c| {
            grand_totals.get(c.description()).map(|total| CategoryTotal {
                category: c.description().to_string(),
                total: *total,
            })
        })
        .collect();
    rows.push(PivotRow::Totals { totals });
    rows
}
