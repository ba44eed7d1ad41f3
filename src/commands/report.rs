//! Handler for `budget report`.

use crate::args::ReportArgs;
use crate::commands::{Out, Rows, Table};
use crate::model::{date, Amount, BudgetItem, PivotRow};
use crate::report::{search, Report, ReportKind, ReportQuery};
use crate::{Config, Result};
use anyhow::bail;
use tracing::debug;

/// Runs the report chosen by the grouping flags and renders it in the requested format.
///
/// Table and CSV output hold one line per expense for the plain list, one line per month or
/// category for the grouped reports, and a month by category grid for the combined report.
/// JSON output always carries every detail.
pub async fn report(config: &Config, args: &ReportArgs) -> Result<Out<Rows>> {
    let kind = ReportKind::from_toggles(args.by_category(), args.by_month());
    if args.search().is_some() && kind != ReportKind::Items {
        bail!("--search cannot be combined with --by-month or --by-category");
    }

    let query = ReportQuery::new(
        args.start(),
        args.end(),
        args.category_id().is_some(),
        args.category_id().unwrap_or_default(),
    );
    debug!("Running the {kind} report for {query:?}");
    let report = match (args.search(), config.budget().reports().run(kind, &query).await?) {
        (Some(needle), Report::Items(items)) => {
            let found = search(&items, needle, None);
            debug!("Search for '{needle}' matched {} items", found.matches.len());
            Report::Items(found.matches)
        }
        (_, report) => report,
    };

    let table = to_table(&report);
    let message = format!("Report has {} rows", table.len());
    let rows = Rows::render(args.format(), &report, &table)?;
    Ok(Out::new(message, rows))
}

fn to_table(report: &Report) -> Table {
    match report {
        Report::Items(items) => items_table(items),
        Report::ByMonth(months) => {
            let mut table = Table::new(["Month", "Total"]);
            for month in months {
                table.push([month.month.clone(), month.total.to_string()]);
            }
            table
        }
        Report::ByCategory(categories) => {
            let mut table = Table::new(["Category", "Total"]);
            for category in categories {
                table.push([category.category.clone(), category.total.to_string()]);
            }
            table
        }
        Report::ByCategoryAndMonth(rows) => pivot_table(rows),
    }
}

fn items_table(items: &[BudgetItem]) -> Table {
    let mut table = Table::new(["Date", "Category", "Description", "Amount", "Balance"]);
    for item in items {
        table.push([
            date::to_display(item.date),
            item.category.clone(),
            item.short_description.clone(),
            item.amount.to_string(),
            item.balance.to_string(),
        ]);
    }
    table
}

/// One column per category that appears in the totals row, in that order.
fn pivot_table(rows: &[PivotRow]) -> Table {
    let columns: Vec<String> = match rows.last() {
        Some(PivotRow::Totals { totals }) => totals.iter().map(|t| t.category.clone()).collect(),
        _ => Vec::new(),
    };

    let mut headers = vec!["Month".to_string()];
    headers.extend(columns.iter().cloned());
    headers.push("Total".to_string());
    let mut table = Table::new(headers);

    for row in rows {
        let total = match row {
            PivotRow::Month(month) => month.total,
            PivotRow::Totals { totals } => totals.iter().map(|t| t.total).sum::<Amount>(),
        };
        let mut cells = vec![row.month().to_string()];
        cells.extend(columns.iter().map(|category| {
            row.category_total(category)
                .map(|amount| amount.to_string())
                .unwrap_or_default()
        }));
        cells.push(total.to_string());
        table.push(cells);
    }
    table
}
