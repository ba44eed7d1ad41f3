//! Handlers for `budget expense`.

use crate::args::ExpenseFields;
use crate::commands::{Out, OutputFormat, Rows, Table};
use crate::error::Outcome;
use crate::model::date;
use crate::{Config, Result};

/// Prints every expense in the order it was recorded.
pub async fn expense_list(config: &Config, format: OutputFormat) -> Result<Out<Rows>> {
    let expenses = config.budget().expenses().list().await?;
    let mut table = Table::new(["Id", "Date", "Category Id", "Amount", "Description"]);
    for expense in &expenses {
        table.push([
            expense.id().to_string(),
            date::to_display(expense.date()),
            expense.category_id().to_string(),
            expense.amount().to_string(),
            expense.description().to_string(),
        ]);
    }
    let rows = Rows::render(format, &expenses, &table)?;
    Ok(Out::new(format!("Found {} expenses", expenses.len()), rows))
}

pub async fn expense_add(config: &Config, fields: &ExpenseFields) -> Result<Out<Outcome<i64>>> {
    let outcome = config
        .budget()
        .expenses()
        .add(
            fields.date(),
            fields.category_id(),
            fields.amount(),
            fields.description(),
        )
        .await?;
    let message = match outcome {
        Outcome::Applied(id) => format!("Added expense {id} '{}'", fields.description()),
        Outcome::NoOp(reason) => format!(
            "Expense '{}' was not added: {reason} {}",
            fields.description(),
            fields.category_id()
        ),
    };
    Ok(Out::new(message, outcome))
}

pub async fn expense_update(
    config: &Config,
    id: i64,
    fields: &ExpenseFields,
) -> Result<Out<Outcome>> {
    let outcome = config
        .budget()
        .expenses()
        .update(
            id,
            fields.date(),
            fields.category_id(),
            fields.amount(),
            fields.description(),
        )
        .await?;
    Ok(Out::new(mutation_message("Updated", id, outcome), outcome))
}

pub async fn expense_delete(config: &Config, id: i64) -> Result<Out<Outcome>> {
    let outcome = config.budget().expenses().delete(id).await?;
    Ok(Out::new(mutation_message("Deleted", id, outcome), outcome))
}

fn mutation_message(verb: &str, id: i64, outcome: Outcome) -> String {
    match outcome {
        Outcome::Applied(()) => format!("{verb} expense {id}"),
        Outcome::NoOp(reason) => format!("Expense {id} was not changed: {reason}"),
    }
}
