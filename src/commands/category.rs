//! Handlers for `budget category`.

use crate::commands::{Out, OutputFormat, Rows, Table};
use crate::error::Outcome;
use crate::model::{Category, CategoryType};
use crate::{Config, Result};

/// Prints every category, oldest first.
pub async fn category_list(config: &Config, format: OutputFormat) -> Result<Out<Rows>> {
    let categories = config.budget().categories().list().await?;
    let mut table = Table::new(["Id", "Description", "Type"]);
    for category in &categories {
        table.push([
            category.id().to_string(),
            category.description().to_string(),
            category.category_type().name().to_string(),
        ]);
    }
    let rows = Rows::render(format, &categories, &table)?;
    Ok(Out::new(
        format!("Found {} categories", categories.len()),
        rows,
    ))
}

pub async fn category_add(
    config: &Config,
    description: &str,
    category_type: CategoryType,
) -> Result<Out<Outcome<i64>>> {
    let outcome = config
        .budget()
        .categories()
        .add(description, category_type)
        .await?;
    let message = match outcome {
        Outcome::Applied(id) => format!("Added category {id} '{description}'"),
        Outcome::NoOp(reason) => format!("Category '{description}' was not added: {reason}"),
    };
    Ok(Out::new(message, outcome))
}

pub async fn category_update(
    config: &Config,
    id: i64,
    description: &str,
    category_type: CategoryType,
) -> Result<Out<Outcome>> {
    let outcome = config
        .budget()
        .categories()
        .update(id, description, category_type)
        .await?;
    Ok(Out::new(mutation_message("Updated", id, outcome), outcome))
}

pub async fn category_delete(config: &Config, id: i64) -> Result<Out<Outcome>> {
    let outcome = config.budget().categories().delete(id).await?;
    Ok(Out::new(mutation_message("Deleted", id, outcome), outcome))
}

/// Replaces every unused category with the defaults.
pub async fn category_reset(config: &Config) -> Result<Out<Vec<Category>>> {
    let categories = config.budget().categories();
    categories.set_to_defaults().await?;
    let list = categories.list().await?;
    Ok(Out::new(
        format!("Reset to the default categories, {} in total", list.len()),
        list,
    ))
}

fn mutation_message(verb: &str, id: i64, outcome: Outcome) -> String {
    match outcome {
        Outcome::Applied(()) => format!("{verb} category {id}"),
        Outcome::NoOp(reason) => format!("Category {id} was not changed: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoOpReason;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_category_list_table() {
        let env = TestEnv::new().await;
        let out = category_list(&env.config(), OutputFormat::Table)
            .await
            .unwrap();
        assert_eq!(out.message(), "Found 16 categories");
        let Some(Rows::Table(table)) = out.structure() else {
            panic!("expected a table");
        };
        assert!(table.contains("| 9 | Credit Card | Credit |"));
    }

    #[tokio::test]
    async fn test_category_add_and_delete_messages() {
        let env = TestEnv::new().await;
        let config = env.config();

        let out = category_add(&config, "Pets", CategoryType::Expense)
            .await
            .unwrap();
        assert_eq!(out.message(), "Added category 17 'Pets'");

        env.add_expense("2020-01-01", 17, -5, "treats").await;
        let out = category_delete(&config, 17).await.unwrap();
        assert_eq!(
            out.structure(),
            Some(&Outcome::NoOp(NoOpReason::CategoryInUse))
        );
        assert_eq!(
            out.message(),
            "Category 17 was not changed: category_in_use"
        );
    }

    #[tokio::test]
    async fn test_category_update() {
        let env = TestEnv::new().await;
        let out = category_update(&env.config(), 3, "Groceries", CategoryType::Expense)
            .await
            .unwrap();
        assert_eq!(out.message(), "Updated category 3");
        let category = env.categories().get(3).await.unwrap();
        assert_eq!(category.description(), "Groceries");
    }

    #[tokio::test]
    async fn test_category_reset() {
        let env = TestEnv::new().await;
        env.categories().delete(1).await.unwrap();
        let out = category_reset(&env.config()).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 16);
    }
}
