//! The expense store.

use crate::db::categories::category_exists;
use crate::db::Db;
use crate::error::{Entity, NoOpReason, NotFound, Outcome};
use crate::model::{date, Amount, Expense};
use crate::Result;
use anyhow::{anyhow, Context};
use chrono::NaiveDateTime;
use sqlx::SqliteConnection;
use tracing::{debug, trace};

/// Reads and writes the `expenses` table.
#[derive(Debug, Clone)]
pub struct Expenses {
    db: Db,
}

type ExpenseRow = (i64, String, i64, f64, String);

impl Expenses {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Returns the expense with `id`.
    ///
    /// # Errors
    /// - `NotFound` (inside the returned error) when no expense has this id.
    pub async fn get(&self, id: i64) -> Result<Expense> {
        let mut conn = self
            .db
            .pool()
            .acquire()
            .await
            .context("Failed to acquire a database connection")?;
        fetch_one(&mut conn, id)
            .await?
            .ok_or_else(|| NotFound::new(Entity::Expense, id).into())
    }

    /// Returns all expenses in insertion order.
    pub async fn list(&self) -> Result<Vec<Expense>> {
        let rows: Vec<ExpenseRow> = sqlx::query_as(
            "SELECT id, date, categoryId, amount, description FROM expenses ORDER BY id",
        )
        .fetch_all(self.db.pool())
        .await
        .context("Failed to list expenses")?;
        trace!("Listed {} expenses", rows.len());
        rows.into_iter().map(to_expense).collect()
    }

    /// Adds an expense and returns its new id. Rejected with `UnknownCategory` when
    /// `category_id` does not exist.
    pub async fn add(
        &self,
        date: NaiveDateTime,
        category_id: i64,
        amount: Amount,
        description: &str,
    ) -> Result<Outcome<i64>> {
        let _guard = self.db.write_lock().await;
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        if !category_exists(&mut tx, category_id).await? {
            debug!("Not adding expense '{description}': unknown category {category_id}");
            return Ok(Outcome::NoOp(NoOpReason::UnknownCategory));
        }

        let id = sqlx::query(
            "INSERT INTO expenses (date, description, amount, categoryId) VALUES (?, ?, ?, ?)",
        )
        .bind(date::to_sql(date))
        .bind(description)
        .bind(amount.to_f64())
        .bind(category_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert expense '{description}'"))?
        .last_insert_rowid();
        tx.commit().await.context("Failed to commit expense")?;

        debug!("Added expense {id} '{description}' {amount}");
        Ok(Outcome::Applied(id))
    }

    /// Replaces every field of expense `id` except the id itself.
    ///
    /// Nothing changes when `id` does not exist or `category_id` does not exist.
    pub async fn update(
        &self,
        id: i64,
        date: NaiveDateTime,
        category_id: i64,
        amount: Amount,
        description: &str,
    ) -> Result<Outcome> {
        let _guard = self.db.write_lock().await;
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        if fetch_one(&mut tx, id).await?.is_none() {
            debug!("Not updating expense {id}: not found");
            return Ok(Outcome::NoOp(NoOpReason::NotFound));
        }
        if !category_exists(&mut tx, category_id).await? {
            debug!("Not updating expense {id}: unknown category {category_id}");
            return Ok(Outcome::NoOp(NoOpReason::UnknownCategory));
        }

        sqlx::query(
            "UPDATE expenses SET date = ?, description = ?, amount = ?, categoryId = ? \
             WHERE id = ?",
        )
        .bind(date::to_sql(date))
        .bind(description)
        .bind(amount.to_f64())
        .bind(category_id)
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to update expense {id}"))?;
        tx.commit()
            .await
            .context("Failed to commit expense update")?;

        debug!("Updated expense {id}");
        Ok(Outcome::Applied(()))
    }

    /// Deletes expense `id`. Deleting an id that does not exist is not an error.
    pub async fn delete(&self, id: i64) -> Result<Outcome> {
        let _guard = self.db.write_lock().await;
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .with_context(|| format!("Failed to delete expense {id}"))?;

        if result.rows_affected() == 0 {
            debug!("Not deleting expense {id}: not found");
            return Ok(Outcome::NoOp(NoOpReason::NotFound));
        }
        debug!("Deleted expense {id}");
        Ok(Outcome::Applied(()))
    }
}

fn to_expense((id, date, category_id, amount, description): ExpenseRow) -> Result<Expense> {
    let date = date::from_sql(&date).with_context(|| format!("Expense {id} has a bad date"))?;
    let amount = Amount::from_f64(amount)
        .ok_or_else(|| anyhow!("Expense {id} has an amount that is not a number"))?;
    Ok(Expense::new(id, date, category_id, amount, description))
}

async fn fetch_one(conn: &mut SqliteConnection, id: i64) -> Result<Option<Expense>> {
    let row: Option<ExpenseRow> = sqlx::query_as(
        "SELECT id, date, categoryId, amount, description FROM expenses WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("Failed to query expense {id}"))?;
    row.map(to_expense).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_not_found;
    use crate::model::parse_date;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_add_and_get() {
        let env = TestEnv::new().await;
        let date = parse_date("2021-01-10").unwrap();
        let amount = Amount::from_str("98.10").unwrap();

        let id = env
            .expenses()
            .add(date, 10, amount, "hat (on credit)")
            .await
            .unwrap()
            .applied()
            .unwrap();

        let expense = env.expenses().get(id).await.unwrap();
        assert_eq!(expense, Expense::new(id, date, 10, amount, "hat (on credit)"));
    }

    #[tokio::test]
    async fn test_add_appends_with_increasing_ids() {
        let env = TestEnv::new().await;
        let a = env.add_expense("2021-03-01", 1, -100, "power").await;
        let b = env.add_expense("2021-01-01", 2, -900, "rent").await;
        assert!(b > a);

        let list = env.expenses().list().await.unwrap();
        let ids: Vec<i64> = list.iter().map(Expense::id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[tokio::test]
    async fn test_add_with_unknown_category_is_rejected() {
        let env = TestEnv::new().await;
        env.add_expense("2021-03-01", 1, -100, "power").await;

        let outcome = env
            .expenses()
            .add(
                parse_date("2021-03-02").unwrap(),
                57,
                Amount::from(-5),
                "new expense",
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::NoOp(NoOpReason::UnknownCategory));
        assert_eq!(env.expenses().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_returns_not_found() {
        let env = TestEnv::new().await;
        let err = env.expenses().get(3).await.unwrap_err();
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_delete() {
        let env = TestEnv::new().await;
        let a = env.add_expense("2021-03-01", 1, -100, "power").await;
        let b = env.add_expense("2021-03-02", 1, -50, "water").await;

        let outcome = env.expenses().delete(a).await.unwrap();

        assert!(outcome.is_applied());
        let list = env.expenses().list().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id(), b);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_leaves_list_unchanged() {
        let env = TestEnv::new().await;
        env.add_expense("2021-03-01", 1, -100, "power").await;
        let before = env.expenses().list().await.unwrap();

        let outcome = env.expenses().delete(9999).await.unwrap();

        assert_eq!(outcome, Outcome::NoOp(NoOpReason::NotFound));
        assert_eq!(env.expenses().list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_all_fields() {
        let env = TestEnv::new().await;
        let id = env.add_expense("2021-03-01", 1, -100, "power").await;
        let new_date = parse_date("2021-04-15 12:30:00").unwrap();

        let outcome = env
            .expenses()
            .update(id, new_date, 3, Amount::from(-42), "lunch")
            .await
            .unwrap();

        assert!(outcome.is_applied());
        let updated = env.expenses().get(id).await.unwrap();
        assert_eq!(updated, Expense::new(id, new_date, 3, Amount::from(-42), "lunch"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_leaves_list_unchanged() {
        let env = TestEnv::new().await;
        env.add_expense("2021-03-01", 1, -100, "power").await;
        let before = env.expenses().list().await.unwrap();

        let outcome = env
            .expenses()
            .update(
                77,
                parse_date("2021-04-15").unwrap(),
                3,
                Amount::from(-42),
                "lunch",
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::NoOp(NoOpReason::NotFound));
        assert_eq!(env.expenses().list().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_with_unknown_category_leaves_row_unchanged() {
        let env = TestEnv::new().await;
        let id = env.add_expense("2021-03-01", 1, -100, "power").await;
        let before = env.expenses().get(id).await.unwrap();

        let outcome = env
            .expenses()
            .update(
                id,
                parse_date("2021-04-15").unwrap(),
                400,
                Amount::from(-42),
                "lunch",
            )
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::NoOp(NoOpReason::UnknownCategory));
        assert_eq!(env.expenses().get(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_concurrent_adds_get_distinct_ids() {
        let env = TestEnv::new().await;
        let date = parse_date("2022-06-01").unwrap();
        let mut handles = Vec::new();
        for n in 0..8i64 {
            let expenses = env.expenses();
            handles.push(tokio::spawn(async move {
                expenses
                    .add(date, 3, Amount::from(-n), &format!("snack {n}"))
                    .await
                    .unwrap()
                    .applied()
                    .unwrap()
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert_eq!(env.expenses().list().await.unwrap().len(), 8);
    }
}
