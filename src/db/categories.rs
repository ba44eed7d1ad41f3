//! The category store.

use crate::db::Db;
use crate::error::{Entity, NoOpReason, NotFound, Outcome};
use crate::model::{Category, CategoryType, DEFAULT_CATEGORIES};
use crate::Result;
use anyhow::Context;
use sqlx::SqliteConnection;
use tracing::{debug, info, trace};

/// Reads and writes the `categories` table. Every call goes to the database; nothing is cached.
#[derive(Debug, Clone)]
pub struct Categories {
    db: Db,
}

impl Categories {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Returns the category with `id`.
    ///
    /// # Errors
    /// - `NotFound` (inside the returned error) when no category has this id.
    pub async fn get(&self, id: i64) -> Result<Category> {
        let mut conn = self
            .db
            .pool()
            .acquire()
            .await
            .context("Failed to acquire a database connection")?;
        fetch_one(&mut conn, id)
            .await?
            .ok_or_else(|| NotFound::new(Entity::Category, id).into())
    }

    /// Returns all categories in insertion order.
    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows: Vec<(i64, String, i64)> =
            sqlx::query_as("SELECT id, description, typeId FROM categories ORDER BY id")
                .fetch_all(self.db.pool())
                .await
                .context("Failed to list categories")?;
        trace!("Listed {} categories", rows.len());
        rows.into_iter().map(to_category).collect()
    }

    /// Adds a category and returns its new id.
    ///
    /// Rejected with `UnknownCategoryType` if the type code is missing from `categoryTypes`.
    pub async fn add(
        &self,
        description: &str,
        category_type: CategoryType,
    ) -> Result<Outcome<i64>> {
        let _guard = self.db.write_lock().await;
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let outcome = insert(&mut tx, description, category_type).await?;
        tx.commit().await.context("Failed to commit category")?;
        Ok(outcome)
    }

    /// Changes the description and type of category `id`. The id never changes.
    pub async fn update(
        &self,
        id: i64,
        description: &str,
        category_type: CategoryType,
    ) -> Result<Outcome> {
        let _guard = self.db.write_lock().await;
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        if fetch_one(&mut tx, id).await?.is_none() {
            debug!("Not updating category {id}: not found");
            return Ok(Outcome::NoOp(NoOpReason::NotFound));
        }
        if !type_exists(&mut tx, category_type).await? {
            debug!("Not updating category {id}: unknown type {category_type}");
            return Ok(Outcome::NoOp(NoOpReason::UnknownCategoryType));
        }

        sqlx::query("UPDATE categories SET description = ?, typeId = ? WHERE id = ?")
            .bind(description)
            .bind(category_type.code())
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to update category {id}"))?;
        tx.commit()
            .await
            .context("Failed to commit category update")?;

        debug!("Updated category {id}");
        Ok(Outcome::Applied(()))
    }

    /// Deletes category `id` unless an expense still refers to it. Deleting an id that does not
    /// exist is not an error.
    pub async fn delete(&self, id: i64) -> Result<Outcome> {
        let _guard = self.db.write_lock().await;
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;
        let outcome = remove(&mut tx, id).await?;
        tx.commit()
            .await
            .context("Failed to commit category delete")?;
        Ok(outcome)
    }

    /// Deletes every category that is not in use and then adds the default categories.
    ///
    /// Categories still referenced by expenses survive, so after this call the list holds those
    /// followed by the sixteen defaults. Returns how many defaults were added; a default whose
    /// type code is missing from `categoryTypes` is skipped.
    pub async fn set_to_defaults(&self) -> Result<usize> {
        let _guard = self.db.write_lock().await;
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let ids: Vec<(i64,)> = sqlx::query_as("SELECT id FROM categories ORDER BY id")
            .fetch_all(&mut *tx)
            .await
            .context("Failed to list category ids")?;
        for (id,) in ids {
            let _ = remove(&mut tx, id).await?;
        }
        let mut added = 0;
        for (description, category_type) in DEFAULT_CATEGORIES {
            match insert(&mut tx, description, category_type).await? {
                Outcome::Applied(_) => added += 1,
                Outcome::NoOp(reason) => {
                    info!("Default category '{description}' was not added: {reason}")
                }
            }
        }

        tx.commit()
            .await
            .context("Failed to commit default categories")?;
        debug!("Reset categories to defaults, added {added}");
        Ok(added)
    }
}

fn to_category((id, description, type_id): (i64, String, i64)) -> Result<Category> {
    let category_type = CategoryType::from_code(type_id)
        .with_context(|| format!("Category {id} has an invalid type"))?;
    Ok(Category::new(id, description, category_type))
}

async fn fetch_one(conn: &mut SqliteConnection, id: i64) -> Result<Option<Category>> {
    let row: Option<(i64, String, i64)> =
        sqlx::query_as("SELECT id, description, typeId FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("Failed to query category {id}"))?;
    row.map(to_category).transpose()
}

async fn type_exists(conn: &mut SqliteConnection, category_type: CategoryType) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categoryTypes WHERE id = ?")
        .bind(category_type.code())
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to query category types")?;
    Ok(row.is_some())
}

pub(super) async fn category_exists(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to query category {id}"))?;
    Ok(row.is_some())
}

async fn insert(
    conn: &mut SqliteConnection,
    description: &str,
    category_type: CategoryType,
) -> Result<Outcome<i64>> {
    if !type_exists(conn, category_type).await? {
        debug!("Not adding category '{description}': unknown type {category_type}");
        return Ok(Outcome::NoOp(NoOpReason::UnknownCategoryType));
    }
    let id = sqlx::query("INSERT INTO categories (description, typeId) VALUES (?, ?)")
        .bind(description)
        .bind(category_type.code())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to insert category '{description}'"))?
        .last_insert_rowid();
    debug!("Added category {id} '{description}'");
    Ok(Outcome::Applied(id))
}

async fn remove(conn: &mut SqliteConnection, id: i64) -> Result<Outcome> {
    if !category_exists(conn, id).await? {
        debug!("Not deleting category {id}: not found");
        return Ok(Outcome::NoOp(NoOpReason::NotFound));
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(id) FROM expenses WHERE categoryId = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("Failed to count expenses for category {id}"))?;
    if count > 0 {
        debug!("Not deleting category {id}: used by {count} expenses");
        return Ok(Outcome::NoOp(NoOpReason::CategoryInUse));
    }

    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to delete category {id}"))?;
    debug!("Deleted category {id}");
    Ok(Outcome::Applied(()))
}
