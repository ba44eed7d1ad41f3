//! The `HomeBudget` handle that ties the stores and the report engine to one database.

use crate::db::{Categories, Db, Expenses};
use crate::report::Reports;
use crate::Result;
use std::path::Path;
use tracing::debug;

/// One open budget. The caller owns the handle's lifetime; any number of budgets may be open at
/// the same time.
#[derive(Debug, Clone)]
pub struct HomeBudget {
    db: Db,
}

impl HomeBudget {
    /// Opens the budget database at `path`.
    ///
    /// If `create_new` is false and the file exists it is opened as is. Otherwise a new database
    /// replaces whatever is at `path` and is seeded with the default categories.
    pub async fn open(path: impl AsRef<Path>, create_new: bool) -> Result<Self> {
        let path = path.as_ref();
        let is_new = create_new || !path.is_file();
        let db = Db::open(path, create_new).await?;
        let budget = Self { db };
        if is_new {
            let added = budget.categories().set_to_defaults().await?;
            debug!("Seeded {added} default categories in {}", path.display());
        }
        Ok(budget)
    }

    pub fn categories(&self) -> Categories {
        Categories::new(self.db.clone())
    }

    pub fn expenses(&self) -> Expenses {
        Expenses::new(self.db.clone())
    }

    pub fn reports(&self) -> Reports {
        Reports::new(self.db.clone())
    }

    pub fn path(&self) -> &Path {
        self.db.path()
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    /// Closes the database. Stores and reports taken from this budget stop working.
    pub async fn close(&self) {
        self.db.close().await
    }
}
