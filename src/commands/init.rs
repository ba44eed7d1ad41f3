use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the budget home directory with:
/// - an initial `config.json` file with default settings
/// - a new SQLite database seeded with the default categories
///
/// # Arguments
/// - `budget_home` - The directory that will be the budget home, e.g. `$HOME/budget`
/// - `force` - Replace an existing budget in `budget_home`.
///
/// # Errors
/// - Returns an error if a budget already exists and `force` is false.
/// - Returns an error if any file operations fail.
pub async fn init(budget_home: &Path, force: bool) -> Result<Out<()>> {
    let config = Config::create(budget_home, force)
        .await
        .context("Unable to create the budget directory and config")?;
    Ok(format!(
        "Successfully created the budget in {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("budget");

        let out = init(&home, false).await.unwrap();

        assert!(out.message().starts_with("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("budget.sqlite").is_file());
        assert!(init(&home, false).await.is_err());
        assert!(init(&home, true).await.is_ok());
    }
}
