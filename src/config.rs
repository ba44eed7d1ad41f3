//! Configuration file handling for the budget home directory.
//!
//! The configuration file is stored at `$BUDGET_HOME/config.json`. It names the application and
//! says where the SQLite database lives; by default that is `$BUDGET_HOME/budget.sqlite`.

use crate::budget::HomeBudget;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const BUDGET_SQLITE: &str = "budget.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$BUDGET_HOME` and from there it loads `$BUDGET_HOME/config.json` and opens the
/// budget database it points to.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    sqlite_path: PathBuf,
    budget: HomeBudget,
}

impl Config {
    /// Creates the budget home directory with an initial `config.json` and a new database
    /// seeded with the default categories.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the budget home, e.g. `$HOME/budget`
    /// - `force` - Replace an existing configuration and database instead of failing.
    ///
    /// # Errors
    /// - Returns an error if `dir` already holds a configuration and `force` is false.
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, force: bool) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() && !force {
            bail!(
                "A budget already exists at '{}', use --force to replace it",
                root.display()
            );
        }

        let config_file = ConfigFile::default();
        config_file.save(&config_path).await?;

        let sqlite_path = resolve(&root, config_file.sqlite_path());
        let budget = HomeBudget::open(&sqlite_path, true)
            .await
            .context("Unable to create the budget database")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            sqlite_path,
            budget,
        })
    }

    /// This will
    /// - validate that `budget_home` exists and that the config file exists
    /// - load the config file
    /// - open the budget database, bringing its schema up to date
    pub async fn load(budget_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = budget_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The budget home is missing, run 'budget init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = resolve(&root, config_file.sqlite_path());
        if !sqlite_path.is_file() {
            bail!(
                "The budget database is missing '{}'",
                sqlite_path.display()
            )
        }
        let budget = HomeBudget::open(&sqlite_path, false)
            .await
            .context("Unable to load the budget database")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            sqlite_path,
            budget,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn config_version(&self) -> u8 {
        self.config_file.config_version
    }

    pub fn budget(&self) -> &HomeBudget {
        &self.budget
    }
}

/// Returns `p` unchanged if it is absolute, otherwise resolves it against `root`.
fn resolve(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        return p;
    }
    root.join(p)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "sqlite_path": "budget.sqlite"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Path to the SQLite database (optional, relative to the budget home or absolute)
    /// Defaults to $BUDGET_HOME/budget.sqlite if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sqlite_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sqlite_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another application.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = utils::read(path).await?;

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the SQLite path, which may be relative to the budget home.
    fn sqlite_path(&self) -> PathBuf {
        self.sqlite_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(BUDGET_SQLITE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CategoryType;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("budget_home");

        let config = Config::create(&home_dir, false).await.unwrap();

        assert!(config.config_path().is_file());
        assert!(config.sqlite_path().is_file());
        assert_eq!(config.sqlite_path().file_name().unwrap(), BUDGET_SQLITE);
        assert_eq!(config.config_version(), CONFIG_VERSION);
        let categories = config.budget().categories().list().await.unwrap();
        assert_eq!(categories.len(), 16);
    }

    #[tokio::test]
    async fn test_config_create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path(), false).await.unwrap();

        let err = Config::create(dir.path(), false).await.unwrap_err();
        assert!(err.to_string().contains("--force"));
    }

    #[tokio::test]
    async fn test_config_create_force_replaces_budget() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), false).await.unwrap();
        config
            .budget()
            .categories()
            .add("Pets", CategoryType::Expense)
            .await
            .unwrap();
        config.budget().close().await;

        let config = Config::create(dir.path(), true).await.unwrap();
        assert_eq!(config.budget().categories().list().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_config_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path(), false).await.unwrap();
        created.budget().close().await;

        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(loaded.root(), created.root());
        assert_eq!(loaded.sqlite_path(), created.sqlite_path());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_database() {
        let dir = TempDir::new().unwrap();
        let config = Config::create(dir.path(), false).await.unwrap();
        config.budget().close().await;
        utils::remove_file(config.sqlite_path()).await.unwrap();

        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("database is missing"));
    }

    #[tokio::test]
    async fn test_config_file_custom_sqlite_path() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let custom = other.path().join("elsewhere.sqlite");
        HomeBudget::open(&custom, true).await.unwrap().close().await;
        let json = format!(
            r#"{{ "app_name": "budget", "config_version": 1, "sqlite_path": {} }}"#,
            serde_json::to_string(&custom).unwrap()
        );
        utils::write(dir.path().join(CONFIG_JSON), json)
            .await
            .unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.sqlite_path(), custom);
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let original = ConfigFile {
            sqlite_path: Some(PathBuf::from("data/my.sqlite")),
            ..ConfigFile::default()
        };

        original.save(&config_path).await.unwrap();
        let loaded = ConfigFile::load(&config_path).await.unwrap();

        assert_eq!(original, loaded);
        assert_eq!(loaded.sqlite_path(), PathBuf::from("data/my.sqlite"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        utils::write(
            &config_path,
            r#"{ "app_name": "tiller", "config_version": 1 }"#,
        )
        .await
        .unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("sqlite_path"));
    }
}
