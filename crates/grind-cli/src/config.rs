//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use grind_core::Category;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Categories offered when labeling a focus lap, in display order.
    pub categories: Vec<String>,
    /// Category used when labeling is skipped.
    pub default_category: String,
    /// Live display refresh interval in milliseconds.
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("grind.db"),
            categories: vec![
                "Physics".to_string(),
                "Chemistry".to_string(),
                "Biology".to_string(),
            ],
            default_category: "Physics".to_string(),
            tick_ms: 100,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (GRIND_*)
        figment = figment.merge(Env::prefixed("GRIND_"));

        figment.extract()
    }

    /// Validates the configured categories.
    pub fn categories(&self) -> Result<Categories> {
        let mut list: Vec<Category> = Vec::with_capacity(self.categories.len());
        for name in &self.categories {
            let category = Category::new(name.as_str())
                .with_context(|| format!("invalid category in config: {name:?}"))?;
            if list.iter().any(|c| c.as_str().eq_ignore_ascii_case(category.as_str())) {
                bail!("duplicate category in config: {category}");
            }
            list.push(category);
        }
        if list.is_empty() {
            bail!("at least one category must be configured");
        }

        let wanted = Category::new(self.default_category.as_str())
            .context("invalid default_category in config")?;
        let Some(default) = list.iter().find(|c| **c == wanted).cloned() else {
            bail!("default_category {wanted} is not one of the configured categories");
        };

        Ok(Categories { list, default })
    }

    /// Live display refresh interval.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

/// The validated category set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categories {
    list: Vec<Category>,
    default: Category,
}

impl Categories {
    pub fn list(&self) -> &[Category] {
        &self.list
    }

    pub const fn default_category(&self) -> &Category {
        &self.default
    }

    /// Finds a configured category by name, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<&Category> {
        let name = name.trim();
        self.list
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }
}

/// Returns the platform-specific config directory for grind.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("grind"))
}

/// Returns the platform-specific data directory for grind.
///
/// On Linux: `~/.local/share/grind`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("grind"))
}
