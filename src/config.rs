//! Store selection from command line and environment settings

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing::debug;

use crate::error::Result;
use crate::models::normalize_name;
use crate::store::{JsonStore, RecipeStore, SqliteStore};

/// Storage format for a domain's recipes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreBackend {
    /// One JSON array per domain (`<domain>.json`)
    #[default]
    Json,
    /// One SQLite database per domain (`<domain>.db`)
    Sqlite,
}

impl StoreBackend {
    pub fn extension(self) -> &'static str {
        match self {
            StoreBackend::Json => "json",
            StoreBackend::Sqlite => "db",
        }
    }
}

/// Where a domain's recipes live
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Directory holding recipe stores
    #[arg(long, env = "RECIPES_DIR", default_value = ".recipes", global = true)]
    pub dir: PathBuf,

    /// Recipe domain; each domain has its own store
    #[arg(long, env = "RECIPES_DOMAIN", default_value = "default", global = true)]
    pub domain: String,

    /// Store format
    #[arg(long, value_enum, default_value_t = StoreBackend::Json, global = true)]
    pub backend: StoreBackend,
}

impl StoreConfig {
    pub fn new(dir: impl Into<PathBuf>, domain: &str, backend: StoreBackend) -> Self {
        Self {
            dir: dir.into(),
            domain: domain.to_string(),
            backend,
        }
    }

    /// Path of the store file for the configured domain
    pub fn store_path(&self) -> PathBuf {
        let file = format!("{}.{}", normalize_name(&self.domain), self.backend.extension());
        self.dir.join(file)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn open(&self) -> Result<Box<dyn RecipeStore>> {
        let path = self.store_path();
        debug!("Opening {:?} store at {}", self.backend, path.display());
        Ok(match self.backend {
            StoreBackend::Json => Box::new(JsonStore::new(path)),
            StoreBackend::Sqlite => Box::new(SqliteStore::open(&path)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipe;

    #[test]
    fn test_store_path() {
        let config = StoreConfig::new("/data", " Factory ", StoreBackend::Json);
        assert_eq!(config.store_path(), PathBuf::from("/data/factory.json"));

        let config = StoreConfig::new("/data", "factory", StoreBackend::Sqlite);
        assert_eq!(config.store_path(), PathBuf::from("/data/factory.db"));
    }

    #[test]
    fn test_open_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = Recipe::new("smelting", &[("ingot", 1.0)], &[("ore", 2.0)]).unwrap();

        for backend in [StoreBackend::Json, StoreBackend::Sqlite] {
            let config = StoreConfig::new(dir.path(), "factory", backend);
            let store = config.open().unwrap();
            assert!(store.load_recipes().unwrap().is_empty());
            store.add_recipe(&recipe).unwrap();
            assert_eq!(store.load_recipes().unwrap(), vec![recipe.clone()]);
            assert!(config.store_path().exists());
        }
    }
}
