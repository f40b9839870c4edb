//! Recipe persistence
//!
//! A store holds the recipes of one domain as an ordered list. Two backends
//! are available: a JSON file holding an array of recipe records, and a
//! SQLite database. Both treat a store that does not exist yet as empty.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::models::{ItemRates, Recipe};

/// Source of recipe records for one domain
pub trait RecipeStore {
    /// All recipes in the order they were added
    fn load_recipes(&self) -> Result<Vec<Recipe>>;

    /// Append one recipe
    fn add_recipe(&self, recipe: &Recipe) -> Result<()>;

    /// Replace the stored recipes
    fn dump_recipes(&self, recipes: &[Recipe]) -> Result<()>;
}

/// Recipes stored as one JSON array per file
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, recipes: &[Recipe]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(recipes)?)?;
        Ok(())
    }
}

impl RecipeStore for JsonStore {
    fn load_recipes(&self) -> Result<Vec<Recipe>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No recipe file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let recipes: Vec<Recipe> = serde_json::from_slice(&data)?;
        debug!("Loaded {} recipes from {}", recipes.len(), self.path.display());
        Ok(recipes)
    }

    fn add_recipe(&self, recipe: &Recipe) -> Result<()> {
        let mut recipes = self.load_recipes()?;
        recipes.push(recipe.clone());
        self.write(&recipes)?;
        info!("Added recipe to {}: {}", self.path.display(), recipe);
        Ok(())
    }

    fn dump_recipes(&self, recipes: &[Recipe]) -> Result<()> {
        self.write(recipes)?;
        info!("Wrote {} recipes to {}", recipes.len(), self.path.display());
        Ok(())
    }
}

/// Recipes stored in a SQLite database
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn load_rates(&self, table: &str, recipe_id: i64) -> Result<ItemRates> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT item, rate FROM {} WHERE recipe_id = ?1 ORDER BY position",
            table
        ))?;

        let rows = stmt.query_map([recipe_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut rates = ItemRates::new();
        for row in rows {
            let (item, rate) = row?;
            rates.insert(item, rate);
        }
        Ok(rates)
    }
}

/// Initialize the database schema
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            context TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS recipe_results (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id),
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (recipe_id, item)
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id),
            position INTEGER NOT NULL,
            item TEXT NOT NULL,
            rate REAL NOT NULL,
            PRIMARY KEY (recipe_id, item)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_results_item ON recipe_results(item);
        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_item ON recipe_ingredients(item);
        "#,
    )?;
    Ok(())
}

fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<()> {
    conn.execute("INSERT INTO recipes (context) VALUES (?1)", [recipe.context()])?;
    let recipe_id = conn.last_insert_rowid();

    for (table, rates) in [
        ("recipe_results", recipe.results()),
        ("recipe_ingredients", recipe.ingredients()),
    ] {
        let sql = format!(
            "INSERT INTO {} (recipe_id, position, item, rate) VALUES (?1, ?2, ?3, ?4)",
            table
        );
        for (position, (item, rate)) in rates.iter().enumerate() {
            conn.execute(&sql, (recipe_id, position as i64, item, *rate))?;
        }
    }
    Ok(())
}

impl RecipeStore for SqliteStore {
    fn load_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, context FROM recipes ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut headers = Vec::new();
        for row in rows {
            headers.push(row?);
        }

        let mut recipes = Vec::with_capacity(headers.len());
        for (id, context) in headers {
            let results = self.load_rates("recipe_results", id)?;
            let ingredients = self.load_rates("recipe_ingredients", id)?;
            recipes.push(Recipe::from_rates(&context, results, ingredients)?);
        }

        debug!("Loaded {} recipes from database", recipes.len());
        Ok(recipes)
    }

    fn add_recipe(&self, recipe: &Recipe) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_recipe(&tx, recipe)?;
        tx.commit()?;
        info!("Added recipe to database: {}", recipe);
        Ok(())
    }

    fn dump_recipes(&self, recipes: &[Recipe]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM recipe_ingredients;
            DELETE FROM recipe_results;
            DELETE FROM recipes;
            "#,
        )?;
        for recipe in recipes {
            insert_recipe(&tx, recipe)?;
        }
        tx.commit()?;
        info!("Wrote {} recipes to database", recipes.len());
        Ok(())
    }
}

/// Domains with a store file (`<domain>.json` or `<domain>.db`) in `dir`
pub fn known_domains(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut domains = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let is_store = path
            .extension()
            .is_some_and(|ext| ext == "json" || ext == "db");
        if let (true, Some(stem)) = (is_store, path.file_stem().and_then(|s| s.to_str())) {
            domains.insert(stem.to_lowercase());
        }
    }

    Ok(domains.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeError;

    fn recipes() -> Vec<Recipe> {
        vec![
            Recipe::new("smelting", &[("ingot", 1.0)], &[("ore", 2.0), ("coal", 1.0)]).unwrap(),
            Recipe::new("", &[("plate", 1.0), ("dust", 0.5)], &[("ingot", 3.0)]).unwrap(),
            Recipe::new("mining", &[("ore", 1.0)], &[]).unwrap(),
        ]
    }

    #[test]
    fn test_json_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nothing.json"));
        assert!(store.load_recipes().unwrap().is_empty());
    }

    #[test]
    fn test_json_add_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("nested").join("factory.json"));

        for recipe in recipes() {
            store.add_recipe(&recipe).unwrap();
        }
        assert_eq!(store.load_recipes().unwrap(), recipes());

        let reopened = JsonStore::new(store.path().to_path_buf());
        let loaded = reopened.load_recipes().unwrap();
        assert_eq!(loaded, recipes());
        let keys: Vec<&str> = loaded[0].ingredients().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ore", "coal"]);
    }

    #[test]
    fn test_json_dump_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("factory.json"));
        store.dump_recipes(&recipes()).unwrap();
        store.dump_recipes(&recipes()[..1]).unwrap();
        assert_eq!(store.load_recipes().unwrap().len(), 1);
    }

    #[test]
    fn test_json_invalid_record_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"[{"context": "", "results": {"ingot": 0}, "ingredients": {}}]"#).unwrap();

        let err = JsonStore::new(path).load_recipes().unwrap_err();
        assert!(matches!(err, RecipeError::Json(_)));
    }

    #[test]
    fn test_sqlite_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.load_recipes().unwrap().is_empty());

        for recipe in recipes() {
            store.add_recipe(&recipe).unwrap();
        }
        let loaded = store.load_recipes().unwrap();
        assert_eq!(loaded, recipes());
        let keys: Vec<&str> = loaded[1].results().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["plate", "dust"]);

        store.dump_recipes(&recipes()[2..]).unwrap();
        assert_eq!(store.load_recipes().unwrap(), recipes()[2..].to_vec());
    }

    #[test]
    fn test_sqlite_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factory.db");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.dump_recipes(&recipes()).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_recipes().unwrap(), recipes());
    }

    #[test]
    fn test_known_domains() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("factory.json"), "[]").unwrap();
        fs::write(dir.path().join("kitchen.db"), "").unwrap();
        fs::write(dir.path().join("Factory.db"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("hidden.json"), "[]").unwrap();

        assert_eq!(known_domains(dir.path()).unwrap(), vec!["factory", "kitchen"]);
        assert!(known_domains(&dir.path().join("missing")).unwrap().is_empty());
    }
}
