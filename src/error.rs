//! Error types for recipe loading and resolution

use thiserror::Error;

/// Errors that can occur while validating, storing or resolving recipes
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Resolution was requested for an item no recipe produces
    #[error("{item} is not a known recipe")]
    UnknownItem { item: String },

    /// An item name was empty after trimming
    #[error("missing item name in {field}")]
    EmptyName { field: &'static str },

    /// A recipe rate was zero, negative or not finite
    #[error("rate for '{item}' must be a positive number, got {rate}")]
    InvalidRate { item: String, rate: f64 },

    /// A recipe must produce at least one item
    #[error("recipe must have at least one result")]
    NoResults,

    /// A requested production rate was zero, negative or not finite
    #[error("target rate must be a positive number, got {rate}")]
    InvalidTargetRate { rate: f64 },

    /// Scaling a recipe to the requested rate left the range of `f64`
    #[error("rate for '{item}' overflows when scaled to the requested rate")]
    RateOverflow { item: String },

    /// An item depends on itself through its own recipe chain
    #[error("cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    /// An item entry could not be parsed
    #[error("cannot parse item entry '{entry}'")]
    InvalidEntry { entry: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, RecipeError>;
