//! Recipe production calculator
//!
//! Resolves crafting recipes into rate-scaled production trees and derives
//! raw material totals and step lists from them.

pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod parse;
pub mod reducer;
pub mod resolver;
pub mod store;
pub mod tree;
pub mod view;

pub use cache::{ResolutionContext, ingredient_trees};
pub use error::{RecipeError, Result};
pub use index::{PrimaryRecipe, RecipeIndex, RecipeSelector};
pub use models::Recipe;
pub use reducer::{as_steps, totals};
pub use resolver::Resolver;
pub use tree::{Ingredient, ProductionNode, ProductionTree};
