//! Item to recipe lookup tables

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::models::Recipe;

/// Lookup tables built once from a snapshot of loaded recipes.
///
/// Lookups for unknown items return an empty slice; callers treat that as a
/// raw material with no known recipe.
#[derive(Debug, Default, Clone)]
pub struct RecipeIndex {
    results: HashMap<String, Vec<Recipe>>,
    ingredients: HashMap<String, Vec<Recipe>>,
    items: BTreeSet<String>,
}

impl RecipeIndex {
    pub fn new(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let mut index = Self::default();
        let mut count = 0usize;

        for recipe in recipes {
            for name in recipe.results().keys() {
                index
                    .results
                    .entry(name.clone())
                    .or_default()
                    .push(recipe.clone());
                index.items.insert(name.clone());
            }
            for name in recipe.ingredients().keys() {
                index
                    .ingredients
                    .entry(name.clone())
                    .or_default()
                    .push(recipe.clone());
                index.items.insert(name.clone());
            }
            count += 1;
        }

        debug!(
            "Indexed {} recipes covering {} items",
            count,
            index.items.len()
        );
        index
    }

    /// Recipes that produce `item`, in load order
    pub fn producers(&self, item: &str) -> &[Recipe] {
        self.results.get(item).map(Vec::as_slice).unwrap_or_default()
    }

    /// Recipes that consume `item`, in load order
    pub fn consumers(&self, item: &str) -> &[Recipe] {
        self.ingredients
            .get(item)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_producible(&self, item: &str) -> bool {
        self.results.contains_key(item)
    }

    /// Every item seen as a result or an ingredient, sorted by name
    pub fn items(&self) -> &BTreeSet<String> {
        &self.items
    }

    /// Items with at least one producing recipe, sorted by name
    pub fn producible_items(&self) -> Vec<&str> {
        let mut items: Vec<&str> = self.results.keys().map(String::as_str).collect();
        items.sort_unstable();
        items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Picks the recipe used to produce an item when several are available
pub trait RecipeSelector {
    fn select<'a>(&self, index: &'a RecipeIndex, item: &str) -> Option<&'a Recipe>;
}

/// The first producing recipe in load order wins. No cost comparison.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrimaryRecipe;

impl RecipeSelector for PrimaryRecipe {
    fn select<'a>(&self, index: &'a RecipeIndex, item: &str) -> Option<&'a Recipe> {
        index.producers(item).first()
    }
}
