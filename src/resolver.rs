//! Recursive resolution of an item into a rate-scaled production tree

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{RecipeError, Result};
use crate::index::{PrimaryRecipe, RecipeIndex, RecipeSelector};
use crate::models::{Recipe, check_target_rate, is_valid_rate, normalize_name};
use crate::tree::{Ingredient, ProductionNode, ProductionTree};

/// Expands items through the recipe index, one recipe per item.
///
/// Which recipe is used for an item is decided by the selector, which
/// defaults to [`PrimaryRecipe`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a, S = PrimaryRecipe> {
    index: &'a RecipeIndex,
    selector: S,
}

impl<'a> Resolver<'a, PrimaryRecipe> {
    pub fn new(index: &'a RecipeIndex) -> Self {
        Self::with_selector(index, PrimaryRecipe)
    }
}

impl<'a, S: RecipeSelector> Resolver<'a, S> {
    pub fn with_selector(index: &'a RecipeIndex, selector: S) -> Self {
        Self { index, selector }
    }

    /// Resolve `item` into a production tree at `rate`.
    ///
    /// Without a rate, the tree is built at the selected recipe's own output
    /// rate for the item. Fails with [`RecipeError::UnknownItem`] if nothing
    /// produces the item and with [`RecipeError::CyclicDependency`] if the
    /// item ends up among its own ingredients.
    pub fn resolve(&self, item: &str, rate: Option<f64>) -> Result<ProductionTree> {
        let item = normalize_name(item);
        let recipe = self.recipe_for(&item)?;
        let rate = match rate {
            Some(rate) => check_target_rate(rate)?,
            None => native_rate(recipe, &item)?,
        };

        debug!("Resolving {} at {}", item, rate);

        let mut path = Vec::new();
        let root = self.resolve_node(recipe, &item, rate, &mut path)?;
        debug!("Resolved {} into {} entries", item, root.size());
        Ok(ProductionTree::new(item, root))
    }

    fn recipe_for(&self, item: &str) -> Result<&'a Recipe> {
        self.selector
            .select(self.index, item)
            .ok_or_else(|| RecipeError::UnknownItem {
                item: item.to_string(),
            })
    }

    fn resolve_node(
        &self,
        recipe: &Recipe,
        item: &str,
        rate: f64,
        path: &mut Vec<String>,
    ) -> Result<ProductionNode> {
        let ratio = rate / native_rate(recipe, item)?;
        path.push(item.to_string());

        let mut ingredients = IndexMap::with_capacity(recipe.ingredients().len());
        for (name, ingredient_rate) in recipe.ingredients() {
            let required = ingredient_rate * ratio;
            if !is_valid_rate(required) {
                return Err(RecipeError::RateOverflow { item: name.clone() });
            }

            let entry = match self.selector.select(self.index, name) {
                Some(sub_recipe) => {
                    if path.iter().any(|ancestor| ancestor == name) {
                        let mut cycle = path.clone();
                        cycle.push(name.clone());
                        return Err(RecipeError::CyclicDependency { path: cycle });
                    }
                    let node = self.resolve_node(sub_recipe, name, required, path)?;
                    Ingredient::Expanded(vec![node])
                }
                None => Ingredient::Leaf(required),
            };
            ingredients.insert(name.clone(), entry);
        }

        path.pop();
        Ok(ProductionNode {
            rate,
            context: recipe.context().to_string(),
            ingredients,
        })
    }
}

/// The rate at which `recipe` produces `item` in one unit of work
fn native_rate(recipe: &Recipe, item: &str) -> Result<f64> {
    recipe
        .result_rate(item)
        .ok_or_else(|| RecipeError::UnknownItem {
            item: item.to_string(),
        })
}
