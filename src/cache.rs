//! Bulk resolution with memoized subtrees
//!
//! Enumerating every recipe for an item expands many overlapping subtrees.
//! A [`ResolutionContext`] remembers the subtrees it has built per item and
//! hands out rescaled copies instead of expanding the same item again. An
//! ingredient is only expanded fresh the first time it is met in a pass;
//! later occurrences reuse whatever shape was cached for it, or stay a leaf
//! if nothing is cached yet. This also keeps cyclic recipe graphs finite.
//!
//! A context is scoped to one pass. Build a new one per top-level request.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::index::RecipeIndex;
use crate::models::normalize_name;
use crate::tree::{Ingredient, ProductionNode, ProductionTree};

/// Seen-set and subtree cache for one bulk resolution pass
#[derive(Debug)]
pub struct ResolutionContext<'a> {
    index: &'a RecipeIndex,
    seen: HashSet<String>,
    subtrees: HashMap<String, Vec<ProductionNode>>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(index: &'a RecipeIndex) -> Self {
        Self {
            index,
            seen: HashSet::new(),
            subtrees: HashMap::new(),
        }
    }

    /// Subtrees for every recipe producing `item`, scaled to `expected_rate`.
    ///
    /// Returns an empty list for raw materials.
    pub fn get_or_resolve(&mut self, item: &str, expected_rate: f64) -> Vec<ProductionNode> {
        if let Some(cached) = self.cached(item, expected_rate) {
            return cached;
        }

        let index = self.index;
        let mut subtrees = Vec::new();
        for recipe in index.producers(item) {
            let Some(native) = recipe.result_rate(item) else {
                continue;
            };
            let ratio = expected_rate / native;

            let mut ingredients = IndexMap::with_capacity(recipe.ingredients().len());
            for (name, rate) in recipe.ingredients() {
                let required = rate * ratio;
                let nodes = if self.seen.contains(name) {
                    self.cached(name, required).unwrap_or_default()
                } else {
                    self.seen.insert(name.clone());
                    self.get_or_resolve(name, required)
                };
                ingredients.insert(name.clone(), into_ingredient(nodes, required));
            }

            subtrees.push(ProductionNode {
                rate: expected_rate,
                context: recipe.context().to_string(),
                ingredients,
            });
        }

        self.subtrees.insert(item.to_string(), subtrees.clone());
        subtrees
    }

    /// Cached subtrees for `item` rescaled to `rate`, if any were built
    fn cached(&self, item: &str, rate: f64) -> Option<Vec<ProductionNode>> {
        let subtrees = self.subtrees.get(item).filter(|s| !s.is_empty())?;
        debug!("Reusing {} cached subtree(s) for {}", subtrees.len(), item);
        Some(subtrees.iter().map(|node| node.with_rate(rate)).collect())
    }

    /// Number of items with a cache entry
    pub fn cached_items(&self) -> usize {
        self.subtrees.len()
    }
}

fn into_ingredient(nodes: Vec<ProductionNode>, rate: f64) -> Ingredient {
    if nodes.is_empty() {
        Ingredient::Leaf(rate)
    } else {
        Ingredient::Expanded(nodes)
    }
}

/// One tree per recipe producing `item`, each at that recipe's own rate.
///
/// Unknown items give an empty list. Every call runs in a fresh
/// [`ResolutionContext`].
pub fn ingredient_trees(index: &RecipeIndex, item: &str) -> Vec<ProductionTree> {
    let item = normalize_name(item);
    let mut context = ResolutionContext::new(index);
    let mut trees = Vec::new();

    for recipe in index.producers(&item) {
        let Some(native) = recipe.result_rate(&item) else {
            continue;
        };

        let mut ingredients = IndexMap::with_capacity(recipe.ingredients().len());
        for (name, rate) in recipe.ingredients() {
            let nodes = context.get_or_resolve(name, *rate);
            ingredients.insert(name.clone(), into_ingredient(nodes, *rate));
        }

        trees.push(ProductionTree::new(
            item.clone(),
            ProductionNode {
                rate: native,
                context: recipe.context().to_string(),
                ingredients,
            },
        ));
    }

    debug!(
        "Built {} alternative tree(s) for {} ({} cached items)",
        trees.len(),
        item,
        context.cached_items()
    );
    trees
}
