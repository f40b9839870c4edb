//! Data models for recipes

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{RecipeError, Result};

/// Item name to rate, in the order the entries were given
pub type ItemRates = IndexMap<String, f64>;

/// A validated production rule: ingredient rates in, result rates out.
///
/// Item names are trimmed and lower-cased, every rate is finite and strictly
/// positive (subnormal values are rejected), and there is at least one
/// result. A `Recipe` cannot be changed after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecipe")]
pub struct Recipe {
    context: String,
    results: ItemRates,
    ingredients: ItemRates,
}

/// Unvalidated recipe record as it appears in a store
#[derive(Debug, Deserialize)]
struct RawRecipe {
    #[serde(default)]
    context: String,
    results: ItemRates,
    #[serde(default)]
    ingredients: ItemRates,
}

impl TryFrom<RawRecipe> for Recipe {
    type Error = RecipeError;

    fn try_from(raw: RawRecipe) -> Result<Self> {
        Recipe::from_rates(&raw.context, raw.results, raw.ingredients)
    }
}

impl Recipe {
    /// Build a recipe from borrowed `(name, rate)` pairs
    pub fn new(context: &str, results: &[(&str, f64)], ingredients: &[(&str, f64)]) -> Result<Self> {
        let collect = |entries: &[(&str, f64)]| -> ItemRates {
            entries
                .iter()
                .map(|(name, rate)| (name.to_string(), *rate))
                .collect()
        };
        Self::from_rates(context, collect(results), collect(ingredients))
    }

    /// Build a recipe from owned rate maps, normalizing names and checking rates
    pub fn from_rates(context: &str, results: ItemRates, ingredients: ItemRates) -> Result<Self> {
        if results.is_empty() {
            return Err(RecipeError::NoResults);
        }

        Ok(Self {
            context: context.trim().to_lowercase(),
            results: normalize_rates(results, "results")?,
            ingredients: normalize_rates(ingredients, "ingredients")?,
        })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn results(&self) -> &ItemRates {
        &self.results
    }

    pub fn ingredients(&self) -> &ItemRates {
        &self.ingredients
    }

    /// Rate at which this recipe produces `item`, if it produces it at all
    pub fn result_rate(&self, item: &str) -> Option<f64> {
        self.results.get(item).copied()
    }
}

/// Canonical form of an item name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A finite, normal (not subnormal) positive rate
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate >= f64::MIN_POSITIVE
}

/// Check a caller-requested production rate
pub fn check_target_rate(rate: f64) -> Result<f64> {
    if is_valid_rate(rate) {
        Ok(rate)
    } else {
        Err(RecipeError::InvalidTargetRate { rate })
    }
}

fn normalize_rates(rates: ItemRates, field: &'static str) -> Result<ItemRates> {
    let mut normalized = ItemRates::with_capacity(rates.len());
    for (name, rate) in rates {
        let name = normalize_name(&name);
        if name.is_empty() {
            return Err(RecipeError::EmptyName { field });
        }
        if !is_valid_rate(rate) {
            return Err(RecipeError::InvalidRate { item: name, rate });
        }
        normalized.insert(name, rate);
    }
    Ok(normalized)
}

fn format_rates(rates: &ItemRates) -> String {
    rates
        .iter()
        .map(|(name, rate)| format!("{}x {}", rate, name))
        .collect::<Vec<_>>()
        .join(" + ")
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} = {}",
            self.context,
            format_rates(&self.ingredients),
            format_rates(&self.results)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_normalized() {
        let recipe = Recipe::new(
            "  Smelting ",
            &[(" Iron Ingot", 1.0)],
            &[("IRON ORE  ", 2.0)],
        )
        .unwrap();

        assert_eq!(recipe.context(), "smelting");
        assert_eq!(recipe.result_rate("iron ingot"), Some(1.0));
        assert_eq!(recipe.ingredients().get("iron ore"), Some(&2.0));
    }

    #[test]
    fn test_empty_ingredients_allowed() {
        let recipe = Recipe::new("", &[("ore", 1.0)], &[]).unwrap();
        assert!(recipe.ingredients().is_empty());
        assert_eq!(recipe.context(), "");
    }

    #[test]
    fn test_rejects_empty_results() {
        let err = Recipe::new("", &[], &[("ore", 1.0)]).unwrap_err();
        assert!(matches!(err, RecipeError::NoResults));
    }

    #[test]
    fn test_rejects_empty_name() {
        let err = Recipe::new("", &[("ingot", 1.0)], &[("   ", 1.0)]).unwrap_err();
        assert!(matches!(err, RecipeError::EmptyName { field: "ingredients" }));

        let err = Recipe::new("", &[("", 1.0)], &[]).unwrap_err();
        assert!(matches!(err, RecipeError::EmptyName { field: "results" }));
    }

    #[test]
    fn test_rejects_non_positive_rates() {
        for rate in [0.0, -1.0, 1e-320, f64::NAN, f64::INFINITY] {
            let err = Recipe::new("", &[("ingot", rate)], &[]).unwrap_err();
            assert!(matches!(err, RecipeError::InvalidRate { .. }), "rate {rate}");

            let err = Recipe::new("", &[("ingot", 1.0)], &[("ore", rate)]).unwrap_err();
            assert!(matches!(err, RecipeError::InvalidRate { .. }), "rate {rate}");
        }
    }

    #[test]
    fn test_display() {
        let recipe = Recipe::new("smelting", &[("ingot", 1.0)], &[("ore", 2.0), ("coal", 0.5)]).unwrap();
        assert_eq!(recipe.to_string(), "smelting: 2x ore + 0.5x coal = 1x ingot");
    }

    #[test]
    fn test_deserialize_validates() {
        let recipe: Recipe = serde_json::from_str(
            r#"{"context": "Smelting", "results": {"Ingot": 1}, "ingredients": {"ore": 2}}"#,
        )
        .unwrap();
        assert_eq!(recipe.context(), "smelting");
        assert_eq!(recipe.result_rate("ingot"), Some(1.0));

        let bad: std::result::Result<Recipe, _> =
            serde_json::from_str(r#"{"results": {"ingot": -1}, "ingredients": {}}"#);
        assert!(bad.is_err());

        let bad: std::result::Result<Recipe, _> =
            serde_json::from_str(r#"{"results": {}, "ingredients": {"ore": 1}}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialize_keeps_entry_order() {
        let recipe = Recipe::new("", &[("b", 1.0), ("a", 2.0)], &[("z", 1.0), ("y", 1.0)]).unwrap();
        let json = serde_json::to_string(&recipe).unwrap();
        assert_eq!(
            json,
            r#"{"context":"","results":{"b":1.0,"a":2.0},"ingredients":{"z":1.0,"y":1.0}}"#
        );
    }
}
