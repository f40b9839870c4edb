//! Resolved production trees

use indexmap::IndexMap;
use serde::Serialize;

/// One item's production at a point in a chain.
///
/// The node does not carry its own item name: the root's name lives on
/// [`ProductionTree`], every other node is keyed by name in its parent's
/// `ingredients`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionNode {
    pub rate: f64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub context: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub ingredients: IndexMap<String, Ingredient>,
}

/// What an ingredient entry of a node resolves to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ingredient {
    /// No known recipe: a raw material demanded at this rate
    Leaf(f64),
    /// One subtree per recipe used to produce the ingredient
    Expanded(Vec<ProductionNode>),
}

/// A resolved tree rooted at a named item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionTree {
    pub item: String,
    #[serde(flatten)]
    pub root: ProductionNode,
}

impl ProductionNode {
    pub fn leaf(rate: f64, context: impl Into<String>) -> Self {
        Self {
            rate,
            context: context.into(),
            ingredients: IndexMap::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Multiply this node's rate and every descendant rate by `ratio`
    pub fn scale(&mut self, ratio: f64) {
        self.rate *= ratio;
        for ingredient in self.ingredients.values_mut() {
            ingredient.scale(ratio);
        }
    }

    /// Copy of this subtree scaled by `ratio`
    pub fn scaled(&self, ratio: f64) -> Self {
        let mut node = self.clone();
        node.scale(ratio);
        node
    }

    /// Copy of this subtree rescaled so its own rate becomes `rate`
    pub fn with_rate(&self, rate: f64) -> Self {
        self.scaled(rate / self.rate)
    }

    /// Number of nodes and leaf entries in this subtree, itself included
    pub fn size(&self) -> usize {
        1 + self
            .ingredients
            .values()
            .map(|ingredient| match ingredient {
                Ingredient::Leaf(_) => 1,
                Ingredient::Expanded(nodes) => nodes.iter().map(ProductionNode::size).sum(),
            })
            .sum::<usize>()
    }
}

impl Ingredient {
    pub fn scale(&mut self, ratio: f64) {
        match self {
            Ingredient::Leaf(rate) => *rate *= ratio,
            Ingredient::Expanded(nodes) => {
                for node in nodes {
                    node.scale(ratio);
                }
            }
        }
    }
}

impl ProductionTree {
    pub fn new(item: impl Into<String>, root: ProductionNode) -> Self {
        Self {
            item: item.into(),
            root,
        }
    }

    pub fn rate(&self) -> f64 {
        self.root.rate
    }

    pub fn context(&self) -> &str {
        &self.root.context
    }

    /// Copy of this tree rescaled so the root rate becomes `rate`
    pub fn with_rate(&self, rate: f64) -> Self {
        Self::new(self.item.clone(), self.root.with_rate(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RecipeIndex;
    use crate::models::Recipe;
    use crate::resolver::Resolver;
    use proptest::prelude::*;

    fn plate_tree() -> ProductionTree {
        let mut ingot = ProductionNode::leaf(6.0, "smelting");
        ingot
            .ingredients
            .insert("ore".to_string(), Ingredient::Leaf(12.0));

        let mut plate = ProductionNode::leaf(2.0, "assembly");
        plate
            .ingredients
            .insert("ingot".to_string(), Ingredient::Expanded(vec![ingot]));
        plate
            .ingredients
            .insert("bolt".to_string(), Ingredient::Leaf(4.0));

        ProductionTree::new("plate", plate)
    }

    fn ingot_of(tree: &ProductionTree) -> &ProductionNode {
        match &tree.root.ingredients["ingot"] {
            Ingredient::Expanded(nodes) => &nodes[0],
            Ingredient::Leaf(_) => panic!("ingot should be expanded"),
        }
    }

    #[test]
    fn test_scale_reaches_every_descendant() {
        let tree = plate_tree().with_rate(5.0);
        assert_eq!(tree.rate(), 5.0);
        assert_eq!(tree.root.ingredients["bolt"], Ingredient::Leaf(10.0));
        let ingot = ingot_of(&tree);
        assert_eq!(ingot.rate, 15.0);
        assert_eq!(ingot.ingredients["ore"], Ingredient::Leaf(30.0));
    }

    #[test]
    fn test_scaled_leaves_original_untouched() {
        let tree = plate_tree();
        let _ = tree.root.scaled(3.0);
        assert_eq!(tree, plate_tree());
    }

    #[test]
    fn test_size() {
        assert_eq!(plate_tree().root.size(), 4);
        assert_eq!(ProductionNode::leaf(1.0, "").size(), 1);
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_value(plate_tree()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "item": "plate",
                "rate": 2.0,
                "context": "assembly",
                "ingredients": {
                    "ingot": [{"rate": 6.0, "context": "smelting", "ingredients": {"ore": 12.0}}],
                    "bolt": 4.0
                }
            })
        );
    }

    /// Chain `part 0 <- part 1 <- ...`, each link also needing a raw input
    /// and, when `skip` is set, the part two steps further down.
    fn chain_tree(links: &[(f64, f64, f64, bool)], rate: f64) -> ProductionTree {
        let recipes: Vec<Recipe> = links
            .iter()
            .enumerate()
            .map(|(i, &(output, input, raw, skip))| {
                let item = format!("part {}", i);
                let next = format!("part {}", i + 1);
                let after = format!("part {}", i + 2);
                let raw_name = format!("raw {}", i);
                let mut ingredients = vec![(next.as_str(), input), (raw_name.as_str(), raw)];
                if skip {
                    ingredients.push((after.as_str(), input));
                }
                Recipe::new("", &[(item.as_str(), output)], &ingredients).unwrap()
            })
            .collect();

        let index = RecipeIndex::new(recipes);
        Resolver::new(&index).resolve("part 0", Some(rate)).unwrap()
    }

    fn collect_rates(node: &ProductionNode, rates: &mut Vec<f64>) {
        rates.push(node.rate);
        for ingredient in node.ingredients.values() {
            match ingredient {
                Ingredient::Leaf(rate) => rates.push(*rate),
                Ingredient::Expanded(nodes) => {
                    for child in nodes {
                        collect_rates(child, rates);
                    }
                }
            }
        }
    }

    fn link() -> impl Strategy<Value = (f64, f64, f64, bool)> {
        (0.1f64..10.0, 0.1f64..10.0, 0.1f64..10.0, any::<bool>())
    }

    proptest! {
        #[test]
        fn prop_rescale_round_trip(k in 0.001f64..1000.0) {
            let tree = plate_tree();
            let back = ProductionTree::new("plate", tree.root.scaled(k).scaled(1.0 / k));

            prop_assert!((back.rate() - tree.rate()).abs() < 1e-9 * tree.rate());
            let (a, b) = (ingot_of(&back), ingot_of(&tree));
            prop_assert!((a.rate - b.rate).abs() < 1e-9 * b.rate);
            match (&a.ingredients["ore"], &b.ingredients["ore"]) {
                (Ingredient::Leaf(x), Ingredient::Leaf(y)) => prop_assert!((x - y).abs() < 1e-9 * y),
                _ => prop_assert!(false, "ore should stay a leaf"),
            }
        }

        #[test]
        fn prop_rescale_round_trip_on_resolved_chains(
            links in prop::collection::vec(link(), 1..6),
            rate in 0.1f64..100.0,
            k in 0.001f64..1000.0,
        ) {
            let tree = chain_tree(&links, rate);
            let back = tree.root.scaled(k).scaled(1.0 / k);

            let (mut before, mut after) = (Vec::new(), Vec::new());
            collect_rates(&tree.root, &mut before);
            collect_rates(&back, &mut after);

            prop_assert_eq!(before.len(), after.len());
            prop_assert_eq!(before.len(), tree.root.size());
            for (x, y) in before.iter().zip(&after) {
                prop_assert!(*x > 0.0);
                prop_assert!((x - y).abs() <= 1e-9 * x);
            }
        }
    }
}
