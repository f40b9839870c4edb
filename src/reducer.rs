//! Projections of a production tree onto raw material demand

use std::fmt;

use indexmap::IndexMap;

use crate::error::Result;
use crate::models::check_target_rate;
use crate::tree::{Ingredient, ProductionNode, ProductionTree};

/// Aggregated raw material demand of `tree` when its root runs at `required_rate`.
///
/// Leaves are bare ingredient rates and produced ingredients whose recipe
/// needs nothing. The root itself is never a leaf, so a tree whose root
/// recipe has no ingredients yields empty totals. The same item at several
/// leaves is summed. Items appear in the order they are first reached.
pub fn totals(tree: &ProductionTree, required_rate: f64) -> Result<IndexMap<String, f64>> {
    let multiplier = multiplier(tree, required_rate)?;
    let mut result = IndexMap::new();
    visit_leaves(&tree.root, &mut |name, rate| {
        *result.entry(name.to_string()).or_insert(0.0) += rate * multiplier;
    });
    Ok(result)
}

/// Unaggregated leaf demands in depth-first, ingredient order
pub fn as_steps(tree: &ProductionTree, required_rate: f64) -> Result<Vec<(String, f64)>> {
    let multiplier = multiplier(tree, required_rate)?;
    let mut result = Vec::new();
    visit_leaves(&tree.root, &mut |name, rate| {
        result.push((name.to_string(), rate * multiplier));
    });
    Ok(result)
}

/// Rates of every produced (non-leaf) intermediate, summed per item
pub fn intermediates(tree: &ProductionTree, required_rate: f64) -> Result<IndexMap<String, f64>> {
    let multiplier = multiplier(tree, required_rate)?;
    let mut result = IndexMap::new();
    collect_intermediates(&tree.root, multiplier, &mut result);
    Ok(result)
}

fn multiplier(tree: &ProductionTree, required_rate: f64) -> Result<f64> {
    Ok(check_target_rate(required_rate)? / tree.rate())
}

fn visit_leaves(node: &ProductionNode, emit: &mut impl FnMut(&str, f64)) {
    for (name, ingredient) in &node.ingredients {
        match ingredient {
            Ingredient::Leaf(rate) => emit(name, *rate),
            Ingredient::Expanded(children) => {
                for child in children {
                    if child.is_leaf() {
                        emit(name, child.rate);
                    } else {
                        visit_leaves(child, emit);
                    }
                }
            }
        }
    }
}

fn collect_intermediates(node: &ProductionNode, multiplier: f64, result: &mut IndexMap<String, f64>) {
    for (name, ingredient) in &node.ingredients {
        if let Ingredient::Expanded(children) = ingredient {
            for child in children.iter().filter(|child| !child.is_leaf()) {
                *result.entry(name.clone()).or_insert(0.0) += child.rate * multiplier;
                collect_intermediates(child, multiplier, result);
            }
        }
    }
}

/// Summary of a production tree at a target rate
#[derive(Debug)]
pub struct ChainSummary {
    pub target_item: String,
    pub target_rate: f64,
    pub context: String,
    pub intermediates: Vec<(String, f64)>,
    pub raw_inputs: Vec<(String, f64)>,
    pub step_count: usize,
}

/// Generate a summary of the production tree
pub fn summarize(tree: &ProductionTree, required_rate: f64) -> Result<ChainSummary> {
    let mut intermediates: Vec<_> = intermediates(tree, required_rate)?.into_iter().collect();
    intermediates.sort_by(|a, b| a.0.cmp(&b.0));

    let mut raw_inputs: Vec<_> = totals(tree, required_rate)?.into_iter().collect();
    raw_inputs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(ChainSummary {
        target_item: tree.item.clone(),
        target_rate: required_rate,
        context: tree.context().to_string(),
        intermediates,
        raw_inputs,
        step_count: as_steps(tree, required_rate)?.len(),
    })
}

impl fmt::Display for ChainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Summary ===")?;
        if self.context.is_empty() {
            writeln!(f, "Target: {} @ {:.3}/s", self.target_item, self.target_rate)?;
        } else {
            writeln!(
                f,
                "Target: {} @ {:.3}/s [{}]",
                self.target_item, self.target_rate, self.context
            )?;
        }
        writeln!(f)?;

        if !self.intermediates.is_empty() {
            writeln!(f, "Intermediates:")?;
            for (name, rate) in &self.intermediates {
                writeln!(f, "  {} @ {:.3}/s", name, rate)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Raw inputs required:")?;
        for (name, rate) in &self.raw_inputs {
            writeln!(f, "  {} @ {:.3}/s", name, rate)?;
        }
        writeln!(f)?;

        writeln!(f, "Steps: {}", self.step_count)?;
        Ok(())
    }
}
