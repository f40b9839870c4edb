//! Display shapes for trees and their projections

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::tree::{Ingredient, ProductionNode, ProductionTree};

/// Node shape consumed by tree widgets and `--json` output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeView {
    pub id: String,
    pub label: String,
    pub rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeView>>,
}

/// Identifier-safe form of an item name; each space becomes a `-`
pub fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

impl TreeView {
    /// View of a resolved tree.
    ///
    /// Child ids extend the parent id with `/slug`. A sibling whose id is
    /// already taken gets a `~n` suffix and alternatives in the same
    /// ingredient entry get a `#n` suffix, so every id in the view is unique.
    pub fn from_tree(tree: &ProductionTree) -> Self {
        node_view(&tree.item, slug(&tree.item), &tree.root)
    }

    /// Flat view of aggregated totals, sorted by item name
    pub fn from_totals(totals: &IndexMap<String, f64>) -> Vec<Self> {
        let mut entries: Vec<_> = totals.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
            .into_iter()
            .map(|(name, rate)| Self::entry(slug(name), name, *rate))
            .collect()
    }

    /// Flat view of steps, in step order
    pub fn from_steps(steps: &[(String, f64)]) -> Vec<Self> {
        steps
            .iter()
            .enumerate()
            .map(|(i, (name, rate))| Self::entry(format!("step-{}-{}", i + 1, slug(name)), name, *rate))
            .collect()
    }

    fn entry(id: String, label: &str, rate: f64) -> Self {
        Self {
            id,
            label: label.to_string(),
            rate,
            context: None,
            children: None,
        }
    }
}

fn node_view(item: &str, id: String, node: &ProductionNode) -> TreeView {
    let mut children = Vec::new();
    let mut taken = HashSet::new();
    for (name, ingredient) in &node.ingredients {
        let base = format!("{}/{}", id, slug(name));
        let mut child_id = base.clone();
        let mut n = 1;
        while !taken.insert(child_id.clone()) {
            n += 1;
            child_id = format!("{}~{}", base, n);
        }
        match ingredient {
            Ingredient::Leaf(rate) => children.push(TreeView::entry(child_id, name, *rate)),
            Ingredient::Expanded(nodes) if nodes.len() == 1 => {
                children.push(node_view(name, child_id, &nodes[0]));
            }
            Ingredient::Expanded(nodes) => {
                for (i, child) in nodes.iter().enumerate() {
                    children.push(node_view(name, format!("{}#{}", child_id, i + 1), child));
                }
            }
        }
    }

    TreeView {
        id,
        label: item.to_string(),
        rate: node.rate,
        context: (!node.context.is_empty()).then(|| node.context.clone()),
        children: (!children.is_empty()).then_some(children),
    }
}

/// Format a production tree as indented text, one line per node
pub fn format_tree(tree: &ProductionTree) -> String {
    let mut output = String::new();
    format_node(&mut output, &tree.item, &tree.root, 0);
    output
}

fn format_node(output: &mut String, item: &str, node: &ProductionNode, indent: usize) {
    let prefix = "  ".repeat(indent);
    if node.context.is_empty() {
        output.push_str(&format!("{}{:.3}x {}\n", prefix, node.rate, item));
    } else {
        output.push_str(&format!(
            "{}{:.3}x {} [{}]\n",
            prefix, node.rate, item, node.context
        ));
    }

    for (name, ingredient) in &node.ingredients {
        match ingredient {
            Ingredient::Leaf(rate) => {
                output.push_str(&format!("{}  {:.3}x {} (raw)\n", prefix, rate, name));
            }
            Ingredient::Expanded(nodes) => {
                for child in nodes {
                    format_node(output, name, child, indent + 1);
                }
            }
        }
    }
}

/// Format `(item, rate)` pairs as an aligned table
pub fn format_rates<'a>(rates: impl IntoIterator<Item = (&'a str, f64)>) -> String {
    let mut output = String::new();
    for (name, rate) in rates {
        output.push_str(&format!("{:<30} {:>12.3}\n", name, rate));
    }
    output
}
