//! Recipe Production Calculator
//!
//! Records crafting recipes per domain and resolves them into production
//! trees, raw material totals and step lists.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use recipe_calculator::config::StoreConfig;
use recipe_calculator::models::{check_target_rate, normalize_name};
use recipe_calculator::store::{RecipeStore, known_domains};
use recipe_calculator::view::{TreeView, format_rates, format_tree};
use recipe_calculator::{
    ProductionTree, Recipe, RecipeIndex, Resolver, as_steps, ingredient_trees, parse, reducer,
    totals,
};

#[derive(Parser)]
#[command(name = "recipe-calculator")]
#[command(about = "Production rate calculator for crafting recipes")]
struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new recipe
    Add {
        /// Free-text label, e.g. the machine or station used
        #[arg(short, long, default_value = "")]
        context: String,

        /// Produced items, e.g. "1 iron plate, 0.5 slag"
        #[arg(short, long)]
        results: String,

        /// Consumed items, e.g. "2 iron ore, coal"
        #[arg(short, long, default_value = "")]
        ingredients: String,
    },

    /// List all recipes grouped by context
    List,

    /// List every known item
    Items,

    /// Show the recipes that consume an item
    Uses {
        item: String,
    },

    /// Show the production tree for an item
    Tree {
        item: String,

        /// Target production rate (defaults to the recipe's own rate)
        #[arg(short, long)]
        rate: Option<f64>,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the raw materials needed for an item
    Totals {
        item: String,

        /// Target production rate (defaults to the recipe's own rate)
        #[arg(short, long)]
        rate: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Show each raw material demand in tree order
    Steps {
        item: String,

        /// Target production rate (defaults to the recipe's own rate)
        #[arg(short, long)]
        rate: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Show one tree per recipe that produces an item
    Alternatives {
        item: String,

        /// Rescale every tree to this rate (defaults to each recipe's own rate)
        #[arg(short, long)]
        rate: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// List domains with a recipe store
    Domains,

    /// Replace the current domain's recipes with sample data
    LoadSample,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let open_store = || {
        cli.store
            .open()
            .with_context(|| format!("Failed to open {}", cli.store.store_path().display()))
    };

    match cli.command {
        Commands::Add {
            context,
            results,
            ingredients,
        } => {
            let recipe = Recipe::from_rates(
                &context,
                parse::parse_items(&results)?,
                parse::parse_items(&ingredients)?,
            )?;
            open_store()?
                .add_recipe(&recipe)
                .context("Failed to save recipe")?;
            println!("Added {}", recipe);
        }

        Commands::List => {
            let recipes = load_recipes(open_store()?.as_ref(), &cli.store)?;
            if recipes.is_empty() {
                println!("No recipes in domain '{}'. Run 'add' or 'load-sample' first.", cli.store.domain);
            } else {
                let mut by_context: IndexMap<&str, Vec<&Recipe>> = IndexMap::new();
                for recipe in &recipes {
                    by_context.entry(recipe.context()).or_default().push(recipe);
                }
                by_context.sort_keys();

                for (context, recipes) in by_context {
                    println!("[{}]", if context.is_empty() { "no context" } else { context });
                    for recipe in recipes {
                        println!("  {}", recipe);
                    }
                }
            }
        }

        Commands::Items => {
            let index = load_index(open_store()?.as_ref(), &cli.store)?;
            if index.is_empty() {
                println!("No items in domain '{}'. Run 'add' or 'load-sample' first.", cli.store.domain);
            } else {
                println!(
                    "{:<30} {:<11} {:>10} {:>10}",
                    "Item", "Kind", "Producers", "Consumers"
                );
                println!("{}", "-".repeat(64));
                for item in index.items() {
                    let kind = if index.is_producible(item) { "producible" } else { "raw" };
                    println!(
                        "{:<30} {:<11} {:>10} {:>10}",
                        item,
                        kind,
                        index.producers(item).len(),
                        index.consumers(item).len()
                    );
                }
            }
        }

        Commands::Uses { item } => {
            let index = load_index(open_store()?.as_ref(), &cli.store)?;
            let item = normalize_name(&item);
            let consumers = index.consumers(&item);
            if consumers.is_empty() {
                println!("No recipe uses '{}'", item);
            } else {
                for recipe in consumers {
                    println!("{}", recipe);
                }
            }
        }

        Commands::Tree { item, rate, json } => {
            let index = load_index(open_store()?.as_ref(), &cli.store)?;
            let tree = Resolver::new(&index).resolve(&item, rate)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&TreeView::from_tree(&tree))?);
            } else {
                print!("{}", format_tree(&tree));
            }
        }

        Commands::Totals { item, rate, json } => {
            let index = load_index(open_store()?.as_ref(), &cli.store)?;
            let tree = Resolver::new(&index).resolve(&item, rate)?;
            let raw = totals(&tree, tree.rate())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&TreeView::from_totals(&raw))?);
            } else {
                println!("{}", reducer::summarize(&tree, tree.rate())?);
            }
        }

        Commands::Steps { item, rate, json } => {
            let index = load_index(open_store()?.as_ref(), &cli.store)?;
            let tree = Resolver::new(&index).resolve(&item, rate)?;
            let steps = as_steps(&tree, tree.rate())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&TreeView::from_steps(&steps))?);
            } else {
                for (i, (name, rate)) in steps.iter().enumerate() {
                    println!("{:>3}. {} @ {:.3}/s", i + 1, name, rate);
                }
            }
        }

        Commands::Alternatives { item, rate, json } => {
            let index = load_index(open_store()?.as_ref(), &cli.store)?;
            let mut trees = ingredient_trees(&index, &item);
            if let Some(rate) = rate {
                let rate = check_target_rate(rate)?;
                trees = trees.iter().map(|tree| tree.with_rate(rate)).collect();
            }
            if trees.is_empty() {
                println!("No recipe produces '{}'", normalize_name(&item));
            } else if json {
                let views = trees
                    .iter()
                    .map(alternative_json)
                    .collect::<recipe_calculator::Result<Vec<_>>>()?;
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                for (i, tree) in trees.iter().enumerate() {
                    println!("Recipe {}:", i + 1);
                    print!("{}", format_tree(tree));
                    println!("Raw inputs:");
                    let raw = totals(tree, tree.rate())?;
                    print!("{}", format_rates(raw.iter().map(|(n, r)| (n.as_str(), *r))));
                    println!();
                }
            }
        }

        Commands::Domains => {
            let domains = known_domains(cli.store.dir())?;
            if domains.is_empty() {
                println!("No recipe stores in {}", cli.store.dir().display());
            } else {
                for domain in domains {
                    println!("{}", domain);
                }
            }
        }

        Commands::LoadSample => {
            let recipes = sample_recipes()?;
            open_store()?.dump_recipes(&recipes)?;
            println!(
                "Loaded {} sample recipes into domain '{}'",
                recipes.len(),
                cli.store.domain
            );
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_recipes(store: &dyn RecipeStore, config: &StoreConfig) -> Result<Vec<Recipe>> {
    store
        .load_recipes()
        .with_context(|| format!("Failed to load recipes from {}", config.store_path().display()))
}

fn load_index(store: &dyn RecipeStore, config: &StoreConfig) -> Result<RecipeIndex> {
    let index = RecipeIndex::new(load_recipes(store, config)?);
    debug!("{} producible items", index.producible_items().len());
    Ok(index)
}

fn alternative_json(tree: &ProductionTree) -> recipe_calculator::Result<serde_json::Value> {
    let raw = totals(tree, tree.rate())?;
    Ok(serde_json::json!({
        "tree": TreeView::from_tree(tree),
        "totals": TreeView::from_totals(&raw),
    }))
}

/// Sample recipes for trying the calculator without recording any
fn sample_recipes() -> recipe_calculator::Result<Vec<Recipe>> {
    Ok(vec![
        // Water -> Oxygen + Hydrogen
        Recipe::new(
            "electrolyzer",
            &[("oxygen", 0.888), ("hydrogen", 0.112)],
            &[("water", 1.0)],
        )?,
        // Polluted Water + Sand -> Water
        Recipe::new(
            "water sieve",
            &[("water", 5.0), ("polluted dirt", 0.2)],
            &[("polluted water", 5.0), ("sand", 1.0)],
        )?,
        Recipe::new("metal refinery", &[("iron", 0.5)], &[("iron ore", 0.5)])?,
        Recipe::new("rock crusher", &[("sand", 1.0)], &[("sandstone", 1.0)])?,
        Recipe::new("polymer press", &[("plastic", 0.5)], &[("petroleum", 0.833)])?,
        Recipe::new("oil refinery", &[("petroleum", 5.0)], &[("crude oil", 10.0), ("water", 0.35)])?,
        Recipe::new(
            "fabricator",
            &[("machine part", 1.0)],
            &[("iron", 2.0), ("plastic", 1.0)],
        )?,
        Recipe::new("oil well", &[("crude oil", 3.33)], &[("water", 1.0)])?,
    ])
}
