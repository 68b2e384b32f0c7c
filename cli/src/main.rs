mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_plan_add, cmd_plan_delete, cmd_plan_show, cmd_plan_update, cmd_recipe_add,
    cmd_recipe_ingredients, cmd_recipe_list, cmd_recipe_show, cmd_seed, cmd_shop_add,
    cmd_shop_check, cmd_shop_list, cmd_user_add, cmd_user_delete, cmd_user_list, cmd_user_show,
};
use crate::config::Config;
use mealplan_core::Planner;
use mealplan_core::models::{NewRecipe, RecipeFilter};

#[derive(Parser)]
#[command(
    name = "mealplan",
    version,
    about = "Plan weekly meals and keep a shopping list in step"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage recipes and their ingredients
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the weekly meal plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage the shopping list
    Shop {
        #[command(subcommand)]
        command: ShopCommands,
    },
    /// Fill an empty database with sample users, recipes and meal plans
    Seed {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Add {
        /// Display name
        name: String,
        /// Email address (must be unique)
        email: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all users
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a user
    Show {
        /// User ID
        user_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a user along with their meal plan and shopping list
    Delete {
        /// User ID
        user_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Create a recipe
    Add {
        /// Recipe name
        name: String,
        /// Diet type (e.g. vegetarian, vegan, omnivore)
        #[arg(long)]
        diet: String,
        /// Cuisine (e.g. italian, mexican)
        #[arg(long)]
        cuisine: String,
        /// Short description
        #[arg(long)]
        description: String,
        /// Ingredient name; repeat for each ingredient
        #[arg(short, long = "ingredient", required = true)]
        ingredients: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes, optionally filtered
    List {
        /// Only recipes of this cuisine
        #[arg(long)]
        cuisine: Option<String>,
        /// Only recipes of this diet type
        #[arg(long)]
        diet: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe and its ingredients
    Show {
        /// Recipe ID
        recipe_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List every known ingredient
    Ingredients {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Plan a recipe for an empty slot and add its ingredients to the shopping list
    Add {
        /// User ID
        user_id: String,
        /// Day of week: monday-sunday or mon-sun
        day: String,
        /// Meal type: breakfast, lunch, dinner, snack
        meal: String,
        /// Recipe ID
        recipe_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the recipe in an already planned slot
    Update {
        /// User ID
        user_id: String,
        /// Day of week: monday-sunday or mon-sun
        day: String,
        /// Meal type: breakfast, lunch, dinner, snack
        meal: String,
        /// Recipe ID
        recipe_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete planned meals for the week, a day, or a single slot
    Delete {
        /// User ID
        user_id: String,
        /// Limit to one day
        #[arg(long)]
        day: Option<String>,
        /// Limit to one meal (requires --day)
        #[arg(long)]
        meal: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the meal plan
    Show {
        /// User ID
        user_id: String,
        /// Limit to one day
        #[arg(long)]
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ShopCommands {
    /// Show unchecked shopping list items
    List {
        /// User ID
        user_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an ingredient to the shopping list
    Add {
        /// User ID
        user_id: String,
        /// Ingredient ID
        ingredient_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check off a purchased ingredient
    Check {
        /// User ID
        user_id: String,
        /// Ingredient ID
        ingredient_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let planner = Planner::open(&config.db_path)?;

    match cli.command {
        Commands::User { command } => match command {
            UserCommands::Add { name, email, json } => {
                cmd_user_add(&planner, &name, &email, json)
            }
            UserCommands::List { json } => cmd_user_list(&planner, json),
            UserCommands::Show { user_id, json } => cmd_user_show(&planner, &user_id, json),
            UserCommands::Delete { user_id, json } => cmd_user_delete(&planner, &user_id, json),
        },
        Commands::Recipe { command } => match command {
            RecipeCommands::Add {
                name,
                diet,
                cuisine,
                description,
                ingredients,
                json,
            } => {
                let recipe = NewRecipe {
                    name,
                    diet_type: diet,
                    cuisine,
                    description,
                    ingredients,
                };
                cmd_recipe_add(&planner, &recipe, json)
            }
            RecipeCommands::List {
                cuisine,
                diet,
                json,
            } => {
                let filter = RecipeFilter {
                    cuisine,
                    diet_type: diet,
                };
                cmd_recipe_list(&planner, &filter, json)
            }
            RecipeCommands::Show { recipe_id, json } => {
                cmd_recipe_show(&planner, recipe_id, json)
            }
            RecipeCommands::Ingredients { json } => cmd_recipe_ingredients(&planner, json),
        },
        Commands::Plan { command } => match command {
            PlanCommands::Add {
                user_id,
                day,
                meal,
                recipe_id,
                json,
            } => cmd_plan_add(&planner, &user_id, &day, &meal, recipe_id, json),
            PlanCommands::Update {
                user_id,
                day,
                meal,
                recipe_id,
                json,
            } => cmd_plan_update(&planner, &user_id, &day, &meal, recipe_id, json),
            PlanCommands::Delete {
                user_id,
                day,
                meal,
                json,
            } => cmd_plan_delete(&planner, &user_id, day.as_deref(), meal.as_deref(), json),
            PlanCommands::Show { user_id, day, json } => {
                cmd_plan_show(&planner, &user_id, day.as_deref(), json)
            }
        },
        Commands::Shop { command } => match command {
            ShopCommands::List { user_id, json } => cmd_shop_list(&planner, &user_id, json),
            ShopCommands::Add {
                user_id,
                ingredient_id,
                json,
            } => cmd_shop_add(&planner, &user_id, ingredient_id, json),
            ShopCommands::Check {
                user_id,
                ingredient_id,
                json,
            } => cmd_shop_check(&planner, &user_id, ingredient_id, json),
        },
        Commands::Seed { json } => cmd_seed(&planner, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                Some(config.load_or_create_api_key()?)
            };
            server::start_server(planner, port, &bind, api_key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recipe_add_collects_ingredients() {
        let cli = Cli::try_parse_from([
            "mealplan",
            "recipe",
            "add",
            "Omelette",
            "--diet",
            "vegetarian",
            "--cuisine",
            "french",
            "--description",
            "Folded eggs",
            "-i",
            "eggs",
            "--ingredient",
            "butter",
        ])
        .unwrap();
        let Commands::Recipe {
            command: RecipeCommands::Add { ingredients, .. },
        } = cli.command
        else {
            panic!("expected recipe add");
        };
        assert_eq!(ingredients, vec!["eggs", "butter"]);
    }

    #[test]
    fn test_recipe_add_requires_an_ingredient() {
        let result = Cli::try_parse_from([
            "mealplan",
            "recipe",
            "add",
            "Toast",
            "--diet",
            "vegan",
            "--cuisine",
            "british",
            "--description",
            "Bread, warmed",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_seed_parses() {
        let cli = Cli::try_parse_from(["mealplan", "seed", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Seed { json: true }));
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["mealplan", "serve"]).unwrap();
        let Commands::Serve {
            port,
            bind,
            no_auth,
        } = cli.command
        else {
            panic!("expected serve");
        };
        assert_eq!(port, 8080);
        assert_eq!(bind, "127.0.0.1");
        assert!(!no_auth);
    }
}
