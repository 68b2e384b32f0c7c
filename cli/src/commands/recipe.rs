use anyhow::Result;

use mealplan_core::Planner;
use mealplan_core::db::Database;
use mealplan_core::models::{NewRecipe, RecipeDetail, RecipeFilter};

use super::helpers::{exit_if_not_found, print_ingredient_table, print_json, print_recipe_table};

pub(crate) fn cmd_recipe_add(
    planner: &Planner<Database>,
    recipe: &NewRecipe,
    json: bool,
) -> Result<()> {
    let created = planner.create_recipe(recipe)?;

    if json {
        print_json(&created)?;
    } else {
        println!(
            "Created recipe '{}' (id: {}) with {} ingredient(s)",
            created.recipe.name,
            created.recipe.id,
            created.ingredients.len()
        );
    }

    Ok(())
}

pub(crate) fn cmd_recipe_list(
    planner: &Planner<Database>,
    filter: &RecipeFilter,
    json: bool,
) -> Result<()> {
    let recipes = planner.list_recipes(filter)?;

    if json {
        print_json(&recipes)?;
    } else if recipes.is_empty() {
        println!("No recipes found.");
    } else {
        print_recipe_table(&recipes);
    }

    Ok(())
}

pub(crate) fn cmd_recipe_show(
    planner: &Planner<Database>,
    recipe_id: i64,
    json: bool,
) -> Result<()> {
    let detail = planner
        .get_recipe(recipe_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&detail)?;
    } else {
        print_recipe_detail(&detail);
    }

    Ok(())
}

pub(crate) fn cmd_recipe_ingredients(planner: &Planner<Database>, json: bool) -> Result<()> {
    let ingredients = planner.list_ingredients()?;

    if json {
        print_json(&ingredients)?;
    } else if ingredients.is_empty() {
        println!("No ingredients yet. They are created along with recipes.");
    } else {
        print_ingredient_table(&ingredients);
    }

    Ok(())
}

fn print_recipe_detail(detail: &RecipeDetail) {
    let recipe = &detail.recipe;
    println!("Recipe: {} (id: {})", recipe.name, recipe.id);
    println!("  Cuisine: {}", recipe.cuisine);
    println!("  Diet:    {}", recipe.diet_type);
    println!("  {}", recipe.description);
    println!();
    println!("Ingredients:");
    for ingredient in &detail.ingredients {
        println!("  - {} (id: {})", ingredient.name, ingredient.id);
    }
}
