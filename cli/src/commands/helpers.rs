use anyhow::Result;
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealplan_core::PlannerError;
use mealplan_core::models::{
    DeleteScope, Ingredient, MealPlanEntry, RecipeDetail, ShoppingListEntry, User,
    validate_day_of_week, validate_meal_type,
};

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Print a value as pretty JSON.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a not-found outcome and exit with status 2. Other errors are
/// passed back to the caller.
pub(crate) fn exit_if_not_found(err: PlannerError, json: bool) -> anyhow::Error {
    if let PlannerError::NotFound(message) = &err {
        if json {
            println!("{}", json_error(message));
        } else {
            eprintln!("{message}");
        }
        process::exit(2);
    }
    err.into()
}

/// Build a delete scope from optional day and meal arguments.
pub(crate) fn parse_scope(day: Option<&str>, meal: Option<&str>) -> Result<DeleteScope> {
    let scope = match (day, meal) {
        (None, None) => DeleteScope::All,
        (Some(day), None) => DeleteScope::Day(validate_day_of_week(day)?),
        (Some(day), Some(meal)) => {
            DeleteScope::Meal(validate_day_of_week(day)?, validate_meal_type(meal)?)
        }
        (None, Some(_)) => anyhow::bail!("--meal requires --day"),
    };
    Ok(scope)
}

pub(crate) fn print_user_table(users: &[User]) {
    #[derive(Tabled)]
    struct UserRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Email")]
        email: String,
    }

    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id.clone(),
            name: truncate(&u.name, 30),
            email: truncate(&u.email, 40),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_recipe_table(recipes: &[RecipeDetail]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Cuisine")]
        cuisine: String,
        #[tabled(rename = "Diet")]
        diet_type: String,
        #[tabled(rename = "Ingredients")]
        ingredients: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: r.recipe.id,
            name: truncate(&r.recipe.name, 30),
            cuisine: r.recipe.cuisine.clone(),
            diet_type: r.recipe.diet_type.clone(),
            ingredients: truncate(
                &r.ingredients
                    .iter()
                    .map(|i| i.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                50,
            ),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_ingredient_table(ingredients: &[Ingredient]) {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
    }

    let rows: Vec<IngredientRow> = ingredients
        .iter()
        .map(|i| IngredientRow {
            id: i.id,
            name: truncate(&i.name, 40),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_plan_table(entries: &[MealPlanEntry]) {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Meal")]
        meal: String,
        #[tabled(rename = "Recipe ID")]
        recipe_id: i64,
        #[tabled(rename = "Recipe")]
        recipe: String,
    }

    let rows: Vec<PlanRow> = entries
        .iter()
        .map(|e| PlanRow {
            day: e.day_of_week.to_string(),
            meal: e.meal_type.to_string(),
            recipe_id: e.recipe_id,
            recipe: e
                .recipe_name
                .as_deref()
                .map(|n| truncate(n, 35))
                .unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn print_shopping_table(entries: &[ShoppingListEntry]) {
    #[derive(Tabled)]
    struct ShoppingRow {
        #[tabled(rename = "Ingredient ID")]
        ingredient_id: i64,
        #[tabled(rename = "Ingredient")]
        name: String,
    }

    let rows: Vec<ShoppingRow> = entries
        .iter()
        .map(|e| ShoppingRow {
            ingredient_id: e.ingredient_id,
            name: e.ingredient_name.clone().unwrap_or_default(),
        })
        .collect();

    println!("{}", Table::new(&rows).with(Style::rounded()));
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
