use anyhow::Result;
use std::process;

use mealplan_core::Planner;
use mealplan_core::db::Database;
use mealplan_core::models::{DeleteScope, validate_day_of_week, validate_meal_type};

use super::helpers::{exit_if_not_found, json_error, parse_scope, print_json, print_plan_table};

pub(crate) fn cmd_plan_add(
    planner: &Planner<Database>,
    user_id: &str,
    day: &str,
    meal: &str,
    recipe_id: i64,
    json: bool,
) -> Result<()> {
    let day = validate_day_of_week(day)?;
    let meal = validate_meal_type(meal)?;
    let entry = planner
        .create_meal_plan(user_id, meal, day, recipe_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Planned {} for {day} {meal}",
            entry.recipe_name.as_deref().unwrap_or("recipe")
        );
        println!("Ingredients added to the shopping list.");
    }

    Ok(())
}

pub(crate) fn cmd_plan_update(
    planner: &Planner<Database>,
    user_id: &str,
    day: &str,
    meal: &str,
    recipe_id: i64,
    json: bool,
) -> Result<()> {
    let day = validate_day_of_week(day)?;
    let meal = validate_meal_type(meal)?;
    let entry = planner
        .update_meal_plan(user_id, meal, day, recipe_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Updated {day} {meal} to {}",
            entry.recipe_name.as_deref().unwrap_or("recipe")
        );
    }

    Ok(())
}

pub(crate) fn cmd_plan_delete(
    planner: &Planner<Database>,
    user_id: &str,
    day: Option<&str>,
    meal: Option<&str>,
    json: bool,
) -> Result<()> {
    let scope = parse_scope(day, meal)?;
    let summary = planner
        .delete_meal_plan(user_id, scope)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&summary)?;
    } else {
        let target = match scope {
            DeleteScope::All => "the whole week".to_string(),
            DeleteScope::Day(day) => day.to_string(),
            DeleteScope::Meal(day, meal) => format!("{day} {meal}"),
        };
        println!(
            "Deleted {} meal plan entr{} for {target}",
            summary.affected_count,
            if summary.affected_count == 1 { "y" } else { "ies" }
        );
    }

    Ok(())
}

pub(crate) fn cmd_plan_show(
    planner: &Planner<Database>,
    user_id: &str,
    day: Option<&str>,
    json: bool,
) -> Result<()> {
    let day = day.map(validate_day_of_week).transpose()?;
    let entries = planner.meal_plan_for_user(user_id, day)?;

    if entries.is_empty() {
        let message = match day {
            Some(day) => format!("User {user_id} has no meal plan for {day}"),
            None => format!("User {user_id} has no meal plan"),
        };
        if json {
            println!("{}", json_error(&message));
        } else {
            eprintln!("{message}");
        }
        process::exit(2);
    }

    if json {
        print_json(&entries)?;
    } else {
        print_plan_table(&entries);
    }

    Ok(())
}
