use anyhow::Result;
use std::process;

use mealplan_core::Planner;
use mealplan_core::db::Database;

use super::helpers::{exit_if_not_found, json_error, print_json, print_shopping_table};

pub(crate) fn cmd_shop_list(planner: &Planner<Database>, user_id: &str, json: bool) -> Result<()> {
    let entries = planner.unchecked_shopping_list(user_id)?;

    if entries.is_empty() {
        let message = format!("User {user_id} has nothing on their shopping list");
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
        print_shopping_table(&entries);
    }

    Ok(())
}

pub(crate) fn cmd_shop_add(
    planner: &Planner<Database>,
    user_id: &str,
    ingredient_id: i64,
    json: bool,
) -> Result<()> {
    let entry = planner
        .add_shopping_item(user_id, ingredient_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Added {} to the shopping list",
            entry.ingredient_name.as_deref().unwrap_or("ingredient")
        );
    }

    Ok(())
}

pub(crate) fn cmd_shop_check(
    planner: &Planner<Database>,
    user_id: &str,
    ingredient_id: i64,
    json: bool,
) -> Result<()> {
    let entry = planner
        .mark_shopping_item_purchased(user_id, ingredient_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&entry)?;
    } else {
        println!(
            "Checked off {}",
            entry.ingredient_name.as_deref().unwrap_or("ingredient")
        );
    }

    Ok(())
}
