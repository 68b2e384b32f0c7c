use anyhow::Result;

use mealplan_core::Planner;
use mealplan_core::db::Database;

use super::helpers::{exit_if_not_found, print_json, print_user_table};

pub(crate) fn cmd_user_add(
    planner: &Planner<Database>,
    name: &str,
    email: &str,
    json: bool,
) -> Result<()> {
    let user = planner.create_user(name, email)?;

    if json {
        print_json(&user)?;
    } else {
        println!("Created user {} <{}> (id: {})", user.name, user.email, user.id);
    }

    Ok(())
}

pub(crate) fn cmd_user_list(planner: &Planner<Database>, json: bool) -> Result<()> {
    let users = planner.list_users()?;

    if json {
        print_json(&users)?;
    } else if users.is_empty() {
        println!("No users yet. Add one with: mealplan user add <NAME> <EMAIL>");
    } else {
        print_user_table(&users);
    }

    Ok(())
}

pub(crate) fn cmd_user_show(planner: &Planner<Database>, user_id: &str, json: bool) -> Result<()> {
    let user = planner
        .get_user(user_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&user)?;
    } else {
        println!("{} <{}>", user.name, user.email);
        println!("  ID:      {}", user.id);
        println!("  Created: {}", user.created_at);
    }

    Ok(())
}

pub(crate) fn cmd_user_delete(
    planner: &Planner<Database>,
    user_id: &str,
    json: bool,
) -> Result<()> {
    let user = planner
        .delete_user(user_id)
        .map_err(|e| exit_if_not_found(e, json))?;

    if json {
        print_json(&user)?;
    } else {
        println!("Deleted user {} <{}>", user.name, user.email);
    }

    Ok(())
}
