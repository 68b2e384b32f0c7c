use anyhow::Result;

use mealplan_core::Planner;
use mealplan_core::db::Database;

use super::helpers::print_json;

pub(crate) fn cmd_seed(planner: &Planner<Database>, json: bool) -> Result<()> {
    let summary = planner.seed_sample_data()?;

    if json {
        print_json(&summary)?;
    } else {
        println!("Seeded {} users and {} recipes", summary.users, summary.recipes);
        println!(
            "Planned {} meals, adding {} shopping list items",
            summary.meal_plans, summary.shopping_items
        );
        println!("List users with: mealplan user list");
    }

    Ok(())
}
