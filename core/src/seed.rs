//! Sample data for trying the CLI and REST API against a fresh database.

use serde::Serialize;
use tracing::info;

use crate::error::{PlannerError, PlannerResult};
use crate::models::{DayOfWeek, MealType, NewRecipe};
use crate::service::Planner;
use crate::store::PlannerStore;

const SAMPLE_USERS: &[(&str, &str)] = &[
    ("user1", "user1@email.com"),
    ("user2", "user2@email.com"),
    ("user3", "user3@email.com"),
];

// (name, diet_type, cuisine, description, ingredients)
const SAMPLE_RECIPES: &[(&str, &str, &str, &str, &[&str])] = &[
    (
        "Shakshuka",
        "vegetarian",
        "middle eastern",
        "Eggs poached in spiced tomato sauce",
        &["eggs", "tomatoes", "onion", "cumin", "bread"],
    ),
    (
        "Overnight oats",
        "vegetarian",
        "american",
        "Oats soaked in milk with fruit",
        &["oats", "milk", "yogurt", "berries", "honey"],
    ),
    (
        "Chickpea curry",
        "vegan",
        "indian",
        "Chickpeas simmered in coconut curry",
        &["chickpeas", "coconut milk", "onion", "garam masala", "rice"],
    ),
    (
        "Spaghetti bolognese",
        "omnivore",
        "italian",
        "Slow-cooked beef ragu with pasta",
        &["spaghetti", "beef mince", "tomatoes", "onion", "parmesan"],
    ),
    (
        "Chicken tacos",
        "omnivore",
        "mexican",
        "Grilled chicken in corn tortillas",
        &["tortillas", "chicken", "avocado", "lime", "coriander"],
    ),
    (
        "Miso soup",
        "vegan",
        "japanese",
        "Light broth with tofu and seaweed",
        &["miso paste", "tofu", "wakame", "spring onion", "dashi"],
    ),
];

const DAYS: [DayOfWeek; 7] = [
    DayOfWeek::Monday,
    DayOfWeek::Tuesday,
    DayOfWeek::Wednesday,
    DayOfWeek::Thursday,
    DayOfWeek::Friday,
    DayOfWeek::Saturday,
    DayOfWeek::Sunday,
];

const SEEDED_MEALS: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub recipes: usize,
    pub meal_plans: usize,
    pub shopping_items: usize,
}

impl<S: PlannerStore> Planner<S> {
    /// Fill an empty database with sample users and recipes, then plan
    /// breakfast, lunch and dinner for every day of each user's week.
    /// Shopping lists are filled by the meal-plan creates themselves.
    pub fn seed_sample_data(&self) -> PlannerResult<SeedSummary> {
        if !self.list_users()?.is_empty() {
            return Err(PlannerError::Conflict(
                "The database already has users; sample data is only added to an empty database"
                    .to_string(),
            ));
        }

        let users = SAMPLE_USERS
            .iter()
            .map(|(name, email)| self.create_user(name, email))
            .collect::<PlannerResult<Vec<_>>>()?;

        let recipes = SAMPLE_RECIPES
            .iter()
            .map(|(name, diet_type, cuisine, description, ingredients)| {
                self.create_recipe(&NewRecipe {
                    name: (*name).to_string(),
                    diet_type: (*diet_type).to_string(),
                    cuisine: (*cuisine).to_string(),
                    description: (*description).to_string(),
                    ingredients: ingredients.iter().map(|i| (*i).to_string()).collect(),
                })
            })
            .collect::<PlannerResult<Vec<_>>>()?;

        let mut summary = SeedSummary {
            users: users.len(),
            recipes: recipes.len(),
            meal_plans: 0,
            shopping_items: 0,
        };

        // Rotate through the recipes so each user gets a different week.
        let mut slot = 0;
        for (offset, user) in users.iter().enumerate() {
            for day in DAYS {
                for meal in SEEDED_MEALS {
                    let recipe = &recipes[(slot + offset) % recipes.len()];
                    self.create_meal_plan(&user.id, meal, day, recipe.recipe.id)?;
                    summary.meal_plans += 1;
                    summary.shopping_items += recipe.ingredients.len();
                    slot += 1;
                }
            }
        }

        info!(
            users = summary.users,
            recipes = summary.recipes,
            meal_plans = summary.meal_plans,
            "seeded sample data"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::RecipeFilter;

    #[test]
    fn test_seed_fills_every_week() {
        let p: Planner<Database> = Planner::open_in_memory().unwrap();

        let summary = p.seed_sample_data().unwrap();

        assert_eq!(summary.users, 3);
        assert_eq!(summary.recipes, 6);
        assert_eq!(summary.meal_plans, 3 * 7 * 3);
        assert_eq!(summary.shopping_items, summary.meal_plans * 5);

        for user in p.list_users().unwrap() {
            let plan = p.meal_plan_for_user(&user.id, None).unwrap();
            assert_eq!(plan.len(), 21);
            assert!(plan.iter().all(|e| e.meal_type != MealType::Snack));
            assert_eq!(p.unchecked_shopping_list(&user.id).unwrap().len(), 21 * 5);
        }
        assert_eq!(
            p.list_recipes(&RecipeFilter {
                cuisine: Some("italian".to_string()),
                diet_type: None,
            })
            .unwrap()
            .len(),
            1
        );
    }

    #[test]
    fn test_seed_shares_ingredients_by_name() {
        let p: Planner<Database> = Planner::open_in_memory().unwrap();
        p.seed_sample_data().unwrap();

        let onions = p
            .list_ingredients()
            .unwrap()
            .into_iter()
            .filter(|i| i.name == "onion")
            .count();
        assert_eq!(onions, 1);
    }

    #[test]
    fn test_seed_refuses_non_empty_database() {
        let p: Planner<Database> = Planner::open_in_memory().unwrap();
        p.create_user("Kim", "kim@example.com").unwrap();

        let err = p.seed_sample_data().unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(p.list_users().unwrap().len(), 1);
        assert!(p.list_recipes(&RecipeFilter::default()).unwrap().is_empty());
    }
}
