use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::error::{PlannerError, PlannerResult};
use crate::models::{
    DayOfWeek, DeleteScope, DeleteSummary, Ingredient, MealPlanEntry, MealType, NewRecipe,
    NewUser, RecipeDetail, RecipeFilter, ShoppingListEntry, User, require_field,
};
use crate::store::PlannerStore;
use crate::validate::{
    validate_recipe, validate_user, validate_user_and_ingredient, validate_user_and_recipe,
};

/// Meal planning over a store handle.
///
/// Every mutation checks that the entities it references exist, then applies
/// the shopping-list side effects of the meal-plan change:
///
/// - creating a plan entry appends one unchecked shopping row per ingredient
///   of the recipe, even when an identical unchecked row is already there;
/// - updating an entry only reassigns the recipe;
/// - deleting entries never touches the shopping list.
pub struct Planner<S: PlannerStore> {
    store: S,
}

impl Planner<Database> {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open(db_path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl<S: PlannerStore> Planner<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- Users ---

    pub fn create_user(&self, name: &str, email: &str) -> PlannerResult<User> {
        let name = require_field("name", name)?;
        let email = require_field("email", email)?;
        if self.store.get_user_by_email(&email)?.is_some() {
            warn!(%email, "user already exists");
            return Err(email_taken(&email));
        }
        // Another writer on the same database can take the email after the
        // check; the store's unique constraint reports that as `None`.
        let Some(user) = self.store.insert_user(&NewUser {
            name,
            email: email.clone(),
        })?
        else {
            warn!(%email, "user already exists on insert");
            return Err(email_taken(&email));
        };
        info!(user_id = %user.id, "created user");
        Ok(user)
    }

    pub fn delete_user(&self, user_id: &str) -> PlannerResult<User> {
        let user = validate_user(&self.store, user_id)?;
        self.store.delete_user(user_id)?;
        info!(user_id, "deleted user");
        Ok(user)
    }

    // --- Recipes ---

    /// Create a recipe and link its ingredients, reusing any ingredient that
    /// already exists with the same name.
    pub fn create_recipe(&self, recipe: &NewRecipe) -> PlannerResult<RecipeDetail> {
        let name = require_field("name", &recipe.name)?;
        let diet_type = require_field("diet_type", &recipe.diet_type)?;
        let cuisine = require_field("cuisine", &recipe.cuisine)?;
        let description = require_field("description", &recipe.description)?;
        let ingredient_names = recipe
            .ingredients
            .iter()
            .map(|n| require_field("ingredient name", n))
            .collect::<PlannerResult<Vec<_>>>()?;
        if ingredient_names.is_empty() {
            return Err(PlannerError::Validation(
                "A recipe must have at least one ingredient".to_string(),
            ));
        }

        let created = self
            .store
            .insert_recipe(&name, &diet_type, &cuisine, &description)?;
        for ingredient_name in &ingredient_names {
            let ingredient = self.store.find_or_create_ingredient(ingredient_name)?;
            self.store.link_ingredient(created.id, ingredient.id)?;
        }
        info!(
            recipe_id = created.id,
            ingredients = ingredient_names.len(),
            "created recipe"
        );
        self.get_recipe(created.id)
    }

    // --- Meal plans ---

    /// Assign a recipe to an empty slot and add its ingredients to the
    /// user's shopping list.
    pub fn create_meal_plan(
        &self,
        user_id: &str,
        meal_type: MealType,
        day_of_week: DayOfWeek,
        recipe_id: i64,
    ) -> PlannerResult<MealPlanEntry> {
        let (user, recipe) = validate_user_and_recipe(&self.store, user_id, recipe_id)?;

        if self
            .store
            .find_meal_plan(&user.id, day_of_week, meal_type)?
            .is_some()
        {
            warn!(user_id, day = %day_of_week, meal = %meal_type, "meal plan slot taken");
            return Err(slot_taken(user_id, day_of_week, meal_type));
        }

        let ingredients = self.store.recipe_ingredients(recipe.id)?;
        // A concurrent create can still win between the check and the insert;
        // the store's slot index catches that.
        let Some(entry) =
            self.store
                .insert_meal_plan(&user.id, day_of_week, meal_type, recipe.id)?
        else {
            warn!(user_id, day = %day_of_week, meal = %meal_type, "meal plan slot taken on insert");
            return Err(slot_taken(user_id, day_of_week, meal_type));
        };

        for ingredient in &ingredients {
            self.store.insert_shopping_entry(&user.id, ingredient.id)?;
        }
        info!(
            user_id,
            recipe_id,
            day = %day_of_week,
            meal = %meal_type,
            shopping_rows = ingredients.len(),
            "created meal plan"
        );
        Ok(entry)
    }

    /// Reassign the recipe of an existing slot. The shopping list is left
    /// as it is.
    pub fn update_meal_plan(
        &self,
        user_id: &str,
        meal_type: MealType,
        day_of_week: DayOfWeek,
        recipe_id: i64,
    ) -> PlannerResult<MealPlanEntry> {
        let (user, recipe) = validate_user_and_recipe(&self.store, user_id, recipe_id)?;

        let Some(existing) = self
            .store
            .find_meal_plan(&user.id, day_of_week, meal_type)?
        else {
            return Err(PlannerError::NotFound(format!(
                "There is no recipe planned for {day_of_week} {meal_type} in the meal plan of user {user_id}. Add this meal plan first."
            )));
        };

        let updated = self.store.set_meal_plan_recipe(existing.id, recipe.id)?;
        info!(
            user_id,
            recipe_id,
            previous_recipe_id = existing.recipe_id,
            day = %day_of_week,
            meal = %meal_type,
            "updated meal plan"
        );
        Ok(updated)
    }

    /// Remove the meal-plan entries covered by `scope`. Shopping-list rows
    /// created by those entries are kept.
    pub fn delete_meal_plan(
        &self,
        user_id: &str,
        scope: DeleteScope,
    ) -> PlannerResult<DeleteSummary> {
        let user = validate_user(&self.store, user_id)?;
        let affected_count = self.store.delete_meal_plans(&user.id, scope)?;
        info!(user_id, ?scope, affected_count, "deleted meal plans");
        Ok(DeleteSummary { affected_count })
    }

    // --- Shopping list ---

    /// Add an ingredient to the shopping list by hand. Refused while an
    /// unchecked row for the same ingredient is still on the list.
    pub fn add_shopping_item(
        &self,
        user_id: &str,
        ingredient_id: i64,
    ) -> PlannerResult<ShoppingListEntry> {
        let (user, ingredient) =
            validate_user_and_ingredient(&self.store, user_id, ingredient_id)?;

        if self
            .store
            .first_unchecked_shopping_entry(&user.id, ingredient.id)?
            .is_some()
        {
            warn!(user_id, ingredient_id, "ingredient already on shopping list");
            return Err(PlannerError::Conflict(format!(
                "User {user_id} already has {} in their shopping list",
                ingredient.name
            )));
        }

        let entry = self.store.insert_shopping_entry(&user.id, ingredient.id)?;
        info!(user_id, ingredient_id, "added shopping list item");
        Ok(entry)
    }

    /// Check off one unchecked row for this ingredient. With duplicates, the
    /// oldest row is checked first.
    pub fn mark_shopping_item_purchased(
        &self,
        user_id: &str,
        ingredient_id: i64,
    ) -> PlannerResult<ShoppingListEntry> {
        let (user, ingredient) =
            validate_user_and_ingredient(&self.store, user_id, ingredient_id)?;

        let Some(entry) = self
            .store
            .first_unchecked_shopping_entry(&user.id, ingredient.id)?
        else {
            return Err(PlannerError::NotFound(format!(
                "User {user_id} doesn't have {} in their shopping list",
                ingredient.name
            )));
        };

        let checked = self.store.set_shopping_entry_checked(entry.id)?;
        info!(user_id, ingredient_id, entry_id = checked.id, "marked item purchased");
        Ok(checked)
    }

    // --- Queries ---

    pub fn list_users(&self) -> PlannerResult<Vec<User>> {
        Ok(self.store.list_users()?)
    }

    pub fn get_user(&self, user_id: &str) -> PlannerResult<User> {
        validate_user(&self.store, user_id)
    }

    pub fn get_recipe(&self, recipe_id: i64) -> PlannerResult<RecipeDetail> {
        let recipe = validate_recipe(&self.store, recipe_id)?;
        let ingredients = self.store.recipe_ingredients(recipe.id)?;
        Ok(RecipeDetail {
            recipe,
            ingredients,
        })
    }

    pub fn list_recipes(&self, filter: &RecipeFilter) -> PlannerResult<Vec<RecipeDetail>> {
        let recipes = self.store.list_recipes(filter)?;
        debug!(count = recipes.len(), ?filter, "listed recipes");
        recipes
            .into_iter()
            .map(|recipe| {
                let ingredients = self.store.recipe_ingredients(recipe.id)?;
                Ok(RecipeDetail {
                    recipe,
                    ingredients,
                })
            })
            .collect()
    }

    pub fn list_ingredients(&self) -> PlannerResult<Vec<Ingredient>> {
        Ok(self.store.list_ingredients()?)
    }

    /// Plan entries for a user, optionally limited to one day, ordered
    /// Monday to Sunday then breakfast to snack.
    pub fn meal_plan_for_user(
        &self,
        user_id: &str,
        day: Option<DayOfWeek>,
    ) -> PlannerResult<Vec<MealPlanEntry>> {
        let entries = self.store.list_meal_plans(user_id, day)?;
        debug!(user_id, count = entries.len(), "listed meal plan");
        Ok(entries)
    }

    pub fn unchecked_shopping_list(&self, user_id: &str) -> PlannerResult<Vec<ShoppingListEntry>> {
        let entries = self.store.list_shopping_entries(user_id, true)?;
        debug!(user_id, count = entries.len(), "listed shopping list");
        Ok(entries)
    }
}

fn email_taken(email: &str) -> PlannerError {
    PlannerError::Conflict(format!("A user with email {email} already exists"))
}

fn slot_taken(user_id: &str, day: DayOfWeek, meal: MealType) -> PlannerError {
    PlannerError::Conflict(format!(
        "There is already a recipe planned for {day} {meal} in the meal plan of user {user_id}. Delete the existing meal plan first."
    ))
}
