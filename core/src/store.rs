use anyhow::Result;

use crate::models::{
    DayOfWeek, DeleteScope, Ingredient, MealPlanEntry, MealType, NewUser, Recipe,
    RecipeFilter, RecipeIngredientLink, ShoppingListEntry, User,
};

/// Persistence operations the planner needs.
///
/// Entities refer to each other by id only; dependents (links, plan entries,
/// shopping rows) are always fetched through these lookups rather than held
/// on their parent. `Database` is the SQLite implementation.
pub trait PlannerStore {
    // --- Users ---

    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    /// Insert a user. Returns `None` when the email is already taken.
    fn insert_user(&self, user: &NewUser) -> Result<Option<User>>;
    /// Deleting a user also removes their meal plans and shopping list.
    fn delete_user(&self, id: &str) -> Result<bool>;

    // --- Recipes and ingredients ---

    fn get_recipe(&self, id: i64) -> Result<Option<Recipe>>;
    fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>>;
    fn insert_recipe(
        &self,
        name: &str,
        diet_type: &str,
        cuisine: &str,
        description: &str,
    ) -> Result<Recipe>;
    fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>>;
    fn list_ingredients(&self) -> Result<Vec<Ingredient>>;
    /// Return the ingredient with this exact name, creating it if needed.
    fn find_or_create_ingredient(&self, name: &str) -> Result<Ingredient>;
    /// Link an ingredient to a recipe. Linking the same pair twice returns
    /// the existing link.
    fn link_ingredient(&self, recipe_id: i64, ingredient_id: i64)
    -> Result<RecipeIngredientLink>;
    fn recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<Ingredient>>;

    // --- Meal plans ---

    fn find_meal_plan(
        &self,
        user_id: &str,
        day: DayOfWeek,
        meal: MealType,
    ) -> Result<Option<MealPlanEntry>>;
    /// Insert a plan entry. Returns `None` when the slot is already taken.
    fn insert_meal_plan(
        &self,
        user_id: &str,
        day: DayOfWeek,
        meal: MealType,
        recipe_id: i64,
    ) -> Result<Option<MealPlanEntry>>;
    fn set_meal_plan_recipe(&self, entry_id: i64, recipe_id: i64) -> Result<MealPlanEntry>;
    fn delete_meal_plans(&self, user_id: &str, scope: DeleteScope) -> Result<usize>;
    fn list_meal_plans(&self, user_id: &str, day: Option<DayOfWeek>)
    -> Result<Vec<MealPlanEntry>>;

    // --- Shopping list ---

    fn insert_shopping_entry(&self, user_id: &str, ingredient_id: i64)
    -> Result<ShoppingListEntry>;
    /// The oldest unchecked row for this user and ingredient, if any.
    fn first_unchecked_shopping_entry(
        &self,
        user_id: &str,
        ingredient_id: i64,
    ) -> Result<Option<ShoppingListEntry>>;
    fn set_shopping_entry_checked(&self, entry_id: i64) -> Result<ShoppingListEntry>;
    fn list_shopping_entries(
        &self,
        user_id: &str,
        unchecked_only: bool,
    ) -> Result<Vec<ShoppingListEntry>>;
}
