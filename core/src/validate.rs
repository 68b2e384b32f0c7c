//! Existence checks run before any mutation touches dependent state.

use std::fmt;

use crate::error::{PlannerError, PlannerResult};
use crate::models::{Ingredient, Recipe, User};
use crate::store::PlannerStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Recipe,
    Ingredient,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe => f.write_str("recipe"),
            Self::Ingredient => f.write_str("ingredient"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Recipe(Recipe),
    Ingredient(Ingredient),
}

/// Look up a user and an item independently. Fails with `NotFound` naming
/// whichever side (or both) is missing.
pub fn validate_exists<S: PlannerStore + ?Sized>(
    store: &S,
    user_id: &str,
    item_id: i64,
    kind: ItemKind,
) -> PlannerResult<(User, Item)> {
    let user = store.get_user(user_id)?;
    let item = match kind {
        ItemKind::Recipe => store.get_recipe(item_id)?.map(Item::Recipe),
        ItemKind::Ingredient => store.get_ingredient(item_id)?.map(Item::Ingredient),
    };
    match (user, item) {
        (Some(user), Some(item)) => Ok((user, item)),
        (user, item) => Err(missing(user_id, user.is_none(), kind, item_id, item.is_none())),
    }
}

pub fn validate_user_and_recipe<S: PlannerStore + ?Sized>(
    store: &S,
    user_id: &str,
    recipe_id: i64,
) -> PlannerResult<(User, Recipe)> {
    match validate_exists(store, user_id, recipe_id, ItemKind::Recipe)? {
        (user, Item::Recipe(recipe)) => Ok((user, recipe)),
        (_, other) => Err(mismatched(ItemKind::Recipe, &other)),
    }
}

pub fn validate_user_and_ingredient<S: PlannerStore + ?Sized>(
    store: &S,
    user_id: &str,
    ingredient_id: i64,
) -> PlannerResult<(User, Ingredient)> {
    match validate_exists(store, user_id, ingredient_id, ItemKind::Ingredient)? {
        (user, Item::Ingredient(ingredient)) => Ok((user, ingredient)),
        (_, other) => Err(mismatched(ItemKind::Ingredient, &other)),
    }
}

pub fn validate_user<S: PlannerStore + ?Sized>(store: &S, user_id: &str) -> PlannerResult<User> {
    store
        .get_user(user_id)?
        .ok_or_else(|| PlannerError::NotFound(format!("User {user_id} does not exist")))
}

pub fn validate_recipe<S: PlannerStore + ?Sized>(
    store: &S,
    recipe_id: i64,
) -> PlannerResult<Recipe> {
    store
        .get_recipe(recipe_id)?
        .ok_or_else(|| PlannerError::NotFound(format!("Recipe {recipe_id} does not exist")))
}

// `validate_exists` only ever returns the kind it was asked for.
fn mismatched(expected: ItemKind, got: &Item) -> PlannerError {
    PlannerError::Store(anyhow::anyhow!(
        "expected a {expected} lookup, got {got:?}"
    ))
}

fn missing(
    user_id: &str,
    user_missing: bool,
    kind: ItemKind,
    item_id: i64,
    item_missing: bool,
) -> PlannerError {
    let message = match (user_missing, item_missing) {
        (true, true) => format!("User {user_id} and {kind} {item_id} do not exist"),
        (true, false) => format!("User {user_id} does not exist"),
        _ => match kind {
            ItemKind::Recipe => format!("Recipe {item_id} does not exist"),
            ItemKind::Ingredient => format!("Ingredient {item_id} does not exist"),
        },
    };
    PlannerError::NotFound(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::NewUser;

    fn setup() -> (Database, User, Recipe, Ingredient) {
        let db = Database::open_in_memory().unwrap();
        let user = db
            .insert_user(&NewUser {
                name: "Sam".to_string(),
                email: "sam@example.com".to_string(),
            })
            .unwrap()
            .unwrap();
        let recipe = db
            .insert_recipe("Pancakes", "vegetarian", "american", "Fluffy")
            .unwrap();
        let flour = db.find_or_create_ingredient("flour").unwrap();
        (db, user, recipe, flour)
    }

    #[test]
    fn test_both_present() {
        let (db, user, recipe, flour) = setup();

        let (u, r) = validate_user_and_recipe(&db, &user.id, recipe.id).unwrap();
        assert_eq!(u, user);
        assert_eq!(r, recipe);

        let (_, i) = validate_user_and_ingredient(&db, &user.id, flour.id).unwrap();
        assert_eq!(i, flour);
    }

    #[test]
    fn test_missing_user_is_named() {
        let (db, _, recipe, _) = setup();
        let err = validate_exists(&db, "ghost", recipe.id, ItemKind::Recipe).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "User ghost does not exist");
    }

    #[test]
    fn test_missing_item_is_named() {
        let (db, user, _, _) = setup();
        let err = validate_exists(&db, &user.id, 999, ItemKind::Ingredient).unwrap_err();
        assert_eq!(err.to_string(), "Ingredient 999 does not exist");

        let err = validate_user_and_recipe(&db, &user.id, 999).unwrap_err();
        assert_eq!(err.to_string(), "Recipe 999 does not exist");
    }

    #[test]
    fn test_both_missing() {
        let (db, _, _, _) = setup();
        let err = validate_exists(&db, "ghost", 42, ItemKind::Recipe).unwrap_err();
        assert_eq!(err.to_string(), "User ghost and recipe 42 do not exist");
    }

    #[test]
    fn test_typed_helpers_share_messages() {
        let (db, user, recipe, _) = setup();

        let err = validate_user_and_ingredient(&db, "ghost", 42).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "User ghost and ingredient 42 do not exist");

        let err = validate_user_and_recipe(&db, "ghost", recipe.id).unwrap_err();
        assert_eq!(err.to_string(), "User ghost does not exist");

        let err = validate_user_and_ingredient(&db, &user.id, 42).unwrap_err();
        assert_eq!(err.to_string(), "Ingredient 42 does not exist");
    }
}
