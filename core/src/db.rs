use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use uuid::Uuid;

use crate::models::{
    DayOfWeek, DeleteScope, Ingredient, MealPlanEntry, MealType, NewUser, Recipe, RecipeFilter,
    RecipeIngredientLink, ShoppingListEntry, User,
};
use crate::store::PlannerStore;

const MEAL_PLAN_SELECT: &str = "SELECT mp.id, mp.user_id, mp.day_of_week, mp.meal_type, mp.recipe_id, mp.created_at, mp.updated_at, r.name
     FROM meal_plans mp JOIN recipes r ON r.id = mp.recipe_id";

const SHOPPING_SELECT: &str = "SELECT sl.id, sl.user_id, sl.ingredient_id, sl.checked, i.name
     FROM shopping_list sl JOIN ingredients i ON i.id = sl.ingredient_id";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY NOT NULL,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS recipes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    diet_type TEXT NOT NULL,
                    cuisine TEXT NOT NULL,
                    description TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL UNIQUE
                );

                CREATE TABLE IF NOT EXISTS recipe_ingredients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                    UNIQUE (recipe_id, ingredient_id)
                );

                CREATE TABLE IF NOT EXISTS meal_plans (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    day_of_week TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS shopping_list (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                    checked INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_recipes_cuisine ON recipes(cuisine);
                CREATE INDEX IF NOT EXISTS idx_recipes_diet_type ON recipes(diet_type);
                CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_meal_plans_user ON meal_plans(user_id);
                CREATE INDEX IF NOT EXISTS idx_shopping_list_user ON shopping_list(user_id, ingredient_id);
                CREATE UNIQUE INDEX IF NOT EXISTS idx_meal_plans_slot ON meal_plans(user_id, day_of_week, meal_type);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // --- Row mapping helpers ---

    fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn recipe_from_row(row: &rusqlite::Row) -> rusqlite::Result<Recipe> {
        Ok(Recipe {
            id: row.get(0)?,
            name: row.get(1)?,
            diet_type: row.get(2)?,
            cuisine: row.get(3)?,
            description: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn ingredient_from_row(row: &rusqlite::Row) -> rusqlite::Result<Ingredient> {
        Ok(Ingredient {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    // Expects the columns of MEAL_PLAN_SELECT.
    fn meal_plan_from_row(row: &rusqlite::Row) -> rusqlite::Result<MealPlanEntry> {
        Ok(MealPlanEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            day_of_week: row.get(2)?,
            meal_type: row.get(3)?,
            recipe_id: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            recipe_name: Some(row.get(7)?),
        })
    }

    // Expects the columns of SHOPPING_SELECT.
    fn shopping_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<ShoppingListEntry> {
        Ok(ShoppingListEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            ingredient_id: row.get(2)?,
            checked: row.get(3)?,
            ingredient_name: Some(row.get(4)?),
        })
    }

    fn get_meal_plan_by_id(&self, id: i64) -> Result<MealPlanEntry> {
        self.conn
            .query_row(
                &format!("{MEAL_PLAN_SELECT} WHERE mp.id = ?1"),
                params![id],
                Self::meal_plan_from_row,
            )
            .context("Meal plan entry not found")
    }

    fn get_shopping_entry_by_id(&self, id: i64) -> Result<ShoppingListEntry> {
        self.conn
            .query_row(
                &format!("{SHOPPING_SELECT} WHERE sl.id = ?1"),
                params![id],
                Self::shopping_entry_from_row,
            )
            .context("Shopping list entry not found")
    }

    fn get_ingredient_by_name(&self, name: &str) -> Result<Option<Ingredient>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM ingredients WHERE name = ?1",
                params![name],
                Self::ingredient_from_row,
            )
            .optional()?)
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl PlannerStore for Database {
    // --- Users ---

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email, created_at, updated_at FROM users WHERE id = ?1",
                params![id],
                Self::user_from_row,
            )
            .optional()?)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, email, created_at, updated_at FROM users WHERE email = ?1",
                params![email],
                Self::user_from_row,
            )
            .optional()?)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, created_at, updated_at FROM users ORDER BY created_at, name",
        )?;
        let users = stmt
            .query_map([], Self::user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    fn insert_user(&self, user: &NewUser) -> Result<Option<User>> {
        let now = Local::now().to_rfc3339();
        let id = Uuid::new_v4().simple().to_string();
        let inserted = self.conn.execute(
            "INSERT INTO users (id, name, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, user.name, user.email, now, now],
        );
        match inserted {
            Ok(_) => Ok(Some(
                self.get_user(&id)?.context("User not found after insert")?,
            )),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Recipes and ingredients ---

    fn get_recipe(&self, id: i64) -> Result<Option<Recipe>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, diet_type, cuisine, description, created_at, updated_at
                 FROM recipes WHERE id = ?1",
                params![id],
                Self::recipe_from_row,
            )
            .optional()?)
    }

    fn list_recipes(&self, filter: &RecipeFilter) -> Result<Vec<Recipe>> {
        let mut sql = String::from(
            "SELECT id, name, diet_type, cuisine, description, created_at, updated_at FROM recipes",
        );
        let mut clauses = Vec::new();
        let mut values: Vec<&str> = Vec::new();
        if let Some(cuisine) = filter.cuisine.as_deref() {
            values.push(cuisine);
            clauses.push(format!("cuisine = ?{}", values.len()));
        }
        if let Some(diet_type) = filter.diet_type.as_deref() {
            values.push(diet_type);
            clauses.push(format!("diet_type = ?{}", values.len()));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let recipes = stmt
            .query_map(params_from_iter(values), Self::recipe_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recipes)
    }

    fn insert_recipe(
        &self,
        name: &str,
        diet_type: &str,
        cuisine: &str,
        description: &str,
    ) -> Result<Recipe> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO recipes (name, diet_type, cuisine, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![name, diet_type, cuisine, description, now, now],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_recipe(id)?.context("Recipe not found after insert")
    }

    fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM ingredients WHERE id = ?1",
                params![id],
                Self::ingredient_from_row,
            )
            .optional()?)
    }

    fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM ingredients ORDER BY name")?;
        let ingredients = stmt
            .query_map([], Self::ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    fn find_or_create_ingredient(&self, name: &str) -> Result<Ingredient> {
        if let Some(existing) = self.get_ingredient_by_name(name)? {
            return Ok(existing);
        }
        self.conn
            .execute("INSERT INTO ingredients (name) VALUES (?1)", params![name])?;
        Ok(Ingredient {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn link_ingredient(
        &self,
        recipe_id: i64,
        ingredient_id: i64,
    ) -> Result<RecipeIngredientLink> {
        self.conn.execute(
            "INSERT OR IGNORE INTO recipe_ingredients (recipe_id, ingredient_id) VALUES (?1, ?2)",
            params![recipe_id, ingredient_id],
        )?;
        self.conn
            .query_row(
                "SELECT id, recipe_id, ingredient_id FROM recipe_ingredients
                 WHERE recipe_id = ?1 AND ingredient_id = ?2",
                params![recipe_id, ingredient_id],
                |row| {
                    Ok(RecipeIngredientLink {
                        id: row.get(0)?,
                        recipe_id: row.get(1)?,
                        ingredient_id: row.get(2)?,
                    })
                },
            )
            .context("Recipe ingredient link not found")
    }

    fn recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<Ingredient>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.name FROM recipe_ingredients ri
             JOIN ingredients i ON i.id = ri.ingredient_id
             WHERE ri.recipe_id = ?1
             ORDER BY ri.id",
        )?;
        let ingredients = stmt
            .query_map(params![recipe_id], Self::ingredient_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ingredients)
    }

    // --- Meal plans ---

    fn find_meal_plan(
        &self,
        user_id: &str,
        day: DayOfWeek,
        meal: MealType,
    ) -> Result<Option<MealPlanEntry>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "{MEAL_PLAN_SELECT} WHERE mp.user_id = ?1 AND mp.day_of_week = ?2 AND mp.meal_type = ?3"
                ),
                params![user_id, day, meal],
                Self::meal_plan_from_row,
            )
            .optional()?)
    }

    fn insert_meal_plan(
        &self,
        user_id: &str,
        day: DayOfWeek,
        meal: MealType,
        recipe_id: i64,
    ) -> Result<Option<MealPlanEntry>> {
        let now = Local::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT INTO meal_plans (user_id, day_of_week, meal_type, recipe_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, day, meal, recipe_id, now, now],
        );
        match inserted {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                Ok(Some(self.get_meal_plan_by_id(id)?))
            }
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_meal_plan_recipe(&self, entry_id: i64, recipe_id: i64) -> Result<MealPlanEntry> {
        let now = Local::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE meal_plans SET recipe_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![recipe_id, now, entry_id],
        )?;
        if rows == 0 {
            anyhow::bail!("Meal plan entry {entry_id} not found");
        }
        self.get_meal_plan_by_id(entry_id)
    }

    fn delete_meal_plans(&self, user_id: &str, scope: DeleteScope) -> Result<usize> {
        let rows = match scope {
            DeleteScope::All => self
                .conn
                .execute("DELETE FROM meal_plans WHERE user_id = ?1", params![user_id])?,
            DeleteScope::Day(day) => self.conn.execute(
                "DELETE FROM meal_plans WHERE user_id = ?1 AND day_of_week = ?2",
                params![user_id, day],
            )?,
            DeleteScope::Meal(day, meal) => self.conn.execute(
                "DELETE FROM meal_plans WHERE user_id = ?1 AND day_of_week = ?2 AND meal_type = ?3",
                params![user_id, day, meal],
            )?,
        };
        Ok(rows)
    }

    fn list_meal_plans(
        &self,
        user_id: &str,
        day: Option<DayOfWeek>,
    ) -> Result<Vec<MealPlanEntry>> {
        let mut entries = if let Some(day) = day {
            let mut stmt = self.conn.prepare(&format!(
                "{MEAL_PLAN_SELECT} WHERE mp.user_id = ?1 AND mp.day_of_week = ?2"
            ))?;
            stmt.query_map(params![user_id, day], Self::meal_plan_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut stmt = self
                .conn
                .prepare(&format!("{MEAL_PLAN_SELECT} WHERE mp.user_id = ?1"))?;
            stmt.query_map(params![user_id], Self::meal_plan_from_row)?
                .collect::<Result<Vec<_>, _>>()?
        };
        entries.sort_by_key(|e| (e.day_of_week, e.meal_type));
        Ok(entries)
    }

    // --- Shopping list ---

    fn insert_shopping_entry(
        &self,
        user_id: &str,
        ingredient_id: i64,
    ) -> Result<ShoppingListEntry> {
        self.conn.execute(
            "INSERT INTO shopping_list (user_id, ingredient_id, checked) VALUES (?1, ?2, 0)",
            params![user_id, ingredient_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_shopping_entry_by_id(id)
    }

    fn first_unchecked_shopping_entry(
        &self,
        user_id: &str,
        ingredient_id: i64,
    ) -> Result<Option<ShoppingListEntry>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "{SHOPPING_SELECT} WHERE sl.user_id = ?1 AND sl.ingredient_id = ?2 AND sl.checked = 0
                     ORDER BY sl.id LIMIT 1"
                ),
                params![user_id, ingredient_id],
                Self::shopping_entry_from_row,
            )
            .optional()?)
    }

    fn set_shopping_entry_checked(&self, entry_id: i64) -> Result<ShoppingListEntry> {
        let rows = self.conn.execute(
            "UPDATE shopping_list SET checked = 1 WHERE id = ?1",
            params![entry_id],
        )?;
        if rows == 0 {
            anyhow::bail!("Shopping list entry {entry_id} not found");
        }
        self.get_shopping_entry_by_id(entry_id)
    }

    fn list_shopping_entries(
        &self,
        user_id: &str,
        unchecked_only: bool,
    ) -> Result<Vec<ShoppingListEntry>> {
        let sql = if unchecked_only {
            format!("{SHOPPING_SELECT} WHERE sl.user_id = ?1 AND sl.checked = 0 ORDER BY sl.id")
        } else {
            format!("{SHOPPING_SELECT} WHERE sl.user_id = ?1 ORDER BY sl.id")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![user_id], Self::shopping_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

// Enums are stored as their lowercase names.

impl ToSql for DayOfWeek {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for DayOfWeek {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for MealType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MealType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(db: &Database) -> User {
        db.insert_user(&NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        })
        .unwrap()
        .unwrap()
    }

    fn sample_recipe(db: &Database) -> Recipe {
        db.insert_recipe("Omelette", "vegetarian", "french", "Eggs, folded")
            .unwrap()
    }

    #[test]
    fn test_insert_and_get_user() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user(&db);

        assert_eq!(user.id.len(), 32);
        assert!(user.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(user.name, "Ada");

        let fetched = db.get_user(&user.id).unwrap().unwrap();
        assert_eq!(fetched, user);
        let by_email = db.get_user_by_email("ada@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(db.get_user("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected_by_store() {
        let db = Database::open_in_memory().unwrap();
        sample_user(&db);
        let duplicate = db
            .insert_user(&NewUser {
                name: "Other".to_string(),
                email: "ada@example.com".to_string(),
            })
            .unwrap();
        assert!(duplicate.is_none());
        assert_eq!(db.list_users().unwrap().len(), 1);
    }

    #[test]
    fn test_find_or_create_ingredient_reuses_by_name() {
        let db = Database::open_in_memory().unwrap();
        let a = db.find_or_create_ingredient("salt").unwrap();
        let b = db.find_or_create_ingredient("salt").unwrap();
        let c = db.find_or_create_ingredient("pepper").unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(db.list_ingredients().unwrap().len(), 2);
    }

    #[test]
    fn test_link_ingredient_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let recipe = sample_recipe(&db);
        let eggs = db.find_or_create_ingredient("eggs").unwrap();

        let first = db.link_ingredient(recipe.id, eggs.id).unwrap();
        let second = db.link_ingredient(recipe.id, eggs.id).unwrap();

        assert_eq!(first, second);
        assert_eq!(db.recipe_ingredients(recipe.id).unwrap(), vec![eggs]);
    }

    #[test]
    fn test_list_recipes_filters() {
        let db = Database::open_in_memory().unwrap();
        db.insert_recipe("Omelette", "vegetarian", "french", "d")
            .unwrap();
        db.insert_recipe("Coq au vin", "omnivore", "french", "d")
            .unwrap();
        db.insert_recipe("Dal", "vegetarian", "indian", "d").unwrap();

        let all = db.list_recipes(&RecipeFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let french = db
            .list_recipes(&RecipeFilter {
                cuisine: Some("french".to_string()),
                diet_type: None,
            })
            .unwrap();
        assert_eq!(french.len(), 2);

        let veg = db
            .list_recipes(&RecipeFilter {
                cuisine: None,
                diet_type: Some("vegetarian".to_string()),
            })
            .unwrap();
        assert_eq!(veg.len(), 2);

        let both = db
            .list_recipes(&RecipeFilter {
                cuisine: Some("french".to_string()),
                diet_type: Some("vegetarian".to_string()),
            })
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].name, "Omelette");
    }

    #[test]
    fn test_meal_plan_slot_is_unique_in_storage() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user(&db);
        let recipe = sample_recipe(&db);

        let first = db
            .insert_meal_plan(&user.id, DayOfWeek::Monday, MealType::Lunch, recipe.id)
            .unwrap();
        assert!(first.is_some());

        let second = db
            .insert_meal_plan(&user.id, DayOfWeek::Monday, MealType::Lunch, recipe.id)
            .unwrap();
        assert!(second.is_none());

        assert_eq!(db.list_meal_plans(&user.id, None).unwrap().len(), 1);
    }

    #[test]
    fn test_insert_meal_plan_unknown_user_is_an_error() {
        let db = Database::open_in_memory().unwrap();
        let recipe = sample_recipe(&db);
        let result = db.insert_meal_plan("nobody", DayOfWeek::Monday, MealType::Lunch, recipe.id);
        assert!(result.is_err());
    }

    #[test]
    fn test_list_meal_plans_ordered_by_day_then_meal() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user(&db);
        let recipe = sample_recipe(&db);

        for (day, meal) in [
            (DayOfWeek::Sunday, MealType::Breakfast),
            (DayOfWeek::Monday, MealType::Dinner),
            (DayOfWeek::Monday, MealType::Breakfast),
        ] {
            db.insert_meal_plan(&user.id, day, meal, recipe.id).unwrap();
        }

        let entries = db.list_meal_plans(&user.id, None).unwrap();
        let slots: Vec<_> = entries.iter().map(|e| (e.day_of_week, e.meal_type)).collect();
        assert_eq!(
            slots,
            vec![
                (DayOfWeek::Monday, MealType::Breakfast),
                (DayOfWeek::Monday, MealType::Dinner),
                (DayOfWeek::Sunday, MealType::Breakfast),
            ]
        );
        assert_eq!(entries[0].recipe_name.as_deref(), Some("Omelette"));

        let monday = db.list_meal_plans(&user.id, Some(DayOfWeek::Monday)).unwrap();
        assert_eq!(monday.len(), 2);
    }

    #[test]
    fn test_delete_meal_plans_by_scope() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user(&db);
        let recipe = sample_recipe(&db);
        for (day, meal) in [
            (DayOfWeek::Monday, MealType::Breakfast),
            (DayOfWeek::Monday, MealType::Lunch),
            (DayOfWeek::Tuesday, MealType::Lunch),
            (DayOfWeek::Friday, MealType::Snack),
        ] {
            db.insert_meal_plan(&user.id, day, meal, recipe.id).unwrap();
        }

        let n = db
            .delete_meal_plans(
                &user.id,
                DeleteScope::Meal(DayOfWeek::Monday, MealType::Lunch),
            )
            .unwrap();
        assert_eq!(n, 1);

        let n = db
            .delete_meal_plans(&user.id, DeleteScope::Day(DayOfWeek::Monday))
            .unwrap();
        assert_eq!(n, 1);

        let n = db.delete_meal_plans(&user.id, DeleteScope::All).unwrap();
        assert_eq!(n, 2);

        let n = db.delete_meal_plans(&user.id, DeleteScope::All).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_shopping_entries_allow_duplicates_and_check_oldest_first() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user(&db);
        let milk = db.find_or_create_ingredient("milk").unwrap();

        let first = db.insert_shopping_entry(&user.id, milk.id).unwrap();
        let second = db.insert_shopping_entry(&user.id, milk.id).unwrap();
        assert!(!first.checked);
        assert_eq!(first.ingredient_name.as_deref(), Some("milk"));

        let picked = db
            .first_unchecked_shopping_entry(&user.id, milk.id)
            .unwrap()
            .unwrap();
        assert_eq!(picked.id, first.id);

        let checked = db.set_shopping_entry_checked(picked.id).unwrap();
        assert!(checked.checked);

        let next = db
            .first_unchecked_shopping_entry(&user.id, milk.id)
            .unwrap()
            .unwrap();
        assert_eq!(next.id, second.id);

        assert_eq!(db.list_shopping_entries(&user.id, true).unwrap().len(), 1);
        assert_eq!(db.list_shopping_entries(&user.id, false).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_user_cascades() {
        let db = Database::open_in_memory().unwrap();
        let user = sample_user(&db);
        let recipe = sample_recipe(&db);
        let eggs = db.find_or_create_ingredient("eggs").unwrap();
        db.insert_meal_plan(&user.id, DayOfWeek::Monday, MealType::Lunch, recipe.id)
            .unwrap();
        db.insert_shopping_entry(&user.id, eggs.id).unwrap();

        assert!(db.delete_user(&user.id).unwrap());
        assert!(!db.delete_user(&user.id).unwrap());
        assert!(db.list_meal_plans(&user.id, None).unwrap().is_empty());
        assert!(db.list_shopping_entries(&user.id, false).unwrap().is_empty());
        // Recipes and ingredients are shared and survive.
        assert!(db.get_recipe(recipe.id).unwrap().is_some());
        assert!(db.get_ingredient(eggs.id).unwrap().is_some());
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mealplan.db");
        let user_id = {
            let db = Database::open(&path).unwrap();
            sample_user(&db).id
        };
        let db = Database::open(&path).unwrap();
        assert!(db.get_user(&user_id).unwrap().is_some());
        let version: i64 = db
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, 1);
    }
}
