use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

pub const DAYS_OF_WEEK: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            "snack" => Ok(Self::Snack),
            _ => Err(PlannerError::Validation(format!(
                "Invalid meal type '{s}'. Must be one of: {}",
                MEAL_TYPES.join(", ")
            ))),
        }
    }
}

/// Day of the week a meal is planned for. Ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monday" | "mon" => Ok(Self::Monday),
            "tuesday" | "tue" => Ok(Self::Tuesday),
            "wednesday" | "wed" => Ok(Self::Wednesday),
            "thursday" | "thu" => Ok(Self::Thursday),
            "friday" | "fri" => Ok(Self::Friday),
            "saturday" | "sat" => Ok(Self::Saturday),
            "sunday" | "sun" => Ok(Self::Sunday),
            _ => Err(PlannerError::Validation(format!(
                "Invalid day of week '{s}'. Must be one of: {}",
                DAYS_OF_WEEK.join(", ")
            ))),
        }
    }
}

pub fn validate_meal_type(meal: &str) -> Result<MealType, PlannerError> {
    meal.parse()
}

pub fn validate_day_of_week(day: &str) -> Result<DayOfWeek, PlannerError> {
    day.parse()
}

/// Trim a required text field, rejecting it when nothing is left.
pub fn require_field(field: &str, value: &str) -> Result<String, PlannerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

// --- Entities ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub diet_type: String,
    pub cuisine: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeIngredientLink {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
}

/// A recipe together with the ingredients linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MealPlanEntry {
    pub id: i64,
    pub user_id: String,
    pub day_of_week: DayOfWeek,
    pub meal_type: MealType,
    pub recipe_id: i64,
    pub created_at: String,
    pub updated_at: String,
    // Joined for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListEntry {
    pub id: i64,
    pub user_id: String,
    pub ingredient_id: i64,
    pub checked: bool,
    // Joined for display
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredient_name: Option<String>,
}

// --- Inputs ---

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub diet_type: String,
    pub cuisine: String,
    pub description: String,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    pub cuisine: Option<String>,
    pub diet_type: Option<String>,
}

/// Which meal-plan entries a delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    All,
    Day(DayOfWeek),
    Meal(DayOfWeek, MealType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub affected_count: usize,
}
