use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{FromRequest, Path, Query, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use mealplan_core::db::Database;
use mealplan_core::models::{
    DeleteScope, DeleteSummary, Ingredient, MealPlanEntry, NewRecipe, RecipeDetail, RecipeFilter,
    ShoppingListEntry, User, validate_day_of_week, validate_meal_type,
};
use mealplan_core::{Planner, PlannerError};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MB

#[derive(Clone)]
struct AppState {
    planner: Arc<Mutex<Planner<Database>>>,
    api_key: Option<String>,
}

impl AppState {
    fn planner(&self) -> MutexGuard<'_, Planner<Database>> {
        self.planner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct CreateUserRequest {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Deserialize)]
struct CreateRecipeRequest {
    name: Option<String>,
    diet_type: Option<String>,
    cuisine: Option<String>,
    description: Option<String>,
    ingredients: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct MealPlanRequest {
    user_id: Option<String>,
    meal_type: Option<String>,
    day_of_week: Option<String>,
    recipe_id: Option<i64>,
}

#[derive(Deserialize)]
struct ShoppingListRequest {
    user_id: Option<String>,
    ingredient_id: Option<i64>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(err) => {
                tracing::error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::NotFound(msg) => Self::NotFound(msg),
            PlannerError::Conflict(msg) => Self::Conflict(msg),
            PlannerError::Validation(msg) => Self::BadRequest(msg),
            PlannerError::Store(err) => Self::Internal(err),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `Json` body extractor whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

/// Unwrap every field of a request body, or fail with one message listing
/// all of them.
macro_rules! required {
    ($message:expr; $($field:ident),+ $(,)?) => {
        match ($($field),+) {
            ($(Some($field)),+) => ($($field),+),
            _ => return Err(ApiError::BadRequest($message.to_string())),
        }
    };
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- User handlers ---

async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let CreateUserRequest { name, email } = req;
    let (name, email) = required!("name and email are required"; name, email);
    let user = state.planner().create_user(&name, &email)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.planner().list_users()?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.planner().get_user(&user_id)?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.planner().delete_user(&user_id)?))
}

// --- Recipe handlers ---

async fn create_recipe(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    let CreateRecipeRequest {
        name,
        diet_type,
        cuisine,
        description,
        ingredients,
    } = req;
    let (name, diet_type, cuisine, description, ingredients) = required!(
        "name, diet_type, cuisine, description, and ingredients are required";
        name, diet_type, cuisine, description, ingredients
    );
    let recipe = NewRecipe {
        name,
        diet_type,
        cuisine,
        description,
        ingredients,
    };
    let detail = state.planner().create_recipe(&recipe)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list_recipes(
    State(state): State<AppState>,
    Query(filter): Query<RecipeFilter>,
) -> Result<Json<Vec<RecipeDetail>>, ApiError> {
    Ok(Json(state.planner().list_recipes(&filter)?))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<i64>,
) -> Result<Json<RecipeDetail>, ApiError> {
    Ok(Json(state.planner().get_recipe(recipe_id)?))
}

async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    Ok(Json(state.planner().list_ingredients()?))
}

// --- Meal plan handlers ---

async fn create_meal_plan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MealPlanRequest>,
) -> Result<(StatusCode, Json<MealPlanEntry>), ApiError> {
    let MealPlanRequest {
        user_id,
        meal_type,
        day_of_week,
        recipe_id,
    } = req;
    let (user_id, meal_type, day_of_week, recipe_id) = required!(
        "user_id, meal_type, day_of_week, and recipe_id are required";
        user_id, meal_type, day_of_week, recipe_id
    );
    let meal = validate_meal_type(&meal_type)?;
    let day = validate_day_of_week(&day_of_week)?;
    let entry = state
        .planner()
        .create_meal_plan(&user_id, meal, day, recipe_id)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_meal_plan(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<MealPlanRequest>,
) -> Result<Json<MealPlanEntry>, ApiError> {
    let MealPlanRequest {
        user_id,
        meal_type,
        day_of_week,
        recipe_id,
    } = req;
    let (user_id, meal_type, day_of_week, recipe_id) = required!(
        "user_id, meal_type, day_of_week, and recipe_id are required";
        user_id, meal_type, day_of_week, recipe_id
    );
    let meal = validate_meal_type(&meal_type)?;
    let day = validate_day_of_week(&day_of_week)?;
    let entry = state
        .planner()
        .update_meal_plan(&user_id, meal, day, recipe_id)?;
    Ok(Json(entry))
}

fn non_empty_plan(
    entries: Vec<MealPlanEntry>,
    message: impl FnOnce() -> String,
) -> Result<Json<Vec<MealPlanEntry>>, ApiError> {
    if entries.is_empty() {
        return Err(ApiError::NotFound(message()));
    }
    Ok(Json(entries))
}

async fn get_meal_plan(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<MealPlanEntry>>, ApiError> {
    let entries = state.planner().meal_plan_for_user(&user_id, None)?;
    non_empty_plan(entries, || format!("User {user_id} has no meal plan"))
}

async fn get_meal_plan_for_day(
    State(state): State<AppState>,
    Path((user_id, day)): Path<(String, String)>,
) -> Result<Json<Vec<MealPlanEntry>>, ApiError> {
    let day = validate_day_of_week(&day)?;
    let entries = state.planner().meal_plan_for_user(&user_id, Some(day))?;
    non_empty_plan(entries, || {
        format!("User {user_id} has no meal plan for {day}")
    })
}

async fn delete_meal_plan(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DeleteSummary>, ApiError> {
    let summary = state.planner().delete_meal_plan(&user_id, DeleteScope::All)?;
    Ok(Json(summary))
}

async fn delete_meal_plan_for_day(
    State(state): State<AppState>,
    Path((user_id, day)): Path<(String, String)>,
) -> Result<Json<DeleteSummary>, ApiError> {
    let scope = DeleteScope::Day(validate_day_of_week(&day)?);
    Ok(Json(state.planner().delete_meal_plan(&user_id, scope)?))
}

async fn delete_meal_plan_slot(
    State(state): State<AppState>,
    Path((user_id, day, meal)): Path<(String, String, String)>,
) -> Result<Json<DeleteSummary>, ApiError> {
    let scope = DeleteScope::Meal(validate_day_of_week(&day)?, validate_meal_type(&meal)?);
    Ok(Json(state.planner().delete_meal_plan(&user_id, scope)?))
}

// --- Shopping list handlers ---

async fn add_shopping_item(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ShoppingListRequest>,
) -> Result<(StatusCode, Json<ShoppingListEntry>), ApiError> {
    let ShoppingListRequest {
        user_id,
        ingredient_id,
    } = req;
    let (user_id, ingredient_id) =
        required!("user_id and ingredient_id are required"; user_id, ingredient_id);
    let entry = state.planner().add_shopping_item(&user_id, ingredient_id)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn mark_purchased(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ShoppingListRequest>,
) -> Result<Json<ShoppingListEntry>, ApiError> {
    let ShoppingListRequest {
        user_id,
        ingredient_id,
    } = req;
    let (user_id, ingredient_id) =
        required!("user_id and ingredient_id are required"; user_id, ingredient_id);
    let entry = state
        .planner()
        .mark_shopping_item_purchased(&user_id, ingredient_id)?;
    Ok(Json(entry))
}

async fn get_shopping_list(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<ShoppingListEntry>>, ApiError> {
    let entries = state.planner().unchecked_shopping_list(&user_id)?;
    if entries.is_empty() {
        return Err(ApiError::NotFound(format!(
            "User {user_id} has nothing on their shopping list"
        )));
    }
    Ok(Json(entries))
}

// --- Router ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/users/{id}", get(get_user).delete(delete_user))
        .route("/api/recipes", post(create_recipe).get(list_recipes))
        .route("/api/recipes/{id}", get(get_recipe))
        .route("/api/ingredients", get(list_ingredients))
        .route("/api/mealplan", post(create_meal_plan).put(update_meal_plan))
        .route(
            "/api/mealplan/{user_id}",
            get(get_meal_plan).delete(delete_meal_plan),
        )
        .route(
            "/api/mealplan/{user_id}/{day}",
            get(get_meal_plan_for_day).delete(delete_meal_plan_for_day),
        )
        .route(
            "/api/mealplan/{user_id}/{day}/{meal}",
            delete(delete_meal_plan_slot),
        )
        .route(
            "/api/shoppinglist",
            post(add_shopping_item).put(mark_purchased),
        )
        .route("/api/shoppinglist/{user_id}", get(get_shopping_list))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(
    planner: Planner<Database>,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        planner: Arc::new(Mutex::new(planner)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        if key.len() >= 8 {
            eprintln!(
                "API key: {}...{} (see api_key file in data directory)",
                &key[..4],
                &key[key.len() - 4..],
            );
        }
    } else {
        tracing::warn!("authentication disabled (--no-auth), API is open to anyone");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        tracing::warn!(
            bind,
            "listening on a non-loopback address with no authentication"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    tracing::info!("listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
