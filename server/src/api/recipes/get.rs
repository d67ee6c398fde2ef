use crate::api::{ApiError, ErrorResponse};
use crate::auth::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use recipebox_core::{Difficulty, DifficultyPolicy, Recipe};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i32,
    pub name: String,
    /// As entered, comma separated
    pub ingredients: String,
    pub ingredient_list: Vec<String>,
    /// Minutes
    pub cooking_time: i32,
    pub difficulty: Difficulty,
    /// Canonical detail path
    pub url: String,
}

impl RecipeResponse {
    pub fn new(recipe: Recipe, policy: &DifficultyPolicy) -> Self {
        Self {
            difficulty: recipe.difficulty(policy),
            ingredient_list: recipe.ingredient_list(),
            url: recipe.absolute_url(),
            id: recipe.id,
            name: recipe.name,
            ingredients: recipe.ingredients,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[utoipa::path(
    get,
    path = "/list/{id}",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 303, description = "Not logged in, redirect to /login"),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>, ApiError> {
    // Non-numeric ids can't name a recipe; treat them like unknown ones
    let id: i32 = id.parse().map_err(|_| ApiError::NotFound)?;

    let recipe = state.store.get_recipe(id)?;
    tracing::debug!(user = %user.username, recipe_id = id, "showing recipe");

    Ok(Json(RecipeResponse::new(recipe, &state.config.difficulty)))
}
