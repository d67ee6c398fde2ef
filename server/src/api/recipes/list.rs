use crate::api::ApiError;
use crate::auth::CurrentUser;
use crate::AppState;
use axum::{extract::State, Json};
use recipebox_core::{Difficulty, DifficultyPolicy, Recipe};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub cooking_time: i32,
    pub difficulty: Difficulty,
    /// Detail page for this recipe
    pub url: String,
}

impl RecipeSummary {
    pub fn new(recipe: &Recipe, policy: &DifficultyPolicy) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            cooking_time: recipe.cooking_time,
            difficulty: recipe.difficulty(policy),
            url: recipe.absolute_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
}

#[utoipa::path(
    get,
    path = "/list",
    tag = "recipes",
    responses(
        (status = 200, description = "All recipes, ordered by id", body = ListRecipesResponse),
        (status = 303, description = "Not logged in, redirect to /login")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ListRecipesResponse>, ApiError> {
    let recipes = state.store.list_recipes()?;
    tracing::debug!(user = %user.username, count = recipes.len(), "listing recipes");

    let policy = &state.config.difficulty;
    Ok(Json(ListRecipesResponse {
        recipes: recipes
            .iter()
            .map(|r| RecipeSummary::new(r, policy))
            .collect(),
    }))
}
