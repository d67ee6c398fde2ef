pub mod get;
pub mod list;
pub mod search;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for the login-gated recipe pages
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", get(list::list_recipes))
        .route("/list/{id}", get(get::get_recipe))
        .route(
            "/search",
            get(search::search_form).post(search::search_recipes),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        get::get_recipe,
        search::search_form,
        search::search_recipes,
    ),
    components(schemas(
        list::ListRecipesResponse,
        list::RecipeSummary,
        get::RecipeResponse,
        search::SearchPage,
        search::SearchResponse,
        search::SearchErrorResponse,
        recipebox_core::Difficulty,
        recipebox_core::SearchBy,
        recipebox_core::SearchForm,
        recipebox_core::SearchCriteria,
        recipebox_core::FieldDescriptor,
        recipebox_core::Choice,
        recipebox_core::FormErrors,
    ))
)]
pub struct ApiDoc;
