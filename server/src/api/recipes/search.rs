use crate::api::ApiError;
use crate::auth::CurrentUser;
use crate::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use recipebox_core::{FieldDescriptor, FormErrors, SearchCriteria, SearchForm};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::get::RecipeResponse;

/// What the search page shows before anything is submitted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchPage {
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    /// The validated search that produced these results
    pub criteria: SearchCriteria,
    pub recipes: Vec<RecipeResponse>,
}

/// Error key for problems with the submission as a whole.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Returned instead of results when the form doesn't validate.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchErrorResponse {
    pub form: SearchForm,
    pub errors: FormErrors,
    pub fields: Vec<FieldDescriptor>,
}

#[utoipa::path(
    get,
    path = "/search",
    tag = "recipes",
    responses(
        (status = 200, description = "Search form fields", body = SearchPage),
        (status = 303, description = "Not logged in, redirect to /login")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn search_form(CurrentUser(_user): CurrentUser) -> Json<SearchPage> {
    Json(SearchPage {
        fields: SearchForm::describe(),
    })
}

#[utoipa::path(
    post,
    path = "/search",
    tag = "recipes",
    request_body(content = SearchForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Matching recipes", body = SearchResponse),
        (status = 400, description = "Form did not validate", body = SearchErrorResponse),
        (status = 303, description = "Not logged in, redirect to /login")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    )
)]
pub async fn search_recipes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    submission: Result<Form<SearchForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let form = match submission {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!(user = %user.username, %rejection, "search form unreadable");
            let mut errors = FormErrors::default();
            errors.add(NON_FIELD_ERRORS, rejection.body_text());
            return Ok(invalid_search(SearchForm::default(), errors));
        }
    };

    let criteria = match form.validate() {
        Ok(c) => c,
        Err(errors) => {
            tracing::debug!(user = %user.username, ?errors, "search form invalid");
            return Ok(invalid_search(form, errors));
        }
    };

    let policy = &state.config.difficulty;
    let recipes = state.store.search_recipes(&criteria, policy)?;
    tracing::debug!(
        user = %user.username,
        search_by = criteria.search_by.value(),
        matches = recipes.len(),
        "search completed"
    );

    let recipes = recipes
        .into_iter()
        .map(|r| RecipeResponse::new(r, policy))
        .collect();

    Ok(Json(SearchResponse { criteria, recipes }).into_response())
}

fn invalid_search(form: SearchForm, errors: FormErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(SearchErrorResponse {
            form,
            errors,
            fields: SearchForm::describe(),
        }),
    )
        .into_response()
}
