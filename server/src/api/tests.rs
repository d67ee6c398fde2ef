use super::recipes::get::RecipeResponse;
use super::recipes::list::ListRecipesResponse;
use super::recipes::search::SearchResponse;
use super::router;
use crate::auth::{register_user, start_session, SESSION_COOKIE};
use crate::config::Config;
use crate::store::{MemoryStore, Store};
use crate::AppState;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use recipebox_core::{Difficulty, NewRecipe};
use std::sync::Arc;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

struct TestApp {
    state: AppState,
    app: Router,
}

impl TestApp {
    /// Two recipes and a "testuser" login, like a freshly seeded database.
    fn new() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(config: Config) -> Self {
        let config = Config {
            insecure_password_hashing: true,
            ..config
        };
        let state = AppState::new(Arc::new(MemoryStore::new()), config);

        state
            .store
            .create_recipe(&NewRecipe::new("Recipe 1", "ingredient1, ingredient2", 10))
            .unwrap();
        state
            .store
            .create_recipe(&NewRecipe::new("Recipe 2", "ingredient1, ingredient2", 20))
            .unwrap();
        register_user(&state, "testuser", "12345").unwrap();

        let app = router(state.clone());
        Self { state, app }
    }

    fn session_token(&self) -> String {
        let user = self
            .state
            .store
            .find_user_by_username("testuser")
            .unwrap()
            .unwrap();
        start_session(&self.state, &user).unwrap()
    }

    fn session_cookie(&self) -> String {
        format!("{}={}", SESSION_COOKIE, self.session_token())
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, FORM);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// The decoded `next` value of a login redirect.
fn login_next(response: &Response<Body>) -> String {
    let location = location(response);
    let (path, query) = location.split_once('?').unwrap();
    assert_eq!(path, "/login");
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "next")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn list_requires_login() {
    let app = TestApp::new();
    let response = app.get("/list", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(login_next(&response), "/list");
}

#[tokio::test]
async fn detail_requires_login() {
    let app = TestApp::new();
    let response = app.get("/list/1", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(login_next(&response), "/list/1");
}

#[tokio::test]
async fn search_requires_login() {
    let app = TestApp::new();
    let response = app.get("/search", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(login_next(&response), "/search");

    let response = app
        .post_form("/search", "search_by=name&search_term=Recipe", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(login_next(&response), "/search");
}

#[tokio::test]
async fn invalid_session_is_redirected() {
    let app = TestApp::new();
    let cookie = format!("{}=not-a-real-token", SESSION_COOKIE);
    let response = app.get("/list?page=2", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(login_next(&response), "/list?page=2");
}

#[tokio::test]
async fn list_shows_all_recipes() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let response = app.get("/list", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let list: ListRecipesResponse = body_json(response).await;
    let names: Vec<&str> = list.recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Recipe 1", "Recipe 2"]);
    assert_eq!(list.recipes[0].url, "/list/1");
    assert_eq!(list.recipes[1].difficulty, Difficulty::Intermediate);
}

#[tokio::test]
async fn bearer_token_also_works() {
    let app = TestApp::new();
    let token = app.session_token();
    let request = Request::builder()
        .uri("/list")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn detail_shows_recipe() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let response = app.get("/list/1", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let recipe: RecipeResponse = body_json(response).await;
    assert_eq!(recipe.name, "Recipe 1");
    assert_eq!(recipe.ingredient_list, vec!["ingredient1", "ingredient2"]);
    assert_eq!(recipe.cooking_time, 10);
    assert_eq!(recipe.url, "/list/1");
}

#[tokio::test]
async fn detail_unknown_id_is_not_found() {
    let app = TestApp::new();
    let cookie = app.session_cookie();

    let response = app.get("/list/999", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/list/abc", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_page_lists_fields() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let response = app.get("/search", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let page: serde_json::Value = body_json(response).await;
    let labels: Vec<&str> = page["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["label"].as_str().unwrap())
        .collect();
    assert_eq!(
        labels,
        vec![
            "Search by",
            "Search term",
            "Cooking Time in Minutes",
            "Difficulty"
        ]
    );
}

#[tokio::test]
async fn search_returns_only_matching_recipe() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let response = app
        .post_form(
            "/search",
            "search_by=name&search_term=Recipe+1&cooking_time=&difficulty=",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let results: SearchResponse = body_json(response).await;
    assert_eq!(results.recipes.len(), 1);
    assert_eq!(results.recipes[0].name, "Recipe 1");
    assert_eq!(results.criteria.search_term, "Recipe 1");
}

#[tokio::test]
async fn search_filters_by_cooking_time() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let response = app
        .post_form(
            "/search",
            "search_by=ingredients&search_term=ingredient1&cooking_time=20",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let results: SearchResponse = body_json(response).await;
    let names: Vec<&str> = results.recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Recipe 2"]);
}

#[tokio::test]
async fn empty_search_is_rejected_with_errors() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let response = app.post_form("/search", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = body_json(response).await;
    assert_eq!(body["errors"]["search_by"][0], "This field is required.");
    assert_eq!(body["errors"]["search_term"][0], "This field is required.");
}

#[tokio::test]
async fn search_without_form_body_gets_error_document() {
    let app = TestApp::new();
    let cookie = app.session_cookie();
    let request = Request::builder()
        .method("POST")
        .uri("/search")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(r#"{"search_by":"name"}"#))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = body_json(response).await;
    assert!(body["errors"]["__all__"][0].is_string());
    assert_eq!(body["fields"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn login_sets_cookie_and_follows_next() {
    let app = TestApp::new();
    let response = app
        .post_form(
            "/login",
            "username=testuser&password=12345&next=%2Flist%2F2",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/list/2");

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("sessionid="));
    assert!(set_cookie.contains("HttpOnly"));

    let response = app.get("/list/2", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_cookie_is_secure_when_configured() {
    let app = TestApp::with_config(Config {
        secure_cookies: true,
        ..Config::default()
    });
    let response = app
        .post_form("/login", "username=testuser&password=12345", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Secure"));

    let plain = TestApp::new()
        .post_form("/login", "username=testuser&password=12345", None)
        .await;
    let set_cookie = plain.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(!set_cookie.contains("Secure"));
}

#[tokio::test]
async fn login_ignores_offsite_next() {
    let app = TestApp::new();
    let response = app
        .post_form(
            "/login",
            "username=TestUser&password=12345&next=https%3A%2F%2Fevil.example",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/list");
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    let response = app
        .post_form("/login", "username=testuser&password=nope", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = app
        .post_form("/login", "username=nobody&password=12345", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn api_login_returns_usable_token() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({"username": "testuser", "password": "12345"}).to_string(),
        ))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = body_json(response).await;
    let token = body["token"].as_str().unwrap();

    let request = Request::builder()
        .uri("/search")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_ends_session() {
    let app = TestApp::new();
    let cookie = app.session_cookie();

    let response = app.post_form("/logout", "", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.get("/list", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn login_page_and_home_are_public() {
    let app = TestApp::new();

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/login?next=%2Fsearch", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page: serde_json::Value = body_json(response).await;
    assert_eq!(page["next"], "/search");
}

#[test]
fn openapi_documents_recipe_routes() {
    let spec = super::openapi();
    for path in ["/list", "/list/{id}", "/search", "/login", "/api/auth/login"] {
        assert!(spec.paths.paths.contains_key(path), "missing {}", path);
    }
}
