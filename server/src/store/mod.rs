//! Persistence for recipes, users and sessions.
//!
//! Handlers talk to a `Store` trait object. `PgStore` is the production
//! backend; `MemoryStore` keeps everything in process and is used by the
//! handler tests and `recipebox serve --in-memory`.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::models::User;
use chrono::{DateTime, Utc};
use recipebox_core::{DifficultyPolicy, NewRecipe, Recipe, RecipeError, SearchCriteria};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Invalid recipe: {0}")]
    InvalidRecipe(#[from] RecipeError),

    #[error("Database connection failed: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Database query failed: {0}")]
    Database(diesel::result::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => StoreError::NotFound,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                info,
            ) => StoreError::Conflict(info.message().to_string()),
            other => StoreError::Database(other),
        }
    }
}

pub trait Store: Send + Sync {
    /// All recipes, ordered by id.
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    fn get_recipe(&self, id: i32) -> Result<Recipe, StoreError>;

    /// Recipes matching `criteria`, ordered by id. Difficulty is derived, so
    /// the policy in force has to be supplied by the caller.
    fn search_recipes(
        &self,
        criteria: &SearchCriteria,
        policy: &DifficultyPolicy,
    ) -> Result<Vec<Recipe>, StoreError>;

    /// Validates and inserts a recipe, returning it with its assigned id.
    fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError>;

    fn delete_recipe(&self, id: i32) -> Result<(), StoreError>;

    /// Fails with `Conflict` if the username is taken (case-insensitively).
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Case-insensitive lookup; soft-deleted users are not returned.
    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    fn create_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// The live user owning an unexpired session with this token hash.
    fn user_for_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;

    fn delete_session(&self, token_hash: &str) -> Result<(), StoreError>;
}
