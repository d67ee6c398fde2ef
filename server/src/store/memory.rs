use super::{Store, StoreError};
use crate::models::{Session, User};
use chrono::{DateTime, Utc};
use recipebox_core::{DifficultyPolicy, NewRecipe, Recipe, SearchCriteria};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    recipes: Vec<Recipe>,
    last_recipe_id: i32,
    users: Vec<User>,
    sessions: Vec<Session>,
}

/// Process-local store. Recipes are kept in id order, matching the
/// ordering guarantees of the Postgres store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        Ok(self.tables()?.recipes.clone())
    }

    fn get_recipe(&self, id: i32) -> Result<Recipe, StoreError> {
        self.tables()?
            .recipes
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn search_recipes(
        &self,
        criteria: &SearchCriteria,
        policy: &DifficultyPolicy,
    ) -> Result<Vec<Recipe>, StoreError> {
        Ok(criteria.filter(&self.tables()?.recipes, policy))
    }

    fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        recipe.validate()?;

        let mut tables = self.tables()?;
        tables.last_recipe_id += 1;
        let stored = Recipe {
            id: tables.last_recipe_id,
            name: recipe.name.clone(),
            ingredients: recipe.ingredients.clone(),
            cooking_time: recipe.cooking_time,
            created_at: Utc::now(),
        };
        tables.recipes.push(stored.clone());
        Ok(stored)
    }

    fn delete_recipe(&self, id: i32) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let before = tables.recipes.len();
        tables.recipes.retain(|r| r.id != id);
        if tables.recipes.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut tables = self.tables()?;
        if tables
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username))
        {
            return Err(StoreError::Conflict(format!(
                "username {} is taken",
                username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.deleted_at.is_none() && u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    fn create_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        tables.sessions.push(Session {
            id: Uuid::new_v4(),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    fn user_for_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables()?;
        let Some(session) = tables
            .sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.expires_at > now)
        else {
            return Ok(None);
        };

        Ok(tables
            .users
            .iter()
            .find(|u| u.id == session.user_id && u.deleted_at.is_none())
            .cloned())
    }

    fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        self.tables()?
            .sessions
            .retain(|s| s.token_hash != token_hash);
        Ok(())
    }
}
