use super::{Store, StoreError};
use crate::db::DbPool;
use crate::models::{NewRecipeRow, NewSession, NewUser, RecipeRow, User};
use crate::schema::{recipes, sessions, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use recipebox_core::{DifficultyPolicy, NewRecipe, Recipe, SearchBy, SearchCriteria};
use uuid::Uuid;

/// Escape LIKE metacharacters so user input only ever matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl Store for PgStore {
    fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let _span = tracing::info_span!("db.query", op = "list_recipes").entered();
        let mut conn = self.conn()?;

        let rows: Vec<RecipeRow> = recipes::table
            .order(recipes::id.asc())
            .select(RecipeRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    fn get_recipe(&self, id: i32) -> Result<Recipe, StoreError> {
        let _span = tracing::info_span!("db.query", op = "get_recipe", id).entered();
        let mut conn = self.conn()?;

        let row: RecipeRow = recipes::table
            .find(id)
            .select(RecipeRow::as_select())
            .first(&mut conn)?;

        Ok(row.into())
    }

    fn search_recipes(
        &self,
        criteria: &SearchCriteria,
        policy: &DifficultyPolicy,
    ) -> Result<Vec<Recipe>, StoreError> {
        let _span = tracing::info_span!("db.query", op = "search_recipes").entered();

        // Must outlive the boxed query
        let pattern = format!("%{}%", escape_like(&criteria.search_term));

        let mut conn = self.conn()?;

        let mut query = recipes::table.into_boxed();

        query = match criteria.search_by {
            SearchBy::Name => query.filter(recipes::name.ilike(&pattern)),
            SearchBy::Ingredients => query.filter(recipes::ingredients.ilike(&pattern)),
        };

        if let Some(minutes) = criteria.cooking_time {
            query = query.filter(recipes::cooking_time.eq(minutes));
        }

        let rows: Vec<RecipeRow> = query
            .order(recipes::id.asc())
            .select(RecipeRow::as_select())
            .load(&mut conn)?;

        // Difficulty depends on the parsed ingredient count, so it is
        // filtered here rather than in SQL.
        Ok(rows
            .into_iter()
            .map(Recipe::from)
            .filter(|r| criteria.matches_difficulty(r, policy))
            .collect())
    }

    fn create_recipe(&self, recipe: &NewRecipe) -> Result<Recipe, StoreError> {
        recipe.validate()?;

        let _span = tracing::info_span!("db.query", op = "create_recipe").entered();
        let mut conn = self.conn()?;

        let row: RecipeRow = diesel::insert_into(recipes::table)
            .values(&NewRecipeRow {
                name: &recipe.name,
                ingredients: &recipe.ingredients,
                cooking_time: recipe.cooking_time,
            })
            .returning(RecipeRow::as_returning())
            .get_result(&mut conn)?;

        Ok(row.into())
    }

    fn delete_recipe(&self, id: i32) -> Result<(), StoreError> {
        let _span = tracing::info_span!("db.query", op = "delete_recipe", id).entered();
        let mut conn = self.conn()?;

        let deleted = diesel::delete(recipes::table.find(id)).execute(&mut conn)?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let _span = tracing::info_span!("db.query", op = "create_user").entered();
        let mut conn = self.conn()?;

        let user = diesel::insert_into(users::table)
            .values(&NewUser {
                username,
                password_hash,
            })
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        Ok(user)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let _span = tracing::info_span!("db.query", op = "find_user_by_username").entered();
        let mut conn = self.conn()?;

        let user = users::table
            .filter(
                diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(username) = LOWER(")
                    .bind::<diesel::sql_types::Text, _>(username)
                    .sql(")"),
            )
            .filter(users::deleted_at.is_null())
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(user)
    }

    fn create_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _span = tracing::info_span!("db.query", op = "create_session").entered();
        let mut conn = self.conn()?;

        diesel::insert_into(sessions::table)
            .values(&NewSession {
                user_id,
                token_hash,
                expires_at,
            })
            .execute(&mut conn)?;

        Ok(())
    }

    fn user_for_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let _span = tracing::info_span!("db.query", op = "user_for_session").entered();
        let mut conn = self.conn()?;

        let user = sessions::table
            .inner_join(users::table)
            .filter(sessions::token_hash.eq(token_hash))
            .filter(sessions::expires_at.gt(now))
            .filter(users::deleted_at.is_null())
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(user)
    }

    fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        let _span = tracing::info_span!("db.query", op = "delete_session").entered();
        let mut conn = self.conn()?;

        diesel::delete(sessions::table.filter(sessions::token_hash.eq(token_hash)))
            .execute(&mut conn)?;

        Ok(())
    }
}
