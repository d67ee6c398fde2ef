use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::difficulty::{Difficulty, DifficultyPolicy};
use crate::error::RecipeError;

/// Maximum length of a recipe name, in characters.
pub const NAME_MAX_LENGTH: usize = 50;

/// Maximum length of the comma-separated ingredients text, in characters.
pub const INGREDIENTS_MAX_LENGTH: usize = 225;

/// A stored recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i32,
    pub name: String,
    /// Free text, one ingredient per comma: "Tea leaves, Sugar, Water"
    pub ingredients: String,
    /// Minutes
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    /// Canonical detail path for this recipe.
    pub fn absolute_url(&self) -> String {
        detail_path(self.id)
    }

    pub fn ingredient_list(&self) -> Vec<String> {
        parse_ingredients(&self.ingredients)
    }

    pub fn ingredient_count(&self) -> usize {
        self.ingredient_list().len()
    }

    pub fn difficulty(&self, policy: &DifficultyPolicy) -> Difficulty {
        policy.classify(self.cooking_time, self.ingredient_count())
    }

    /// Human-readable name of a model field, as shown next to its value.
    pub fn verbose_name(field: &str) -> Option<&'static str> {
        match field {
            "name" => Some("name"),
            "ingredients" => Some("ingredients"),
            "cooking_time" => Some("cooking time"),
            _ => None,
        }
    }
}

/// Detail path for a recipe id, e.g. `/list/1`.
pub fn detail_path(id: i32) -> String {
    format!("/list/{}", id)
}

/// Split comma-separated ingredients, trimming whitespace and dropping
/// empty entries (so "a,, b," is two ingredients).
pub fn parse_ingredients(ingredients: &str) -> Vec<String> {
    ingredients
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A recipe that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: String,
    pub cooking_time: i32,
}

impl NewRecipe {
    pub fn new(name: impl Into<String>, ingredients: impl Into<String>, cooking_time: i32) -> Self {
        Self {
            name: name.into(),
            ingredients: ingredients.into(),
            cooking_time,
        }
    }

    /// Check the field constraints. Lengths are counted in characters, not
    /// bytes, to match the varchar limits in the database.
    pub fn validate(&self) -> Result<(), RecipeError> {
        if self.name.trim().is_empty() {
            return Err(RecipeError::MissingName);
        }

        let name_len = self.name.chars().count();
        if name_len > NAME_MAX_LENGTH {
            return Err(RecipeError::NameTooLong {
                len: name_len,
                max: NAME_MAX_LENGTH,
            });
        }

        let ingredients_len = self.ingredients.chars().count();
        if ingredients_len > INGREDIENTS_MAX_LENGTH {
            return Err(RecipeError::IngredientsTooLong {
                len: ingredients_len,
                max: INGREDIENTS_MAX_LENGTH,
            });
        }

        if self.cooking_time < 0 {
            return Err(RecipeError::NegativeCookingTime(self.cooking_time));
        }

        Ok(())
    }
}
