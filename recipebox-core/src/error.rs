use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecipeError {
    #[error("Recipe name is required")]
    MissingName,

    #[error("Recipe name is {len} characters long (max {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Ingredients are {len} characters long (max {max})")]
    IngredientsTooLong { len: usize, max: usize },

    #[error("Cooking time must be a non-negative number of minutes, got {0}")]
    NegativeCookingTime(i32),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);
