//! Domain logic for the recipe box: the recipe record, its derived
//! difficulty, and the search form that filters recipes.
//!
//! Nothing in this crate touches the network or the database. The server
//! crate owns persistence and HTTP; it calls into these types to validate
//! input and to classify recipes.

pub mod difficulty;
pub mod error;
pub mod recipe;
pub mod search;

pub use difficulty::{Difficulty, DifficultyPolicy};
pub use error::{RecipeError, UnknownDifficulty};
pub use recipe::{
    detail_path, parse_ingredients, NewRecipe, Recipe, INGREDIENTS_MAX_LENGTH, NAME_MAX_LENGTH,
};
pub use search::{
    Choice, FieldDescriptor, FormErrors, SearchBy, SearchCriteria, SearchForm,
    SEARCH_TERM_MAX_LENGTH,
};
