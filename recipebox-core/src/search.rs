//! The recipe search form and the criteria it validates into.
//!
//! A submission arrives as loose strings (`SearchForm`). `validate` turns it
//! into `SearchCriteria` or a per-field `FormErrors` map. Blank optional
//! fields are treated as absent, the way an HTML form submits them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::difficulty::{Difficulty, DifficultyPolicy};
use crate::recipe::Recipe;

pub const SEARCH_TERM_MAX_LENGTH: usize = 100;

const REQUIRED: &str = "This field is required.";
const WHOLE_NUMBER: &str = "Enter a whole number.";

/// Which recipe field the search term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SearchBy {
    Name,
    Ingredients,
}

impl SearchBy {
    pub const ALL: [SearchBy; 2] = [SearchBy::Name, SearchBy::Ingredients];

    /// Value submitted by the form.
    pub fn value(self) -> &'static str {
        match self {
            SearchBy::Name => "name",
            SearchBy::Ingredients => "ingredients",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchBy::Name => "Name",
            SearchBy::Ingredients => "Ingredients",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        SearchBy::ALL.into_iter().find(|s| s.value() == value)
    }
}

/// A search form submission, exactly as posted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchForm {
    #[serde(default)]
    pub search_by: Option<String>,
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Validation errors keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Describes a form field so a client can render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    /// Empty for free-text fields
    pub choices: Vec<Choice>,
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl SearchForm {
    pub const FIELDS: [&'static str; 4] = ["search_by", "search_term", "cooking_time", "difficulty"];

    pub fn label(field: &str) -> Option<&'static str> {
        match field {
            "search_by" => Some("Search by"),
            "search_term" => Some("Search term"),
            "cooking_time" => Some("Cooking Time in Minutes"),
            "difficulty" => Some("Difficulty"),
            _ => None,
        }
    }

    /// Field descriptors in display order.
    pub fn describe() -> Vec<FieldDescriptor> {
        Self::FIELDS
            .into_iter()
            .map(|name| {
                let (required, choices) = match name {
                    "search_by" => (
                        true,
                        SearchBy::ALL
                            .into_iter()
                            .map(|s| Choice {
                                value: s.value(),
                                label: s.label(),
                            })
                            .collect(),
                    ),
                    "search_term" => (true, Vec::new()),
                    "difficulty" => (
                        false,
                        Difficulty::ALL
                            .into_iter()
                            .map(|d| Choice {
                                value: d.label(),
                                label: d.label(),
                            })
                            .collect(),
                    ),
                    _ => (false, Vec::new()),
                };
                FieldDescriptor {
                    name,
                    label: Self::label(name).unwrap_or(name),
                    required,
                    choices,
                }
            })
            .collect()
    }

    /// Validate every field, collecting all errors rather than stopping at
    /// the first.
    pub fn validate(&self) -> Result<SearchCriteria, FormErrors> {
        let mut errors = FormErrors::default();

        let search_by = match blank_to_none(self.search_by.as_deref()) {
            None => {
                errors.add("search_by", REQUIRED);
                None
            }
            Some(value) => {
                let parsed = SearchBy::from_value(value);
                if parsed.is_none() {
                    errors.add(
                        "search_by",
                        format!(
                            "Select a valid choice. {} is not one of the available choices.",
                            value
                        ),
                    );
                }
                parsed
            }
        };

        let search_term = match blank_to_none(self.search_term.as_deref()) {
            None => {
                errors.add("search_term", REQUIRED);
                None
            }
            Some(term) => {
                let len = term.chars().count();
                if len > SEARCH_TERM_MAX_LENGTH {
                    errors.add(
                        "search_term",
                        format!(
                            "Ensure this value has at most {} characters (it has {}).",
                            SEARCH_TERM_MAX_LENGTH, len
                        ),
                    );
                    None
                } else {
                    Some(term.to_string())
                }
            }
        };

        let cooking_time = match blank_to_none(self.cooking_time.as_deref()) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(minutes) if minutes >= 0 => Some(minutes),
                Ok(_) => {
                    errors.add(
                        "cooking_time",
                        "Ensure this value is greater than or equal to 0.",
                    );
                    None
                }
                Err(_) => {
                    errors.add("cooking_time", WHOLE_NUMBER);
                    None
                }
            },
        };

        let difficulty = match blank_to_none(self.difficulty.as_deref()) {
            None => None,
            Some(raw) => match raw.parse::<Difficulty>() {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.add(
                        "difficulty",
                        format!(
                            "Select a valid choice. {} is not one of the available choices.",
                            raw
                        ),
                    );
                    None
                }
            },
        };

        match (search_by, search_term) {
            (Some(search_by), Some(search_term)) if errors.is_empty() => Ok(SearchCriteria {
                search_by,
                search_term,
                cooking_time,
                difficulty,
            }),
            _ => Err(errors),
        }
    }
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SearchCriteria {
    pub search_by: SearchBy,
    pub search_term: String,
    pub cooking_time: Option<i32>,
    pub difficulty: Option<Difficulty>,
}

impl SearchCriteria {
    pub fn new(search_by: SearchBy, search_term: impl Into<String>) -> Self {
        Self {
            search_by,
            search_term: search_term.into(),
            cooking_time: None,
            difficulty: None,
        }
    }

    pub fn with_cooking_time(mut self, minutes: i32) -> Self {
        self.cooking_time = Some(minutes);
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Case-insensitive substring match on the selected field.
    pub fn matches_text(&self, recipe: &Recipe) -> bool {
        let haystack = match self.search_by {
            SearchBy::Name => &recipe.name,
            SearchBy::Ingredients => &recipe.ingredients,
        };
        haystack
            .to_lowercase()
            .contains(&self.search_term.to_lowercase())
    }

    pub fn matches_difficulty(&self, recipe: &Recipe, policy: &DifficultyPolicy) -> bool {
        self.difficulty
            .map_or(true, |wanted| recipe.difficulty(policy) == wanted)
    }

    pub fn matches(&self, recipe: &Recipe, policy: &DifficultyPolicy) -> bool {
        self.matches_text(recipe)
            && self.cooking_time.map_or(true, |t| recipe.cooking_time == t)
            && self.matches_difficulty(recipe, policy)
    }

    /// Filter recipes, keeping their order.
    pub fn filter<'a, I>(&self, recipes: I, policy: &DifficultyPolicy) -> Vec<Recipe>
    where
        I: IntoIterator<Item = &'a Recipe>,
    {
        recipes
            .into_iter()
            .filter(|r| self.matches(r, policy))
            .cloned()
            .collect()
    }
}
