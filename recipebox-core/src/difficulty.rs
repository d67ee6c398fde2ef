use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownDifficulty;

/// Derived difficulty of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Difficulty {
    Easy,
    Medium,
    Intermediate,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Intermediate,
        Difficulty::Hard,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDifficulty(s.to_string()))
    }
}

/// Thresholds separating quick from slow recipes and short ingredient
/// lists from long ones.
///
/// A recipe is "short" when `cooking_time < short_time_minutes` and has
/// "few" ingredients when `count < few_ingredients`:
///
/// | time \ ingredients | few | many |
/// |---|---|---|
/// | short | Easy | Medium |
/// | long | Intermediate | Hard |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyPolicy {
    pub short_time_minutes: i32,
    pub few_ingredients: usize,
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            short_time_minutes: 10,
            few_ingredients: 4,
        }
    }
}

impl DifficultyPolicy {
    pub fn classify(&self, cooking_time: i32, ingredient_count: usize) -> Difficulty {
        let short = cooking_time < self.short_time_minutes;
        let few = ingredient_count < self.few_ingredients;
        match (short, few) {
            (true, true) => Difficulty::Easy,
            (true, false) => Difficulty::Medium,
            (false, true) => Difficulty::Intermediate,
            (false, false) => Difficulty::Hard,
        }
    }
}
