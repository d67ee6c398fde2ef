//! End-to-end checks of the search form against a small set of recipes.

use chrono::Utc;
use recipebox_core::{
    Difficulty, DifficultyPolicy, Recipe, SearchBy, SearchCriteria, SearchForm,
};

fn recipe(id: i32, name: &str, ingredients: &str, cooking_time: i32) -> Recipe {
    Recipe {
        id,
        name: name.to_string(),
        ingredients: ingredients.to_string(),
        cooking_time,
        created_at: Utc::now(),
    }
}

fn pantry() -> Vec<Recipe> {
    vec![
        recipe(1, "Tea", "Tea leaves, Sugar, Water", 5),
        recipe(2, "Lemonade", "Lemons, Sugar, Water, Ice", 5),
        recipe(3, "Rice", "Rice, Water", 20),
        recipe(4, "Chili", "Beans, Beef, Tomato, Onion, Chili powder", 90),
    ]
}

fn names(recipes: &[Recipe]) -> Vec<&str> {
    recipes.iter().map(|r| r.name.as_str()).collect()
}

fn submit(search_by: &str, term: &str, time: &str, difficulty: &str) -> Vec<Recipe> {
    let form = SearchForm {
        search_by: Some(search_by.to_string()),
        search_term: Some(term.to_string()),
        cooking_time: Some(time.to_string()),
        difficulty: Some(difficulty.to_string()),
    };
    let criteria = form.validate().expect("form should be valid");
    criteria.filter(&pantry(), &DifficultyPolicy::default())
}

#[test]
fn each_recipe_gets_expected_difficulty() {
    let policy = DifficultyPolicy::default();
    let got: Vec<Difficulty> = pantry().iter().map(|r| r.difficulty(&policy)).collect();
    assert_eq!(
        got,
        vec![
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Intermediate,
            Difficulty::Hard,
        ]
    );
}

#[test]
fn name_search_is_case_insensitive_substring() {
    assert_eq!(names(&submit("name", "LEMON", "", "")), vec!["Lemonade"]);
    assert_eq!(names(&submit("name", "i", "", "")), vec!["Rice", "Chili"]);
}

#[test]
fn ingredient_search_looks_at_ingredients_only() {
    assert_eq!(
        names(&submit("ingredients", "water", "", "")),
        vec!["Tea", "Lemonade", "Rice"]
    );
    // "Tea" is a name, but also appears in "Tea leaves"
    assert_eq!(names(&submit("ingredients", "tea", "", "")), vec!["Tea"]);
    assert!(submit("ingredients", "Lemonade", "", "").is_empty());
}

#[test]
fn cooking_time_and_difficulty_narrow_results() {
    assert_eq!(
        names(&submit("ingredients", "water", "5", "")),
        vec!["Tea", "Lemonade"]
    );
    assert_eq!(
        names(&submit("ingredients", "water", "5", "Medium")),
        vec!["Lemonade"]
    );
    assert!(submit("ingredients", "water", "", "Hard").is_empty());
}

#[test]
fn search_for_recipe_one_returns_only_recipe_one() {
    let recipes = vec![
        recipe(1, "Recipe 1", "ingredient1, ingredient2", 10),
        recipe(2, "Recipe 2", "ingredient1, ingredient2", 20),
    ];
    let criteria = SearchCriteria::new(SearchBy::Name, "Recipe 1");
    let found = criteria.filter(&recipes, &DifficultyPolicy::default());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 1);
}

#[test]
fn custom_policy_changes_classification() {
    let strict = DifficultyPolicy {
        short_time_minutes: 3,
        few_ingredients: 2,
    };
    let criteria = SearchCriteria::new(SearchBy::Name, "Tea").with_difficulty(Difficulty::Hard);
    assert_eq!(names(&criteria.filter(&pantry(), &strict)), vec!["Tea"]);
}
