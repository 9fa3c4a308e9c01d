use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};

use crate::{
    error::AppError,
    recipe::{AuthorType, RecipeFields, RecipeInput},
};

const NOT_BLANK: &str = "must not be blank";
const NOT_EMPTY: &str = "must not be empty";
const NOT_NULL: &str = "must not be null";

pub const SEASON_REQUIRED: &str = "season is required when authorType is participant";
pub const INGREDIENT_REQUIRED: &str = "ingredient query param is required";

/// Checks every field, then the participant season rule.
pub fn validate_input(input: RecipeInput) -> Result<RecipeFields, AppError> {
    let mut details = BTreeMap::new();

    let title = required_text(&mut details, "title", input.title);
    let ingredients = required_list(&mut details, "ingredients", input.ingredients);
    let steps = required_list(&mut details, "steps", input.steps);
    let chef_name = required_text(&mut details, "chefName", input.chef_name);

    if input.author_type.is_none() {
        details.insert("authorType".to_string(), NOT_NULL.to_string());
    }

    let (Some(title), Some(ingredients), Some(steps), Some(chef_name), Some(author_type)) =
        (title, ingredients, steps, chef_name, input.author_type)
    else {
        return Err(AppError::Validation(details));
    };

    if author_type == AuthorType::Participant && input.season.is_none() {
        return Err(AppError::BadRequest(SEASON_REQUIRED.to_string()));
    }

    Ok(RecipeFields {
        title,
        ingredients,
        steps,
        chef_name,
        author_type,
        season: input.season,
    })
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn required_text(
    details: &mut BTreeMap<String, String>,
    field: &str,
    value: Option<String>,
) -> Option<String> {
    match value {
        Some(value) if !is_blank(&value) => Some(value),
        _ => {
            details.insert(field.to_string(), NOT_BLANK.to_string());
            None
        }
    }
}

fn required_list(
    details: &mut BTreeMap<String, String>,
    field: &str,
    value: Option<Vec<String>>,
) -> Option<Vec<String>> {
    let Some(items) = value.filter(|items| !items.is_empty()) else {
        details.insert(field.to_string(), NOT_EMPTY.to_string());
        return None;
    };

    let mut valid = true;
    for (index, item) in items.iter().enumerate() {
        if is_blank(item) {
            details
                .entry(format!("{field}[{index}]"))
                .or_insert_with(|| NOT_BLANK.to_string());
            valid = false;
        }
    }

    valid.then_some(items)
}

/// Case-insensitive pattern for ingredient search.
pub fn ingredient_pattern(ingredient: Option<&str>) -> Result<Regex, AppError> {
    let ingredient = ingredient
        .filter(|ingredient| !is_blank(ingredient))
        .ok_or_else(|| AppError::BadRequest(INGREDIENT_REQUIRED.to_string()))?;

    RegexBuilder::new(ingredient)
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::BadRequest(format!("invalid ingredient pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RecipeInput {
        RecipeInput {
            title: Some("Pancakes".to_string()),
            ingredients: Some(vec!["Flour".to_string(), "Milk".to_string()]),
            steps: Some(vec!["Mix".to_string()]),
            chef_name: Some("Ana".to_string()),
            author_type: Some(AuthorType::Viewer),
            season: None,
        }
    }

    fn details(err: AppError) -> BTreeMap<String, String> {
        match err {
            AppError::Validation(details) => details,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_input() {
        let fields = validate_input(input()).unwrap();

        assert_eq!(fields.title, "Pancakes");
        assert_eq!(fields.author_type, AuthorType::Viewer);
        assert_eq!(fields.season, None);
    }

    #[test]
    fn test_empty_input_reports_every_field() {
        let details = details(validate_input(RecipeInput::default()).unwrap_err());

        assert_eq!(details.len(), 5);
        assert_eq!(details["title"], NOT_BLANK);
        assert_eq!(details["ingredients"], NOT_EMPTY);
        assert_eq!(details["steps"], NOT_EMPTY);
        assert_eq!(details["chefName"], NOT_BLANK);
        assert_eq!(details["authorType"], NOT_NULL);
    }

    #[test]
    fn test_blank_values() {
        let details = details(
            validate_input(RecipeInput {
                title: Some("   ".to_string()),
                ingredients: Some(vec!["Flour".to_string(), " ".to_string()]),
                steps: Some(vec![]),
                ..input()
            })
            .unwrap_err(),
        );

        assert_eq!(details["title"], NOT_BLANK);
        assert_eq!(details["ingredients[1]"], NOT_BLANK);
        assert_eq!(details["steps"], NOT_EMPTY);
        assert!(!details.contains_key("chefName"));
    }

    #[test]
    fn test_participant_needs_season() {
        let err = validate_input(RecipeInput {
            author_type: Some(AuthorType::Participant),
            ..input()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref message) if message == SEASON_REQUIRED));

        let fields = validate_input(RecipeInput {
            author_type: Some(AuthorType::Participant),
            season: Some(4),
            ..input()
        })
        .unwrap();
        assert_eq!(fields.season, Some(4));
    }

    #[test]
    fn test_ingredient_pattern() {
        let pattern = ingredient_pattern(Some("flo")).unwrap();
        assert!(pattern.is_match("FLOUR"));
        assert!(pattern.is_match("Wholewheat flour"));
        assert!(!pattern.is_match("Milk"));

        assert!(matches!(
            ingredient_pattern(Some("  ")),
            Err(AppError::BadRequest(ref message)) if message == INGREDIENT_REQUIRED
        ));
        assert!(ingredient_pattern(None).is_err());
        assert!(ingredient_pattern(Some("(unclosed")).is_err());
    }
}
