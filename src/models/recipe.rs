use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::user::UserProfile;
use super::validation::{self, FieldErrors, REQUIRED};
use crate::constants::limits;
use crate::entities::tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// A validated recipe ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

/// A validated partial update. Scalar fields left as `None` keep their
/// stored value; ingredients and tags always replace the stored sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmountInput {
    pub id: i64,
    pub amount: i64,
}

/// Wire shape of a recipe write, shared by create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i64>,
    pub ingredients: Option<Vec<IngredientAmountInput>>,
    pub tags: Option<Vec<i64>>,
}

impl RecipeInput {
    pub fn validate_create(self) -> Result<RecipeDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = validation::required_text(
            &mut errors,
            "name",
            self.name.as_deref(),
            limits::MAX_NAME_LENGTH,
        );
        let text = validation::required_text(
            &mut errors,
            "text",
            self.text.as_deref(),
            limits::MAX_TEXT_LENGTH,
        );
        let cooking_time = match self.cooking_time {
            Some(value) => validation::positive_int(&mut errors, "cooking_time", value, 1),
            None => {
                errors.add("cooking_time", REQUIRED);
                None
            }
        };
        let ingredients = validate_ingredients(&mut errors, self.ingredients);
        let tags = validate_tags(&mut errors, self.tags);

        match (name, text, cooking_time, ingredients, tags) {
            (Some(name), Some(text), Some(cooking_time), Some(ingredients), Some(tags))
                if errors.is_empty() =>
            {
                Ok(RecipeDraft {
                    name,
                    text,
                    image: normalize_image(self.image),
                    cooking_time,
                    ingredients,
                    tags,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn validate_update(self) -> Result<RecipePatch, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self
            .name
            .as_deref()
            .map(|v| validation::text(&mut errors, "name", v, limits::MAX_NAME_LENGTH));
        let text = self
            .text
            .as_deref()
            .map(|v| validation::text(&mut errors, "text", v, limits::MAX_TEXT_LENGTH));
        let cooking_time = self
            .cooking_time
            .map(|v| validation::positive_int(&mut errors, "cooking_time", v, 1));
        let ingredients = validate_ingredients(&mut errors, self.ingredients);
        let tags = validate_tags(&mut errors, self.tags);

        match (ingredients, tags) {
            (Some(ingredients), Some(tags)) if errors.is_empty() => Ok(RecipePatch {
                name: name.flatten(),
                text: text.flatten(),
                image: normalize_image(self.image),
                cooking_time: cooking_time.flatten(),
                ingredients,
                tags,
            }),
            _ => Err(errors),
        }
    }
}

fn normalize_image(image: Option<String>) -> Option<String> {
    image.filter(|s| !s.trim().is_empty())
}

fn validate_ingredients(
    errors: &mut FieldErrors,
    input: Option<Vec<IngredientAmountInput>>,
) -> Option<Vec<IngredientAmount>> {
    let Some(input) = input else {
        errors.add("ingredients", REQUIRED);
        return None;
    };
    if input.is_empty() {
        errors.add("ingredients", "A recipe needs at least one ingredient.");
        return None;
    }

    let mut local = FieldErrors::new();
    let mut seen = HashSet::new();
    let mut amounts = Vec::with_capacity(input.len());

    for item in input {
        let id = validation::positive_int(&mut local, "ingredients", item.id, 1);
        let amount = validation::positive_int(&mut local, "ingredients", item.amount, 1);
        if let Some(id) = id
            && !seen.insert(id)
        {
            local.add("ingredients", format!("Ingredient {id} is listed more than once."));
        }
        if let (Some(ingredient_id), Some(amount)) = (id, amount) {
            amounts.push(IngredientAmount {
                ingredient_id,
                amount,
            });
        }
    }

    if local.is_empty() {
        Some(amounts)
    } else {
        errors.merge(local);
        None
    }
}

fn validate_tags(errors: &mut FieldErrors, input: Option<Vec<i64>>) -> Option<Vec<i32>> {
    let Some(input) = input else {
        errors.add("tags", REQUIRED);
        return None;
    };
    if input.is_empty() {
        errors.add("tags", "A recipe needs at least one tag.");
        return None;
    }

    let mut local = FieldErrors::new();
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(input.len());

    for raw in input {
        if let Some(id) = validation::positive_int(&mut local, "tags", raw, 1) {
            if seen.insert(id) {
                ids.push(id);
            } else {
                local.add("tags", format!("Tag {id} is listed more than once."));
            }
        }
    }

    if local.is_empty() {
        Some(ids)
    } else {
        errors.merge(local);
        None
    }
}

/// Optional narrowing of the recipe list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Match recipes carrying any of these tag slugs.
    pub tags: Vec<String>,
    pub author: Option<i32>,
    pub favorited_only: bool,
    pub in_cart_only: bool,
}

impl RecipeFilter {
    /// Parses a raw query string. `tags` may repeat.
    pub fn from_query(query: &str) -> Result<Self, FieldErrors> {
        let mut filter = Self::default();
        let mut errors = FieldErrors::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "tags" => {
                    if !value.is_empty() {
                        filter.tags.push(value.into_owned());
                    }
                }
                "author" => match value.parse::<i32>() {
                    Ok(id) if id > 0 => filter.author = Some(id),
                    _ => errors.add("author", "A valid user id is required."),
                },
                "is_favorited" => match parse_flag(&value) {
                    Some(flag) => filter.favorited_only = flag,
                    None => errors.add("is_favorited", "Expected 0, 1, true or false."),
                },
                "is_in_shopping_cart" => match parse_flag(&value) {
                    Some(flag) => filter.in_cart_only = flag,
                    None => errors.add("is_in_shopping_cart", "Expected 0, 1, true or false."),
                },
                _ => {}
            }
        }

        errors.into_result().map(|()| filter)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Per-user recipe list: favorites or shopping cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeCollection {
    Favorites,
    ShoppingCart,
}

impl RecipeCollection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

impl fmt::Display for RecipeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredientLine {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A recipe as seen by one viewer.
#[derive(Debug, Clone)]
pub struct RecipeDetails {
    pub id: i32,
    pub author: UserProfile,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub pub_date: String,
    pub tags: Vec<tags::Model>,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> RecipeInput {
        RecipeInput {
            name: Some("Pancakes".to_string()),
            text: Some("Mix and fry.".to_string()),
            image: None,
            cooking_time: Some(20),
            ingredients: Some(vec![
                IngredientAmountInput { id: 1, amount: 200 },
                IngredientAmountInput { id: 2, amount: 2 },
            ]),
            tags: Some(vec![1]),
        }
    }

    #[test]
    fn test_validate_create_accepts_complete_recipe() {
        let draft = valid_input().validate_create().unwrap();
        assert_eq!(draft.name, "Pancakes");
        assert_eq!(draft.cooking_time, 20);
        assert_eq!(draft.ingredients.len(), 2);
        assert_eq!(draft.tags, vec![1]);
    }

    #[test]
    fn test_validate_create_reports_every_bad_field() {
        let input = RecipeInput {
            name: Some("   ".to_string()),
            cooking_time: Some(0),
            ingredients: Some(vec![]),
            tags: Some(vec![]),
            ..RecipeInput::default()
        };
        let errors = input.validate_create().unwrap_err();
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["cooking_time", "ingredients", "name", "tags", "text"]
        );
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let mut input = valid_input();
        input.ingredients = Some(vec![
            IngredientAmountInput { id: 3, amount: 1 },
            IngredientAmountInput { id: 3, amount: 5 },
        ]);
        let errors = input.validate_create().unwrap_err();
        assert!(errors.get("ingredients").is_some());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let mut input = valid_input();
        input.ingredients = Some(vec![IngredientAmountInput { id: 3, amount: 0 }]);
        assert!(input.validate_create().is_err());
    }

    #[test]
    fn test_validate_update_requires_sets_but_not_scalars() {
        let input = RecipeInput {
            ingredients: Some(vec![IngredientAmountInput { id: 4, amount: 1 }]),
            tags: Some(vec![2, 3]),
            ..RecipeInput::default()
        };
        let patch = input.validate_update().unwrap();
        assert!(patch.name.is_none());
        assert!(patch.cooking_time.is_none());
        assert_eq!(patch.tags, vec![2, 3]);

        let missing_sets = RecipeInput {
            name: Some("Renamed".to_string()),
            ..RecipeInput::default()
        };
        let errors = missing_sets.validate_update().unwrap_err();
        assert!(errors.get("ingredients").is_some());
        assert!(errors.get("tags").is_some());
    }

    #[test]
    fn test_filter_from_query() {
        let filter =
            RecipeFilter::from_query("tags=breakfast&tags=lunch&author=3&is_favorited=1").unwrap();
        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
        assert_eq!(filter.author, Some(3));
        assert!(filter.favorited_only);
        assert!(!filter.in_cart_only);

        assert_eq!(RecipeFilter::from_query("").unwrap(), RecipeFilter::default());
        assert!(RecipeFilter::from_query("is_in_shopping_cart=maybe").is_err());
        assert!(RecipeFilter::from_query("author=abc").is_err());
    }
}
