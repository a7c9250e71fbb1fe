use serde::{Deserialize, Serialize};

use crate::entities::{ingredients, tags};
use crate::models::{
    FieldErrors, RecipeDetails, RecipeIngredientLine, RecipeSummary, Subscription, UserProfile,
};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Per-field validation messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fields: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: None,
        }
    }

    pub fn field_errors(message: impl Into<String>, fields: FieldErrors) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            fields: Some(fields),
        }
    }
}

pub type TagDto = tags::Model;

pub type IngredientDto = ingredients::Model;

pub type UserDto = UserProfile;

/// Registration response; the viewer-relative flag is omitted.
#[derive(Debug, Serialize)]
pub struct CreatedUserDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserProfile> for CreatedUserDto {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub tags: Vec<TagDto>,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientLine>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: String,
}

impl From<RecipeDetails> for RecipeDto {
    fn from(recipe: RecipeDetails) -> Self {
        Self {
            id: recipe.id,
            tags: recipe.tags,
            author: recipe.author,
            ingredients: recipe.ingredients,
            is_favorited: recipe.is_favorited,
            is_in_shopping_cart: recipe.is_in_shopping_cart,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            pub_date: recipe.pub_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeShortDto {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<RecipeSummary> for RecipeShortDto {
    fn from(recipe: RecipeSummary) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscriptionDto {
    #[serde(flatten)]
    pub author: UserDto,
    pub recipes: Vec<RecipeShortDto>,
    pub recipes_count: u64,
}

impl From<Subscription> for SubscriptionDto {
    fn from(sub: Subscription) -> Self {
        Self {
            author: sub.author,
            recipes: sub.recipes.into_iter().map(RecipeShortDto::from).collect(),
            recipes_count: sub.recipes_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenDto {
    pub auth_token: String,
}

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<String>,
}
