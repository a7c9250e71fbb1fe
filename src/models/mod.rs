pub mod catalog;
pub mod recipe;
pub mod shopping_list;
pub mod user;
pub mod validation;

pub use catalog::{NewIngredient, NewTag};
pub use recipe::{
    IngredientAmount, RecipeCollection, RecipeDetails, RecipeDraft, RecipeFilter,
    RecipeIngredientLine, RecipeInput, RecipePatch, RecipeSummary,
};
pub use shopping_list::ShoppingListLine;
pub use user::{
    AuthUser, LoginInput, NewUser, RegistrationInput, SetPasswordInput, Subscription, UserProfile,
    Viewer,
};
pub use validation::FieldErrors;
