pub mod collection;
pub mod follow;
pub mod ingredient;
pub mod recipe;
pub mod shopping_list;
pub mod tag;
pub mod user;
