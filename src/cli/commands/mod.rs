mod ingredient;
mod tag;

pub use ingredient::cmd_ingredient_add;
pub use tag::{cmd_tag_add, cmd_tag_list};
