//! Ingredient command handlers

use crate::config::Config;
use crate::db::Store;
use crate::models::NewIngredient;

pub async fn cmd_ingredient_add(config: &Config, name: &str, unit: &str) -> anyhow::Result<()> {
    let ingredient = match NewIngredient::parse(name, unit) {
        Ok(ingredient) => ingredient,
        Err(errors) => {
            println!("Invalid ingredient: {errors}");
            return Ok(());
        }
    };

    let store = Store::new(&config.general.database_path).await?;

    match store
        .create_ingredient(&ingredient.name, &ingredient.measurement_unit)
        .await?
    {
        Some(created) => println!(
            "✓ Added ingredient #{}: {} ({})",
            created.id, created.name, created.measurement_unit
        ),
        None => println!(
            "Ingredient '{}' ({}) already exists.",
            ingredient.name, ingredient.measurement_unit
        ),
    }

    Ok(())
}
