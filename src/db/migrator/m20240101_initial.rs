use crate::entities::{follows, ingredients, prelude::*, recipes};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AuthTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tags)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Ingredients)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Recipes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RecipeIngredients)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(RecipeTags)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Favorites)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(ShoppingCart)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Follows)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingredients_name_unit")
                    .table(Ingredients)
                    .col(ingredients::Column::Name)
                    .col(ingredients::Column::MeasurementUnit)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ingredients_name_lower")
                    .table(Ingredients)
                    .col(ingredients::Column::NameLower)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_follows_user_author")
                    .table(Follows)
                    .col(follows::Column::UserId)
                    .col(follows::Column::AuthorId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_author")
                    .table(Recipes)
                    .col(recipes::Column::AuthorId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recipes_pub_date")
                    .table(Recipes)
                    .col(recipes::Column::PubDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Follows).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShoppingCart).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Favorites).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeTags).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RecipeIngredients).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Recipes).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ingredients).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tags).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).if_exists().to_owned())
            .await?;

        Ok(())
    }
}
