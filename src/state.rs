use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{RecipeService, SeaOrmRecipeService, SeaOrmUserService, UserService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub recipe_service: Arc<dyn RecipeService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_store(config, store))
    }

    #[must_use]
    pub fn with_store(config: Config, store: Store) -> Self {
        let recipe_service: Arc<dyn RecipeService> =
            Arc::new(SeaOrmRecipeService::new(store.clone()));
        let user_service: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(
            store.clone(),
            config.security.clone(),
        ));

        Self {
            config: Arc::new(config),
            store,
            recipe_service,
            user_service,
        }
    }
}
