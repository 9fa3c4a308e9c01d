use std::sync::Arc;

use tracing::info;

use super::{
    config::{Config, StoreBackend},
    counter::{CounterStore, MemoryCounterStore},
    database::{RedisCounterStore, RedisRecipeStore, StoreError, init_redis},
    sequence::SequenceAllocator,
    service::RecipeService,
    store::{MemoryRecipeStore, RecipeStore},
};

pub struct State {
    pub config: Config,
    pub recipes: RecipeService,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, StoreError> {
        let counters: Arc<dyn CounterStore>;
        let recipes: Arc<dyn RecipeStore>;

        match config.backend {
            StoreBackend::Redis => {
                let redis_connection = init_redis(&config).await?;

                counters = Arc::new(RedisCounterStore::new(redis_connection.clone()));
                recipes = Arc::new(RedisRecipeStore::new(redis_connection));
            }
            StoreBackend::Memory => {
                info!("Using in-memory store, data will not survive a restart");

                counters = Arc::new(MemoryCounterStore::new());
                recipes = Arc::new(MemoryRecipeStore::new());
            }
        }

        Ok(Self::with_stores(config, counters, recipes))
    }

    pub fn with_stores(
        config: Config,
        counters: Arc<dyn CounterStore>,
        recipes: Arc<dyn RecipeStore>,
    ) -> Arc<Self> {
        let sequences = SequenceAllocator::new(counters);

        Arc::new(Self {
            config,
            recipes: RecipeService::new(recipes, sequences),
        })
    }
}
