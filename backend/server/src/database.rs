//! # Redis
//!
//! Durable store for recipe documents and sequence counters.
//!
//! ## Counters
//! - One string key per counter: `counter:<name>`
//! - `INCR` is atomic, creates missing keys at 0 and returns the new value,
//!   so a first allocation yields 1
//! - Redis runs commands one at a time, no application lock is taken
//!
//! ## Recipes
//! - `recipes`: hash of storage id -> JSON document
//! - `recipes:seq`: hash of seq -> storage id, the unique sequence index
//! - Inserts claim the index slot and write the document in one Lua script,
//!   a taken slot rejects the insert
//! - Replaces only write while the index still maps the seq to the same id,
//!   so an update racing a delete cannot bring the document back
//! - Deletes drop both entries in one `MULTI`
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, RedisError, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    config::Config,
    counter::{Counter, CounterStore},
    recipe::{Recipe, RecipeDraft},
    store::{RecipeStore, new_id},
};

pub const COUNTER_PREFIX: &str = "counter:";
pub const RECIPES_KEY: &str = "recipes";
pub const SEQ_INDEX_KEY: &str = "recipes:seq";

const INSERT_SCRIPT: &str = r"
if redis.call('HSETNX', KEYS[2], ARGV[1], ARGV[2]) == 0 then
    return 0
end
redis.call('HSET', KEYS[1], ARGV[2], ARGV[3])
return 1
";

const REPLACE_SCRIPT: &str = r"
if redis.call('HGET', KEYS[2], ARGV[1]) ~= ARGV[2] then
    return 0
end
redis.call('HSET', KEYS[1], ARGV[2], ARGV[3])
return 1
";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] RedisError),

    #[error("Corrupt recipe document: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Sequence {0} is already taken")]
    DuplicateSequence(i64),

    #[error("Counter {0:?} overflowed")]
    CounterOverflow(String),
}

pub async fn init_redis(config: &Config) -> Result<ConnectionManager, StoreError> {
    let manager_config = ConnectionManagerConfig::new()
        .set_number_of_retries(config.redis_retries)
        .set_connection_timeout(config.redis_timeout);

    let client = Client::open(config.redis_url.as_str())?;
    let connection_manager = client
        .get_connection_manager_with_config(manager_config)
        .await?;

    info!("Connected to Redis");

    Ok(connection_manager)
}

pub fn counter_key(name: &str) -> String {
    format!("{COUNTER_PREFIX}{name}")
}

#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment_and_get(&self, name: &str) -> Result<Option<Counter>, StoreError> {
        let mut connection = self.connection.clone();

        let value: Option<i64> = connection.incr(counter_key(name), 1).await?;

        Ok(value.map(|value| Counter {
            name: name.to_string(),
            value,
        }))
    }
}

#[derive(Clone)]
pub struct RedisRecipeStore {
    connection: ConnectionManager,
}

impl RedisRecipeStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl RecipeStore for RedisRecipeStore {
    async fn insert(&self, draft: RecipeDraft) -> Result<Recipe, StoreError> {
        let mut connection = self.connection.clone();
        let recipe = draft.into_recipe(new_id());
        let document = serde_json::to_string(&recipe)?;

        let claimed: i64 = Script::new(INSERT_SCRIPT)
            .key(RECIPES_KEY)
            .key(SEQ_INDEX_KEY)
            .arg(recipe.seq)
            .arg(&recipe.id)
            .arg(document)
            .invoke_async(&mut connection)
            .await?;

        if claimed == 0 {
            return Err(StoreError::DuplicateSequence(recipe.seq));
        }

        Ok(recipe)
    }

    async fn find_by_seq(&self, seq: i64) -> Result<Option<Recipe>, StoreError> {
        let mut connection = self.connection.clone();

        let Some(id): Option<String> = connection.hget(SEQ_INDEX_KEY, seq).await? else {
            return Ok(None);
        };

        let document: Option<String> = connection.hget(RECIPES_KEY, &id).await?;
        if document.is_none() {
            debug!("Sequence index points at missing recipe {id}");
        }

        document
            .map(|document| serde_json::from_str(&document))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut connection = self.connection.clone();

        let documents: Vec<String> = connection.hvals(RECIPES_KEY).await?;
        let mut recipes = documents
            .iter()
            .map(|document| serde_json::from_str::<Recipe>(document))
            .collect::<Result<Vec<_>, _>>()?;
        recipes.sort_by_key(|recipe| recipe.seq);

        Ok(recipes)
    }

    async fn replace(&self, recipe: &Recipe) -> Result<bool, StoreError> {
        let mut connection = self.connection.clone();
        let document = serde_json::to_string(recipe)?;

        let replaced: i64 = Script::new(REPLACE_SCRIPT)
            .key(RECIPES_KEY)
            .key(SEQ_INDEX_KEY)
            .arg(recipe.seq)
            .arg(&recipe.id)
            .arg(document)
            .invoke_async(&mut connection)
            .await?;

        Ok(replaced == 1)
    }

    async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: () = redis::pipe()
            .atomic()
            .hdel(RECIPES_KEY, &recipe.id)
            .ignore()
            .hdel(SEQ_INDEX_KEY, recipe.seq)
            .ignore()
            .query_async(&mut connection)
            .await?;

        Ok(())
    }
}
