use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use regex::Regex;
use uuid::Uuid;

use crate::{
    database::StoreError,
    recipe::{AuthorType, Recipe, RecipeDraft},
};

/// Document storage for recipes. `seq` is a unique index.
#[async_trait]
pub trait RecipeStore: Send + Sync + 'static {
    /// Persists a new recipe under a fresh storage id. Fails with
    /// [`StoreError::DuplicateSequence`] if `seq` is already taken.
    async fn insert(&self, draft: RecipeDraft) -> Result<Recipe, StoreError>;

    async fn find_by_seq(&self, seq: i64) -> Result<Option<Recipe>, StoreError>;

    /// All recipes, ordered by `seq` ascending.
    async fn list_all(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Overwrites the stored recipe with the same `seq` and `id`. Returns
    /// `false` without writing anything if that recipe no longer exists.
    async fn replace(&self, recipe: &Recipe) -> Result<bool, StoreError>;

    async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError>;

    async fn list_by_author_type(
        &self,
        author_type: AuthorType,
    ) -> Result<Vec<Recipe>, StoreError> {
        Ok(filter(self.list_all().await?, |recipe| {
            recipe.fields.author_type == author_type
        }))
    }

    async fn list_by_author_type_and_season(
        &self,
        author_type: AuthorType,
        season: i32,
    ) -> Result<Vec<Recipe>, StoreError> {
        Ok(filter(self.list_all().await?, |recipe| {
            recipe.fields.author_type == author_type && recipe.fields.season == Some(season)
        }))
    }

    /// Recipes with at least one ingredient matching `pattern`.
    async fn search_by_ingredient(&self, pattern: &Regex) -> Result<Vec<Recipe>, StoreError> {
        Ok(filter(self.list_all().await?, |recipe| {
            recipe
                .fields
                .ingredients
                .iter()
                .any(|ingredient| pattern.is_match(ingredient))
        }))
    }
}

fn filter<F>(recipes: Vec<Recipe>, keep: F) -> Vec<Recipe>
where
    F: Fn(&Recipe) -> bool,
{
    recipes.into_iter().filter(|recipe| keep(recipe)).collect()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Default)]
pub struct MemoryRecipeStore {
    recipes: DashMap<i64, Recipe>,
}

impl MemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeStore for MemoryRecipeStore {
    async fn insert(&self, draft: RecipeDraft) -> Result<Recipe, StoreError> {
        match self.recipes.entry(draft.seq) {
            Entry::Occupied(_) => Err(StoreError::DuplicateSequence(draft.seq)),
            Entry::Vacant(entry) => {
                let recipe = draft.into_recipe(new_id());
                entry.insert(recipe.clone());

                Ok(recipe)
            }
        }
    }

    async fn find_by_seq(&self, seq: i64) -> Result<Option<Recipe>, StoreError> {
        Ok(self.recipes.get(&seq).map(|recipe| recipe.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut recipes: Vec<Recipe> = self
            .recipes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        recipes.sort_by_key(|recipe| recipe.seq);

        Ok(recipes)
    }

    async fn replace(&self, recipe: &Recipe) -> Result<bool, StoreError> {
        match self.recipes.get_mut(&recipe.seq) {
            Some(mut existing) if existing.id == recipe.id => {
                *existing = recipe.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError> {
        self.recipes.remove(&recipe.seq);

        Ok(())
    }
}
