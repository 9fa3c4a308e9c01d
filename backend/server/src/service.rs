use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::{
    error::AppError,
    recipe::{AuthorType, Recipe, RecipeDraft, RecipeInput},
    sequence::{RECIPE_SEQUENCE, SequenceAllocator},
    store::RecipeStore,
    utils::{ingredient_pattern, validate_input},
};

#[derive(Clone)]
pub struct RecipeService {
    store: Arc<dyn RecipeStore>,
    sequences: SequenceAllocator,
}

impl RecipeService {
    pub fn new(store: Arc<dyn RecipeStore>, sequences: SequenceAllocator) -> Self {
        Self { store, sequences }
    }

    /// Validates, stamps the next recipe sequence number and persists.
    /// Nothing is written if allocation fails.
    pub async fn create(&self, input: RecipeInput) -> Result<Recipe, AppError> {
        let fields = validate_input(input)?;
        let seq = self.sequences.next(RECIPE_SEQUENCE).await?;

        let recipe = self
            .store
            .insert(RecipeDraft::new(seq, fields, Utc::now()))
            .await?;

        info!("Created recipe {} ({})", recipe.seq, recipe.id);

        Ok(recipe)
    }

    pub async fn find_all(&self) -> Result<Vec<Recipe>, AppError> {
        Ok(self.store.list_all().await?)
    }

    pub async fn find_by_seq(&self, seq: i64) -> Result<Recipe, AppError> {
        self.store.find_by_seq(seq).await?.ok_or(AppError::NotFound)
    }

    pub async fn by_type(&self, author_type: AuthorType) -> Result<Vec<Recipe>, AppError> {
        Ok(self.store.list_by_author_type(author_type).await?)
    }

    /// Participant recipes entered in `season`.
    pub async fn by_season(&self, season: i32) -> Result<Vec<Recipe>, AppError> {
        Ok(self
            .store
            .list_by_author_type_and_season(AuthorType::Participant, season)
            .await?)
    }

    pub async fn search_by_ingredient(
        &self,
        ingredient: Option<&str>,
    ) -> Result<Vec<Recipe>, AppError> {
        let pattern = ingredient_pattern(ingredient)?;

        Ok(self.store.search_by_ingredient(&pattern).await?)
    }

    pub async fn update(&self, seq: i64, input: RecipeInput) -> Result<Recipe, AppError> {
        let fields = validate_input(input)?;
        let mut recipe = self.find_by_seq(seq).await?;

        recipe.fields = fields;
        recipe.updated_at = Utc::now();

        // A delete may have landed since the load.
        if !self.store.replace(&recipe).await? {
            return Err(AppError::NotFound);
        }

        info!("Updated recipe {}", recipe.seq);

        Ok(recipe)
    }

    pub async fn delete(&self, seq: i64) -> Result<(), AppError> {
        let recipe = self.find_by_seq(seq).await?;
        self.store.delete(&recipe).await?;

        info!("Deleted recipe {}", recipe.seq);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        counter::{Counter, CounterStore, MemoryCounterStore},
        database::StoreError,
        sequence::SequenceError,
        store::MemoryRecipeStore,
    };

    struct EmptyCounters;

    #[async_trait]
    impl CounterStore for EmptyCounters {
        async fn increment_and_get(&self, _name: &str) -> Result<Option<Counter>, StoreError> {
            Ok(None)
        }
    }

    /// Deletes the recipe just before every replace, as a concurrent delete
    /// request would between `update` loading and writing.
    #[derive(Default)]
    struct DeletingStore {
        inner: MemoryRecipeStore,
    }

    #[async_trait]
    impl RecipeStore for DeletingStore {
        async fn insert(&self, draft: RecipeDraft) -> Result<Recipe, StoreError> {
            self.inner.insert(draft).await
        }

        async fn find_by_seq(&self, seq: i64) -> Result<Option<Recipe>, StoreError> {
            self.inner.find_by_seq(seq).await
        }

        async fn list_all(&self) -> Result<Vec<Recipe>, StoreError> {
            self.inner.list_all().await
        }

        async fn replace(&self, recipe: &Recipe) -> Result<bool, StoreError> {
            self.inner.delete(recipe).await?;
            self.inner.replace(recipe).await
        }

        async fn delete(&self, recipe: &Recipe) -> Result<(), StoreError> {
            self.inner.delete(recipe).await
        }
    }

    fn service_with(counters: Arc<dyn CounterStore>) -> (RecipeService, Arc<MemoryRecipeStore>) {
        let store = Arc::new(MemoryRecipeStore::new());
        let service = RecipeService::new(store.clone(), SequenceAllocator::new(counters));

        (service, store)
    }

    fn service() -> (RecipeService, SequenceAllocator) {
        let sequences = SequenceAllocator::new(Arc::new(MemoryCounterStore::new()));
        let service = RecipeService::new(Arc::new(MemoryRecipeStore::new()), sequences.clone());

        (service, sequences)
    }

    fn input(author_type: AuthorType, season: Option<i32>, ingredients: &[&str]) -> RecipeInput {
        RecipeInput {
            title: Some("Tart".to_string()),
            ingredients: Some(ingredients.iter().map(|s| s.to_string()).collect()),
            steps: Some(vec!["Bake".to_string()]),
            chef_name: Some("Ana".to_string()),
            author_type: Some(author_type),
            season,
        }
    }

    fn chef() -> RecipeInput {
        input(AuthorType::Chef, None, &["Egg"])
    }

    fn seqs(recipes: Vec<Recipe>) -> Vec<i64> {
        recipes.iter().map(|recipe| recipe.seq).collect()
    }

    #[tokio::test]
    async fn test_create_stamps_sequence() {
        let (service, _) = service();

        let first = service.create(chef()).await.unwrap();
        let second = service.create(chef()).await.unwrap();

        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);
        assert_ne!(first.id, second.id);
        assert_eq!(first.created_at, first.updated_at);
    }

    #[tokio::test]
    async fn test_rejected_input_consumes_no_sequence() {
        let (service, sequences) = service();

        let err = service
            .create(input(AuthorType::Participant, None, &["Egg"]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service.create(RecipeInput::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert_eq!(sequences.next(RECIPE_SEQUENCE).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_counter_result_aborts_create() {
        let (service, store) = service_with(Arc::new(EmptyCounters));

        let err = service.create(chef()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Sequence(SequenceError::UnexpectedEmptyResult { .. })
        ));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let (service, _) = service();
        let created = service
            .create(input(AuthorType::Viewer, None, &["Egg"]))
            .await
            .unwrap();

        let updated = service
            .update(
                created.seq,
                input(AuthorType::Participant, Some(5), &["Duck Egg"]),
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.seq, created.seq);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.fields.season, Some(5));
        assert_eq!(service.find_by_seq(created.seq).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_missing_recipe() {
        let (service, _) = service();

        assert!(matches!(
            service.find_by_seq(9).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.update(9, chef()).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(service.delete(9).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_does_not_free_sequence() {
        let (service, _) = service();
        let created = service.create(chef()).await.unwrap();

        service.delete(created.seq).await.unwrap();
        let next = service.create(chef()).await.unwrap();

        assert_eq!(next.seq, 2);
        assert_eq!(seqs(service.find_all().await.unwrap()), vec![2]);
    }

    #[tokio::test]
    async fn test_filters() {
        let (service, _) = service();
        let inputs = [
            input(AuthorType::Participant, Some(1), &["Sugar"]),
            input(AuthorType::Viewer, Some(1), &["Salt"]),
            input(AuthorType::Participant, Some(2), &["Brown sugar"]),
        ];
        for input in inputs {
            service.create(input).await.unwrap();
        }

        let participants = service.by_type(AuthorType::Participant).await.unwrap();
        assert_eq!(seqs(participants), vec![1, 3]);

        assert_eq!(seqs(service.by_season(1).await.unwrap()), vec![1]);

        let sugar = service.search_by_ingredient(Some("SUGAR")).await.unwrap();
        assert_eq!(seqs(sugar), vec![1, 3]);

        assert!(matches!(
            service.search_by_ingredient(Some("")).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_update_racing_delete_is_not_found() {
        let store = Arc::new(DeletingStore::default());
        let sequences = SequenceAllocator::new(Arc::new(MemoryCounterStore::new()));
        let service = RecipeService::new(store, sequences);
        let created = service.create(chef()).await.unwrap();

        let err = service.update(created.seq, chef()).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound));
        assert!(matches!(
            service.find_by_seq(created.seq).await,
            Err(AppError::NotFound)
        ));
        assert!(service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_replace_after_delete_stays_deleted() {
        let (service, store) = service_with(Arc::new(MemoryCounterStore::new()));
        let created = service.create(chef()).await.unwrap();

        service.delete(created.seq).await.unwrap();

        assert!(!store.replace(&created).await.unwrap());
        assert!(matches!(
            service.find_by_seq(created.seq).await,
            Err(AppError::NotFound)
        ));
    }
}
