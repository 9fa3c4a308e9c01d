use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State as AxumState,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    error::AppError,
    recipe::{AuthorType, Recipe, RecipeInput},
    state::State,
};

type AppState = AxumState<Arc<State>>;

pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/api/v1/recipes", post(create_handler).get(all_handler))
        .route("/api/v1/recipes/viewer", post(create_viewer_handler))
        .route("/api/v1/recipes/participant", post(create_participant_handler))
        .route("/api/v1/recipes/chef", post(create_chef_handler))
        .route(
            "/api/v1/recipes/{seq}",
            get(by_seq_handler).put(update_handler).delete(delete_handler),
        )
        .route("/api/v1/recipes/type/{type}", get(by_type_handler))
        .route("/api/v1/recipes/season/{season}", get(by_season_handler))
        .route("/api/v1/recipes/search/by-ingredient", get(search_handler))
        .with_state(state)
}

#[derive(Deserialize)]
pub struct IngredientQuery {
    ingredient: Option<String>,
}

async fn create(
    state: Arc<State>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
    forced: Option<AuthorType>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    let Json(mut input) = payload?;
    if forced.is_some() {
        input.author_type = forced;
    }

    let recipe = state.recipes.create(input).await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

pub async fn create_handler(
    AxumState(state): AppState,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    create(state, payload, None).await
}

pub async fn create_viewer_handler(
    AxumState(state): AppState,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    create(state, payload, Some(AuthorType::Viewer)).await
}

pub async fn create_participant_handler(
    AxumState(state): AppState,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    create(state, payload, Some(AuthorType::Participant)).await
}

pub async fn create_chef_handler(
    AxumState(state): AppState,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    create(state, payload, Some(AuthorType::Chef)).await
}

pub async fn all_handler(AxumState(state): AppState) -> Result<Json<Vec<Recipe>>, AppError> {
    Ok(Json(state.recipes.find_all().await?))
}

pub async fn by_seq_handler(
    AxumState(state): AppState,
    seq: Result<Path<i64>, PathRejection>,
) -> Result<Json<Recipe>, AppError> {
    let Path(seq) = seq?;

    Ok(Json(state.recipes.find_by_seq(seq).await?))
}

pub async fn by_type_handler(
    AxumState(state): AppState,
    author_type: Result<Path<AuthorType>, PathRejection>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let Path(author_type) = author_type?;

    Ok(Json(state.recipes.by_type(author_type).await?))
}

pub async fn by_season_handler(
    AxumState(state): AppState,
    season: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let Path(season) = season?;

    Ok(Json(state.recipes.by_season(season).await?))
}

pub async fn search_handler(
    AxumState(state): AppState,
    query: Result<Query<IngredientQuery>, QueryRejection>,
) -> Result<Json<Vec<Recipe>>, AppError> {
    let Query(query) = query?;

    Ok(Json(
        state
            .recipes
            .search_by_ingredient(query.ingredient.as_deref())
            .await?,
    ))
}

pub async fn update_handler(
    AxumState(state): AppState,
    seq: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipeInput>, JsonRejection>,
) -> Result<Json<Recipe>, AppError> {
    let Path(seq) = seq?;
    let Json(input) = payload?;

    Ok(Json(state.recipes.update(seq, input).await?))
}

pub async fn delete_handler(
    AxumState(state): AppState,
    seq: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(seq) = seq?;
    state.recipes.delete(seq).await?;

    Ok(StatusCode::NO_CONTENT)
}
