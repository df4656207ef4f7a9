use crate::{
    dto::{CreateJokeRequest, UpdateJokeRequest, Valid},
    errors::AppError,
    hal::{JokeModel, PagedModel},
    models::{PageRequest, SortOrder, DEFAULT_PAGE_SIZE},
    AppState,
};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// `property[,asc|desc]`
    pub sort: Option<String>,
}

impl ListParams {
    fn page_request(&self) -> Result<PageRequest, AppError> {
        let sort = match self.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(expr) => vec![expr.parse::<SortOrder>().map_err(AppError::InvalidInput)?],
            None => Vec::new(),
        };
        Ok(PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        ))
    }
}

/// Handler for GET /api/v1/jokes
pub async fn list_jokes(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PagedModel>, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let request = params.page_request()?;
    tracing::debug!(date_from = ?params.date, page = request.page, size = request.size, "Listing jokes via handler");

    let page = state.service.list(params.date, &request).await?;
    let model = state
        .assembler
        .to_paged_model(&state.service, page, params.date, &request)
        .await?;
    Ok(Json(model))
}

/// Handler for POST /api/v1/jokes
pub async fn create_joke(
    State(state): State<Arc<AppState>>,
    Valid(new_joke): Valid<CreateJokeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let joke = state.service.create(new_joke).await?;
    let model = state.assembler.to_model(&state.service, joke).await?;
    let location = state.assembler.joke_href(model.joke.id);

    tracing::info!(joke_id = %model.joke.id, "Joke created successfully via handler");
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(model)))
}

/// Handler for GET /api/v1/jokes/today
pub async fn get_joke_of_the_day(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JokeModel>, AppError> {
    let joke = state.service.get_for_today().await?;
    Ok(Json(state.assembler.to_model(&state.service, joke).await?))
}

/// Handler for GET /api/v1/jokes/{id}
pub async fn get_joke(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<Json<JokeModel>, AppError> {
    let joke_id = Uuid::parse_str(&id_str)?;
    tracing::debug!(%joke_id, "Fetching joke via handler");
    let joke = state.service.get_by_id(joke_id).await?;
    Ok(Json(state.assembler.to_model(&state.service, joke).await?))
}

/// Handler for PUT /api/v1/jokes/{id}
pub async fn update_joke(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Valid(update): Valid<UpdateJokeRequest>,
) -> Result<Json<JokeModel>, AppError> {
    let joke_id = Uuid::parse_str(&id_str)?;
    let joke = state
        .service
        .update(joke_id, update.into_record(joke_id))
        .await?;

    tracing::info!(%joke_id, "Joke updated successfully via handler");
    Ok(Json(state.assembler.to_model(&state.service, joke).await?))
}

/// Handler for DELETE /api/v1/jokes/{id}
pub async fn delete_joke(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<StatusCode, AppError> {
    let joke_id = Uuid::parse_str(&id_str)?;
    tracing::debug!(%joke_id, "Deleting joke via handler");
    state.service.remove(joke_id).await?;

    tracing::info!(%joke_id, "Joke deleted successfully via handler");
    Ok(StatusCode::NO_CONTENT)
}
