//! HTTP handlers for carousels.

use crate::{errors::AppError, models::carousel::Carousel, services::catalog_service::CatalogService};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

/// Request body for `POST /carousels`.
#[derive(Debug, Deserialize)]
pub struct CreateCarouselReq {
    pub identifier: String,
}

/// Query params for `GET /carousels`.
#[derive(Debug, Deserialize)]
pub struct ListCarouselsQuery {
    pub identifier: Option<String>,
}

/// `POST /carousels`
pub async fn create_carousel(
    State(service): State<CatalogService>,
    Json(payload): Json<CreateCarouselReq>,
) -> Result<impl IntoResponse, AppError> {
    let carousel = service.create_carousel(&payload.identifier).await?;
    Ok((StatusCode::CREATED, Json(carousel)))
}

/// `GET /carousels`: newest first, `?identifier=` narrows to one key.
pub async fn list_carousels(
    State(service): State<CatalogService>,
    Query(q): Query<ListCarouselsQuery>,
) -> Result<Json<Vec<Carousel>>, AppError> {
    let carousels = service.list_carousels(q.identifier.as_deref()).await?;
    Ok(Json(carousels))
}

/// `GET /carousels/{id}`
pub async fn get_carousel(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<Json<Carousel>, AppError> {
    Ok(Json(service.get_carousel(id).await?))
}

/// `DELETE /carousels/{id}`: also removes every placement in the carousel.
pub async fn delete_carousel(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_carousel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
