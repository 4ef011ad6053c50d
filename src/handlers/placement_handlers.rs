//! HTTP handlers for placements and the ordered carousel listing used by
//! page renderers.

use crate::{
    errors::AppError,
    models::{image::Image, placement::Placement},
    services::catalog_service::CatalogService,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

/// Request body for `POST /placements`.
#[derive(Debug, Deserialize)]
pub struct CreatePlacementReq {
    pub carousel_id: i64,
    pub image_id: i64,
}

/// Query params for `GET /placements`.
#[derive(Debug, Deserialize)]
pub struct ListPlacementsQuery {
    /// Carousel identifier to list.
    pub carousel: String,
}

/// One entry of a carousel listing.
#[derive(Debug, Serialize)]
pub struct PlacementView {
    pub placement: Placement,
    pub image: Image,
    pub asset_url: String,
}

impl From<(Image, Placement)> for PlacementView {
    fn from((image, placement): (Image, Placement)) -> Self {
        Self {
            asset_url: format!("/images/{}/asset", image.id),
            placement,
            image,
        }
    }
}

/// `GET /placements?carousel={identifier}`: images in display order.
pub async fn list_placements(
    State(service): State<CatalogService>,
    Query(q): Query<ListPlacementsQuery>,
) -> Result<Json<Vec<PlacementView>>, AppError> {
    let pairs = service.list_placements(&q.carousel).await?;
    Ok(Json(pairs.into_iter().map(PlacementView::from).collect()))
}

/// `POST /placements`
pub async fn create_placement(
    State(service): State<CatalogService>,
    Json(payload): Json<CreatePlacementReq>,
) -> Result<impl IntoResponse, AppError> {
    let placement = service
        .place(payload.carousel_id, payload.image_id)
        .await?;
    Ok((StatusCode::CREATED, Json(placement)))
}

/// `GET /placements/{id}`
pub async fn get_placement(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<Json<Placement>, AppError> {
    Ok(Json(service.get_placement(id).await?))
}

/// `DELETE /placements/{id}`
pub async fn delete_placement(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_placement(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
