//! HTTP handlers for images.
//! Uploads arrive as `multipart/form-data`; asset downloads are streamed from
//! disk rather than buffered.

use crate::{
    errors::AppError,
    models::{image::Image, ppoi::Ppoi},
    services::catalog_service::{CatalogService, NewImage},
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

/// Request body for `PATCH /images/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateImageReq {
    pub title: Option<String>,
}

/// Request body for `PUT /images/{id}/ppoi`.
#[derive(Debug, Deserialize)]
pub struct SetPpoiReq {
    pub ppoi: String,
}

/// Fields collected from an upload form.
#[derive(Debug, Default)]
struct ImageForm {
    filename: Option<String>,
    data: Bytes,
    title: Option<String>,
    ppoi: Option<Ppoi>,
}

/// Read the `image`, `title` and `ppoi` parts of a multipart body.
///
/// Unknown parts are skipped. A missing `image` part leaves `data` empty,
/// which the catalog rejects as a validation error.
async fn read_image_form(mut multipart: Multipart) -> Result<ImageForm, AppError> {
    let mut form = ImageForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("image") => {
                form.filename = field.file_name().map(str::to_string);
                form.data = field.bytes().await?;
            }
            Some("title") => {
                let text = field.text().await?;
                form.title = (!text.is_empty()).then_some(text);
            }
            Some("ppoi") => {
                let text = field.text().await?;
                form.ppoi = Some(parse_ppoi(&text)?);
            }
            _ => {}
        }
    }
    Ok(form)
}

fn parse_ppoi(raw: &str) -> Result<Ppoi, AppError> {
    raw.parse::<Ppoi>()
        .map_err(|err| AppError::bad_request(format!("invalid ppoi: {}", err)))
}

/// `POST /images`: upload a new image.
pub async fn upload_image(
    State(service): State<CatalogService>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_image_form(multipart).await?;
    let image = service
        .create_image(NewImage {
            filename: form.filename.unwrap_or_else(|| "upload".into()),
            data: form.data,
            title: form.title,
            ppoi: form.ppoi,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(image)))
}

/// `GET /images`: newest first.
pub async fn list_images(
    State(service): State<CatalogService>,
) -> Result<Json<Vec<Image>>, AppError> {
    Ok(Json(service.list_images().await?))
}

/// `GET /images/{id}`
pub async fn get_image(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<Json<Image>, AppError> {
    Ok(Json(service.get_image(id).await?))
}

/// `PATCH /images/{id}`: set or clear the title.
pub async fn update_image(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateImageReq>,
) -> Result<Json<Image>, AppError> {
    let image = service
        .set_image_title(id, payload.title.as_deref())
        .await?;
    Ok(Json(image))
}

/// `PUT /images/{id}/ppoi`
pub async fn set_image_ppoi(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
    Json(payload): Json<SetPpoiReq>,
) -> Result<Json<Image>, AppError> {
    let ppoi = parse_ppoi(&payload.ppoi)?;
    Ok(Json(service.set_image_ppoi(id, ppoi).await?))
}

/// `PUT /images/{id}/asset`: replace the stored picture.
pub async fn replace_image_asset(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Image>, AppError> {
    let form = read_image_form(multipart).await?;
    let filename = form.filename.unwrap_or_else(|| "upload".into());
    let image = service
        .replace_image_asset(id, &filename, &form.data)
        .await?;
    Ok(Json(image))
}

/// `GET /images/{id}/asset`: stream the stored picture.
pub async fn get_image_asset(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let (image, file) = service.open_image_asset(id).await?;
    let len = file
        .metadata()
        .await
        .map_err(|err| AppError::internal(err.to_string()))?
        .len();

    let content_type = ::image::ImageFormat::from_path(&image.image)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream");

    let mut response = Response::new(Body::from_stream(ReaderStream::new(file)));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    *response.status_mut() = StatusCode::OK;
    Ok(response)
}

/// `DELETE /images/{id}`: also removes every placement of the image.
pub async fn delete_image(
    State(service): State<CatalogService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_image(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
