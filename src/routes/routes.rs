//! Defines routes for the carousel catalog API.
//!
//! ## Structure
//! - **Carousels**
//!   - `GET    /carousels`       : list (optional `?identifier=`)
//!   - `POST   /carousels`       : create
//!   - `GET    /carousels/{id}`  : fetch one
//!   - `DELETE /carousels/{id}`  : delete with its placements
//!
//! - **Images**
//!   - `GET    /images`          : list
//!   - `POST   /images`          : multipart upload
//!   - `GET    /images/{id}`     : fetch metadata
//!   - `PATCH  /images/{id}`     : set title
//!   - `DELETE /images/{id}`     : delete with its placements
//!   - `PUT    /images/{id}/ppoi`: move the focal point
//!   - `GET    /images/{id}/asset`: stream the picture
//!   - `PUT    /images/{id}/asset`: re-upload the picture
//!
//! - **Placements**
//!   - `GET    /placements?carousel={identifier}`: ordered carousel contents
//!   - `POST   /placements`      : place an image in a carousel
//!   - `GET    /placements/{id}` : fetch one
//!   - `DELETE /placements/{id}` : remove one

use crate::{
    handlers::{
        carousel_handlers::{create_carousel, delete_carousel, get_carousel, list_carousels},
        health_handlers::{healthz, readyz},
        image_handlers::{
            delete_image, get_image, get_image_asset, list_images, replace_image_asset,
            set_image_ppoi, update_image, upload_image,
        },
        placement_handlers::{create_placement, delete_placement, get_placement, list_placements},
    },
    services::catalog_service::CatalogService,
};
use axum::{
    Router,
    routing::{get, put},
};

/// Build the router for every catalog route.
///
/// The router carries `CatalogService` as shared state to all handlers.
pub fn routes() -> Router<CatalogService> {
    Router::new()
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // carousels
        .route("/carousels", get(list_carousels).post(create_carousel))
        .route("/carousels/{id}", get(get_carousel).delete(delete_carousel))
        // images
        .route("/images", get(list_images).post(upload_image))
        .route(
            "/images/{id}",
            get(get_image).patch(update_image).delete(delete_image),
        )
        .route("/images/{id}/ppoi", put(set_image_ppoi))
        .route(
            "/images/{id}/asset",
            get(get_image_asset).put(replace_image_asset),
        )
        // placements
        .route("/placements", get(list_placements).post(create_placement))
        .route(
            "/placements/{id}",
            get(get_placement).delete(delete_placement),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        catalog_service::tests::test_service, image_processor::tests::png_bytes,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const BOUNDARY: &str = "carousel-test-boundary";

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_request(
        method: &str,
        uri: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (service, _dir) = test_service().await;
        let app = routes().with_state(service);

        let resp = send(&app, empty_request("GET", "/healthz")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), b"ok");

        let resp = send(&app, empty_request("GET", "/readyz")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["ready"], true);
        assert_eq!(body["schema"]["ok"], true);
        assert_eq!(body["uploads"]["ok"], true);
    }

    #[tokio::test]
    async fn test_readyz_reports_missing_schema() {
        let (service, dir) = test_service().await;
        sqlx::query("DROP TABLE placements")
            .execute(&*service.db)
            .await
            .unwrap();
        let app = routes().with_state(service);

        let resp = send(&app, empty_request("GET", "/readyz")).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(resp).await;
        assert_eq!(body["ready"], false);
        assert_eq!(body["schema"]["ok"], false);
        assert!(
            body["schema"]["detail"]
                .as_str()
                .unwrap()
                .contains("placements")
        );
        // the scratch asset is cleaned up
        assert_eq!(body["uploads"]["ok"], true);
        let leftover = std::fs::read_dir(dir.path().join("carousel_image"))
            .unwrap()
            .count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_upload_place_and_list() {
        let (service, _dir) = test_service().await;
        let app = routes().with_state(service);

        let resp = send(
            &app,
            json_request("POST", "/carousels", json!({"identifier": "homepage-banner"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let carousel = body_json(resp).await;

        let png = png_bytes(20, 10);
        let resp = send(
            &app,
            multipart_request(
                "POST",
                "/images",
                &[("title", "Launch"), ("ppoi", "0.25x0.75")],
                Some(("launch.png", &png)),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let image = body_json(resp).await;
        assert_eq!(image["width"], 20);
        assert_eq!(image["height"], 10);
        assert_eq!(image["title"], "Launch");
        assert_eq!(image["ppoi"], "0.25x0.75");

        let resp = send(
            &app,
            json_request(
                "POST",
                "/placements",
                json!({"carousel_id": carousel["id"], "image_id": image["id"]}),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let placement = body_json(resp).await;

        let resp = send(
            &app,
            empty_request("GET", "/placements?carousel=homepage-banner"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let listed = body_json(resp).await;
        let entries = listed.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["placement"]["id"], placement["id"]);
        assert_eq!(entries[0]["image"]["id"], image["id"]);
        let asset_url = entries[0]["asset_url"].as_str().unwrap().to_string();

        let resp = send(&app, empty_request("GET", &asset_url)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.as_ref(), png.as_slice());
    }

    #[tokio::test]
    async fn test_upload_without_file_is_rejected() {
        let (service, _dir) = test_service().await;
        let app = routes().with_state(service);

        let resp = send(
            &app,
            multipart_request("POST", "/images", &[("title", "No file")], None),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["status"], 400);

        let resp = send(
            &app,
            multipart_request(
                "POST",
                "/images",
                &[("ppoi", "3x3")],
                Some(("a.png", &png_bytes(2, 2))),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_errors_map_to_status_codes() {
        let (service, _dir) = test_service().await;
        let app = routes().with_state(service);

        let resp = send(
            &app,
            json_request(
                "POST",
                "/carousels",
                json!({"identifier": "x".repeat(257)}),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            json_request("POST", "/carousels", json!({"identifier": "hero"})),
        )
        .await;
        let carousel = body_json(resp).await;

        let resp = send(
            &app,
            json_request(
                "POST",
                "/placements",
                json!({"carousel_id": carousel["id"], "image_id": 999}),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "image `999` not found");

        let resp = send(&app, empty_request("GET", "/images/999/asset")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_carousel_endpoint() {
        let (service, _dir) = test_service().await;
        let app = routes().with_state(service);

        let resp = send(
            &app,
            json_request("POST", "/carousels", json!({"identifier": "hero"})),
        )
        .await;
        let id = body_json(resp).await["id"].as_i64().unwrap();

        let resp = send(&app, empty_request("DELETE", &format!("/carousels/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&app, empty_request("GET", &format!("/carousels/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edit_image_endpoints() {
        let (service, _dir) = test_service().await;
        let app = routes().with_state(service);

        let resp = send(
            &app,
            multipart_request("POST", "/images", &[], Some(("a.png", &png_bytes(2, 2)))),
        )
        .await;
        let id = body_json(resp).await["id"].as_i64().unwrap();

        let resp = send(
            &app,
            json_request("PATCH", &format!("/images/{id}"), json!({"title": "Renamed"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["title"], "Renamed");

        let resp = send(
            &app,
            json_request("PUT", &format!("/images/{id}/ppoi"), json!({"ppoi": "0.1x0.2"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["ppoi"], "0.1x0.2");

        let resp = send(
            &app,
            json_request("PUT", &format!("/images/{id}/ppoi"), json!({"ppoi": "middle"})),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = send(
            &app,
            multipart_request(
                "PUT",
                &format!("/images/{id}/asset"),
                &[],
                Some(("b.png", &png_bytes(8, 6))),
            ),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let replaced = body_json(resp).await;
        assert_eq!(replaced["width"], 8);
        assert_eq!(replaced["height"], 6);
        assert_eq!(replaced["ppoi"], "0.1x0.2");

        let resp = send(&app, empty_request("DELETE", &format!("/images/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        let resp = send(&app, empty_request("GET", &format!("/images/{id}"))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
