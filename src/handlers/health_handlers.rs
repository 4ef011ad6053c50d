//! Liveness and readiness endpoints.
//!
//! Readiness means the catalog can do real work: the schema has been
//! migrated and an asset can round-trip through the upload directory.

use crate::services::catalog_service::CatalogService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tokio::io::AsyncReadExt;

const CATALOG_TABLES: [&str; 3] = ["carousels", "images", "placements"];
const SCRATCH_BYTES: &[u8] = b"carousel-readyz";

#[derive(Serialize)]
struct Readiness {
    ready: bool,
    schema: Check,
    uploads: Check,
}

#[derive(Serialize)]
struct Check {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl Check {
    fn from_result(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Check {
                ok: true,
                detail: None,
            },
            Err(detail) => Check {
                ok: false,
                detail: Some(detail),
            },
        }
    }
}

/// `GET /healthz`: the process is up.
pub async fn healthz() -> &'static str {
    "ok"
}

/// `GET /readyz`: 200 when the schema is present and uploads are writable,
/// 503 otherwise.
pub async fn readyz(State(service): State<CatalogService>) -> impl IntoResponse {
    let schema = Check::from_result(check_schema(&service).await);
    let uploads = Check::from_result(check_uploads(&service).await);
    let ready = schema.ok && uploads.ok;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(Readiness {
            ready,
            schema,
            uploads,
        }),
    )
}

async fn check_schema(service: &CatalogService) -> Result<(), String> {
    let present: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name IN ('carousels', 'images', 'placements')",
    )
    .fetch_all(&*service.db)
    .await
    .map_err(|err| format!("database unreachable: {}", err))?;

    let missing: Vec<&str> = CATALOG_TABLES
        .into_iter()
        .filter(|table| !present.iter().any(|name| name == table))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "missing tables {}; run with --migrate",
            missing.join(", ")
        ))
    }
}

/// Store, read back and remove a scratch asset through the same store that
/// serves uploads.
async fn check_uploads(service: &CatalogService) -> Result<(), String> {
    let relative = service
        .assets
        .store("readyz", SCRATCH_BYTES)
        .await
        .map_err(|err| format!("cannot write uploads: {}", err))?;

    let mut contents = Vec::new();
    let read = match service.assets.open(&relative).await {
        Ok(mut file) => file.read_to_end(&mut contents).await.map(|_| ()),
        Err(err) => Err(err),
    };
    let removed = service.assets.remove(&relative).await;

    read.map_err(|err| format!("cannot read uploads: {}", err))?;
    if contents != SCRATCH_BYTES {
        return Err("scratch asset came back altered".into());
    }
    removed.map_err(|err| format!("cannot remove from uploads: {}", err))
}
