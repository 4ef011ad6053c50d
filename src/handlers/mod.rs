//! HTTP handlers. Each module maps one resource onto `CatalogService`.

pub mod carousel_handlers;
pub mod health_handlers;
pub mod image_handlers;
pub mod placement_handlers;
