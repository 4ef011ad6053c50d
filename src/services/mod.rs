//! Catalog services: metadata access, asset storage and image processing.

pub mod asset_store;
pub mod catalog_service;
pub mod image_processor;
