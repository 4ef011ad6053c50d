//! Core data models for the carousel catalog.
//!
//! A carousel groups images for one display slot, an image is a stored
//! picture asset, and a placement links the two. They map onto the
//! `carousels`, `images` and `placements` tables via `sqlx::FromRow` and
//! serialize as JSON via `serde`.

pub mod carousel;
pub mod image;
pub mod placement;
pub mod ppoi;
