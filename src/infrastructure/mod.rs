//! Adapters binding the engine to concrete collaborators

#[cfg(feature = "axum")]
pub mod axum;
#[cfg(feature = "sea-orm")]
pub mod sea_orm;
