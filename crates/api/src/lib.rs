//! `bodega-api` — HTTP surface over the application services.

pub mod app;
pub mod context;
pub mod middleware;
