use axum::{
    Router,
    routing::{get, post},
};

pub mod common;
pub mod companies;
pub mod currencies;
pub mod exchanges;
pub mod inventories;
pub mod lots;
pub mod prices;
pub mod storages;
pub mod system;
pub mod taxes;
pub mod variants;

/// Router for all authenticated (company-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/companies", post(companies::create_company))
        .route(
            "/company",
            get(companies::get_company).put(companies::update_company),
        )
        .nest("/inventories", inventories::router())
        .nest("/storages", storages::router())
        .nest("/variants", variants::router())
        .nest("/lots", lots::router())
        .nest("/prices", prices::router())
        .nest("/taxes", taxes::router())
        .nest("/currencies", currencies::router())
        .nest("/exchanges", exchanges::router())
}
