use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bodega_core::InventoryId;
use bodega_inventory::{InventoryPatch, NewInventory};

use crate::app::routes::common::ListQuery;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_inventory).get(list_inventories))
        .route("/:id", get(get_inventory).put(update_inventory))
}

pub async fn create_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewInventory>,
) -> axum::response::Response {
    match services
        .inventory
        .create_inventory(company.company_id(), body)
        .await
    {
        Ok(inv) => (StatusCode::CREATED, Json(dto::inventory_to_json(&inv))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_inventories(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services
        .inventory
        .list_inventories(company.company_id(), query.page())
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(items.iter().map(dto::inventory_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: InventoryId = match errors::parse_id(&id, "inventory") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.get_inventory(company.company_id(), id).await {
        Ok(inv) => (StatusCode::OK, Json(dto::inventory_to_json(&inv))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<InventoryPatch>,
) -> axum::response::Response {
    let id: InventoryId = match errors::parse_id(&id, "inventory") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .inventory
        .update_inventory(company.company_id(), id, body)
        .await
    {
        Ok(inv) => (StatusCode::OK, Json(dto::inventory_to_json(&inv))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
