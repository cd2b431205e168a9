use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bodega_core::StorageId;
use bodega_inventory::{NewStorage, StoragePatch};

use crate::app::routes::common::ListQuery;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_storage).get(list_storages))
        .route("/:id", get(get_storage).put(update_storage))
}

pub async fn create_storage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewStorage>,
) -> axum::response::Response {
    match services
        .inventory
        .create_storage(company.company_id(), body)
        .await
    {
        Ok(storage) => (StatusCode::CREATED, Json(dto::storage_to_json(&storage))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_storages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services
        .inventory
        .list_storages(company.company_id(), query.page())
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(items.iter().map(dto::storage_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_storage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: StorageId = match errors::parse_id(&id, "storage") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.get_storage(company.company_id(), id).await {
        Ok(storage) => (StatusCode::OK, Json(dto::storage_to_json(&storage))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_storage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<StoragePatch>,
) -> axum::response::Response {
    let id: StorageId = match errors::parse_id(&id, "storage") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .inventory
        .update_storage(company.company_id(), id, body)
        .await
    {
        Ok(storage) => (StatusCode::OK, Json(dto::storage_to_json(&storage))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
