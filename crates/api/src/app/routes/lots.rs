use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use bodega_core::{LotId, StorageId, VariantId};
use bodega_infra::LotFilter;
use bodega_inventory::{LotPatch, NewLot};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_lot).get(list_lots))
        .route("/:id", get(get_lot).put(update_lot))
}

#[derive(Debug, Deserialize)]
pub struct LotListQuery {
    pub variant_id: Option<String>,
    pub storage_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn create_lot(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewLot>,
) -> axum::response::Response {
    match services.inventory.create_lot(company.company_id(), body).await {
        Ok(record) => (StatusCode::CREATED, Json(dto::lot_to_json(&record))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_lots(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<LotListQuery>,
) -> axum::response::Response {
    let variant_id: Option<VariantId> = match &query.variant_id {
        Some(raw) => match errors::parse_id(raw, "variant") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
        None => None,
    };
    let storage_id: Option<StorageId> = match &query.storage_id {
        Some(raw) => match errors::parse_id(raw, "storage") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
        None => None,
    };
    let filter = LotFilter {
        variant_id,
        storage_id,
    };
    let page = bodega_infra::Page::clamped(query.limit, query.offset);
    match services
        .inventory
        .list_lots(company.company_id(), filter, page)
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(items.iter().map(dto::lot_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_lot(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: LotId = match errors::parse_id(&id, "lot") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.get_lot(company.company_id(), id).await {
        Ok(record) => (StatusCode::OK, Json(dto::lot_to_json(&record))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_lot(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<LotPatch>,
) -> axum::response::Response {
    let id: LotId = match errors::parse_id(&id, "lot") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .inventory
        .update_lot(company.company_id(), id, body)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::lot_to_json(&record))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
