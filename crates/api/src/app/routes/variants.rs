use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use bodega_core::{InventoryId, VariantId};
use bodega_inventory::{NewVariant, VariantPatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_variant).get(list_variants))
        .route("/:id", get(get_variant).put(update_variant))
}

#[derive(Debug, Deserialize)]
pub struct VariantListQuery {
    pub inventory_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn create_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewVariant>,
) -> axum::response::Response {
    match services
        .inventory
        .create_variant(company.company_id(), body)
        .await
    {
        Ok(variant) => (StatusCode::CREATED, Json(dto::variant_to_json(&variant))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_variants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<VariantListQuery>,
) -> axum::response::Response {
    let inventory_id: Option<InventoryId> = match &query.inventory_id {
        Some(raw) => match errors::parse_id(raw, "inventory") {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
        None => None,
    };
    let page = bodega_infra::Page::clamped(query.limit, query.offset);
    match services
        .inventory
        .list_variants(company.company_id(), inventory_id, page)
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(items.iter().map(dto::variant_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: VariantId = match errors::parse_id(&id, "variant") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.get_variant(company.company_id(), id).await {
        Ok(variant) => (StatusCode::OK, Json(dto::variant_to_json(&variant))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<VariantPatch>,
) -> axum::response::Response {
    let id: VariantId = match errors::parse_id(&id, "variant") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .inventory
        .update_variant(company.company_id(), id, body)
        .await
    {
        Ok(variant) => (StatusCode::OK, Json(dto::variant_to_json(&variant))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
