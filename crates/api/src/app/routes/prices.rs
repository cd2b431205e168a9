use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use bodega_core::{PriceId, VariantId};
use bodega_pricing::{NewPrice, PricePatch};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_price).get(list_prices))
        .route("/:id", get(get_price).put(update_price))
        .route("/:id/current", post(set_current))
}

#[derive(Debug, Deserialize)]
pub struct PriceListQuery {
    pub variant_id: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn create_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewPrice>,
) -> axum::response::Response {
    match services.pricing.create_price(company.company_id(), body).await {
        Ok(price) => (StatusCode::CREATED, Json(dto::price_to_json(&price))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_prices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<PriceListQuery>,
) -> axum::response::Response {
    let variant_id: VariantId = match errors::parse_id(&query.variant_id, "variant") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page = bodega_infra::Page::clamped(query.limit, query.offset);
    match services
        .pricing
        .list_prices(company.company_id(), variant_id, page)
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(
                items
                    .iter()
                    .map(dto::price_record_to_json)
                    .collect::<Vec<_>>(),
            ),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PriceId = match errors::parse_id(&id, "price") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.pricing.get_price(company.company_id(), id).await {
        Ok(price) => (StatusCode::OK, Json(dto::price_to_json(&price))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<PricePatch>,
) -> axum::response::Response {
    let id: PriceId = match errors::parse_id(&id, "price") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .pricing
        .update_price(company.company_id(), id, body)
        .await
    {
        Ok(price) => (StatusCode::OK, Json(dto::price_to_json(&price))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_current(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: PriceId = match errors::parse_id(&id, "price") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.pricing.set_current(company.company_id(), id).await {
        Ok(price) => (StatusCode::OK, Json(dto::price_to_json(&price))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
