use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bodega_core::TaxId;
use bodega_pricing::{NewTax, TaxPatch};

use crate::app::routes::common::ListQuery;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_tax).get(list_taxes))
        .route("/:id", get(get_tax).put(update_tax))
}

pub async fn create_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewTax>,
) -> axum::response::Response {
    match services.pricing.create_tax(company.company_id(), body).await {
        Ok(tax) => (StatusCode::CREATED, Json(dto::tax_to_json(&tax))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_taxes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services
        .pricing
        .list_taxes(company.company_id(), query.page())
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(items.iter().map(dto::tax_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TaxId = match errors::parse_id(&id, "tax") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.pricing.get_tax(company.company_id(), id).await {
        Ok(tax) => (StatusCode::OK, Json(dto::tax_to_json(&tax))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_tax(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<TaxPatch>,
) -> axum::response::Response {
    let id: TaxId = match errors::parse_id(&id, "tax") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .pricing
        .update_tax(company.company_id(), id, body)
        .await
    {
        Ok(tax) => (StatusCode::OK, Json(dto::tax_to_json(&tax))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
