use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bodega_core::CurrencyId;
use bodega_currency::{CurrencyPatch, NewCurrency};

use crate::app::routes::common::ListQuery;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_currency).get(list_currencies))
        .route("/:id", get(get_currency).put(update_currency))
        .route("/:id/base", post(set_base))
}

pub async fn create_currency(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewCurrency>,
) -> axum::response::Response {
    match services
        .currency
        .create_currency(company.company_id(), body)
        .await
    {
        Ok(currency) => {
            (StatusCode::CREATED, Json(dto::currency_to_json(&currency))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_currencies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services
        .currency
        .list_currencies(company.company_id(), query.page())
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(items.iter().map(dto::currency_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_currency(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CurrencyId = match errors::parse_id(&id, "currency") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.currency.get_currency(company.company_id(), id).await {
        Ok(currency) => (StatusCode::OK, Json(dto::currency_to_json(&currency))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_currency(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<CurrencyPatch>,
) -> axum::response::Response {
    let id: CurrencyId = match errors::parse_id(&id, "currency") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .currency
        .update_currency(company.company_id(), id, body)
        .await
    {
        Ok(currency) => (StatusCode::OK, Json(dto::currency_to_json(&currency))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_base(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CurrencyId = match errors::parse_id(&id, "currency") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.currency.set_base(company.company_id(), id).await {
        Ok(currency) => (StatusCode::OK, Json(dto::currency_to_json(&currency))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
