use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use bodega_core::{CurrencyId, ExchangeId};
use bodega_currency::{ExchangePatch, NewExchange};

use crate::app::routes::common::ListQuery;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_exchange).get(list_exchanges))
        .route("/convert", post(convert))
        .route("/:id", get(get_exchange).put(update_exchange))
}

pub async fn create_exchange(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<NewExchange>,
) -> axum::response::Response {
    match services
        .currency
        .create_exchange(company.company_id(), body)
        .await
    {
        Ok(exchange) => {
            (StatusCode::CREATED, Json(dto::exchange_to_json(&exchange))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_exchanges(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    match services
        .currency
        .list_exchanges(company.company_id(), query.page())
        .await
    {
        Ok(items) => (
            StatusCode::OK,
            Json(
                items
                    .iter()
                    .map(dto::exchange_record_to_json)
                    .collect::<Vec<_>>(),
            ),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_exchange(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ExchangeId = match errors::parse_id(&id, "exchange") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.currency.get_exchange(company.company_id(), id).await {
        Ok(record) => (StatusCode::OK, Json(dto::exchange_record_to_json(&record))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_exchange(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Path(id): Path<String>,
    Json(body): Json<ExchangePatch>,
) -> axum::response::Response {
    let id: ExchangeId = match errors::parse_id(&id, "exchange") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .currency
        .update_exchange(company.company_id(), id, body)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(dto::exchange_record_to_json(&record))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn convert(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<dto::ConvertRequest>,
) -> axum::response::Response {
    let from: CurrencyId = match errors::parse_id(&body.from_currency_id, "currency") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to: CurrencyId = match errors::parse_id(&body.to_currency_id, "currency") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services
        .currency
        .convert(company.company_id(), body.amount, from, to)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(dto::conversion_to_json(&outcome))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
