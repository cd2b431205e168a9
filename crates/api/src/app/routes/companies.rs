use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use bodega_company::{CompanyPatch, NewCompany};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::CompanyContext;

/// Create a company. The caller's token still authenticates the request, but
/// the new company is independent of the caller's company context; tokens for
/// it are issued out-of-band.
pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewCompany>,
) -> axum::response::Response {
    match services.companies.create(body).await {
        Ok(company) => (StatusCode::CREATED, Json(dto::company_to_json(&company))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
) -> axum::response::Response {
    match services.companies.get(company.company_id()).await {
        Ok(company) => (StatusCode::OK, Json(dto::company_to_json(&company))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(company): Extension<CompanyContext>,
    Json(body): Json<CompanyPatch>,
) -> axum::response::Response {
    match services.companies.update(company.company_id(), body).await {
        Ok(company) => (StatusCode::OK, Json(dto::company_to_json(&company))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
