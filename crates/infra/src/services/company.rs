//! Company service.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use bodega_company::{Company, CompanyPatch, NewCompany};
use bodega_core::CompanyId;

use crate::services::error::ServiceError;
use crate::stores::traits::CompanyStore;

#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn CompanyStore>,
}

impl CompanyService {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: NewCompany) -> Result<Company, ServiceError> {
        input.validate()?;
        let company = input.into_company(CompanyId::new(), Utc::now());
        self.store.insert(&company).await?;
        Ok(company)
    }

    pub async fn get(&self, id: CompanyId) -> Result<Company, ServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("company"))
    }

    #[instrument(skip(self, patch), fields(company_id = %id), err)]
    pub async fn update(&self, id: CompanyId, patch: CompanyPatch) -> Result<Company, ServiceError> {
        patch.validate()?;
        let mut company = self.get(id).await?;
        patch.apply(&mut company, Utc::now());
        self.store.update(&company).await?;
        Ok(company)
    }
}
