//! Pricing service: prices and taxes.
//!
//! A variant carries at most one current price per kind; the store routines
//! that touch `is_current` demote the sibling atomically.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use bodega_core::{CompanyId, PriceId, TaxId, VariantId};
use bodega_pricing::{NewPrice, NewTax, Price, PricePatch, Tax, TaxPatch};

use crate::page::Page;
use crate::services::error::ServiceError;
use crate::stores::traits::{CurrencyStore, InventoryStore, PriceRecord, PricingStore};

#[derive(Clone)]
pub struct PricingService {
    store: Arc<dyn PricingStore>,
    inventory: Arc<dyn InventoryStore>,
    currencies: Arc<dyn CurrencyStore>,
}

impl PricingService {
    pub fn new(
        store: Arc<dyn PricingStore>,
        inventory: Arc<dyn InventoryStore>,
        currencies: Arc<dyn CurrencyStore>,
    ) -> Self {
        Self {
            store,
            inventory,
            currencies,
        }
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_price(
        &self,
        company_id: CompanyId,
        input: NewPrice,
    ) -> Result<Price, ServiceError> {
        input.validate()?;
        if !self
            .inventory
            .variant_exists(company_id, input.variant_id)
            .await?
        {
            return Err(ServiceError::NotFound("variant"));
        }
        if self
            .currencies
            .get_currency(company_id, input.currency_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound("currency"));
        }
        let price = input.into_price(PriceId::new(), company_id, Utc::now());
        self.store.insert_price(&price).await?;
        Ok(price)
    }

    pub async fn get_price(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Price, ServiceError> {
        self.store
            .get_price(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("price"))
    }

    pub async fn list_prices(
        &self,
        company_id: CompanyId,
        variant_id: VariantId,
        page: Page,
    ) -> Result<Vec<PriceRecord>, ServiceError> {
        if !self.inventory.variant_exists(company_id, variant_id).await? {
            return Err(ServiceError::NotFound("variant"));
        }
        Ok(self
            .store
            .list_prices_for_variant(company_id, variant_id, page)
            .await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, price_id = %id), err)]
    pub async fn update_price(
        &self,
        company_id: CompanyId,
        id: PriceId,
        patch: PricePatch,
    ) -> Result<Price, ServiceError> {
        patch.validate()?;
        let mut price = self.get_price(company_id, id).await?;
        patch.apply(&mut price, Utc::now());
        self.store.update_price(&price).await?;
        Ok(price)
    }

    /// Make a price the current one for its (variant, kind). Idempotent.
    #[instrument(skip(self), fields(company_id = %company_id, price_id = %id), err)]
    pub async fn set_current(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Price, ServiceError> {
        self.store
            .set_current(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("price"))
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_tax(
        &self,
        company_id: CompanyId,
        input: NewTax,
    ) -> Result<Tax, ServiceError> {
        input.validate()?;
        let tax = input.into_tax(TaxId::new(), company_id, Utc::now());
        self.store.insert_tax(&tax).await?;
        Ok(tax)
    }

    pub async fn get_tax(&self, company_id: CompanyId, id: TaxId) -> Result<Tax, ServiceError> {
        self.store
            .get_tax(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("tax"))
    }

    pub async fn list_taxes(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Tax>, ServiceError> {
        Ok(self.store.list_taxes(company_id, page).await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, tax_id = %id), err)]
    pub async fn update_tax(
        &self,
        company_id: CompanyId,
        id: TaxId,
        patch: TaxPatch,
    ) -> Result<Tax, ServiceError> {
        patch.validate()?;
        let mut tax = self.get_tax(company_id, id).await?;
        patch.apply(&mut tax, Utc::now());
        self.store.update_tax(&tax).await?;
        Ok(tax)
    }
}
