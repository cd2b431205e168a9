//! Currency service: currencies, exchange rates, and cross-rate conversion.
//!
//! The first currency of a company becomes its base automatically; later base
//! changes go through `set_base`. Exchanges always relate a non-base currency
//! to the base, so a conversion is at most two legs.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use bodega_core::{CompanyId, CurrencyId, ExchangeId};
use bodega_currency::{
    ConversionOutcome, Currency, CurrencyExchange, CurrencyPatch, ExchangeLeg, ExchangePatch,
    NewCurrency, NewExchange, convert_via_base,
};

use crate::page::Page;
use crate::services::error::ServiceError;
use crate::stores::traits::{CompanyStore, CurrencyStore, ExchangeRecord};

#[derive(Clone)]
pub struct CurrencyService {
    store: Arc<dyn CurrencyStore>,
    companies: Arc<dyn CompanyStore>,
}

impl CurrencyService {
    pub fn new(store: Arc<dyn CurrencyStore>, companies: Arc<dyn CompanyStore>) -> Self {
        Self { store, companies }
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_currency(
        &self,
        company_id: CompanyId,
        input: NewCurrency,
    ) -> Result<Currency, ServiceError> {
        if !self.companies.exists(company_id).await? {
            return Err(ServiceError::NotFound("company"));
        }
        input.validate()?;
        let is_base = !self.store.has_currencies(company_id).await?;
        let currency = input.into_currency(CurrencyId::new(), company_id, is_base, Utc::now());
        self.store.insert_currency(&currency).await?;
        Ok(currency)
    }

    pub async fn get_currency(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Currency, ServiceError> {
        self.store
            .get_currency(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("currency"))
    }

    pub async fn list_currencies(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Currency>, ServiceError> {
        Ok(self.store.list_currencies(company_id, page).await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, currency_id = %id), err)]
    pub async fn update_currency(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
        patch: CurrencyPatch,
    ) -> Result<Currency, ServiceError> {
        patch.validate()?;
        let mut currency = self.get_currency(company_id, id).await?;
        patch.apply(&mut currency, Utc::now());
        self.store.update_currency(&currency).await?;
        Ok(currency)
    }

    /// Designate a currency as the company's base. Idempotent.
    #[instrument(skip(self), fields(company_id = %company_id, currency_id = %id), err)]
    pub async fn set_base(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Currency, ServiceError> {
        self.store
            .set_base(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("currency"))
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_exchange(
        &self,
        company_id: CompanyId,
        input: NewExchange,
    ) -> Result<CurrencyExchange, ServiceError> {
        input.validate()?;
        let currency = self.get_currency(company_id, input.currency_id).await?;
        if currency.is_base {
            return Err(ServiceError::InvariantViolation(format!(
                "currency '{}' is the base currency and cannot carry an exchange rate",
                currency.code
            )));
        }
        let exchange = input.into_exchange(ExchangeId::new(), company_id, Utc::now());
        self.store.insert_exchange(&exchange).await?;
        Ok(exchange)
    }

    pub async fn get_exchange(
        &self,
        company_id: CompanyId,
        id: ExchangeId,
    ) -> Result<ExchangeRecord, ServiceError> {
        self.store
            .get_exchange(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("exchange"))
    }

    pub async fn list_exchanges(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<ExchangeRecord>, ServiceError> {
        Ok(self.store.list_exchanges(company_id, page).await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, exchange_id = %id), err)]
    pub async fn update_exchange(
        &self,
        company_id: CompanyId,
        id: ExchangeId,
        patch: ExchangePatch,
    ) -> Result<ExchangeRecord, ServiceError> {
        patch.validate()?;
        let mut record = self.get_exchange(company_id, id).await?;
        patch.apply(&mut record.exchange, Utc::now());
        self.store.update_exchange(&record.exchange).await?;
        Ok(record)
    }

    /// Convert an amount between two of the company's currencies through the
    /// base. Converting a currency to itself is the identity.
    #[instrument(skip(self), fields(company_id = %company_id, from = %from, to = %to), err)]
    pub async fn convert(
        &self,
        company_id: CompanyId,
        amount: Decimal,
        from: CurrencyId,
        to: CurrencyId,
    ) -> Result<ConversionOutcome, ServiceError> {
        let from_currency = self.get_currency(company_id, from).await?;
        let to_currency = self.get_currency(company_id, to).await?;

        if from_currency.id == to_currency.id {
            return Ok(convert_via_base(amount, None, None)?);
        }

        let from_leg = self.leg_for(company_id, &from_currency).await?;
        let to_leg = self.leg_for(company_id, &to_currency).await?;
        Ok(convert_via_base(amount, from_leg, to_leg)?)
    }

    async fn leg_for(
        &self,
        company_id: CompanyId,
        currency: &Currency,
    ) -> Result<Option<ExchangeLeg>, ServiceError> {
        if currency.is_base {
            return Ok(None);
        }
        let exchange = self
            .store
            .exchange_for_currency(company_id, currency.id)
            .await?
            .ok_or_else(|| {
                ServiceError::InvariantViolation(format!(
                    "no exchange rate configured for currency '{}'",
                    currency.code
                ))
            })?;
        Ok(Some(ExchangeLeg {
            currency_id: currency.id,
            rate: exchange.rate,
            method: exchange.method,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_company::NewCompany;
    use bodega_currency::ConversionMethod;

    use crate::services::company::CompanyService;
    use crate::stores::in_memory::{InMemoryCompanyStore, InMemoryCurrencyStore};

    struct Fixture {
        currencies: CurrencyService,
        company_id: CompanyId,
    }

    async fn fixture() -> Fixture {
        let company_store = Arc::new(InMemoryCompanyStore::new());
        let currency_store = Arc::new(InMemoryCurrencyStore::new());
        let companies = CompanyService::new(company_store.clone());
        let currencies = CurrencyService::new(currency_store, company_store);

        let company_id = companies
            .create(NewCompany {
                name: "Acme".to_string(),
                tax_id: None,
                email: None,
            })
            .await
            .unwrap()
            .id;
        Fixture {
            currencies,
            company_id,
        }
    }

    fn new_currency(code: &str, name: &str) -> NewCurrency {
        NewCurrency {
            code: code.to_string(),
            name: name.to_string(),
            symbol: None,
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn first_currency_becomes_base() {
        let fx = fixture().await;
        let eur = fx
            .currencies
            .create_currency(fx.company_id, new_currency("EUR", "Euro"))
            .await
            .unwrap();
        assert!(eur.is_base);

        let usd = fx
            .currencies
            .create_currency(fx.company_id, new_currency("USD", "US Dollar"))
            .await
            .unwrap();
        assert!(!usd.is_base);
    }

    #[tokio::test]
    async fn duplicate_code_conflicts() {
        let fx = fixture().await;
        fx.currencies
            .create_currency(fx.company_id, new_currency("EUR", "Euro"))
            .await
            .unwrap();
        let err = fx
            .currencies
            .create_currency(fx.company_id, new_currency("eur", "Euro again"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn base_currency_rejects_exchange() {
        let fx = fixture().await;
        let eur = fx
            .currencies
            .create_currency(fx.company_id, new_currency("EUR", "Euro"))
            .await
            .unwrap();

        let err = fx
            .currencies
            .create_exchange(
                fx.company_id,
                NewExchange {
                    currency_id: eur.id,
                    rate: dec("1.1"),
                    method: ConversionMethod::Multiply,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn set_base_moves_flag_and_drops_exchange() {
        let fx = fixture().await;
        let eur = fx
            .currencies
            .create_currency(fx.company_id, new_currency("EUR", "Euro"))
            .await
            .unwrap();
        let usd = fx
            .currencies
            .create_currency(fx.company_id, new_currency("USD", "US Dollar"))
            .await
            .unwrap();
        fx.currencies
            .create_exchange(
                fx.company_id,
                NewExchange {
                    currency_id: usd.id,
                    rate: dec("0.9"),
                    method: ConversionMethod::Multiply,
                },
            )
            .await
            .unwrap();

        let promoted = fx.currencies.set_base(fx.company_id, usd.id).await.unwrap();
        assert!(promoted.is_base);

        let old_base = fx
            .currencies
            .get_currency(fx.company_id, eur.id)
            .await
            .unwrap();
        assert!(!old_base.is_base);

        // USD's rate against the old base is gone.
        let exchanges = fx
            .currencies
            .list_exchanges(fx.company_id, Page::default())
            .await
            .unwrap();
        assert!(exchanges.is_empty());
    }

    #[tokio::test]
    async fn convert_through_base() {
        let fx = fixture().await;
        fx.currencies
            .create_currency(fx.company_id, new_currency("EUR", "Euro"))
            .await
            .unwrap();
        let usd = fx
            .currencies
            .create_currency(fx.company_id, new_currency("USD", "US Dollar"))
            .await
            .unwrap();
        let gbp = fx
            .currencies
            .create_currency(fx.company_id, new_currency("GBP", "Pound"))
            .await
            .unwrap();

        // 1 USD = 0.8 EUR; 1 GBP = 1.25 EUR.
        fx.currencies
            .create_exchange(
                fx.company_id,
                NewExchange {
                    currency_id: usd.id,
                    rate: dec("0.8"),
                    method: ConversionMethod::Multiply,
                },
            )
            .await
            .unwrap();
        fx.currencies
            .create_exchange(
                fx.company_id,
                NewExchange {
                    currency_id: gbp.id,
                    rate: dec("1.25"),
                    method: ConversionMethod::Multiply,
                },
            )
            .await
            .unwrap();

        let outcome = fx
            .currencies
            .convert(fx.company_id, dec("100"), usd.id, gbp.id)
            .await
            .unwrap();
        assert_eq!(outcome.base_amount, dec("80.0"));
        assert_eq!(outcome.converted, dec("64"));
    }

    #[tokio::test]
    async fn convert_same_currency_is_identity() {
        let fx = fixture().await;
        let usd = fx
            .currencies
            .create_currency(fx.company_id, new_currency("USD", "US Dollar"))
            .await
            .unwrap();

        let outcome = fx
            .currencies
            .convert(fx.company_id, dec("12.34"), usd.id, usd.id)
            .await
            .unwrap();
        assert_eq!(outcome.converted, dec("12.34"));
    }

    #[tokio::test]
    async fn convert_without_rate_is_an_invariant_error() {
        let fx = fixture().await;
        let eur = fx
            .currencies
            .create_currency(fx.company_id, new_currency("EUR", "Euro"))
            .await
            .unwrap();
        let usd = fx
            .currencies
            .create_currency(fx.company_id, new_currency("USD", "US Dollar"))
            .await
            .unwrap();

        let err = fx
            .currencies
            .convert(fx.company_id, dec("10"), usd.id, eur.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvariantViolation(_)));
    }

    #[tokio::test]
    async fn convert_unknown_currency_is_not_found() {
        let fx = fixture().await;
        let usd = fx
            .currencies
            .create_currency(fx.company_id, new_currency("USD", "US Dollar"))
            .await
            .unwrap();

        let err = fx
            .currencies
            .convert(fx.company_id, dec("10"), usd.id, CurrencyId::new())
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("currency"));
    }
}
