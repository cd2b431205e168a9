use chrono::{DateTime, Utc};
use core::str::FromStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, CurrencyId, DomainError, DomainResult, Entity, ExchangeId};

/// How a configured rate maps a currency amount onto the base currency.
///
/// `multiply`: base = amount * rate. `divide`: base = amount / rate. Both
/// directions exist in the wild depending on which side the rate was quoted
/// from, so the method travels with the rate instead of being normalized away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionMethod {
    Multiply,
    Divide,
}

impl ConversionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMethod::Multiply => "multiply",
            ConversionMethod::Divide => "divide",
        }
    }
}

impl core::fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiply" => Ok(ConversionMethod::Multiply),
            "divide" => Ok(ConversionMethod::Divide),
            other => Err(DomainError::validation(format!(
                "unknown conversion method '{other}' (expected multiply or divide)"
            ))),
        }
    }
}

/// Configured exchange rate between a currency and the company's base
/// currency. At most one per currency; never configured for the base itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyExchange {
    pub id: ExchangeId,
    pub company_id: CompanyId,
    pub currency_id: CurrencyId,
    pub rate: Decimal,
    pub method: ConversionMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for CurrencyExchange {
    type Id = ExchangeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for configuring an exchange rate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewExchange {
    pub currency_id: CurrencyId,
    pub rate: Decimal,
    pub method: ConversionMethod,
}

impl NewExchange {
    pub fn validate(&self) -> DomainResult<()> {
        validate_rate(self.rate)
    }

    pub fn into_exchange(
        self,
        id: ExchangeId,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> CurrencyExchange {
        CurrencyExchange {
            id,
            company_id,
            currency_id: self.currency_id,
            rate: self.rate,
            method: self.method,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an exchange. `None` fields are left untouched; the
/// target currency is fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExchangePatch {
    pub rate: Option<Decimal>,
    pub method: Option<ConversionMethod>,
}

impl ExchangePatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(rate) = self.rate {
            validate_rate(rate)?;
        }
        Ok(())
    }

    pub fn apply(self, exchange: &mut CurrencyExchange, now: DateTime<Utc>) {
        if let Some(rate) = self.rate {
            exchange.rate = rate;
        }
        if let Some(method) = self.method {
            exchange.method = method;
        }
        exchange.updated_at = now;
    }
}

fn validate_rate(rate: Decimal) -> DomainResult<()> {
    if rate <= Decimal::ZERO {
        return Err(DomainError::validation("rate must be positive"));
    }
    Ok(())
}
