use chrono::{DateTime, Utc};
use core::str::FromStr;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, CurrencyId, DomainError, DomainResult, Entity, PriceId, VariantId};

/// Price kind. A variant can carry one *current* price per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceKind {
    Retail,
    Wholesale,
}

impl PriceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceKind::Retail => "retail",
            PriceKind::Wholesale => "wholesale",
        }
    }
}

impl core::fmt::Display for PriceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retail" => Ok(PriceKind::Retail),
            "wholesale" => Ok(PriceKind::Wholesale),
            other => Err(DomainError::validation(format!(
                "unknown price kind '{other}' (expected retail or wholesale)"
            ))),
        }
    }
}

/// Price row: an amount in a given currency attached to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    pub company_id: CompanyId,
    pub variant_id: VariantId,
    pub currency_id: CurrencyId,
    pub kind: PriceKind,
    pub amount: Decimal,
    pub is_current: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Price {
    type Id = PriceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a price.
///
/// `make_current` asks the store to demote the previous current price of the
/// same (variant, kind) in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPrice {
    pub variant_id: VariantId,
    pub currency_id: CurrencyId,
    pub kind: PriceKind,
    pub amount: Decimal,
    #[serde(default)]
    pub make_current: bool,
}

impl NewPrice {
    pub fn validate(&self) -> DomainResult<()> {
        validate_amount(self.amount)
    }

    pub fn into_price(self, id: PriceId, company_id: CompanyId, now: DateTime<Utc>) -> Price {
        Price {
            id,
            company_id,
            variant_id: self.variant_id,
            currency_id: self.currency_id,
            kind: self.kind,
            amount: self.amount,
            is_current: self.make_current,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a price. Only the amount is mutable; re-pointing a price
/// at another variant, currency, or kind is a new price.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricePatch {
    pub amount: Decimal,
}

impl PricePatch {
    pub fn validate(&self) -> DomainResult<()> {
        validate_amount(self.amount)
    }

    pub fn apply(self, price: &mut Price, now: DateTime<Utc>) {
        price.amount = self.amount;
        price.updated_at = now;
    }
}

fn validate_amount(amount: Decimal) -> DomainResult<()> {
    if amount < Decimal::ZERO {
        return Err(DomainError::validation("amount cannot be negative"));
    }
    Ok(())
}
