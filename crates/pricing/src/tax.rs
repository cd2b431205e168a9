use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, DomainError, DomainResult, Entity, TaxId};

/// Tax definition: a percentage rate, optionally already baked into prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tax {
    pub id: TaxId,
    pub company_id: CompanyId,
    pub name: String,
    /// Percentage in `[0, 100]`.
    pub rate: Decimal,
    pub included_in_price: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Tax {
    type Id = TaxId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a tax. Name is unique per company.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTax {
    pub name: String,
    pub rate: Decimal,
    #[serde(default)]
    pub included_in_price: bool,
}

impl NewTax {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        validate_rate(self.rate)
    }

    pub fn into_tax(self, id: TaxId, company_id: CompanyId, now: DateTime<Utc>) -> Tax {
        Tax {
            id,
            company_id,
            name: self.name.trim().to_string(),
            rate: self.rate,
            included_in_price: self.included_in_price,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a tax. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaxPatch {
    pub name: Option<String>,
    pub rate: Option<Decimal>,
    pub included_in_price: Option<bool>,
}

impl TaxPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(rate) = self.rate {
            validate_rate(rate)?;
        }
        Ok(())
    }

    pub fn apply(self, tax: &mut Tax, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            tax.name = name.trim().to_string();
        }
        if let Some(rate) = self.rate {
            tax.rate = rate;
        }
        if let Some(included) = self.included_in_price {
            tax.included_in_price = included;
        }
        tax.updated_at = now;
    }
}

fn validate_rate(rate: Decimal) -> DomainResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::from(100) {
        return Err(DomainError::validation("rate must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tax(rate: Decimal) -> NewTax {
        NewTax {
            name: "VAT".to_string(),
            rate,
            included_in_price: true,
        }
    }

    #[test]
    fn new_tax_accepts_bounds() {
        new_tax(Decimal::ZERO).validate().unwrap();
        new_tax(Decimal::from(100)).validate().unwrap();
        new_tax(Decimal::new(2100, 2)).validate().unwrap();
    }

    #[test]
    fn new_tax_rejects_out_of_range_rate() {
        assert!(new_tax(Decimal::from(-1)).validate().is_err());
        assert!(new_tax(Decimal::new(10001, 2)).validate().is_err());
    }

    #[test]
    fn patch_rechecks_rate_bounds() {
        let patch = TaxPatch {
            rate: Some(Decimal::from(150)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn patch_toggles_inclusion() {
        let mut tax = new_tax(Decimal::from(21)).into_tax(TaxId::new(), CompanyId::new(), Utc::now());
        TaxPatch {
            included_in_price: Some(false),
            ..Default::default()
        }
        .apply(&mut tax, Utc::now());
        assert!(!tax.included_in_price);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: rates in [0, 100] always validate, rates outside never do.
            #[test]
            fn rate_bounds_are_sharp(cents in -10_000i64..20_000) {
                let rate = Decimal::new(cents, 2);
                let result = new_tax(rate).validate();
                let in_bounds = rate >= Decimal::ZERO && rate <= Decimal::from(100);
                prop_assert_eq!(result.is_ok(), in_bounds);
            }
        }
    }
}
