use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, CurrencyId, DomainError, DomainResult, Entity};

const MAX_CODE_LEN: usize = 8;
const MAX_NAME_LEN: usize = 100;
const MAX_SYMBOL_LEN: usize = 8;

/// Company-scoped currency. Exactly one per company carries `is_base` once
/// any currency exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub company_id: CompanyId,
    /// Uppercased code, unique per company (typically ISO 4217, e.g. "EUR").
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
    pub is_base: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Currency {
    type Id = CurrencyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a currency.
///
/// The first currency of a company automatically becomes the base; there is
/// no flag here to request it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCurrency {
    pub code: String,
    pub name: String,
    pub symbol: Option<String>,
}

impl NewCurrency {
    pub fn validate(&self) -> DomainResult<()> {
        validate_code(&self.code)?;
        validate_name(&self.name)?;
        if let Some(symbol) = &self.symbol {
            validate_symbol(symbol)?;
        }
        Ok(())
    }

    pub fn into_currency(
        self,
        id: CurrencyId,
        company_id: CompanyId,
        is_base: bool,
        now: DateTime<Utc>,
    ) -> Currency {
        Currency {
            id,
            company_id,
            code: self.code.trim().to_uppercase(),
            name: self.name.trim().to_string(),
            symbol: self.symbol.map(|s| s.trim().to_string()),
            is_base,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a currency. `None` fields are left untouched.
///
/// `is_base` is deliberately absent: base designation goes through the
/// dedicated set-base routine so the one-base invariant stays in one place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CurrencyPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

impl CurrencyPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(symbol) = &self.symbol {
            validate_symbol(symbol)?;
        }
        Ok(())
    }

    pub fn apply(self, currency: &mut Currency, now: DateTime<Utc>) {
        if let Some(code) = self.code {
            currency.code = code.trim().to_uppercase();
        }
        if let Some(name) = self.name {
            currency.name = name.trim().to_string();
        }
        if let Some(symbol) = self.symbol {
            currency.symbol = Some(symbol.trim().to_string());
        }
        currency.updated_at = now;
    }
}

fn validate_code(code: &str) -> DomainResult<()> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("code cannot be empty"));
    }
    if trimmed.len() > MAX_CODE_LEN {
        return Err(DomainError::validation(format!(
            "code cannot exceed {MAX_CODE_LEN} characters"
        )));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(DomainError::validation("code must be alphanumeric"));
    }
    Ok(())
}

fn validate_name(name: &str) -> DomainResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    if trimmed.len() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_symbol(symbol: &str) -> DomainResult<()> {
    if symbol.trim().len() > MAX_SYMBOL_LEN {
        return Err(DomainError::validation(format!(
            "symbol cannot exceed {MAX_SYMBOL_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_currency(code: &str) -> NewCurrency {
        NewCurrency {
            code: code.to_string(),
            name: "Euro".to_string(),
            symbol: Some("€".to_string()),
        }
    }

    #[test]
    fn code_is_uppercased() {
        let input = new_currency("eur");
        input.validate().unwrap();
        let currency = input.into_currency(CurrencyId::new(), CompanyId::new(), true, Utc::now());
        assert_eq!(currency.code, "EUR");
        assert!(currency.is_base);
    }

    #[test]
    fn rejects_non_alphanumeric_code() {
        assert!(new_currency("E U").validate().is_err());
        assert!(new_currency("€").validate().is_err());
    }

    #[test]
    fn rejects_blank_code() {
        assert!(new_currency("  ").validate().is_err());
    }

    #[test]
    fn patch_cannot_flip_base_flag() {
        let input = new_currency("USD");
        let mut currency = input.into_currency(CurrencyId::new(), CompanyId::new(), true, Utc::now());

        CurrencyPatch {
            name: Some("US Dollar".to_string()),
            ..Default::default()
        }
        .apply(&mut currency, Utc::now());

        assert!(currency.is_base);
        assert_eq!(currency.name, "US Dollar");
    }
}
