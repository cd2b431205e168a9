use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, DomainError, DomainResult, Entity};

const MAX_NAME_LEN: usize = 200;
const MAX_TAX_ID_LEN: usize = 64;
const MAX_EMAIL_LEN: usize = 254;

/// Company: top-level tenant entity. Everything else is partitioned by its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a company.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub tax_id: Option<String>,
    pub email: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.name)?;
        if let Some(tax_id) = &self.tax_id {
            validate_tax_id(tax_id)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    /// Materialize the validated input into a new entity.
    pub fn into_company(self, id: CompanyId, now: DateTime<Utc>) -> Company {
        Company {
            id,
            name: self.name.trim().to_string(),
            tax_id: self.tax_id.map(|t| t.trim().to_string()),
            email: self.email.map(|e| e.trim().to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a company. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
}

impl CompanyPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(tax_id) = &self.tax_id {
            validate_tax_id(tax_id)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    pub fn apply(self, company: &mut Company, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            company.name = name.trim().to_string();
        }
        if let Some(tax_id) = self.tax_id {
            company.tax_id = Some(tax_id.trim().to_string());
        }
        if let Some(email) = self.email {
            company.email = Some(email.trim().to_string());
        }
        company.updated_at = now;
    }
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

fn validate_tax_id(tax_id: &str) -> DomainResult<()> {
    if tax_id.trim().len() > MAX_TAX_ID_LEN {
        return Err(DomainError::validation(format!(
            "tax_id cannot exceed {MAX_TAX_ID_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    let trimmed = email.trim();
    if trimmed.len() > MAX_EMAIL_LEN {
        return Err(DomainError::validation(format!(
            "email cannot exceed {MAX_EMAIL_LEN} characters"
        )));
    }
    // Intentionally shallow: real deliverability checks belong elsewhere.
    if !trimmed.contains('@') {
        return Err(DomainError::validation("email must contain '@'"));
    }
    Ok(())
}
