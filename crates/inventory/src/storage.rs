use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, DomainResult, Entity, StorageId};

use crate::validate;

/// Storage: a physical or logical location holding stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub id: StorageId,
    pub company_id: CompanyId,
    pub name: String,
    pub code: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Storage {
    type Id = StorageId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a storage. Name is unique per company.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewStorage {
    pub name: String,
    pub code: Option<String>,
    pub address: Option<String>,
}

impl NewStorage {
    pub fn validate(&self) -> DomainResult<()> {
        validate::non_empty("name", &self.name)?;
        validate::max_len("name", &self.name, validate::MAX_NAME_LEN)?;
        if let Some(code) = &self.code {
            validate::max_len("code", code, validate::MAX_CODE_LEN)?;
        }
        Ok(())
    }

    pub fn into_storage(self, id: StorageId, company_id: CompanyId, now: DateTime<Utc>) -> Storage {
        Storage {
            id,
            company_id,
            name: self.name.trim().to_string(),
            code: self.code.map(|c| c.trim().to_string()),
            address: self.address,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a storage. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoragePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub address: Option<String>,
}

impl StoragePatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate::non_empty("name", name)?;
            validate::max_len("name", name, validate::MAX_NAME_LEN)?;
        }
        if let Some(code) = &self.code {
            validate::max_len("code", code, validate::MAX_CODE_LEN)?;
        }
        Ok(())
    }

    pub fn apply(self, storage: &mut Storage, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            storage.name = name.trim().to_string();
        }
        if let Some(code) = self.code {
            storage.code = Some(code.trim().to_string());
        }
        if let Some(address) = self.address {
            storage.address = Some(address);
        }
        storage.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_storage_accepts_minimal_input() {
        let input = NewStorage {
            name: "Dock A".to_string(),
            code: None,
            address: None,
        };
        input.validate().unwrap();
        let storage = input.into_storage(StorageId::new(), CompanyId::new(), Utc::now());
        assert_eq!(storage.name, "Dock A");
        assert!(storage.code.is_none());
    }

    #[test]
    fn new_storage_rejects_oversized_code() {
        let input = NewStorage {
            name: "Dock A".to_string(),
            code: Some("X".repeat(100)),
            address: None,
        };
        assert!(input.validate().is_err());
    }
}
