use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, DomainResult, Entity, InventoryId};

use crate::validate;

/// Inventory: a named grouping of variants within a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub company_id: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Inventory {
    type Id = InventoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating an inventory. Name is unique per company.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewInventory {
    pub name: String,
    pub description: Option<String>,
}

impl NewInventory {
    pub fn validate(&self) -> DomainResult<()> {
        validate::non_empty("name", &self.name)?;
        validate::max_len("name", &self.name, validate::MAX_NAME_LEN)?;
        Ok(())
    }

    pub fn into_inventory(
        self,
        id: InventoryId,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> Inventory {
        Inventory {
            id,
            company_id,
            name: self.name.trim().to_string(),
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an inventory. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InventoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl InventoryPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.name {
            validate::non_empty("name", name)?;
            validate::max_len("name", name, validate::MAX_NAME_LEN)?;
        }
        Ok(())
    }

    pub fn apply(self, inventory: &mut Inventory, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            inventory.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            inventory.description = Some(description);
        }
        inventory.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_core::DomainError;

    #[test]
    fn new_inventory_trims_name() {
        let input = NewInventory {
            name: "  Main warehouse stock  ".to_string(),
            description: None,
        };
        input.validate().unwrap();
        let inv = input.into_inventory(InventoryId::new(), CompanyId::new(), Utc::now());
        assert_eq!(inv.name, "Main warehouse stock");
    }

    #[test]
    fn new_inventory_rejects_blank_name() {
        let input = NewInventory {
            name: "   ".to_string(),
            description: None,
        };
        assert!(matches!(
            input.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn patch_keeps_description_when_absent() {
        let input = NewInventory {
            name: "Main".to_string(),
            description: Some("primary".to_string()),
        };
        let mut inv = input.into_inventory(InventoryId::new(), CompanyId::new(), Utc::now());

        InventoryPatch {
            name: Some("Secondary".to_string()),
            description: None,
        }
        .apply(&mut inv, Utc::now());

        assert_eq!(inv.name, "Secondary");
        assert_eq!(inv.description.as_deref(), Some("primary"));
    }
}
