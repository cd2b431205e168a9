use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, DomainResult, Entity, InventoryId, VariantId};

use crate::validate;

/// Inventory variant: a specific SKU-level instance of an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryVariant {
    pub id: VariantId,
    pub company_id: CompanyId,
    pub inventory_id: InventoryId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for InventoryVariant {
    type Id = VariantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a variant. SKU is unique per company.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewVariant {
    pub inventory_id: InventoryId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
}

impl NewVariant {
    pub fn validate(&self) -> DomainResult<()> {
        validate::non_empty("sku", &self.sku)?;
        validate::max_len("sku", &self.sku, validate::MAX_CODE_LEN)?;
        validate::non_empty("name", &self.name)?;
        validate::max_len("name", &self.name, validate::MAX_NAME_LEN)?;
        if let Some(barcode) = &self.barcode {
            validate::max_len("barcode", barcode, validate::MAX_CODE_LEN)?;
        }
        Ok(())
    }

    pub fn into_variant(
        self,
        id: VariantId,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> InventoryVariant {
        InventoryVariant {
            id,
            company_id,
            inventory_id: self.inventory_id,
            sku: self.sku.trim().to_string(),
            name: self.name.trim().to_string(),
            description: self.description,
            barcode: self.barcode.map(|b| b.trim().to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a variant. `None` fields are left untouched.
///
/// The owning inventory is fixed at creation; moving a variant between
/// inventories is not an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VariantPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,
}

impl VariantPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(sku) = &self.sku {
            validate::non_empty("sku", sku)?;
            validate::max_len("sku", sku, validate::MAX_CODE_LEN)?;
        }
        if let Some(name) = &self.name {
            validate::non_empty("name", name)?;
            validate::max_len("name", name, validate::MAX_NAME_LEN)?;
        }
        if let Some(barcode) = &self.barcode {
            validate::max_len("barcode", barcode, validate::MAX_CODE_LEN)?;
        }
        Ok(())
    }

    pub fn apply(self, variant: &mut InventoryVariant, now: DateTime<Utc>) {
        if let Some(sku) = self.sku {
            variant.sku = sku.trim().to_string();
        }
        if let Some(name) = self.name {
            variant.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            variant.description = Some(description);
        }
        if let Some(barcode) = self.barcode {
            variant.barcode = Some(barcode.trim().to_string());
        }
        variant.updated_at = now;
    }
}
