//! Inventory service: inventories, storages, variants, lots.
//!
//! Every create checks its referenced rows first so the caller gets a 404 for
//! a dangling id instead of a foreign-key conflict.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use bodega_core::{CompanyId, InventoryId, LotId, StorageId, VariantId};
use bodega_inventory::{
    Inventory, InventoryPatch, InventoryVariant, LotPatch, NewInventory, NewLot, NewStorage,
    NewVariant, Storage, StoragePatch, VariantPatch,
};

use crate::page::Page;
use crate::services::error::ServiceError;
use crate::stores::traits::{CompanyStore, InventoryStore, LotFilter, LotRecord};

#[derive(Clone)]
pub struct InventoryService {
    store: Arc<dyn InventoryStore>,
    companies: Arc<dyn CompanyStore>,
}

impl InventoryService {
    pub fn new(store: Arc<dyn InventoryStore>, companies: Arc<dyn CompanyStore>) -> Self {
        Self { store, companies }
    }

    async fn ensure_company(&self, company_id: CompanyId) -> Result<(), ServiceError> {
        if !self.companies.exists(company_id).await? {
            return Err(ServiceError::NotFound("company"));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_inventory(
        &self,
        company_id: CompanyId,
        input: NewInventory,
    ) -> Result<Inventory, ServiceError> {
        self.ensure_company(company_id).await?;
        input.validate()?;
        let inventory = input.into_inventory(InventoryId::new(), company_id, Utc::now());
        self.store.insert_inventory(&inventory).await?;
        Ok(inventory)
    }

    pub async fn get_inventory(
        &self,
        company_id: CompanyId,
        id: InventoryId,
    ) -> Result<Inventory, ServiceError> {
        self.store
            .get_inventory(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("inventory"))
    }

    pub async fn list_inventories(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Inventory>, ServiceError> {
        Ok(self.store.list_inventories(company_id, page).await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, inventory_id = %id), err)]
    pub async fn update_inventory(
        &self,
        company_id: CompanyId,
        id: InventoryId,
        patch: InventoryPatch,
    ) -> Result<Inventory, ServiceError> {
        patch.validate()?;
        let mut inventory = self.get_inventory(company_id, id).await?;
        patch.apply(&mut inventory, Utc::now());
        self.store.update_inventory(&inventory).await?;
        Ok(inventory)
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_storage(
        &self,
        company_id: CompanyId,
        input: NewStorage,
    ) -> Result<Storage, ServiceError> {
        self.ensure_company(company_id).await?;
        input.validate()?;
        let storage = input.into_storage(StorageId::new(), company_id, Utc::now());
        self.store.insert_storage(&storage).await?;
        Ok(storage)
    }

    pub async fn get_storage(
        &self,
        company_id: CompanyId,
        id: StorageId,
    ) -> Result<Storage, ServiceError> {
        self.store
            .get_storage(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("storage"))
    }

    pub async fn list_storages(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Storage>, ServiceError> {
        Ok(self.store.list_storages(company_id, page).await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, storage_id = %id), err)]
    pub async fn update_storage(
        &self,
        company_id: CompanyId,
        id: StorageId,
        patch: StoragePatch,
    ) -> Result<Storage, ServiceError> {
        patch.validate()?;
        let mut storage = self.get_storage(company_id, id).await?;
        patch.apply(&mut storage, Utc::now());
        self.store.update_storage(&storage).await?;
        Ok(storage)
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_variant(
        &self,
        company_id: CompanyId,
        input: NewVariant,
    ) -> Result<InventoryVariant, ServiceError> {
        self.get_inventory(company_id, input.inventory_id).await?;
        input.validate()?;
        let variant = input.into_variant(VariantId::new(), company_id, Utc::now());
        self.store.insert_variant(&variant).await?;
        Ok(variant)
    }

    pub async fn get_variant(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<InventoryVariant, ServiceError> {
        self.store
            .get_variant(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("variant"))
    }

    pub async fn list_variants(
        &self,
        company_id: CompanyId,
        inventory_id: Option<InventoryId>,
        page: Page,
    ) -> Result<Vec<InventoryVariant>, ServiceError> {
        Ok(self
            .store
            .list_variants(company_id, inventory_id, page)
            .await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, variant_id = %id), err)]
    pub async fn update_variant(
        &self,
        company_id: CompanyId,
        id: VariantId,
        patch: VariantPatch,
    ) -> Result<InventoryVariant, ServiceError> {
        patch.validate()?;
        let mut variant = self.get_variant(company_id, id).await?;
        patch.apply(&mut variant, Utc::now());
        self.store.update_variant(&variant).await?;
        Ok(variant)
    }

    #[instrument(skip(self, input), fields(company_id = %company_id), err)]
    pub async fn create_lot(
        &self,
        company_id: CompanyId,
        input: NewLot,
    ) -> Result<LotRecord, ServiceError> {
        self.get_variant(company_id, input.variant_id).await?;
        let storage = self.get_storage(company_id, input.storage_id).await?;
        input.validate()?;
        let lot = input.into_lot(LotId::new(), company_id, Utc::now());
        self.store.insert_lot(&lot).await?;
        Ok(LotRecord {
            lot,
            storage_name: storage.name,
        })
    }

    pub async fn get_lot(
        &self,
        company_id: CompanyId,
        id: LotId,
    ) -> Result<LotRecord, ServiceError> {
        self.store
            .get_lot(company_id, id)
            .await?
            .ok_or(ServiceError::NotFound("lot"))
    }

    pub async fn list_lots(
        &self,
        company_id: CompanyId,
        filter: LotFilter,
        page: Page,
    ) -> Result<Vec<LotRecord>, ServiceError> {
        Ok(self.store.list_lots(company_id, filter, page).await?)
    }

    #[instrument(skip(self, patch), fields(company_id = %company_id, lot_id = %id), err)]
    pub async fn update_lot(
        &self,
        company_id: CompanyId,
        id: LotId,
        patch: LotPatch,
    ) -> Result<LotRecord, ServiceError> {
        patch.validate()?;
        let mut record = self.get_lot(company_id, id).await?;
        patch.apply(&mut record.lot, Utc::now())?;
        self.store.update_lot(&record.lot).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_company::NewCompany;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::services::company::CompanyService;
    use crate::stores::in_memory::{InMemoryCompanyStore, InMemoryInventoryStore};

    struct Fixture {
        companies: CompanyService,
        inventory: InventoryService,
    }

    fn fixture() -> Fixture {
        let company_store = Arc::new(InMemoryCompanyStore::new());
        let inventory_store = Arc::new(InMemoryInventoryStore::new());
        Fixture {
            companies: CompanyService::new(company_store.clone()),
            inventory: InventoryService::new(inventory_store, company_store),
        }
    }

    async fn seed_company(fx: &Fixture) -> CompanyId {
        fx.companies
            .create(NewCompany {
                name: "Acme".to_string(),
                tax_id: None,
                email: None,
            })
            .await
            .unwrap()
            .id
    }

    fn new_inventory(name: &str) -> NewInventory {
        NewInventory {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_inventory_requires_existing_company() {
        let fx = fixture();
        let err = fx
            .inventory
            .create_inventory(CompanyId::new(), new_inventory("Main"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("company"));
    }

    #[tokio::test]
    async fn duplicate_inventory_name_conflicts() {
        let fx = fixture();
        let company_id = seed_company(&fx).await;

        fx.inventory
            .create_inventory(company_id, new_inventory("Main"))
            .await
            .unwrap();
        let err = fx
            .inventory
            .create_inventory(company_id, new_inventory("Main"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn variant_creation_checks_inventory() {
        let fx = fixture();
        let company_id = seed_company(&fx).await;

        let err = fx
            .inventory
            .create_variant(
                company_id,
                NewVariant {
                    inventory_id: InventoryId::new(),
                    sku: "SKU-001".to_string(),
                    name: "Widget".to_string(),
                    description: None,
                    barcode: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("inventory"));
    }

    #[tokio::test]
    async fn list_variants_filters_by_inventory() {
        let fx = fixture();
        let company_id = seed_company(&fx).await;
        let inv_a = fx
            .inventory
            .create_inventory(company_id, new_inventory("A"))
            .await
            .unwrap();
        let inv_b = fx
            .inventory
            .create_inventory(company_id, new_inventory("B"))
            .await
            .unwrap();

        for (i, inv) in [&inv_a, &inv_a, &inv_b].iter().enumerate() {
            fx.inventory
                .create_variant(
                    company_id,
                    NewVariant {
                        inventory_id: inv.id,
                        sku: format!("SKU-{i}"),
                        name: format!("Widget {i}"),
                        description: None,
                        barcode: None,
                    },
                )
                .await
                .unwrap();
        }

        let all = fx
            .inventory
            .list_variants(company_id, None, Page::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let only_a = fx
            .inventory
            .list_variants(company_id, Some(inv_a.id), Page::default())
            .await
            .unwrap();
        assert_eq!(only_a.len(), 2);
    }

    #[tokio::test]
    async fn lot_creation_checks_variant_and_storage_and_joins_name() {
        let fx = fixture();
        let company_id = seed_company(&fx).await;
        let inventory = fx
            .inventory
            .create_inventory(company_id, new_inventory("Main"))
            .await
            .unwrap();
        let variant = fx
            .inventory
            .create_variant(
                company_id,
                NewVariant {
                    inventory_id: inventory.id,
                    sku: "SKU-001".to_string(),
                    name: "Widget".to_string(),
                    description: None,
                    barcode: None,
                },
            )
            .await
            .unwrap();

        let missing_storage = fx
            .inventory
            .create_lot(
                company_id,
                NewLot {
                    variant_id: variant.id,
                    storage_id: StorageId::new(),
                    lot_number: "LOT-1".to_string(),
                    quantity: Decimal::from(10),
                    unit_cost: Decimal::ONE,
                    manufactured_on: None,
                    expires_on: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(missing_storage, ServiceError::NotFound("storage"));

        let storage = fx
            .inventory
            .create_storage(
                company_id,
                NewStorage {
                    name: "Dock A".to_string(),
                    code: None,
                    address: None,
                },
            )
            .await
            .unwrap();

        let record = fx
            .inventory
            .create_lot(
                company_id,
                NewLot {
                    variant_id: variant.id,
                    storage_id: storage.id,
                    lot_number: "LOT-1".to_string(),
                    quantity: Decimal::from(10),
                    unit_cost: Decimal::ONE,
                    manufactured_on: NaiveDate::from_ymd_opt(2026, 1, 1),
                    expires_on: NaiveDate::from_ymd_opt(2027, 1, 1),
                },
            )
            .await
            .unwrap();
        assert_eq!(record.storage_name, "Dock A");

        let listed = fx
            .inventory
            .list_lots(
                company_id,
                LotFilter {
                    variant_id: Some(variant.id),
                    storage_id: None,
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(listed, vec![record]);
    }

    #[tokio::test]
    async fn lot_patch_cannot_invert_dates() {
        let fx = fixture();
        let company_id = seed_company(&fx).await;
        let inventory = fx
            .inventory
            .create_inventory(company_id, new_inventory("Main"))
            .await
            .unwrap();
        let variant = fx
            .inventory
            .create_variant(
                company_id,
                NewVariant {
                    inventory_id: inventory.id,
                    sku: "SKU-001".to_string(),
                    name: "Widget".to_string(),
                    description: None,
                    barcode: None,
                },
            )
            .await
            .unwrap();
        let storage = fx
            .inventory
            .create_storage(
                company_id,
                NewStorage {
                    name: "Dock A".to_string(),
                    code: None,
                    address: None,
                },
            )
            .await
            .unwrap();
        let record = fx
            .inventory
            .create_lot(
                company_id,
                NewLot {
                    variant_id: variant.id,
                    storage_id: storage.id,
                    lot_number: "LOT-1".to_string(),
                    quantity: Decimal::from(10),
                    unit_cost: Decimal::ONE,
                    manufactured_on: NaiveDate::from_ymd_opt(2026, 1, 1),
                    expires_on: NaiveDate::from_ymd_opt(2027, 1, 1),
                },
            )
            .await
            .unwrap();

        let err = fx
            .inventory
            .update_lot(
                company_id,
                record.lot.id,
                LotPatch {
                    manufactured_on: NaiveDate::from_ymd_opt(2028, 1, 1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn cross_company_rows_are_invisible() {
        let fx = fixture();
        let company_a = seed_company(&fx).await;
        let company_b = fx
            .companies
            .create(NewCompany {
                name: "Globex".to_string(),
                tax_id: None,
                email: None,
            })
            .await
            .unwrap()
            .id;

        let inventory = fx
            .inventory
            .create_inventory(company_a, new_inventory("Main"))
            .await
            .unwrap();

        let err = fx
            .inventory
            .get_inventory(company_b, inventory.id)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound("inventory"));
    }
}
