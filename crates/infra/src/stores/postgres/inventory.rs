//! Postgres-backed inventory store (inventories, storages, variants, lots).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use bodega_core::{CompanyId, InventoryId, LotId, StorageId, VariantId};
use bodega_inventory::{Inventory, InventoryVariant, Lot, Storage};

use super::{decode_error, map_sqlx_error};
use crate::page::Page;
use crate::stores::error::StoreError;
use crate::stores::traits::{InventoryStore, LotFilter, LotRecord};

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self, inventory), fields(company_id = %inventory.company_id, inventory_id = %inventory.id), err)]
    async fn insert_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventories (id, company_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(inventory.id.as_uuid())
        .bind(inventory.company_id.as_uuid())
        .bind(&inventory.name)
        .bind(&inventory.description)
        .bind(inventory.created_at)
        .bind(inventory.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_inventory", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, inventory_id = %id), err)]
    async fn get_inventory(
        &self,
        company_id: CompanyId,
        id: InventoryId,
    ) -> Result<Option<Inventory>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, name, description, created_at, updated_at
            FROM inventories
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_inventory", e))?;

        row.map(|r| {
            InventoryRow::from_row(&r)
                .map(Inventory::from)
                .map_err(|e| decode_error("get_inventory", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn list_inventories(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Inventory>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, description, created_at, updated_at
            FROM inventories
            WHERE company_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventories", e))?;

        rows.iter()
            .map(|r| {
                InventoryRow::from_row(r)
                    .map(Inventory::from)
                    .map_err(|e| decode_error("list_inventories", e))
            })
            .collect()
    }

    #[instrument(skip(self, inventory), fields(company_id = %inventory.company_id, inventory_id = %inventory.id), err)]
    async fn update_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE inventories
            SET name = $3, description = $4, updated_at = $5
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(inventory.company_id.as_uuid())
        .bind(inventory.id.as_uuid())
        .bind(&inventory.name)
        .bind(&inventory.description)
        .bind(inventory.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_inventory", e))?;
        Ok(())
    }

    #[instrument(skip(self, storage), fields(company_id = %storage.company_id, storage_id = %storage.id), err)]
    async fn insert_storage(&self, storage: &Storage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO storages (id, company_id, name, code, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(storage.id.as_uuid())
        .bind(storage.company_id.as_uuid())
        .bind(&storage.name)
        .bind(&storage.code)
        .bind(&storage.address)
        .bind(storage.created_at)
        .bind(storage.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_storage", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, storage_id = %id), err)]
    async fn get_storage(
        &self,
        company_id: CompanyId,
        id: StorageId,
    ) -> Result<Option<Storage>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, name, code, address, created_at, updated_at
            FROM storages
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_storage", e))?;

        row.map(|r| {
            StorageRow::from_row(&r)
                .map(Storage::from)
                .map_err(|e| decode_error("get_storage", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn list_storages(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Storage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, code, address, created_at, updated_at
            FROM storages
            WHERE company_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_storages", e))?;

        rows.iter()
            .map(|r| {
                StorageRow::from_row(r)
                    .map(Storage::from)
                    .map_err(|e| decode_error("list_storages", e))
            })
            .collect()
    }

    #[instrument(skip(self, storage), fields(company_id = %storage.company_id, storage_id = %storage.id), err)]
    async fn update_storage(&self, storage: &Storage) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE storages
            SET name = $3, code = $4, address = $5, updated_at = $6
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(storage.company_id.as_uuid())
        .bind(storage.id.as_uuid())
        .bind(&storage.name)
        .bind(&storage.code)
        .bind(&storage.address)
        .bind(storage.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_storage", e))?;
        Ok(())
    }

    #[instrument(skip(self, variant), fields(company_id = %variant.company_id, variant_id = %variant.id), err)]
    async fn insert_variant(&self, variant: &InventoryVariant) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory_variants
                (id, company_id, inventory_id, sku, name, description, barcode, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(variant.id.as_uuid())
        .bind(variant.company_id.as_uuid())
        .bind(variant.inventory_id.as_uuid())
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(&variant.description)
        .bind(&variant.barcode)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_variant", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, variant_id = %id), err)]
    async fn get_variant(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<Option<InventoryVariant>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, inventory_id, sku, name, description, barcode, created_at, updated_at
            FROM inventory_variants
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_variant", e))?;

        row.map(|r| {
            VariantRow::from_row(&r)
                .map(InventoryVariant::from)
                .map_err(|e| decode_error("get_variant", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id, inventory_id = ?inventory_id), err)]
    async fn list_variants(
        &self,
        company_id: CompanyId,
        inventory_id: Option<InventoryId>,
        page: Page,
    ) -> Result<Vec<InventoryVariant>, StoreError> {
        let inventory_param: Option<uuid::Uuid> = inventory_id.map(|i| *i.as_uuid());
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, inventory_id, sku, name, description, barcode, created_at, updated_at
            FROM inventory_variants
            WHERE company_id = $1
                AND ($2::uuid IS NULL OR inventory_id = $2)
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(inventory_param)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_variants", e))?;

        rows.iter()
            .map(|r| {
                VariantRow::from_row(r)
                    .map(InventoryVariant::from)
                    .map_err(|e| decode_error("list_variants", e))
            })
            .collect()
    }

    #[instrument(skip(self, variant), fields(company_id = %variant.company_id, variant_id = %variant.id), err)]
    async fn update_variant(&self, variant: &InventoryVariant) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE inventory_variants
            SET sku = $3, name = $4, description = $5, barcode = $6, updated_at = $7
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(variant.company_id.as_uuid())
        .bind(variant.id.as_uuid())
        .bind(&variant.sku)
        .bind(&variant.name)
        .bind(&variant.description)
        .bind(&variant.barcode)
        .bind(variant.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_variant", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, variant_id = %id), err)]
    async fn variant_exists(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM inventory_variants WHERE company_id = $1 AND id = $2) AS present",
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("variant_exists", e))?;

        row.try_get("present")
            .map_err(|e| decode_error("variant_exists", e))
    }

    #[instrument(skip(self, lot), fields(company_id = %lot.company_id, lot_id = %lot.id), err)]
    async fn insert_lot(&self, lot: &Lot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO lots
                (id, company_id, variant_id, storage_id, lot_number, quantity, unit_cost,
                 manufactured_on, expires_on, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(lot.id.as_uuid())
        .bind(lot.company_id.as_uuid())
        .bind(lot.variant_id.as_uuid())
        .bind(lot.storage_id.as_uuid())
        .bind(&lot.lot_number)
        .bind(lot.quantity)
        .bind(lot.unit_cost)
        .bind(lot.manufactured_on)
        .bind(lot.expires_on)
        .bind(lot.created_at)
        .bind(lot.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_lot", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, lot_id = %id), err)]
    async fn get_lot(
        &self,
        company_id: CompanyId,
        id: LotId,
    ) -> Result<Option<LotRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT l.id, l.company_id, l.variant_id, l.storage_id, l.lot_number,
                   l.quantity, l.unit_cost, l.manufactured_on, l.expires_on,
                   l.created_at, l.updated_at,
                   s.name AS storage_name
            FROM lots l
            JOIN storages s ON s.company_id = l.company_id AND s.id = l.storage_id
            WHERE l.company_id = $1 AND l.id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_lot", e))?;

        row.map(|r| {
            LotRow::from_row(&r)
                .map(LotRecord::from)
                .map_err(|e| decode_error("get_lot", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id, filter = ?filter), err)]
    async fn list_lots(
        &self,
        company_id: CompanyId,
        filter: LotFilter,
        page: Page,
    ) -> Result<Vec<LotRecord>, StoreError> {
        let variant_param: Option<uuid::Uuid> = filter.variant_id.map(|v| *v.as_uuid());
        let storage_param: Option<uuid::Uuid> = filter.storage_id.map(|s| *s.as_uuid());
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.company_id, l.variant_id, l.storage_id, l.lot_number,
                   l.quantity, l.unit_cost, l.manufactured_on, l.expires_on,
                   l.created_at, l.updated_at,
                   s.name AS storage_name
            FROM lots l
            JOIN storages s ON s.company_id = l.company_id AND s.id = l.storage_id
            WHERE l.company_id = $1
                AND ($2::uuid IS NULL OR l.variant_id = $2)
                AND ($3::uuid IS NULL OR l.storage_id = $3)
            ORDER BY l.id
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(variant_param)
        .bind(storage_param)
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_lots", e))?;

        rows.iter()
            .map(|r| {
                LotRow::from_row(r)
                    .map(LotRecord::from)
                    .map_err(|e| decode_error("list_lots", e))
            })
            .collect()
    }

    #[instrument(skip(self, lot), fields(company_id = %lot.company_id, lot_id = %lot.id), err)]
    async fn update_lot(&self, lot: &Lot) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE lots
            SET lot_number = $3, quantity = $4, unit_cost = $5,
                manufactured_on = $6, expires_on = $7, updated_at = $8
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(lot.company_id.as_uuid())
        .bind(lot.id.as_uuid())
        .bind(&lot.lot_number)
        .bind(lot.quantity)
        .bind(lot.unit_cost)
        .bind(lot.manufactured_on)
        .bind(lot.expires_on)
        .bind(lot.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_lot", e))?;
        Ok(())
    }
}

// SQLx row types

#[derive(Debug)]
struct InventoryRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for InventoryRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(InventoryRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<InventoryRow> for Inventory {
    fn from(row: InventoryRow) -> Self {
        Inventory {
            id: InventoryId::from_uuid(row.id),
            company_id: CompanyId::from_uuid(row.company_id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct StorageRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    name: String,
    code: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for StorageRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StorageRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<StorageRow> for Storage {
    fn from(row: StorageRow) -> Self {
        Storage {
            id: StorageId::from_uuid(row.id),
            company_id: CompanyId::from_uuid(row.company_id),
            name: row.name,
            code: row.code,
            address: row.address,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct VariantRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    inventory_id: uuid::Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    barcode: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for VariantRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(VariantRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            inventory_id: row.try_get("inventory_id")?,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            barcode: row.try_get("barcode")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<VariantRow> for InventoryVariant {
    fn from(row: VariantRow) -> Self {
        InventoryVariant {
            id: VariantId::from_uuid(row.id),
            company_id: CompanyId::from_uuid(row.company_id),
            inventory_id: InventoryId::from_uuid(row.inventory_id),
            sku: row.sku,
            name: row.name,
            description: row.description,
            barcode: row.barcode,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct LotRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    variant_id: uuid::Uuid,
    storage_id: uuid::Uuid,
    lot_number: String,
    quantity: Decimal,
    unit_cost: Decimal,
    manufactured_on: Option<NaiveDate>,
    expires_on: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    storage_name: String,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for LotRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(LotRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            variant_id: row.try_get("variant_id")?,
            storage_id: row.try_get("storage_id")?,
            lot_number: row.try_get("lot_number")?,
            quantity: row.try_get("quantity")?,
            unit_cost: row.try_get("unit_cost")?,
            manufactured_on: row.try_get("manufactured_on")?,
            expires_on: row.try_get("expires_on")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            storage_name: row.try_get("storage_name")?,
        })
    }
}

impl From<LotRow> for LotRecord {
    fn from(row: LotRow) -> Self {
        LotRecord {
            lot: Lot {
                id: LotId::from_uuid(row.id),
                company_id: CompanyId::from_uuid(row.company_id),
                variant_id: VariantId::from_uuid(row.variant_id),
                storage_id: StorageId::from_uuid(row.storage_id),
                lot_number: row.lot_number,
                quantity: row.quantity,
                unit_cost: row.unit_cost,
                manufactured_on: row.manufactured_on,
                expires_on: row.expires_on,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            storage_name: row.storage_name,
        }
    }
}
