//! Object-safe store traits, one per bounded context.
//!
//! Every method except the `companies` table takes a `CompanyId` and filters
//! by it; cross-company access is architecturally impossible. Methods that
//! maintain an invariant (current price, base currency) are single trait
//! calls so each backend can run them in one transaction.

use async_trait::async_trait;

use bodega_company::Company;
use bodega_core::{CompanyId, CurrencyId, ExchangeId, InventoryId, LotId, PriceId, StorageId, TaxId, VariantId};
use bodega_currency::{Currency, CurrencyExchange};
use bodega_inventory::{Inventory, InventoryVariant, Lot, Storage};
use bodega_pricing::{Price, Tax};

use crate::page::Page;
use crate::stores::error::StoreError;

/// Lot plus the storage name pulled in by a shallow join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotRecord {
    pub lot: Lot,
    pub storage_name: String,
}

/// Optional filters for lot listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LotFilter {
    pub variant_id: Option<VariantId>,
    pub storage_id: Option<StorageId>,
}

/// Price plus the currency code pulled in by a shallow join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub price: Price,
    pub currency_code: String,
}

/// Exchange plus the currency code pulled in by a shallow join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRecord {
    pub exchange: CurrencyExchange,
    pub currency_code: String,
}

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn insert(&self, company: &Company) -> Result<(), StoreError>;
    async fn get(&self, id: CompanyId) -> Result<Option<Company>, StoreError>;
    async fn update(&self, company: &Company) -> Result<(), StoreError>;
    async fn exists(&self, id: CompanyId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn insert_inventory(&self, inventory: &Inventory) -> Result<(), StoreError>;
    async fn get_inventory(
        &self,
        company_id: CompanyId,
        id: InventoryId,
    ) -> Result<Option<Inventory>, StoreError>;
    async fn list_inventories(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Inventory>, StoreError>;
    async fn update_inventory(&self, inventory: &Inventory) -> Result<(), StoreError>;

    async fn insert_storage(&self, storage: &Storage) -> Result<(), StoreError>;
    async fn get_storage(
        &self,
        company_id: CompanyId,
        id: StorageId,
    ) -> Result<Option<Storage>, StoreError>;
    async fn list_storages(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Storage>, StoreError>;
    async fn update_storage(&self, storage: &Storage) -> Result<(), StoreError>;

    async fn insert_variant(&self, variant: &InventoryVariant) -> Result<(), StoreError>;
    async fn get_variant(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<Option<InventoryVariant>, StoreError>;
    async fn list_variants(
        &self,
        company_id: CompanyId,
        inventory_id: Option<InventoryId>,
        page: Page,
    ) -> Result<Vec<InventoryVariant>, StoreError>;
    async fn update_variant(&self, variant: &InventoryVariant) -> Result<(), StoreError>;
    async fn variant_exists(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<bool, StoreError>;

    async fn insert_lot(&self, lot: &Lot) -> Result<(), StoreError>;
    async fn get_lot(
        &self,
        company_id: CompanyId,
        id: LotId,
    ) -> Result<Option<LotRecord>, StoreError>;
    async fn list_lots(
        &self,
        company_id: CompanyId,
        filter: LotFilter,
        page: Page,
    ) -> Result<Vec<LotRecord>, StoreError>;
    async fn update_lot(&self, lot: &Lot) -> Result<(), StoreError>;
}

#[async_trait]
pub trait PricingStore: Send + Sync {
    /// Insert a price. When `price.is_current` is set, the previous current
    /// price of the same (variant, kind) is demoted in the same transaction.
    async fn insert_price(&self, price: &Price) -> Result<(), StoreError>;
    async fn get_price(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Option<Price>, StoreError>;
    async fn list_prices_for_variant(
        &self,
        company_id: CompanyId,
        variant_id: VariantId,
        page: Page,
    ) -> Result<Vec<PriceRecord>, StoreError>;
    async fn update_price(&self, price: &Price) -> Result<(), StoreError>;
    /// Make a price the current one for its (variant, kind), demoting any
    /// sibling in the same transaction. Idempotent when already current.
    /// Returns `None` when the price does not exist.
    async fn set_current(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Option<Price>, StoreError>;

    async fn insert_tax(&self, tax: &Tax) -> Result<(), StoreError>;
    async fn get_tax(&self, company_id: CompanyId, id: TaxId) -> Result<Option<Tax>, StoreError>;
    async fn list_taxes(&self, company_id: CompanyId, page: Page) -> Result<Vec<Tax>, StoreError>;
    async fn update_tax(&self, tax: &Tax) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CurrencyStore: Send + Sync {
    async fn insert_currency(&self, currency: &Currency) -> Result<(), StoreError>;
    async fn get_currency(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Option<Currency>, StoreError>;
    async fn list_currencies(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Currency>, StoreError>;
    async fn update_currency(&self, currency: &Currency) -> Result<(), StoreError>;
    async fn has_currencies(&self, company_id: CompanyId) -> Result<bool, StoreError>;
    /// Make a currency the base, clearing the flag on the previous base and
    /// dropping a now-meaningless exchange configured for it, in one
    /// transaction. Idempotent when already base. Returns `None` when the
    /// currency does not exist.
    async fn set_base(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Option<Currency>, StoreError>;

    async fn insert_exchange(&self, exchange: &CurrencyExchange) -> Result<(), StoreError>;
    async fn get_exchange(
        &self,
        company_id: CompanyId,
        id: ExchangeId,
    ) -> Result<Option<ExchangeRecord>, StoreError>;
    async fn list_exchanges(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<ExchangeRecord>, StoreError>;
    async fn update_exchange(&self, exchange: &CurrencyExchange) -> Result<(), StoreError>;
    async fn exchange_for_currency(
        &self,
        company_id: CompanyId,
        currency_id: CurrencyId,
    ) -> Result<Option<CurrencyExchange>, StoreError>;
}
