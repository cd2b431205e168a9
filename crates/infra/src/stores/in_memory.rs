//! In-memory store backends for dev/test.
//!
//! Same shape as the Postgres backends: company-keyed maps, uniqueness rules
//! enforced on insert, invariant routines holding their write locks end to
//! end so they are atomic like their transactional counterparts.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use bodega_company::Company;
use bodega_core::{CompanyId, CurrencyId, ExchangeId, InventoryId, LotId, PriceId, StorageId, TaxId, VariantId};
use bodega_currency::{Currency, CurrencyExchange};
use bodega_inventory::{Inventory, InventoryVariant, Lot, Storage};
use bodega_pricing::{Price, Tax};
use chrono::Utc;

use crate::page::Page;
use crate::stores::error::StoreError;
use crate::stores::traits::{
    CompanyStore, CurrencyStore, ExchangeRecord, InventoryStore, LotFilter, LotRecord,
    PriceRecord, PricingStore,
};

/// Company-keyed map. A poisoned lock yields the inner data; writers never
/// leave partial state behind a panic here.
#[derive(Debug)]
struct CompanyKeyed<K, V> {
    inner: RwLock<HashMap<(CompanyId, K), V>>,
}

impl<K, V> Default for CompanyKeyed<K, V> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Clone + Eq + Hash, V: Clone> CompanyKeyed<K, V> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<(CompanyId, K), V>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<(CompanyId, K), V>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, company_id: CompanyId, key: &K) -> Option<V> {
        self.read().get(&(company_id, key.clone())).cloned()
    }

    fn insert(&self, company_id: CompanyId, key: K, value: V) {
        self.write().insert((company_id, key), value);
    }

    fn for_company(&self, company_id: CompanyId) -> Vec<V> {
        self.read()
            .iter()
            .filter_map(|((c, _), v)| (*c == company_id).then(|| v.clone()))
            .collect()
    }
}

fn paginate<T, K: Ord>(mut rows: Vec<T>, page: Page, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(key);
    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    inner: RwLock<HashMap<CompanyId, Company>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CompanyId, Company>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn insert(&self, company: &Company) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&company.id) {
            return Err(StoreError::Conflict(format!(
                "company {} already exists",
                company.id
            )));
        }
        map.insert(company.id, company.clone());
        Ok(())
    }

    async fn get(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        Ok(self.read().get(&id).cloned())
    }

    async fn update(&self, company: &Company) -> Result<(), StoreError> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(company.id, company.clone());
        Ok(())
    }

    async fn exists(&self, id: CompanyId) -> Result<bool, StoreError> {
        Ok(self.read().contains_key(&id))
    }
}

// ---------------------------------------------------------------------------
// Inventory context
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    inventories: CompanyKeyed<InventoryId, Inventory>,
    storages: CompanyKeyed<StorageId, Storage>,
    variants: CompanyKeyed<VariantId, InventoryVariant>,
    lots: CompanyKeyed<LotId, Lot>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self {
            inventories: CompanyKeyed::new(),
            storages: CompanyKeyed::new(),
            variants: CompanyKeyed::new(),
            lots: CompanyKeyed::new(),
        }
    }

    fn lot_record(&self, lot: Lot) -> Result<LotRecord, StoreError> {
        let storage = self
            .storages
            .get(lot.company_id, &lot.storage_id)
            .ok_or_else(|| {
                StoreError::MissingReference(format!("storage {} for lot {}", lot.storage_id, lot.id))
            })?;
        Ok(LotRecord {
            lot,
            storage_name: storage.name,
        })
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        let mut map = self.inventories.write();
        let duplicate = map
            .iter()
            .any(|((c, _), v)| *c == inventory.company_id && v.name == inventory.name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "inventory name '{}' already exists",
                inventory.name
            )));
        }
        map.insert((inventory.company_id, inventory.id), inventory.clone());
        Ok(())
    }

    async fn get_inventory(
        &self,
        company_id: CompanyId,
        id: InventoryId,
    ) -> Result<Option<Inventory>, StoreError> {
        Ok(self.inventories.get(company_id, &id))
    }

    async fn list_inventories(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Inventory>, StoreError> {
        Ok(paginate(self.inventories.for_company(company_id), page, |i| {
            *i.id.as_uuid()
        }))
    }

    async fn update_inventory(&self, inventory: &Inventory) -> Result<(), StoreError> {
        let mut map = self.inventories.write();
        let duplicate = map.iter().any(|((c, id), v)| {
            *c == inventory.company_id && *id != inventory.id && v.name == inventory.name
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "inventory name '{}' already exists",
                inventory.name
            )));
        }
        map.insert((inventory.company_id, inventory.id), inventory.clone());
        Ok(())
    }

    async fn insert_storage(&self, storage: &Storage) -> Result<(), StoreError> {
        let mut map = self.storages.write();
        let duplicate = map
            .iter()
            .any(|((c, _), v)| *c == storage.company_id && v.name == storage.name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "storage name '{}' already exists",
                storage.name
            )));
        }
        map.insert((storage.company_id, storage.id), storage.clone());
        Ok(())
    }

    async fn get_storage(
        &self,
        company_id: CompanyId,
        id: StorageId,
    ) -> Result<Option<Storage>, StoreError> {
        Ok(self.storages.get(company_id, &id))
    }

    async fn list_storages(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Storage>, StoreError> {
        Ok(paginate(self.storages.for_company(company_id), page, |s| {
            *s.id.as_uuid()
        }))
    }

    async fn update_storage(&self, storage: &Storage) -> Result<(), StoreError> {
        let mut map = self.storages.write();
        let duplicate = map.iter().any(|((c, id), v)| {
            *c == storage.company_id && *id != storage.id && v.name == storage.name
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "storage name '{}' already exists",
                storage.name
            )));
        }
        map.insert((storage.company_id, storage.id), storage.clone());
        Ok(())
    }

    async fn insert_variant(&self, variant: &InventoryVariant) -> Result<(), StoreError> {
        let mut map = self.variants.write();
        let duplicate = map
            .iter()
            .any(|((c, _), v)| *c == variant.company_id && v.sku == variant.sku);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "sku '{}' already exists",
                variant.sku
            )));
        }
        map.insert((variant.company_id, variant.id), variant.clone());
        Ok(())
    }

    async fn get_variant(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<Option<InventoryVariant>, StoreError> {
        Ok(self.variants.get(company_id, &id))
    }

    async fn list_variants(
        &self,
        company_id: CompanyId,
        inventory_id: Option<InventoryId>,
        page: Page,
    ) -> Result<Vec<InventoryVariant>, StoreError> {
        let rows = self
            .variants
            .for_company(company_id)
            .into_iter()
            .filter(|v| inventory_id.is_none_or(|i| v.inventory_id == i))
            .collect();
        Ok(paginate(rows, page, |v| *v.id.as_uuid()))
    }

    async fn update_variant(&self, variant: &InventoryVariant) -> Result<(), StoreError> {
        let mut map = self.variants.write();
        let duplicate = map.iter().any(|((c, id), v)| {
            *c == variant.company_id && *id != variant.id && v.sku == variant.sku
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "sku '{}' already exists",
                variant.sku
            )));
        }
        map.insert((variant.company_id, variant.id), variant.clone());
        Ok(())
    }

    async fn variant_exists(
        &self,
        company_id: CompanyId,
        id: VariantId,
    ) -> Result<bool, StoreError> {
        Ok(self.variants.get(company_id, &id).is_some())
    }

    async fn insert_lot(&self, lot: &Lot) -> Result<(), StoreError> {
        let mut map = self.lots.write();
        let duplicate = map.iter().any(|((c, _), l)| {
            *c == lot.company_id
                && l.variant_id == lot.variant_id
                && l.storage_id == lot.storage_id
                && l.lot_number == lot.lot_number
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "lot number '{}' already exists for this variant and storage",
                lot.lot_number
            )));
        }
        map.insert((lot.company_id, lot.id), lot.clone());
        Ok(())
    }

    async fn get_lot(
        &self,
        company_id: CompanyId,
        id: LotId,
    ) -> Result<Option<LotRecord>, StoreError> {
        match self.lots.get(company_id, &id) {
            Some(lot) => Ok(Some(self.lot_record(lot)?)),
            None => Ok(None),
        }
    }

    async fn list_lots(
        &self,
        company_id: CompanyId,
        filter: LotFilter,
        page: Page,
    ) -> Result<Vec<LotRecord>, StoreError> {
        let rows: Vec<Lot> = self
            .lots
            .for_company(company_id)
            .into_iter()
            .filter(|l| filter.variant_id.is_none_or(|v| l.variant_id == v))
            .filter(|l| filter.storage_id.is_none_or(|s| l.storage_id == s))
            .collect();
        paginate(rows, page, |l| *l.id.as_uuid())
            .into_iter()
            .map(|lot| self.lot_record(lot))
            .collect()
    }

    async fn update_lot(&self, lot: &Lot) -> Result<(), StoreError> {
        let mut map = self.lots.write();
        let duplicate = map.iter().any(|((c, id), l)| {
            *c == lot.company_id
                && *id != lot.id
                && l.variant_id == lot.variant_id
                && l.storage_id == lot.storage_id
                && l.lot_number == lot.lot_number
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "lot number '{}' already exists for this variant and storage",
                lot.lot_number
            )));
        }
        map.insert((lot.company_id, lot.id), lot.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pricing context
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct InMemoryPricingStore {
    prices: CompanyKeyed<PriceId, Price>,
    taxes: CompanyKeyed<TaxId, Tax>,
    /// Shared currency store, so price listings can join live currency codes
    /// the way the Postgres backend joins the currencies table.
    currencies: Arc<InMemoryCurrencyStore>,
}

impl InMemoryPricingStore {
    pub fn new(currencies: Arc<InMemoryCurrencyStore>) -> Self {
        Self {
            prices: CompanyKeyed::new(),
            taxes: CompanyKeyed::new(),
            currencies,
        }
    }

    fn price_record(&self, price: Price) -> PriceRecord {
        let currency_code = self
            .currencies
            .currencies
            .get(price.company_id, &price.currency_id)
            .map(|c| c.code)
            .unwrap_or_default();
        PriceRecord {
            price,
            currency_code,
        }
    }
}

#[async_trait]
impl PricingStore for InMemoryPricingStore {
    async fn insert_price(&self, price: &Price) -> Result<(), StoreError> {
        let mut map = self.prices.write();
        if price.is_current {
            // Demote the previous current sibling atomically, like the
            // Postgres transaction does.
            for ((c, _), p) in map.iter_mut() {
                if *c == price.company_id
                    && p.variant_id == price.variant_id
                    && p.kind == price.kind
                    && p.is_current
                {
                    p.is_current = false;
                    p.updated_at = Utc::now();
                }
            }
        }
        map.insert((price.company_id, price.id), price.clone());
        Ok(())
    }

    async fn get_price(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Option<Price>, StoreError> {
        Ok(self.prices.get(company_id, &id))
    }

    async fn list_prices_for_variant(
        &self,
        company_id: CompanyId,
        variant_id: VariantId,
        page: Page,
    ) -> Result<Vec<PriceRecord>, StoreError> {
        let rows: Vec<Price> = self
            .prices
            .for_company(company_id)
            .into_iter()
            .filter(|p| p.variant_id == variant_id)
            .collect();
        Ok(paginate(rows, page, |p| *p.id.as_uuid())
            .into_iter()
            .map(|p| self.price_record(p))
            .collect())
    }

    async fn update_price(&self, price: &Price) -> Result<(), StoreError> {
        self.prices.insert(price.company_id, price.id, price.clone());
        Ok(())
    }

    async fn set_current(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Option<Price>, StoreError> {
        let mut map = self.prices.write();
        let Some(target) = map.get(&(company_id, id)).cloned() else {
            return Ok(None);
        };

        for ((c, pid), p) in map.iter_mut() {
            if *c == company_id
                && *pid != id
                && p.variant_id == target.variant_id
                && p.kind == target.kind
                && p.is_current
            {
                p.is_current = false;
                p.updated_at = Utc::now();
            }
        }

        let entry = map
            .get_mut(&(company_id, id))
            .ok_or_else(|| StoreError::Backend("price vanished mid-update".to_string()))?;
        entry.is_current = true;
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn insert_tax(&self, tax: &Tax) -> Result<(), StoreError> {
        let mut map = self.taxes.write();
        let duplicate = map
            .iter()
            .any(|((c, _), t)| *c == tax.company_id && t.name == tax.name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "tax name '{}' already exists",
                tax.name
            )));
        }
        map.insert((tax.company_id, tax.id), tax.clone());
        Ok(())
    }

    async fn get_tax(&self, company_id: CompanyId, id: TaxId) -> Result<Option<Tax>, StoreError> {
        Ok(self.taxes.get(company_id, &id))
    }

    async fn list_taxes(&self, company_id: CompanyId, page: Page) -> Result<Vec<Tax>, StoreError> {
        Ok(paginate(self.taxes.for_company(company_id), page, |t| {
            *t.id.as_uuid()
        }))
    }

    async fn update_tax(&self, tax: &Tax) -> Result<(), StoreError> {
        let mut map = self.taxes.write();
        let duplicate = map
            .iter()
            .any(|((c, id), t)| *c == tax.company_id && *id != tax.id && t.name == tax.name);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "tax name '{}' already exists",
                tax.name
            )));
        }
        map.insert((tax.company_id, tax.id), tax.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Currency context
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct InMemoryCurrencyStore {
    currencies: CompanyKeyed<CurrencyId, Currency>,
    exchanges: CompanyKeyed<ExchangeId, CurrencyExchange>,
}

impl InMemoryCurrencyStore {
    pub fn new() -> Self {
        Self {
            currencies: CompanyKeyed::new(),
            exchanges: CompanyKeyed::new(),
        }
    }

    fn exchange_record(&self, exchange: CurrencyExchange) -> ExchangeRecord {
        let currency_code = self
            .currencies
            .get(exchange.company_id, &exchange.currency_id)
            .map(|c| c.code)
            .unwrap_or_default();
        ExchangeRecord {
            exchange,
            currency_code,
        }
    }
}

#[async_trait]
impl CurrencyStore for InMemoryCurrencyStore {
    async fn insert_currency(&self, currency: &Currency) -> Result<(), StoreError> {
        let mut map = self.currencies.write();
        let duplicate = map
            .iter()
            .any(|((c, _), cur)| *c == currency.company_id && cur.code == currency.code);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "currency code '{}' already exists",
                currency.code
            )));
        }
        if currency.is_base {
            let has_base = map
                .iter()
                .any(|((c, _), cur)| *c == currency.company_id && cur.is_base);
            if has_base {
                return Err(StoreError::Conflict(
                    "company already has a base currency".to_string(),
                ));
            }
        }
        map.insert((currency.company_id, currency.id), currency.clone());
        Ok(())
    }

    async fn get_currency(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Option<Currency>, StoreError> {
        Ok(self.currencies.get(company_id, &id))
    }

    async fn list_currencies(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Currency>, StoreError> {
        Ok(paginate(self.currencies.for_company(company_id), page, |c| {
            *c.id.as_uuid()
        }))
    }

    async fn update_currency(&self, currency: &Currency) -> Result<(), StoreError> {
        let mut map = self.currencies.write();
        let duplicate = map.iter().any(|((c, id), cur)| {
            *c == currency.company_id && *id != currency.id && cur.code == currency.code
        });
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "currency code '{}' already exists",
                currency.code
            )));
        }
        map.insert((currency.company_id, currency.id), currency.clone());
        Ok(())
    }

    async fn has_currencies(&self, company_id: CompanyId) -> Result<bool, StoreError> {
        Ok(!self.currencies.for_company(company_id).is_empty())
    }

    async fn set_base(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Option<Currency>, StoreError> {
        // Both maps stay locked for the whole routine so a reader can never
        // observe the new base currency still carrying an exchange.
        let mut currencies = self.currencies.write();
        let mut exchanges = self.exchanges.write();
        if !currencies.contains_key(&(company_id, id)) {
            return Ok(None);
        }

        for ((c, cid), cur) in currencies.iter_mut() {
            if *c == company_id && *cid != id && cur.is_base {
                cur.is_base = false;
                cur.updated_at = Utc::now();
            }
        }

        let entry = currencies
            .get_mut(&(company_id, id))
            .ok_or_else(|| StoreError::Backend("currency vanished mid-update".to_string()))?;
        entry.is_base = true;
        entry.updated_at = Utc::now();
        let updated = entry.clone();

        let stale: Vec<ExchangeId> = exchanges
            .iter()
            .filter(|((c, _), e)| *c == company_id && e.currency_id == id)
            .map(|((_, eid), _)| *eid)
            .collect();
        for eid in stale {
            tracing::warn!(company_id = %company_id, currency_id = %id, "dropping exchange configured for new base currency");
            exchanges.remove(&(company_id, eid));
        }

        Ok(Some(updated))
    }

    async fn insert_exchange(&self, exchange: &CurrencyExchange) -> Result<(), StoreError> {
        let mut map = self.exchanges.write();
        let duplicate = map.iter().any(|((c, _), e)| {
            *c == exchange.company_id && e.currency_id == exchange.currency_id
        });
        if duplicate {
            return Err(StoreError::Conflict(
                "an exchange is already configured for this currency".to_string(),
            ));
        }
        map.insert((exchange.company_id, exchange.id), exchange.clone());
        Ok(())
    }

    async fn get_exchange(
        &self,
        company_id: CompanyId,
        id: ExchangeId,
    ) -> Result<Option<ExchangeRecord>, StoreError> {
        Ok(self
            .exchanges
            .get(company_id, &id)
            .map(|e| self.exchange_record(e)))
    }

    async fn list_exchanges(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<ExchangeRecord>, StoreError> {
        Ok(paginate(self.exchanges.for_company(company_id), page, |e| {
            *e.id.as_uuid()
        })
        .into_iter()
        .map(|e| self.exchange_record(e))
        .collect())
    }

    async fn update_exchange(&self, exchange: &CurrencyExchange) -> Result<(), StoreError> {
        self.exchanges
            .insert(exchange.company_id, exchange.id, exchange.clone());
        Ok(())
    }

    async fn exchange_for_currency(
        &self,
        company_id: CompanyId,
        currency_id: CurrencyId,
    ) -> Result<Option<CurrencyExchange>, StoreError> {
        Ok(self
            .exchanges
            .for_company(company_id)
            .into_iter()
            .find(|e| e.currency_id == currency_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_currency::{ConversionMethod, NewCurrency, NewExchange};
    use rust_decimal::Decimal;

    fn currency(company_id: CompanyId, code: &str, is_base: bool) -> Currency {
        NewCurrency {
            code: code.to_string(),
            name: code.to_string(),
            symbol: None,
        }
        .into_currency(CurrencyId::new(), company_id, is_base, Utc::now())
    }

    #[tokio::test]
    async fn set_base_moves_flag_and_drops_exchange_in_one_step() {
        let store = InMemoryCurrencyStore::new();
        let company_id = CompanyId::new();

        let eur = currency(company_id, "EUR", true);
        let usd = currency(company_id, "USD", false);
        store.insert_currency(&eur).await.unwrap();
        store.insert_currency(&usd).await.unwrap();
        store
            .insert_exchange(
                &NewExchange {
                    currency_id: usd.id,
                    rate: Decimal::new(8, 1),
                    method: ConversionMethod::Multiply,
                }
                .into_exchange(ExchangeId::new(), company_id, Utc::now()),
            )
            .await
            .unwrap();

        let promoted = store
            .set_base(company_id, usd.id)
            .await
            .unwrap()
            .expect("currency exists");
        assert!(promoted.is_base);

        // The routine leaves no window where the new base still carries a
        // rate: by the time it returns, flag and exchange agree.
        assert!(store
            .exchange_for_currency(company_id, usd.id)
            .await
            .unwrap()
            .is_none());
        let old_base = store.get_currency(company_id, eur.id).await.unwrap().unwrap();
        assert!(!old_base.is_base);
    }

    #[tokio::test]
    async fn set_base_on_unknown_currency_is_none() {
        let store = InMemoryCurrencyStore::new();
        let outcome = store
            .set_base(CompanyId::new(), CurrencyId::new())
            .await
            .unwrap();
        assert!(outcome.is_none());
    }
}
