//! `bodega-infra` — persistence and application services.
//!
//! One store trait per bounded context, each with a Postgres implementation
//! (explicit SQL over `sqlx`) and an in-memory implementation for dev/test.
//! Services layer input validation, referential existence checks, and the
//! invariant-maintenance routines over the stores.

pub mod page;
pub mod services;
pub mod stores;

pub use page::Page;
pub use services::{
    CompanyService, CurrencyService, InventoryService, PricingService, ServiceError,
};
pub use stores::{
    CompanyStore, CurrencyStore, ExchangeRecord, InventoryStore, LotFilter, LotRecord,
    PriceRecord, PricingStore, StoreError,
    in_memory::{
        InMemoryCompanyStore, InMemoryCurrencyStore, InMemoryInventoryStore, InMemoryPricingStore,
    },
    postgres::{
        PostgresCompanyStore, PostgresCurrencyStore, PostgresInventoryStore, PostgresPricingStore,
    },
};
