//! Store traits + backends.

pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use error::StoreError;
pub use traits::{
    CompanyStore, CurrencyStore, ExchangeRecord, InventoryStore, LotFilter, LotRecord,
    PriceRecord, PricingStore,
};
