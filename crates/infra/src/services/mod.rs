//! Application services: validation, existence checks, and invariant
//! maintenance over the store traits.

pub mod company;
pub mod currency;
pub mod error;
pub mod inventory;
pub mod pricing;

pub use company::CompanyService;
pub use currency::CurrencyService;
pub use error::ServiceError;
pub use inventory::InventoryService;
pub use pricing::PricingService;
