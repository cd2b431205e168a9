//! `bodega-pricing` — prices and taxes.
//!
//! The "at most one current price per (variant, kind)" invariant is enforced
//! by the store layer; this crate owns the types and input validation.

pub mod price;
pub mod tax;

pub use price::{NewPrice, Price, PriceKind, PricePatch};
pub use tax::{NewTax, Tax, TaxPatch};
