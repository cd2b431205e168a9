//! `bodega-currency` — currencies, configured exchange rates, and the
//! conversion math.
//!
//! Every rate is expressed against the company's base currency; converting
//! between two non-base currencies goes through the base (see [`convert`]).

pub mod convert;
pub mod currency;
pub mod exchange;

pub use convert::{ConversionOutcome, ExchangeLeg, convert_via_base, from_base, to_base};
pub use currency::{Currency, CurrencyPatch, NewCurrency};
pub use exchange::{ConversionMethod, CurrencyExchange, ExchangePatch, NewExchange};
