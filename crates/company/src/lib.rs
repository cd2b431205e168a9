//! `bodega-company` — company (tenant) entity and input validation.

pub mod company;

pub use company::{Company, CompanyPatch, NewCompany};
