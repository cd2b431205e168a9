//! `bodega-inventory` — inventories, variants, lots, and storages.
//!
//! Entities + input validation only; persistence and existence checks live in
//! `bodega-infra`.

pub mod inventory;
pub mod lot;
pub mod storage;
pub mod variant;

pub use inventory::{Inventory, InventoryPatch, NewInventory};
pub use lot::{Lot, LotPatch, NewLot};
pub use storage::{NewStorage, Storage, StoragePatch};
pub use variant::{InventoryVariant, NewVariant, VariantPatch};

pub(crate) mod validate {
    use bodega_core::{DomainError, DomainResult};

    pub const MAX_NAME_LEN: usize = 200;
    pub const MAX_CODE_LEN: usize = 64;

    pub fn non_empty(field: &'static str, value: &str) -> DomainResult<()> {
        if value.trim().is_empty() {
            return Err(DomainError::validation(format!("{field} cannot be empty")));
        }
        Ok(())
    }

    pub fn max_len(field: &'static str, value: &str, max: usize) -> DomainResult<()> {
        if value.trim().len() > max {
            return Err(DomainError::validation(format!(
                "{field} cannot exceed {max} characters"
            )));
        }
        Ok(())
    }
}
