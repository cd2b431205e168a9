//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! impl_uuid_newtype {
    ($t:ident, $name:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(Uuid);

        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(CompanyId, "CompanyId", "Identifier of a company (multi-tenant boundary).");
impl_uuid_newtype!(CurrencyId, "CurrencyId", "Identifier of a company-scoped currency.");
impl_uuid_newtype!(ExchangeId, "ExchangeId", "Identifier of a configured exchange rate.");
impl_uuid_newtype!(InventoryId, "InventoryId", "Identifier of an inventory.");
impl_uuid_newtype!(VariantId, "VariantId", "Identifier of an inventory variant (SKU-level).");
impl_uuid_newtype!(LotId, "LotId", "Identifier of a tracked lot.");
impl_uuid_newtype!(StorageId, "StorageId", "Identifier of a storage location.");
impl_uuid_newtype!(PriceId, "PriceId", "Identifier of a price row.");
impl_uuid_newtype!(TaxId, "TaxId", "Identifier of a tax definition.");
impl_uuid_newtype!(PrincipalId, "PrincipalId", "Identity of an authenticated principal (human user, service account, etc).");
