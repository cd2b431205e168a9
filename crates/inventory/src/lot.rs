use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bodega_core::{CompanyId, DomainError, DomainResult, Entity, LotId, StorageId, VariantId};

use crate::validate;

/// Lot: a tracked batch of a variant sitting in a storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub company_id: CompanyId,
    pub variant_id: VariantId,
    pub storage_id: StorageId,
    pub lot_number: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub manufactured_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Lot {
    type Id = LotId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a lot. Lot number is unique per (variant, storage).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewLot {
    pub variant_id: VariantId,
    pub storage_id: StorageId,
    pub lot_number: String,
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub manufactured_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

impl NewLot {
    pub fn validate(&self) -> DomainResult<()> {
        validate::non_empty("lot_number", &self.lot_number)?;
        validate::max_len("lot_number", &self.lot_number, validate::MAX_CODE_LEN)?;
        validate_quantity(self.quantity)?;
        validate_unit_cost(self.unit_cost)?;
        validate_date_order(self.manufactured_on, self.expires_on)?;
        Ok(())
    }

    pub fn into_lot(self, id: LotId, company_id: CompanyId, now: DateTime<Utc>) -> Lot {
        Lot {
            id,
            company_id,
            variant_id: self.variant_id,
            storage_id: self.storage_id,
            lot_number: self.lot_number.trim().to_string(),
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            manufactured_on: self.manufactured_on,
            expires_on: self.expires_on,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a lot. `None` fields are left untouched.
///
/// Date-order is re-validated against the merged state, so a patch cannot
/// leave a lot expiring before it was manufactured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LotPatch {
    pub lot_number: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_cost: Option<Decimal>,
    pub manufactured_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

impl LotPatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(lot_number) = &self.lot_number {
            validate::non_empty("lot_number", lot_number)?;
            validate::max_len("lot_number", lot_number, validate::MAX_CODE_LEN)?;
        }
        if let Some(quantity) = self.quantity {
            validate_quantity(quantity)?;
        }
        if let Some(unit_cost) = self.unit_cost {
            validate_unit_cost(unit_cost)?;
        }
        Ok(())
    }

    pub fn apply(self, lot: &mut Lot, now: DateTime<Utc>) -> DomainResult<()> {
        let manufactured_on = self.manufactured_on.or(lot.manufactured_on);
        let expires_on = self.expires_on.or(lot.expires_on);
        validate_date_order(manufactured_on, expires_on)?;

        if let Some(lot_number) = self.lot_number {
            lot.lot_number = lot_number.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            lot.quantity = quantity;
        }
        if let Some(unit_cost) = self.unit_cost {
            lot.unit_cost = unit_cost;
        }
        lot.manufactured_on = manufactured_on;
        lot.expires_on = expires_on;
        lot.updated_at = now;
        Ok(())
    }
}

fn validate_quantity(quantity: Decimal) -> DomainResult<()> {
    if quantity < Decimal::ZERO {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    Ok(())
}

fn validate_unit_cost(unit_cost: Decimal) -> DomainResult<()> {
    if unit_cost < Decimal::ZERO {
        return Err(DomainError::validation("unit_cost cannot be negative"));
    }
    Ok(())
}

fn validate_date_order(
    manufactured_on: Option<NaiveDate>,
    expires_on: Option<NaiveDate>,
) -> DomainResult<()> {
    if let (Some(made), Some(expires)) = (manufactured_on, expires_on) {
        if expires < made {
            return Err(DomainError::validation(
                "expires_on cannot precede manufactured_on",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_lot() -> NewLot {
        NewLot {
            variant_id: VariantId::new(),
            storage_id: StorageId::new(),
            lot_number: "LOT-2026-01".to_string(),
            quantity: Decimal::from(100),
            unit_cost: Decimal::new(1250, 2),
            manufactured_on: Some(date(2026, 1, 10)),
            expires_on: Some(date(2027, 1, 10)),
        }
    }

    #[test]
    fn new_lot_accepts_valid_input() {
        new_lot().validate().unwrap();
    }

    #[test]
    fn new_lot_rejects_negative_quantity() {
        let mut input = new_lot();
        input.quantity = Decimal::from(-1);
        assert!(matches!(
            input.validate().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn new_lot_rejects_expiry_before_manufacture() {
        let mut input = new_lot();
        input.manufactured_on = Some(date(2026, 6, 1));
        input.expires_on = Some(date(2026, 1, 1));
        assert!(input.validate().is_err());
    }

    #[test]
    fn new_lot_accepts_zero_quantity() {
        let mut input = new_lot();
        input.quantity = Decimal::ZERO;
        input.validate().unwrap();
    }

    #[test]
    fn patch_revalidates_date_order_against_merged_state() {
        let input = new_lot();
        let mut lot = input.into_lot(LotId::new(), CompanyId::new(), Utc::now());

        // Moving manufacture past the stored expiry must fail.
        let patch = LotPatch {
            manufactured_on: Some(date(2028, 1, 1)),
            ..Default::default()
        };
        patch.validate().unwrap();
        assert!(patch.apply(&mut lot, Utc::now()).is_err());
        assert_eq!(lot.manufactured_on, Some(date(2026, 1, 10)));
    }

    #[test]
    fn patch_updates_quantity() {
        let input = new_lot();
        let mut lot = input.into_lot(LotId::new(), CompanyId::new(), Utc::now());

        LotPatch {
            quantity: Some(Decimal::from(42)),
            ..Default::default()
        }
        .apply(&mut lot, Utc::now())
        .unwrap();

        assert_eq!(lot.quantity, Decimal::from(42));
        assert_eq!(lot.lot_number, "LOT-2026-01");
    }
}
