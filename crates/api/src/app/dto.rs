use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use bodega_company::Company;
use bodega_currency::{ConversionOutcome, Currency, CurrencyExchange, ExchangeLeg};
use bodega_infra::{ExchangeRecord, LotRecord, PriceRecord};
use bodega_inventory::{Inventory, InventoryVariant, Storage};
use bodega_pricing::{Price, Tax};

// -------------------------
// Request DTOs
// -------------------------
//
// Create/update bodies deserialize straight into the domain `New*`/`*Patch`
// types; only requests with no domain counterpart live here.

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub amount: Decimal,
    pub from_currency_id: String,
    pub to_currency_id: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn company_to_json(c: &Company) -> Value {
    json!({
        "id": c.id.to_string(),
        "name": c.name,
        "tax_id": c.tax_id,
        "email": c.email,
        "created_at": c.created_at.to_rfc3339(),
        "updated_at": c.updated_at.to_rfc3339(),
    })
}

pub fn inventory_to_json(i: &Inventory) -> Value {
    json!({
        "id": i.id.to_string(),
        "name": i.name,
        "description": i.description,
        "created_at": i.created_at.to_rfc3339(),
        "updated_at": i.updated_at.to_rfc3339(),
    })
}

pub fn storage_to_json(s: &Storage) -> Value {
    json!({
        "id": s.id.to_string(),
        "name": s.name,
        "code": s.code,
        "address": s.address,
        "created_at": s.created_at.to_rfc3339(),
        "updated_at": s.updated_at.to_rfc3339(),
    })
}

pub fn variant_to_json(v: &InventoryVariant) -> Value {
    json!({
        "id": v.id.to_string(),
        "inventory_id": v.inventory_id.to_string(),
        "sku": v.sku,
        "name": v.name,
        "description": v.description,
        "barcode": v.barcode,
        "created_at": v.created_at.to_rfc3339(),
        "updated_at": v.updated_at.to_rfc3339(),
    })
}

pub fn lot_to_json(r: &LotRecord) -> Value {
    json!({
        "id": r.lot.id.to_string(),
        "variant_id": r.lot.variant_id.to_string(),
        "storage_id": r.lot.storage_id.to_string(),
        "storage_name": r.storage_name,
        "lot_number": r.lot.lot_number,
        "quantity": r.lot.quantity,
        "unit_cost": r.lot.unit_cost,
        "manufactured_on": r.lot.manufactured_on,
        "expires_on": r.lot.expires_on,
        "created_at": r.lot.created_at.to_rfc3339(),
        "updated_at": r.lot.updated_at.to_rfc3339(),
    })
}

pub fn price_to_json(p: &Price) -> Value {
    json!({
        "id": p.id.to_string(),
        "variant_id": p.variant_id.to_string(),
        "currency_id": p.currency_id.to_string(),
        "kind": p.kind.as_str(),
        "amount": p.amount,
        "is_current": p.is_current,
        "created_at": p.created_at.to_rfc3339(),
        "updated_at": p.updated_at.to_rfc3339(),
    })
}

pub fn price_record_to_json(r: &PriceRecord) -> Value {
    let mut value = price_to_json(&r.price);
    value["currency_code"] = json!(r.currency_code);
    value
}

pub fn tax_to_json(t: &Tax) -> Value {
    json!({
        "id": t.id.to_string(),
        "name": t.name,
        "rate": t.rate,
        "included_in_price": t.included_in_price,
        "created_at": t.created_at.to_rfc3339(),
        "updated_at": t.updated_at.to_rfc3339(),
    })
}

pub fn currency_to_json(c: &Currency) -> Value {
    json!({
        "id": c.id.to_string(),
        "code": c.code,
        "name": c.name,
        "symbol": c.symbol,
        "is_base": c.is_base,
        "created_at": c.created_at.to_rfc3339(),
        "updated_at": c.updated_at.to_rfc3339(),
    })
}

pub fn exchange_to_json(e: &CurrencyExchange) -> Value {
    json!({
        "id": e.id.to_string(),
        "currency_id": e.currency_id.to_string(),
        "rate": e.rate,
        "method": e.method.as_str(),
        "created_at": e.created_at.to_rfc3339(),
        "updated_at": e.updated_at.to_rfc3339(),
    })
}

pub fn exchange_record_to_json(r: &ExchangeRecord) -> Value {
    let mut value = exchange_to_json(&r.exchange);
    value["currency_code"] = json!(r.currency_code);
    value
}

pub fn conversion_to_json(o: &ConversionOutcome) -> Value {
    json!({
        "original": o.original,
        "base_amount": o.base_amount,
        "converted": o.converted,
        "from_leg": o.from_leg.as_ref().map(leg_to_json),
        "to_leg": o.to_leg.as_ref().map(leg_to_json),
    })
}

fn leg_to_json(leg: &ExchangeLeg) -> Value {
    json!({
        "currency_id": leg.currency_id.to_string(),
        "rate": leg.rate,
        "method": leg.method.as_str(),
    })
}
