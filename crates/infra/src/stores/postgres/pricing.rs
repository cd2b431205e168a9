//! Postgres-backed pricing store (prices and taxes).
//!
//! The current-price invariant is maintained here: inserting a current price
//! and promoting a price both demote the sibling row inside one transaction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use bodega_core::{CompanyId, CurrencyId, PriceId, TaxId, VariantId};
use bodega_pricing::{Price, PriceKind, Tax};

use super::{decode_error, map_sqlx_error};
use crate::page::Page;
use crate::stores::error::StoreError;
use crate::stores::traits::{PriceRecord, PricingStore};

#[derive(Debug, Clone)]
pub struct PostgresPricingStore {
    pool: Arc<PgPool>,
}

impl PostgresPricingStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PricingStore for PostgresPricingStore {
    #[instrument(skip(self, price), fields(company_id = %price.company_id, price_id = %price.id), err)]
    async fn insert_price(&self, price: &Price) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_price", e))?;

        if price.is_current {
            sqlx::query(
                r#"
                UPDATE prices
                SET is_current = FALSE, updated_at = $4
                WHERE company_id = $1 AND variant_id = $2 AND kind = $3 AND is_current
                "#,
            )
            .bind(price.company_id.as_uuid())
            .bind(price.variant_id.as_uuid())
            .bind(price.kind.as_str())
            .bind(price.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_price", e))?;
        }

        sqlx::query(
            r#"
            INSERT INTO prices
                (id, company_id, variant_id, currency_id, kind, amount, is_current, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(price.id.as_uuid())
        .bind(price.company_id.as_uuid())
        .bind(price.variant_id.as_uuid())
        .bind(price.currency_id.as_uuid())
        .bind(price.kind.as_str())
        .bind(price.amount)
        .bind(price.is_current)
        .bind(price.created_at)
        .bind(price.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_price", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_price", e))
    }

    #[instrument(skip(self), fields(company_id = %company_id, price_id = %id), err)]
    async fn get_price(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Option<Price>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, variant_id, currency_id, kind, amount, is_current,
                   created_at, updated_at
            FROM prices
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_price", e))?;

        row.map(|r| price_from_row(&r, "get_price")).transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id, variant_id = %variant_id), err)]
    async fn list_prices_for_variant(
        &self,
        company_id: CompanyId,
        variant_id: VariantId,
        page: Page,
    ) -> Result<Vec<PriceRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.company_id, p.variant_id, p.currency_id, p.kind, p.amount,
                   p.is_current, p.created_at, p.updated_at,
                   c.code AS currency_code
            FROM prices p
            JOIN currencies c ON c.company_id = p.company_id AND c.id = p.currency_id
            WHERE p.company_id = $1 AND p.variant_id = $2
            ORDER BY p.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(variant_id.as_uuid())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_prices_for_variant", e))?;

        rows.iter()
            .map(|r| {
                let price = price_from_row(r, "list_prices_for_variant")?;
                let currency_code = r
                    .try_get("currency_code")
                    .map_err(|e| decode_error("list_prices_for_variant", e))?;
                Ok(PriceRecord {
                    price,
                    currency_code,
                })
            })
            .collect()
    }

    #[instrument(skip(self, price), fields(company_id = %price.company_id, price_id = %price.id), err)]
    async fn update_price(&self, price: &Price) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE prices
            SET amount = $3, updated_at = $4
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(price.company_id.as_uuid())
        .bind(price.id.as_uuid())
        .bind(price.amount)
        .bind(price.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_price", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, price_id = %id), err)]
    async fn set_current(
        &self,
        company_id: CompanyId,
        id: PriceId,
    ) -> Result<Option<Price>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("set_current", e))?;

        let row = sqlx::query(
            r#"
            SELECT id, company_id, variant_id, currency_id, kind, amount, is_current,
                   created_at, updated_at
            FROM prices
            WHERE company_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("set_current", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut price = price_from_row(&row, "set_current")?;

        if !price.is_current {
            let now = Utc::now();
            sqlx::query(
                r#"
                UPDATE prices
                SET is_current = FALSE, updated_at = $5
                WHERE company_id = $1 AND variant_id = $2 AND kind = $3
                    AND is_current AND id <> $4
                "#,
            )
            .bind(company_id.as_uuid())
            .bind(price.variant_id.as_uuid())
            .bind(price.kind.as_str())
            .bind(id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_current", e))?;

            sqlx::query(
                r#"
                UPDATE prices
                SET is_current = TRUE, updated_at = $3
                WHERE company_id = $1 AND id = $2
                "#,
            )
            .bind(company_id.as_uuid())
            .bind(id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_current", e))?;

            price.is_current = true;
            price.updated_at = now;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("set_current", e))?;
        Ok(Some(price))
    }

    #[instrument(skip(self, tax), fields(company_id = %tax.company_id, tax_id = %tax.id), err)]
    async fn insert_tax(&self, tax: &Tax) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO taxes (id, company_id, name, rate, included_in_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(tax.id.as_uuid())
        .bind(tax.company_id.as_uuid())
        .bind(&tax.name)
        .bind(tax.rate)
        .bind(tax.included_in_price)
        .bind(tax.created_at)
        .bind(tax.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_tax", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, tax_id = %id), err)]
    async fn get_tax(&self, company_id: CompanyId, id: TaxId) -> Result<Option<Tax>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, name, rate, included_in_price, created_at, updated_at
            FROM taxes
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_tax", e))?;

        row.map(|r| {
            TaxRow::from_row(&r)
                .map(Tax::from)
                .map_err(|e| decode_error("get_tax", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn list_taxes(&self, company_id: CompanyId, page: Page) -> Result<Vec<Tax>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, name, rate, included_in_price, created_at, updated_at
            FROM taxes
            WHERE company_id = $1
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_taxes", e))?;

        rows.iter()
            .map(|r| {
                TaxRow::from_row(r)
                    .map(Tax::from)
                    .map_err(|e| decode_error("list_taxes", e))
            })
            .collect()
    }

    #[instrument(skip(self, tax), fields(company_id = %tax.company_id, tax_id = %tax.id), err)]
    async fn update_tax(&self, tax: &Tax) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE taxes
            SET name = $3, rate = $4, included_in_price = $5, updated_at = $6
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(tax.company_id.as_uuid())
        .bind(tax.id.as_uuid())
        .bind(&tax.name)
        .bind(tax.rate)
        .bind(tax.included_in_price)
        .bind(tax.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_tax", e))?;
        Ok(())
    }
}

fn price_from_row(row: &sqlx::postgres::PgRow, operation: &str) -> Result<Price, StoreError> {
    let raw = PriceRow::from_row(row).map_err(|e| decode_error(operation, e))?;
    let kind = raw
        .kind
        .parse::<PriceKind>()
        .map_err(|e| decode_error(operation, e))?;
    Ok(Price {
        id: PriceId::from_uuid(raw.id),
        company_id: CompanyId::from_uuid(raw.company_id),
        variant_id: VariantId::from_uuid(raw.variant_id),
        currency_id: CurrencyId::from_uuid(raw.currency_id),
        kind,
        amount: raw.amount,
        is_current: raw.is_current,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

#[derive(Debug)]
struct PriceRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    variant_id: uuid::Uuid,
    currency_id: uuid::Uuid,
    kind: String,
    amount: Decimal,
    is_current: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for PriceRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(PriceRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            variant_id: row.try_get("variant_id")?,
            currency_id: row.try_get("currency_id")?,
            kind: row.try_get("kind")?,
            amount: row.try_get("amount")?,
            is_current: row.try_get("is_current")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug)]
struct TaxRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    name: String,
    rate: Decimal,
    included_in_price: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for TaxRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TaxRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            name: row.try_get("name")?,
            rate: row.try_get("rate")?,
            included_in_price: row.try_get("included_in_price")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<TaxRow> for Tax {
    fn from(row: TaxRow) -> Self {
        Tax {
            id: TaxId::from_uuid(row.id),
            company_id: CompanyId::from_uuid(row.company_id),
            name: row.name,
            rate: row.rate,
            included_in_price: row.included_in_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
