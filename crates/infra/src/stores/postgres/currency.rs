//! Postgres-backed currency store (currencies and exchanges).
//!
//! Base designation runs in one transaction: clear the previous base, set the
//! new one, and drop any exchange configured for the promoted currency.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Row};
use tracing::{instrument, warn};

use bodega_core::{CompanyId, CurrencyId, ExchangeId};
use bodega_currency::{ConversionMethod, Currency, CurrencyExchange};

use super::{decode_error, map_sqlx_error};
use crate::page::Page;
use crate::stores::error::StoreError;
use crate::stores::traits::{CurrencyStore, ExchangeRecord};

#[derive(Debug, Clone)]
pub struct PostgresCurrencyStore {
    pool: Arc<PgPool>,
}

impl PostgresCurrencyStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CurrencyStore for PostgresCurrencyStore {
    #[instrument(skip(self, currency), fields(company_id = %currency.company_id, currency_id = %currency.id), err)]
    async fn insert_currency(&self, currency: &Currency) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO currencies (id, company_id, code, name, symbol, is_base, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(currency.id.as_uuid())
        .bind(currency.company_id.as_uuid())
        .bind(&currency.code)
        .bind(&currency.name)
        .bind(&currency.symbol)
        .bind(currency.is_base)
        .bind(currency.created_at)
        .bind(currency.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_currency", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, currency_id = %id), err)]
    async fn get_currency(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Option<Currency>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, code, name, symbol, is_base, created_at, updated_at
            FROM currencies
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_currency", e))?;

        row.map(|r| {
            CurrencyRow::from_row(&r)
                .map(Currency::from)
                .map_err(|e| decode_error("get_currency", e))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn list_currencies(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<Currency>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, company_id, code, name, symbol, is_base, created_at, updated_at
            FROM currencies
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
        .map_err(|e| map_sqlx_error("list_currencies", e))?;

        rows.iter()
            .map(|r| {
                CurrencyRow::from_row(r)
                    .map(Currency::from)
                    .map_err(|e| decode_error("list_currencies", e))
            })
            .collect()
    }

    #[instrument(skip(self, currency), fields(company_id = %currency.company_id, currency_id = %currency.id), err)]
    async fn update_currency(&self, currency: &Currency) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE currencies
            SET code = $3, name = $4, symbol = $5, updated_at = $6
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(currency.company_id.as_uuid())
        .bind(currency.id.as_uuid())
        .bind(&currency.code)
        .bind(&currency.name)
        .bind(&currency.symbol)
        .bind(currency.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_currency", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn has_currencies(&self, company_id: CompanyId) -> Result<bool, StoreError> {
        let row =
            sqlx::query("SELECT EXISTS(SELECT 1 FROM currencies WHERE company_id = $1) AS present")
                .bind(company_id.as_uuid())
                .fetch_one(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("has_currencies", e))?;

        row.try_get("present")
            .map_err(|e| decode_error("has_currencies", e))
    }

    #[instrument(skip(self), fields(company_id = %company_id, currency_id = %id), err)]
    async fn set_base(
        &self,
        company_id: CompanyId,
        id: CurrencyId,
    ) -> Result<Option<Currency>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("set_base", e))?;

        let row = sqlx::query(
            r#"
            SELECT id, company_id, code, name, symbol, is_base, created_at, updated_at
            FROM currencies
            WHERE company_id = $1 AND id = $2
            FOR UPDATE
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("set_base", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut currency = CurrencyRow::from_row(&row)
            .map(Currency::from)
            .map_err(|e| decode_error("set_base", e))?;

        if !currency.is_base {
            let now = Utc::now();
            sqlx::query(
                r#"
                UPDATE currencies
                SET is_base = FALSE, updated_at = $3
                WHERE company_id = $1 AND is_base AND id <> $2
                "#,
            )
            .bind(company_id.as_uuid())
            .bind(id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_base", e))?;

            sqlx::query(
                r#"
                UPDATE currencies
                SET is_base = TRUE, updated_at = $3
                WHERE company_id = $1 AND id = $2
                "#,
            )
            .bind(company_id.as_uuid())
            .bind(id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_base", e))?;

            // A rate against itself means nothing once this currency is base.
            let dropped = sqlx::query(
                "DELETE FROM currency_exchanges WHERE company_id = $1 AND currency_id = $2",
            )
            .bind(company_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_base", e))?;
            if dropped.rows_affected() > 0 {
                warn!(
                    company_id = %company_id,
                    currency_id = %id,
                    "dropped exchange rate for newly designated base currency"
                );
            }

            currency.is_base = true;
            currency.updated_at = now;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("set_base", e))?;
        Ok(Some(currency))
    }

    #[instrument(skip(self, exchange), fields(company_id = %exchange.company_id, exchange_id = %exchange.id), err)]
    async fn insert_exchange(&self, exchange: &CurrencyExchange) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO currency_exchanges
                (id, company_id, currency_id, rate, method, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(exchange.id.as_uuid())
        .bind(exchange.company_id.as_uuid())
        .bind(exchange.currency_id.as_uuid())
        .bind(exchange.rate)
        .bind(exchange.method.as_str())
        .bind(exchange.created_at)
        .bind(exchange.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_exchange", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, exchange_id = %id), err)]
    async fn get_exchange(
        &self,
        company_id: CompanyId,
        id: ExchangeId,
    ) -> Result<Option<ExchangeRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT e.id, e.company_id, e.currency_id, e.rate, e.method,
                   e.created_at, e.updated_at,
                   c.code AS currency_code
            FROM currency_exchanges e
            JOIN currencies c ON c.company_id = e.company_id AND c.id = e.currency_id
            WHERE e.company_id = $1 AND e.id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_exchange", e))?;

        row.map(|r| exchange_record_from_row(&r, "get_exchange"))
            .transpose()
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn list_exchanges(
        &self,
        company_id: CompanyId,
        page: Page,
    ) -> Result<Vec<ExchangeRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.company_id, e.currency_id, e.rate, e.method,
                   e.created_at, e.updated_at,
                   c.code AS currency_code
            FROM currency_exchanges e
            JOIN currencies c ON c.company_id = e.company_id AND c.id = e.currency_id
            WHERE e.company_id = $1
            ORDER BY e.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_exchanges", e))?;

        rows.iter()
            .map(|r| exchange_record_from_row(r, "list_exchanges"))
            .collect()
    }

    #[instrument(skip(self, exchange), fields(company_id = %exchange.company_id, exchange_id = %exchange.id), err)]
    async fn update_exchange(&self, exchange: &CurrencyExchange) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE currency_exchanges
            SET rate = $3, method = $4, updated_at = $5
            WHERE company_id = $1 AND id = $2
            "#,
        )
        .bind(exchange.company_id.as_uuid())
        .bind(exchange.id.as_uuid())
        .bind(exchange.rate)
        .bind(exchange.method.as_str())
        .bind(exchange.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_exchange", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %company_id, currency_id = %currency_id), err)]
    async fn exchange_for_currency(
        &self,
        company_id: CompanyId,
        currency_id: CurrencyId,
    ) -> Result<Option<CurrencyExchange>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, company_id, currency_id, rate, method, created_at, updated_at
            FROM currency_exchanges
            WHERE company_id = $1 AND currency_id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(currency_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("exchange_for_currency", e))?;

        row.map(|r| exchange_from_row(&r, "exchange_for_currency"))
            .transpose()
    }
}

fn exchange_from_row(
    row: &sqlx::postgres::PgRow,
    operation: &str,
) -> Result<CurrencyExchange, StoreError> {
    let raw = ExchangeRow::from_row(row).map_err(|e| decode_error(operation, e))?;
    let method = raw
        .method
        .parse::<ConversionMethod>()
        .map_err(|e| decode_error(operation, e))?;
    Ok(CurrencyExchange {
        id: ExchangeId::from_uuid(raw.id),
        company_id: CompanyId::from_uuid(raw.company_id),
        currency_id: CurrencyId::from_uuid(raw.currency_id),
        rate: raw.rate,
        method,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}

fn exchange_record_from_row(
    row: &sqlx::postgres::PgRow,
    operation: &str,
) -> Result<ExchangeRecord, StoreError> {
    let exchange = exchange_from_row(row, operation)?;
    let currency_code = row
        .try_get("currency_code")
        .map_err(|e| decode_error(operation, e))?;
    Ok(ExchangeRecord {
        exchange,
        currency_code,
    })
}

#[derive(Debug)]
struct CurrencyRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    code: String,
    name: String,
    symbol: Option<String>,
    is_base: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for CurrencyRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CurrencyRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            symbol: row.try_get("symbol")?,
            is_base: row.try_get("is_base")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<CurrencyRow> for Currency {
    fn from(row: CurrencyRow) -> Self {
        Currency {
            id: CurrencyId::from_uuid(row.id),
            company_id: CompanyId::from_uuid(row.company_id),
            code: row.code,
            name: row.name,
            symbol: row.symbol,
            is_base: row.is_base,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug)]
struct ExchangeRow {
    id: uuid::Uuid,
    company_id: uuid::Uuid,
    currency_id: uuid::Uuid,
    rate: Decimal,
    method: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for ExchangeRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ExchangeRow {
            id: row.try_get("id")?,
            company_id: row.try_get("company_id")?,
            currency_id: row.try_get("currency_id")?,
            rate: row.try_get("rate")?,
            method: row.try_get("method")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
