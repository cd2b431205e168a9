//! Postgres-backed company store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use bodega_company::Company;
use bodega_core::CompanyId;

use super::{decode_error, map_sqlx_error};
use crate::stores::error::StoreError;
use crate::stores::traits::CompanyStore;

#[derive(Debug, Clone)]
pub struct PostgresCompanyStore {
    pool: Arc<PgPool>,
}

impl PostgresCompanyStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyStore for PostgresCompanyStore {
    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn insert(&self, company: &Company) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, tax_id, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.tax_id)
        .bind(&company.email)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn get(&self, id: CompanyId) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, tax_id, email, created_at, updated_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_company", e))?;

        row.map(|r| {
            CompanyRow::from_row(&r)
                .map(Company::from)
                .map_err(|e| decode_error("get_company", e))
        })
        .transpose()
    }

    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn update(&self, company: &Company) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, tax_id = $3, email = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.tax_id)
        .bind(&company.email)
        .bind(company.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_company", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn exists(&self, id: CompanyId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM companies WHERE id = $1) AS present")
            .bind(id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("company_exists", e))?;

        row.try_get("present")
            .map_err(|e| decode_error("company_exists", e))
    }
}

#[derive(Debug)]
struct CompanyRow {
    id: uuid::Uuid,
    name: String,
    tax_id: Option<String>,
    email: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for CompanyRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CompanyRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            tax_id: row.try_get("tax_id")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: CompanyId::from_uuid(row.id),
            name: row.name,
            tax_id: row.tax_id,
            email: row.email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
