//! Store selection and service wiring.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use bodega_infra::{
    CompanyService, CurrencyService, InventoryService, PricingService,
    InMemoryCompanyStore, InMemoryCurrencyStore, InMemoryInventoryStore, InMemoryPricingStore,
    PostgresCompanyStore, PostgresCurrencyStore, PostgresInventoryStore, PostgresPricingStore,
};
use bodega_infra::stores::traits::{CompanyStore, CurrencyStore, InventoryStore, PricingStore};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// The application services handed to route handlers.
pub struct AppServices {
    pub companies: CompanyService,
    pub inventory: InventoryService,
    pub pricing: PricingService,
    pub currency: CurrencyService,
}

/// Wire services over Postgres when `DATABASE_URL` is set, otherwise over the
/// in-memory stores (dev/test).
pub fn build_services() -> anyhow::Result<AppServices> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => build_postgres(&url),
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            Ok(build_in_memory())
        }
    }
}

fn build_postgres(url: &str) -> anyhow::Result<AppServices> {
    let max_connections = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_CONNECTIONS);

    // Lazy pool: connections are established on first use, so startup does
    // not race the database.
    let pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)
            .context("invalid DATABASE_URL")?,
    );

    let company_store: Arc<dyn CompanyStore> = Arc::new(PostgresCompanyStore::new(pool.clone()));
    let inventory_store: Arc<dyn InventoryStore> =
        Arc::new(PostgresInventoryStore::new(pool.clone()));
    let pricing_store: Arc<dyn PricingStore> = Arc::new(PostgresPricingStore::new(pool.clone()));
    let currency_store: Arc<dyn CurrencyStore> = Arc::new(PostgresCurrencyStore::new(pool));

    Ok(wire(
        company_store,
        inventory_store,
        pricing_store,
        currency_store,
    ))
}

fn build_in_memory() -> AppServices {
    let company_store = Arc::new(InMemoryCompanyStore::new());
    let inventory_store = Arc::new(InMemoryInventoryStore::new());
    let currency_store = Arc::new(InMemoryCurrencyStore::new());
    let pricing_store = Arc::new(InMemoryPricingStore::new(currency_store.clone()));

    wire(company_store, inventory_store, pricing_store, currency_store)
}

fn wire(
    company_store: Arc<dyn CompanyStore>,
    inventory_store: Arc<dyn InventoryStore>,
    pricing_store: Arc<dyn PricingStore>,
    currency_store: Arc<dyn CurrencyStore>,
) -> AppServices {
    AppServices {
        companies: CompanyService::new(company_store.clone()),
        inventory: InventoryService::new(inventory_store.clone(), company_store.clone()),
        pricing: PricingService::new(pricing_store, inventory_store, currency_store.clone()),
        currency: CurrencyService::new(currency_store, company_store),
    }
}
