//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! The in-memory stores are authoritative while the process runs. When a
//! database pool is configured, every mutation is also written through to
//! Postgres and the stores are hydrated from it on startup.
//!
//! - **Catalog**: beers, kegs, partners, events (public reads, admin writes)
//! - **Back office**: customers and rentals (admin only)

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use medalla_core::{GeoPoint, PaymentMethod, RentalStatus};
use medalla_state::{RentalFootprint, StockHolder, StockLine};

use crate::middleware::metrics::ApiMetrics;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across an `.await`.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// First record matching `pred`.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.data.read().values().find(|v| pred(v)).cloned()
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &Uuid, f: impl FnOnce(&mut T)) -> Option<T> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock. Returns `None` if the
    /// record doesn't exist, or `Some(result)` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Run `f` over the whole map under one write lock.
    ///
    /// Used when a change spans several records (stock reservation) or must
    /// check a uniqueness constraint before inserting.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Replace the whole contents (startup hydration).
    pub fn replace_all(&self, records: impl IntoIterator<Item = (Uuid, T)>) -> usize {
        let mut guard = self.data.write();
        guard.clear();
        guard.extend(records);
        guard.len()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Catalog Records ----------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeerSpecs {
    /// Alcohol by volume as displayed, e.g. "4.5%".
    pub abv: Option<String>,
    pub ibu: Option<f64>,
    pub srm: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeerImages {
    pub main: Option<String>,
    pub detail: Option<String>,
}

/// A beer in the public catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BeerRecord {
    pub id: Uuid,
    /// Stable catalog number used by public links (`/api/beers/3`).
    pub legacy_id: i64,
    pub name: String,
    pub title_img: Option<String>,
    pub persona: Option<String>,
    pub category: Option<String>,
    pub style: Option<String>,
    pub specs: BeerSpecs,
    pub color: Option<String>,
    pub images: BeerImages,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rentable keg size with its stock count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct KegRecord {
    pub id: Uuid,
    /// Display size, e.g. "20 Litros".
    pub size: String,
    pub serves: Option<String>,
    pub ideal: Option<String>,
    /// Display price; "Consultar" when not published.
    pub price: String,
    /// Kegs on hand. May go negative after a reverted return.
    pub stock: i64,
    pub icon_size: Option<i32>,
    pub img: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockHolder for KegRecord {
    fn stock(&self) -> i64 {
        self.stock
    }

    fn set_stock(&mut self, stock: i64) {
        self.stock = stock;
    }

    fn label(&self) -> &str {
        &self.size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartnerAddress {
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartnerContact {
    pub phone: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub mail: Option<String>,
    pub website: Option<String>,
}

/// A bar, shop or distributor shown on the locator map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PartnerRecord {
    pub id: Uuid,
    pub name: String,
    /// Kind of venue, e.g. "Bar", "Distribuidor", "Almacén".
    #[serde(rename = "type")]
    pub partner_type: String,
    #[schema(value_type = Object)]
    pub location: GeoPoint,
    pub location_details: PartnerAddress,
    pub contact: PartnerContact,
    pub features: Vec<String>,
    pub varieties: Vec<String>,
    pub is_official: bool,
    pub logo: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventLocation {
    pub name: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventRecord {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub location: EventLocation,
    pub image: Option<String>,
    pub calendar_link: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Back-Office Records ------------------------------------------------------

/// A rental customer, keyed by phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Rentals recorded against this phone since the customer was created.
    pub total_rentals: i64,
    pub last_rental_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of a rental: some kegs of one size, optionally filled with one beer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RentalItem {
    pub keg_id: Uuid,
    pub beer_id: Option<Uuid>,
    pub quantity: u32,
    /// Serial numbers of the physical barrels handed out.
    #[serde(default)]
    pub barrel_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RentalRecord {
    pub id: Uuid,
    pub pickup_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub customer_name: String,
    /// Customer phone, when given. Links the rental to a customer record.
    pub contact: Option<String>,
    pub items: Vec<RentalItem>,
    pub amount: Option<f64>,
    pub is_paid: bool,
    #[schema(value_type = String, example = "Efectivo")]
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    #[schema(value_type = String, example = "Reservado")]
    pub status: RentalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RentalRecord {
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.items
            .iter()
            .map(|item| StockLine {
                keg_id: item.keg_id,
                quantity: item.quantity,
            })
            .collect()
    }
}

impl RentalFootprint for RentalRecord {
    fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    fn customer_name(&self) -> &str {
        &self.customer_name
    }

    fn amount(&self) -> Option<f64> {
        self.amount
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// -- Application State --------------------------------------------------------

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
    /// Requests allowed per client per minute.
    pub rate_limit_per_minute: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("metrics_enabled", &self.metrics_enabled)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            auth_token: None,
            metrics_enabled: true,
            rate_limit_per_minute: 600,
        }
    }
}

impl AppConfig {
    /// Read `PORT`, `AUTH_TOKEN`, `MEDALLA_METRICS_ENABLED` and
    /// `RATE_LIMIT_PER_MINUTE`, falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);
        let auth_token = lookup("AUTH_TOKEN").filter(|t| !t.trim().is_empty());
        let metrics_enabled = lookup("MEDALLA_METRICS_ENABLED")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.metrics_enabled);
        let rate_limit_per_minute = lookup("RATE_LIMIT_PER_MINUTE")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.rate_limit_per_minute);
        Self {
            port,
            auth_token,
            metrics_enabled,
            rate_limit_per_minute,
        }
    }
}

/// Shared application state accessible to all route handlers.
/// Clone-friendly via `Arc` internals in each `Store`.
#[derive(Debug, Clone)]
pub struct AppState {
    pub beers: Store<BeerRecord>,
    pub kegs: Store<KegRecord>,
    pub partners: Store<PartnerRecord>,
    pub events: Store<EventRecord>,
    pub customers: Store<CustomerRecord>,
    pub rentals: Store<RentalRecord>,

    /// PostgreSQL pool for write-through persistence. `None` means
    /// in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub metrics: ApiMetrics,
    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with default configuration and metrics disabled.
    pub fn new() -> Self {
        Self::with_config(
            AppConfig {
                metrics_enabled: false,
                ..AppConfig::default()
            },
            None,
        )
    }

    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let metrics = if config.metrics_enabled {
            ApiMetrics::install()
        } else {
            ApiMetrics::disabled()
        };
        Self {
            beers: Store::new(),
            kegs: Store::new(),
            partners: Store::new(),
            events: Store::new(),
            customers: Store::new(),
            rentals: Store::new(),
            db_pool,
            metrics,
            config,
        }
    }

    /// Load every collection from the database into the in-memory stores.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        let Some(pool) = &self.db_pool else {
            return Ok(());
        };

        let beers = crate::db::beers::load_all(pool).await?;
        let beers = self.beers.replace_all(beers.into_iter().map(|r| (r.id, r)));
        let kegs = crate::db::kegs::load_all(pool).await?;
        let kegs = self.kegs.replace_all(kegs.into_iter().map(|r| (r.id, r)));
        let partners = crate::db::partners::load_all(pool).await?;
        let partners = self
            .partners
            .replace_all(partners.into_iter().map(|r| (r.id, r)));
        let events = crate::db::events::load_all(pool).await?;
        let events = self.events.replace_all(events.into_iter().map(|r| (r.id, r)));
        let customers = crate::db::customers::load_all(pool).await?;
        let customers = self
            .customers
            .replace_all(customers.into_iter().map(|r| (r.id, r)));
        let rentals = crate::db::rentals::load_all(pool).await?;
        let rentals = self
            .rentals
            .replace_all(rentals.into_iter().map(|r| (r.id, r)));

        tracing::info!(
            beers,
            kegs,
            partners,
            events,
            customers,
            rentals,
            "hydrated in-memory stores from database"
        );
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
