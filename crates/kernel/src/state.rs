//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use sqlx::PgPool;

use crate::config::Config;
use crate::db;
use crate::listing::{ListingService, ResidentDirectory, ResidentSource};
use crate::models::{citizen::CitizenSource, resident, staff::StaffSource};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// PostgreSQL connection pool.
    db: PgPool,

    /// Listing service for the single-collection resources.
    listings: Arc<ListingService>,

    /// Merged citizen + staff directory.
    residents: Arc<ResidentDirectory>,
}

impl AppState {
    /// Create new application state: connect, migrate, wire services.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = db::create_pool(config)
            .await
            .context("failed to create database pool")?;

        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;

        Ok(Self::from_pool(db, config.local_offset))
    }

    /// Wire services over an existing pool, with the Postgres-backed
    /// resident sources.
    pub fn from_pool(db: PgPool, local_offset: FixedOffset) -> Self {
        let sources: Vec<Arc<dyn ResidentSource>> = vec![
            Arc::new(CitizenSource::new(db.clone())),
            Arc::new(StaffSource::new(db.clone())),
        ];
        Self::with_resident_sources(db, local_offset, sources)
    }

    /// Wire services with caller-provided resident sources.
    pub fn with_resident_sources(
        db: PgPool,
        local_offset: FixedOffset,
        sources: Vec<Arc<dyn ResidentSource>>,
    ) -> Self {
        let listings = ListingService::new(db.clone(), local_offset);
        let residents = ResidentDirectory::new(resident::SCHEMA.clone(), sources, local_offset);

        Self {
            inner: Arc::new(AppStateInner {
                db,
                listings,
                residents,
            }),
        }
    }

    /// Get the listing service.
    pub fn listings(&self) -> &ListingService {
        &self.inner.listings
    }

    /// Get the resident directory.
    pub fn residents(&self) -> &ResidentDirectory {
        &self.inner.residents
    }

    /// Check if PostgreSQL is healthy.
    pub async fn postgres_healthy(&self) -> bool {
        db::check_health(&self.inner.db).await
    }
}
