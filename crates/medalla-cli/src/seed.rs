//! # Seed Subcommand
//!
//! Replaces the beers, kegs, partners and events tables with the contents
//! of a seed file. Customers and rentals are left alone.

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::Args;
use sqlx::PgPool;

use medalla_api::db;
use medalla_api::routes::beers::{next_legacy_id, CreateBeerRequest};
use medalla_api::state::BeerRecord;

use crate::catalog::SeedFile;

/// Arguments for the seed subcommand.
#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Seed file to load.
    #[arg(long, short, default_value = "seed/catalog.yaml")]
    pub file: PathBuf,

    /// Postgres connection string. Falls back to `DATABASE_URL`.
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Row counts written by one seed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub beers: usize,
    pub kegs: usize,
    pub partners: usize,
    pub events: usize,
}

pub fn run_seed(args: &SeedArgs) -> anyhow::Result<u8> {
    let seed = SeedFile::load(&args.file)?;
    let problems = seed.problems();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("  invalid {problem}");
        }
        bail!(
            "{} invalid entries in {}; nothing was written",
            problems.len(),
            args.file.display()
        );
    }

    let url = match &args.database_url {
        Some(url) => url.clone(),
        None => std::env::var("DATABASE_URL")
            .context("no --database-url given and DATABASE_URL is not set")?,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    let report = runtime.block_on(async {
        let pool = db::connect(&url)
            .await
            .context("failed to connect to the database")?;
        let report = seed_pool(&pool, seed).await;
        pool.close().await;
        report
    })?;

    println!(
        "Seeded {} beers, {} kegs, {} partners, {} events.",
        report.beers, report.kegs, report.partners, report.events
    );
    Ok(0)
}

/// Clear the catalog tables and insert the seed entries.
///
/// Runs in one transaction: on any error the tables keep their previous
/// contents.
pub async fn seed_pool(pool: &PgPool, seed: SeedFile) -> anyhow::Result<SeedReport> {
    let now = Utc::now();
    let mut report = SeedReport::default();
    let beers = number_beers(seed.beers, now)?;

    let mut tx = pool.begin().await.context("failed to open a transaction")?;

    let removed = db::beers::delete_all(&mut *tx).await?;
    tracing::info!(removed, "cleared beers");
    for record in &beers {
        db::beers::upsert(&mut *tx, record)
            .await
            .with_context(|| format!("failed to insert beer {}", record.name))?;
    }
    report.beers = beers.len();

    let removed = db::kegs::delete_all(&mut *tx).await?;
    tracing::info!(removed, "cleared kegs");
    for req in seed.kegs {
        let record = req.into_record(now);
        db::kegs::upsert(&mut *tx, &record)
            .await
            .with_context(|| format!("failed to insert keg {}", record.size))?;
        report.kegs += 1;
    }

    let removed = db::partners::delete_all(&mut *tx).await?;
    tracing::info!(removed, "cleared partners");
    for req in seed.partners {
        let record = req.into_record(now)?;
        db::partners::upsert(&mut *tx, &record)
            .await
            .with_context(|| format!("failed to insert partner {}", record.name))?;
        report.partners += 1;
    }

    let removed = db::events::delete_all(&mut *tx).await?;
    tracing::info!(removed, "cleared events");
    for req in seed.events {
        let record = req.into_record(now);
        db::events::upsert(&mut *tx, &record)
            .await
            .with_context(|| format!("failed to insert event {}", record.title))?;
        report.events += 1;
    }

    tx.commit().await.context("failed to commit the seed")?;
    tracing::info!(?report, "seed complete");
    Ok(report)
}

/// Turn the seed's beers into records, numbering those without a
/// `legacy_id` after the highest number seen so far.
fn number_beers(
    requests: Vec<CreateBeerRequest>,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<BeerRecord>> {
    let mut beers: Vec<BeerRecord> = Vec::with_capacity(requests.len());
    for req in requests {
        let legacy_id = match req.legacy_id {
            Some(id) => id,
            None => next_legacy_id(&beers)
                .with_context(|| format!("no catalog number left for beer {}", req.name))?,
        };
        beers.push(req.into_record(legacy_id, now));
    }
    Ok(beers)
}
