mod api;
mod cli;
mod dao;
mod error;
mod model;
mod service;
#[cfg(test)]
mod testutil;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use cli::Args;
use dao::{DbManager, DbSnapshot};
use service::{Fetcher, GeoService, RefreshScheduler, TimezoneResolver};

#[actix_web::main]
async fn main() -> Result<()> {
    let args = Args::parse().merge_with_config()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    info!("GeoIP API starting");
    info!(
        "Config: data_dir={}, bind={}:{}, fetch_timeout={}s, fetch_retries={}",
        args.data_dir.display(),
        args.host,
        args.port,
        args.fetch_timeout,
        args.fetch_retries
    );

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data directory {}", args.data_dir.display()))?;
    let paths = args.db_paths();

    // A missing database that cannot be downloaded is fatal here; once the
    // service is up, refresh failures only ever keep the old snapshot.
    let fetcher = Fetcher::new(args.fetch_timeout, args.fetch_retries)?;
    fetcher
        .ensure_database(&args.city_url, &paths.city)
        .await
        .context("initial City database download")?;
    fetcher
        .ensure_database(&args.asn_url, &paths.asn)
        .await
        .context("initial ASN database download")?;

    let initial = DbSnapshot::open(&paths.city, &paths.asn).context("opening initial databases")?;
    initial.validate().context("initial database pair")?;
    info!("Loaded {}", initial.describe());

    let manager = Arc::new(DbManager::new(initial));
    let geo = GeoService::new(manager.clone(), Arc::new(TimezoneResolver::new()));

    let scheduler = RefreshScheduler::new(
        manager,
        fetcher,
        paths,
        args.city_url.clone(),
        args.asn_url.clone(),
    )
    .spawn();

    info!("GeoIP query interface is running on {}:{}", args.host, args.port);
    let geo_data = web::Data::new(geo);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(geo_data.clone())
            .configure(api::init_routes)
    })
    .bind((args.host.as_str(), args.port))?
    .run()
    .await?;

    scheduler.abort();
    Ok(())
}
