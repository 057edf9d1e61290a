//! Backend entry-point: reads the environment, runs migrations, and starts
//! the HTTP server.

use std::env;
use std::net::SocketAddr;
use std::ops::RangeInclusive;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use courtbook::domain::catalog::{
    DEFAULT_CLOSE_HOUR, DEFAULT_OPEN_HOUR, DEFAULT_STANDARD_WINDOW, DEFAULT_VIP_WINDOW, SlotCatalog,
};
use courtbook::inbound::http::health::HealthState;
use courtbook::outbound::persistence::{DbPool, PoolConfig};
use courtbook::server::{ServerConfig, create_server};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let bind_addr = parse_bind_addr()?;

    let mut config = ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr)
        .with_catalog(catalog_from_env()?);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        run_migrations(database_url.clone()).await?;
        let pool = DbPool::new(PoolConfig::new(database_url))
            .await
            .map_err(|e| std::io::Error::other(format!("database pool setup failed: {e}")))?;
        config = config.with_db_pool(pool);
    } else {
        warn!("DATABASE_URL not set; serving from in-memory fixtures");
    }

    if let Ok(relay) = env::var("NOTIFY_RELAY_URL") {
        config = config.with_notify_relay(relay);
    }

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(make_metrics()));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(addr = %bind_addr, "listening");
    server.await
}

/// Load the session signing key, falling back to an ephemeral key in
/// development builds.
fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

fn parse_bind_addr() -> std::io::Result<SocketAddr> {
    let raw = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    raw.parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR '{raw}': {e}")))
}

fn hour_from_env(name: &str, default: u8) -> std::io::Result<u8> {
    match env::var(name) {
        Ok(raw) => {
            let hour: u8 = raw
                .parse()
                .map_err(|e| std::io::Error::other(format!("invalid {name} '{raw}': {e}")))?;
            if hour > 23 {
                return Err(std::io::Error::other(format!(
                    "invalid {name} '{raw}': must be an hour of day"
                )));
            }
            Ok(hour)
        }
        Err(_) => Ok(default),
    }
}

fn range_from_env(
    start_name: &str,
    end_name: &str,
    default: RangeInclusive<u8>,
) -> std::io::Result<RangeInclusive<u8>> {
    let start = hour_from_env(start_name, *default.start())?;
    let end = hour_from_env(end_name, *default.end())?;
    if start > end {
        return Err(std::io::Error::other(format!(
            "{start_name} ({start}) must not exceed {end_name} ({end})"
        )));
    }
    Ok(start..=end)
}

/// Build the slot catalog from deployment overrides, falling back to the
/// facility defaults.
fn catalog_from_env() -> std::io::Result<SlotCatalog> {
    let bookable = range_from_env(
        "FACILITY_OPEN_HOUR",
        "FACILITY_CLOSE_HOUR",
        DEFAULT_OPEN_HOUR..=DEFAULT_CLOSE_HOUR,
    )?;
    let standard = range_from_env(
        "STANDARD_WINDOW_OPENS",
        "STANDARD_WINDOW_CLOSES",
        DEFAULT_STANDARD_WINDOW,
    )?;
    let vip = range_from_env("VIP_WINDOW_OPENS", "VIP_WINDOW_CLOSES", DEFAULT_VIP_WINDOW)?;
    Ok(SlotCatalog::new(bookable, standard, vip))
}

/// Apply pending migrations over a short-lived synchronous connection.
///
/// Diesel's migration harness is synchronous, so this runs on the blocking
/// thread pool before the async pool is built.
async fn run_migrations(database_url: String) -> std::io::Result<()> {
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .map_err(|e| std::io::Error::other(format!("database connection failed: {e}")))?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| std::io::Error::other(format!("migrations failed: {e}")))?;
        Ok::<_, std::io::Error>(())
    })
    .await
    .map_err(|e| std::io::Error::other(format!("migration task panicked: {e}")))??;
    info!("database migrations up to date");
    Ok(())
}

#[cfg(feature = "metrics")]
fn make_metrics() -> actix_web_prom::PrometheusMetrics {
    actix_web_prom::PrometheusMetricsBuilder::new("courtbook")
        .endpoint("/metrics")
        .build()
        .expect("configure Prometheus metrics")
}
