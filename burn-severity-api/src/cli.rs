//! Définition et implémentation des commandes CLI
//!
//! - `serve` : crée le schéma si besoin puis sert l'API (défaut)
//! - `migrate` : crée le schéma et quitte

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use burn_severity::MeasureMode;
use clap::{Args, Subcommand};
use tracing::{info, warn};

use burn_severity_api::store::pool::test_connection;
use burn_severity_api::{
    create_pool, router, AppState, BurnSeverityService, DatabaseConfig, PgStore, ServiceConfig,
};

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (default command)
    Serve(ServeArgs),

    /// Create the PostGIS table and indexes, then exit
    Migrate(MigrateArgs),
}

/// Paramètres de connexion, prioritaires sur l'environnement
#[derive(Args, Debug, Clone, Default)]
pub struct DatabaseArgs {
    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// PostgreSQL database name (défaut : env PGDATABASE / fires)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<String>,

    /// Maximum number of pooled connections (défaut : env POOL_SIZE / 10)
    #[arg(long)]
    pub pool_size: Option<usize>,
}

impl DatabaseArgs {
    /// Configuration finale : environnement puis arguments
    pub fn resolve(self) -> Result<DatabaseConfig> {
        let mut config = DatabaseConfig::from_env();
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = self.database {
            config.dbname = database;
        }
        if let Some(user) = self.user {
            config.user = user;
        }
        if let Some(password) = self.password {
            config.password = Some(password);
        }
        if let Some(ssl) = self.ssl {
            config.ssl_mode = ssl.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(pool_size) = self.pool_size {
            config.pool_size = pool_size.max(1);
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on (défaut : env BIND_ADDR / 0.0.0.0:8000)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// JSON configuration file (values overridden by env and flags)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// PostgreSQL schema holding the table
    #[arg(long)]
    pub schema: Option<String>,

    /// Measurement units: native, geodesic, bc_albers
    #[arg(long)]
    pub measure_mode: Option<MeasureMode>,

    /// Reject creations whose FIRE_NUMBER already exists (409)
    #[arg(long)]
    pub unique_fire_number: bool,

    /// Do not create the table at startup
    #[arg(long)]
    pub skip_migrations: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct MigrateArgs {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// PostgreSQL schema holding the table
    #[arg(long)]
    pub schema: Option<String>,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

fn load_service_config(path: Option<&PathBuf>, schema: Option<String>) -> Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::from_env(),
    };
    if let Some(schema) = schema {
        config.schema = schema;
    }
    Ok(config)
}

/// Exécute la commande serve
pub async fn cmd_serve(args: ServeArgs) -> Result<()> {
    let mut config = load_service_config(args.config.as_ref(), args.schema)?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(mode) = args.measure_mode {
        config.measure_mode = mode;
    }
    if args.unique_fire_number {
        config.unique_fire_number = true;
    }
    config.validate()?;

    let db_config = args.db.resolve()?;
    info!(database = %db_config.display_target(), "Connecting to PostgreSQL");
    let pool = create_pool(&db_config)?;
    test_connection(&pool).await?;

    let store = PgStore::new(pool, &config.schema, config.unique_fire_number)
        .context("Failed to create store")?;
    if args.skip_migrations {
        warn!("Skipping schema creation (--skip-migrations)");
    } else {
        store
            .create_schema()
            .await
            .context("Failed to create schema")?;
    }

    let service = BurnSeverityService::new(Arc::new(store.clone()), config.measure_mode);
    let app = router(AppState::new(service, config.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(
        addr = %config.bind_addr,
        measure_mode = %config.measure_mode,
        unique_fire_number = config.unique_fire_number,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.close();
    info!("Server stopped, pool closed");
    Ok(())
}

/// Exécute la commande migrate
pub async fn cmd_migrate(args: MigrateArgs) -> Result<()> {
    let config = load_service_config(args.config.as_ref(), args.schema)?;
    config.validate()?;

    let db_config = args.db.resolve()?;
    let pool = create_pool(&db_config)?;
    test_connection(&pool).await?;

    let store = PgStore::new(pool, &config.schema, config.unique_fire_number)
        .context("Failed to create store")?;
    store
        .create_schema()
        .await
        .context("Failed to create schema")?;
    store.close();

    info!(table = %store.table(), "Migration complete");
    Ok(())
}

/// Attend Ctrl-C ou SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_args_override() {
        let args = DatabaseArgs {
            host: Some("db.internal".into()),
            port: Some(6543),
            ssl: Some("require".into()),
            ..Default::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.ssl_mode, burn_severity_api::store::SslMode::Require);
    }

    #[test]
    fn test_database_args_invalid_ssl() {
        let args = DatabaseArgs {
            ssl: Some("sometimes".into()),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}
