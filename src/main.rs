//! Audit Service - audit event ingestion and retrieval API
//!
//! Client applications post audit events with an API key; operators page
//! through them by time range.

use std::env;
use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use audit_service::{
    api,
    config::{self, LogFormat},
    db, AppConfig, AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Audit Service {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard must outlive the server so buffered log lines are flushed
    let _log_guard = init_logging(&config);

    info!("Audit Service {} starting up", env!("CARGO_PKG_VERSION"));
    info!(
        persist_enabled = config.audit.persist_enabled,
        max_page_size = config.audit.max_page_size,
        "Configuration loaded successfully"
    );

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState {
        config: config.clone(),
        db,
    };

    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    if let Some(ref tls_config) = config.server.tls {
        info!("Starting HTTPS server on https://{}", addr);
        info!("TLS certificate: {:?}", tls_config.cert_file);

        let rustls_config = create_rustls_config(tls_config).await?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("Failed to bind to address")?;

        info!("HTTPS server is ready to accept connections");

        axum_server::from_tcp_rustls(listener.into_std()?, rustls_config)?
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .context("HTTPS server error")?;
    } else {
        info!("Starting HTTP server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .context("Failed to bind to address")?;

        info!("HTTP server is ready to accept connections");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .context("HTTP server error")?;
    }

    Ok(())
}

/// Create RusTLS configuration from TLS config
async fn create_rustls_config(
    tls_config: &config::TlsConfig,
) -> Result<axum_server::tls_rustls::RustlsConfig> {
    use axum_server::tls_rustls::RustlsConfig;
    use rustls::crypto::aws_lc_rs::default_provider;
    use rustls::ServerConfig;

    let cert_file = std::fs::File::open(&tls_config.cert_file)
        .with_context(|| format!("Failed to open certificate file: {:?}", tls_config.cert_file))?;
    let mut cert_reader = BufReader::new(cert_file);
    let certs: Vec<_> = rustls_pemfile::certs(&mut cert_reader)
        .filter_map(|r| r.ok())
        .collect();

    if certs.is_empty() {
        anyhow::bail!("No certificates found in {:?}", tls_config.cert_file);
    }

    let key_file = std::fs::File::open(&tls_config.key_file)
        .with_context(|| format!("Failed to open key file: {:?}", tls_config.key_file))?;
    let mut key_reader = BufReader::new(key_file);
    let key = rustls_pemfile::private_key(&mut key_reader)
        .with_context(|| format!("Failed to read private key: {:?}", tls_config.key_file))?
        .ok_or_else(|| anyhow::anyhow!("No private key found in {:?}", tls_config.key_file))?;

    let versions: Vec<&'static rustls::SupportedProtocolVersion> =
        match tls_config.min_version.as_str() {
            "1.3" => vec![&rustls::version::TLS13],
            _ => vec![&rustls::version::TLS12, &rustls::version::TLS13],
        };

    info!("TLS configured with minimum version: {}", tls_config.min_version);

    let mut server_config = ServerConfig::builder_with_provider(default_provider().into())
        .with_protocol_versions(&versions)
        .context("Failed to set TLS protocol versions")?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("Failed to build TLS server config")?;

    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

/// Initialize the logging/tracing infrastructure
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_config = &config.logging;
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match (log_config.target.writes_console(), log_config.target.writes_file()) {
        (true, false) => {
            init_console_logging(subscriber, &log_config.format);
            None
        }
        (false, _) => {
            let (writer, guard) = create_file_writer(log_config);
            init_file_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
        (true, true) => {
            let (writer, guard) = create_file_writer(log_config);
            init_both_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

/// Initialize console-only logging
fn init_console_logging<S>(subscriber: S, format: &LogFormat)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
    }
}

/// Initialize file-only logging
fn init_file_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(writer))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
    }
}

/// Initialize both console and file logging
fn init_both_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true)) // Console
                .with(fmt::layer().json().with_target(true).with_writer(writer)) // File
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(false)) // Console
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                ) // File
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().with_target(true)) // Console
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                ) // File
                .init();
        }
    }
}

/// Directory holding a `sqlite://` database file, if any
fn data_directory(database_url: &str) -> Option<&std::path::Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.starts_with(':') {
        // In-memory database
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

/// Ensure the data directory exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    if let Some(parent) = data_directory(&config.database.url) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            info!("Created data directory: {:?}", parent);
        }
    }
    Ok(())
}

/// Print help message
fn print_help() {
    println!(
        r#"Audit Service {}

USAGE:
    audit-service [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information

ENVIRONMENT:
    AUDIT_CONFIG            Path to configuration file
    AUDIT_HOST, AUDIT_PORT  Listen address
    AUDIT_TRUST_PROXY       Build page links from x-forwarded-* headers
    AUDIT_API_KEY           Key clients must send in the x-api-key header
    DATABASE_URL            SQLite database URL
    AUDIT_PERSIST_ENABLED   Store ingested records (default: true)
    AUDIT_MAX_PAGE_SIZE     Largest accepted pageSize (default: 1000)
    AUDIT_TLS_CERT, AUDIT_TLS_KEY
                            Serve HTTPS with these PEM files
    RUST_LOG, LOG_LEVEL     Log filter
    AUDIT_LOG_FORMAT        pretty, json or compact
    CONSOLELOG_ENABLED, FILELOG_ENABLED
                            Log destinations
    SERVICE_NAME            Log file name prefix

CONFIGURATION:
    The service looks for configuration files in the following order:
    1. Path specified by AUDIT_CONFIG environment variable
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/audit-service/config.yaml
    5. <user config dir>/audit-service/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}
