use actix_cors::Cors;
use actix_web::{middleware::Logger, App, HttpServer};
use anyhow::Context;
use crypto_core::jwt::JwtCodec;
use db_pool::{create_pool, DbConfig};
use doc_store::{MemoryStore, PgDocumentStore};
use postboard_service::middleware::MetricsMiddleware;
use postboard_service::services::MediaStorage;
use postboard_service::triggers::TriggerRuntime;
use postboard_service::{AppContext, Config, SharedStore};
use std::io;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn open_store(config: &Config) -> anyhow::Result<SharedStore> {
    let capacity = config.triggers.channel_capacity;

    match &config.database {
        Some(database) => {
            let db_cfg = DbConfig::from_env("postboard-service", &database.url);
            db_cfg.log_config();
            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;

            let store = PgDocumentStore::new(pool, capacity);
            store
                .migrate()
                .await
                .context("Failed to run document store migrations")?;
            tracing::info!("Using PostgreSQL document store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory document store");
            Ok(Arc::new(MemoryStore::with_capacity(capacity)))
        }
    }
}

fn jwt_codec(config: &Config) -> anyhow::Result<JwtCodec> {
    let jwt = &config.jwt;
    let codec = match &jwt.private_key_pem {
        Some(private_pem) => JwtCodec::from_rsa_pem(private_pem, &jwt.public_key_pem),
        None => {
            tracing::warn!("JWT_PRIVATE_KEY_PEM not set; signup and login are disabled");
            JwtCodec::validation_only(&jwt.public_key_pem)
        }
    }
    .context("Failed to load JWT keys")?;

    Ok(codec.with_access_ttl(chrono::Duration::seconds(jwt.access_ttl_secs)))
}

/// Postboard Service
///
/// Serves the HTTP API and runs the reactive triggers in the same process.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting postboard-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let jwt = jwt_codec(&config)?;
    let store = open_store(&config).await?;
    let media = MediaStorage::new(&config.media);
    let context = AppContext::new(store.clone(), jwt, media);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let runtime = TriggerRuntime::new(store);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in cors_config.origins() {
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let context = context.clone();
        App::new()
            .wrap(MetricsMiddleware)
            .wrap(TracingLogger::default())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(move |cfg| context.configure(cfg))
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let mut tasks: JoinSet<io::Result<()>> = JoinSet::new();

    tasks.spawn(async move {
        tracing::info!("HTTP server is running");
        server.await
    });

    let trigger_shutdown = shutdown_tx.subscribe();
    tasks.spawn(async move {
        runtime.run(trigger_shutdown).await;
        Ok(())
    });

    let mut first_error: Option<io::Error> = None;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = tasks.join_next() => {
                match result {
                    Some(Ok(Ok(()))) => {
                        tracing::info!("Background task completed");
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                    }
                    Some(Ok(Err(e))) => {
                        tracing::error!("Task returned error: {}", e);
                        first_error.get_or_insert(e);
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                    }
                    Some(Err(e)) => {
                        tracing::error!("Task join error: {}", e);
                        first_error.get_or_insert(io::Error::new(io::ErrorKind::Other, e.to_string()));
                        let _ = shutdown_tx.send(());
                        server_handle.stop(true).await;
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(());
                server_handle.stop(true).await;
                tasks.shutdown().await;
                break;
            }
        }
    }

    tracing::info!("postboard-service shutting down");

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
