use std::net::SocketAddr;

use anyhow::Context;
use axum_server::tls_rustls::RustlsConfig;
use norseus_admin::app::{router, AppState};
use norseus_admin::db;
use norseus_admin::docs::{build_openapi, swagger_routes};
use norseus_admin::jwt::JwtConfig;
use norseus_admin::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let settings = Settings::from_env()?;
    settings.locale.install();
    let jwt = JwtConfig::from_env()?;
    let pool = db::init().await?;

    let port = settings.port;
    let tls = settings.tls.clone();

    let openapi = build_openapi(port, tls.is_some())?;
    let app = router(AppState::new(pool, jwt, settings)).merge(swagger_routes(openapi)?);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    match tls {
        Some(paths) => {
            let config = RustlsConfig::from_pem_file(&paths.cert, &paths.key)
                .await
                .with_context(|| format!("failed to load TLS material from {}", paths.cert.display()))?;
            tracing::info!("listening on https://{}", addr);
            axum_server::bind_rustls(addr, config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("listening on http://{}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app.into_make_service()).await?;
        }
    }

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
