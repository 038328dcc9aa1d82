/// Main Application: back-end de sign-up via Blackbaud OAuth2
///
/// Rotas:
/// - GET /sign-up → redirect para a autorização do Blackbaud
/// - GET <redirect_uri> → callback, troca do code e sessão
/// - GET /health → liveness

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing_subscriber::EnvFilter;

use email_schedule_backend::{build_router, config::Settings, utils::logging::*, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Carregar variáveis de ambiente do arquivo .env (se existir)
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    // Inicializar tracing (RUST_LOG, padrão info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if dotenv_loaded {
        tracing::info!("✅ Arquivo .env carregado com sucesso");
    } else {
        tracing::debug!("Arquivo .env não encontrado - usando variáveis de ambiente do sistema");
    }

    // Carregar configurações
    let settings = Settings::new().context("Failed to load settings")?;
    log_config_loaded(&std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let maintenance_every = Duration::from_secs(settings.server.maintenance_interval_secs);
    let shutdown_grace = Duration::from_secs(settings.server.shutdown_grace_secs);
    let tls_paths = settings
        .server
        .tls_paths()
        .map(|(cert, key)| (cert.to_string(), key.to_string()));

    log_info(&format!(
        "🔐 [OAuth2] Client {} | redirect {} | PKCE {}",
        settings.oauth.client_id, settings.oauth.redirect_uri, settings.oauth.use_pkce
    ));

    let state = Arc::new(AppState::from_settings(settings).context("Failed to build application state")?);

    // Limpeza periódica das tentativas expiradas
    let maintenance = tokio::spawn(state.pending.clone().run_maintenance(maintenance_every));

    let app = build_router(state.clone());

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address for {}:{}", host, port))?;

    // Graceful shutdown com espera limitada pelas conexões abertas
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone(), shutdown_grace));

    log_server_startup(port);

    match tls_paths {
        Some((cert, key)) => {
            let tls = RustlsConfig::from_pem_file(&cert, &key)
                .await
                .with_context(|| format!("Failed to load TLS certificate {} / key {}", cert, key))?;
            log_info(&format!("🔒 TLS habilitado (certificado {})", cert));
            log_server_ready("https", &host, port);

            axum_server::bind_rustls(addr, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        }
        None => {
            log_server_ready("http", &host, port);

            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }
    }

    state.pending.stop_maintenance();
    if let Err(e) = maintenance.await {
        log_warning(&format!("⚠️ Tarefa de manutenção terminou com erro: {}", e));
    }

    log_info("🛑 Server shut down gracefully");
    Ok(())
}

async fn graceful_shutdown(handle: Handle, grace: Duration) {
    shutdown_signal().await;
    handle.graceful_shutdown(Some(grace));
}

/// Signal handler para graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error(&format!("Falha ao instalar handler de Ctrl+C: {}", e));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log_error(&format!("Falha ao instalar handler de SIGTERM: {}", e));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log_info("🛑 Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            log_info("🛑 Received SIGTERM, shutting down gracefully...");
        }
    }
}
