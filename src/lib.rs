// Biblioteca do back-end de sign-up Blackbaud
// Expõe módulos para uso em testes e no binário

pub mod auth;
pub mod config;
pub mod handlers;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use blackbaud::{ClientCredentials, TokenClient};
use tower_http::trace::TraceLayer;

use auth::{
    AuthorizationRedirector, CallbackHandler, ExchangePolicy, InMemorySessions, PendingAuthorizations,
    SessionEstablisher,
};
use utils::AppResult;

// AppState é definido aqui para ser compartilhado
pub struct AppState {
    pub settings: config::Settings,
    pub pending: Arc<PendingAuthorizations>,
    pub redirector: AuthorizationRedirector,
    pub callback: CallbackHandler,
}

impl AppState {
    /// Estado com sessões em memória
    pub fn from_settings(settings: config::Settings) -> AppResult<Self> {
        Self::with_sessions(settings, Arc::new(InMemorySessions::new()))
    }

    pub fn with_sessions(settings: config::Settings, sessions: Arc<dyn SessionEstablisher>) -> AppResult<Self> {
        let oauth = &settings.oauth;

        let pending = Arc::new(PendingAuthorizations::new(
            Duration::from_secs(oauth.pending_ttl_secs),
            oauth.max_pending,
        ));

        let credentials = match oauth.client_secret() {
            Some(secret) => ClientCredentials::confidential(oauth.client_id.clone(), secret),
            None => ClientCredentials::public(oauth.client_id.clone()),
        };
        let token_client = TokenClient::new(
            oauth.token_endpoint()?,
            credentials,
            Duration::from_secs(oauth.exchange_timeout_secs),
        )?;

        let redirector = AuthorizationRedirector::new(oauth, pending.clone())?;
        let callback = CallbackHandler::new(
            pending.clone(),
            token_client,
            oauth.redirect_url()?,
            ExchangePolicy::from_settings(oauth),
            sessions,
        );

        Ok(Self {
            settings,
            pending,
            redirector,
            callback,
        })
    }
}

/// Rotas do serviço; o callback fica no path do redirect URI configurado
pub fn build_router(state: Arc<AppState>) -> Router {
    let callback_path = state.settings.oauth.callback_path();

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/sign-up", get(auth::sign_up))
        .route(&callback_path, get(auth::redirect_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
