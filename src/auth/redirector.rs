//! Authorization Redirector
//!
//! Gera state + PKCE para cada tentativa de sign-up, registra a tentativa no
//! store de pendentes e devolve a URL de autorização do Blackbaud.

use std::sync::Arc;

use blackbaud::{generate_state, AuthorizationRequest, PkcePair};
use url::Url;
use uuid::Uuid;

use super::pending::{PendingAuthorization, PendingAuthorizations};
use crate::config::OAuthSettings;
use crate::utils::AppResult;
use crate::utils::logging::*;

/// Início de uma tentativa: id que vai no cookie + destino do redirect
#[derive(Debug, Clone)]
pub struct AuthorizationStart {
    pub attempt_id: String,
    pub authorization_url: Url,
}

pub struct AuthorizationRedirector {
    client_id: String,
    redirect_uri: Url,
    authorize_endpoint: Url,
    use_pkce: bool,
    scope: Option<String>,
    pending: Arc<PendingAuthorizations>,
}

impl AuthorizationRedirector {
    pub fn new(settings: &OAuthSettings, pending: Arc<PendingAuthorizations>) -> AppResult<Self> {
        Ok(Self {
            client_id: settings.client_id.clone(),
            redirect_uri: settings.redirect_url()?,
            authorize_endpoint: settings.authorize_endpoint()?,
            use_pkce: settings.use_pkce,
            scope: settings.scope().map(str::to_string),
            pending,
        })
    }

    /// Inicia uma nova tentativa
    ///
    /// Cada chamada gera state e verifier novos; nada é reaproveitado de
    /// tentativas anteriores.
    pub async fn begin(&self) -> AuthorizationStart {
        let state = generate_state();
        let pkce = self.use_pkce.then(PkcePair::generate);

        let mut request = AuthorizationRequest::new(self.client_id.clone(), self.redirect_uri.clone(), state.clone());
        if let Some(pair) = &pkce {
            request = request.with_code_challenge(pair.code_challenge.clone());
        }
        if let Some(scope) = &self.scope {
            request = request.with_scope(scope.clone());
        }

        let attempt_id = Uuid::new_v4().to_string();
        self.pending
            .insert(
                attempt_id.clone(),
                PendingAuthorization::new(state, pkce.map(|pair| pair.code_verifier)),
            )
            .await;

        let authorization_url = request.authorize_url(&self.authorize_endpoint);

        log_info(&format!(
            "🚀 [OAuth2] Tentativa {} iniciada (PKCE: {}), redirecionando para {}",
            attempt_id,
            self.use_pkce,
            self.authorize_endpoint
        ));

        AuthorizationStart {
            attempt_id,
            authorization_url,
        }
    }
}
