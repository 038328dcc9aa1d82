use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::handlers::render_message_page;

/// Falhas terminais do callback OAuth2
///
/// O `Display` é para operadores (logs); o usuário só vê `user_message`.
#[derive(Error, Debug)]
pub enum AuthFlowError {
    #[error("Autorização negada pelo provedor: {error}")]
    AuthorizationDenied {
        error: String,
        description: Option<String>,
    },

    #[error("State OAuth2 não confere com nenhuma tentativa pendente")]
    StateMismatch,

    #[error("Falha de rede na troca do código: {0}")]
    NetworkError(String),

    #[error("Código de autorização rejeitado: {0}")]
    InvalidGrant(String),

    #[error("Callback sem code nem error")]
    MalformedCallback,

    #[error("Falha ao estabelecer sessão: {0}")]
    Session(String),

    #[error("Erro interno no fluxo OAuth2: {0}")]
    Internal(String),
}

impl AuthFlowError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthorizationDenied { .. } => "authorization_denied",
            Self::StateMismatch => "state_mismatch",
            Self::NetworkError(_) => "network_error",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::MalformedCallback => "malformed_callback",
            Self::Session(_) => "session_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthorizationDenied { .. }
            | Self::StateMismatch
            | Self::InvalidGrant(_)
            | Self::MalformedCallback => StatusCode::BAD_REQUEST,
            Self::NetworkError(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Mensagem exibida ao usuário, sem detalhes do provedor
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthorizationDenied { .. } => {
                "Sign-up was cancelled at Blackbaud. You can start again whenever you are ready."
            }
            Self::StateMismatch => {
                "This sign-up link has expired or was already used. Please start the sign-up again."
            }
            Self::NetworkError(_) => {
                "Blackbaud could not be reached right now. Please try again in a few minutes."
            }
            Self::InvalidGrant(_) => {
                "Blackbaud did not accept this sign-up. Please start the sign-up again."
            }
            Self::MalformedCallback => "The sign-up response was incomplete. Please start the sign-up again.",
            Self::Session(_) | Self::Internal(_) => {
                "Something went wrong on our side while finishing your sign-up. Please try again."
            }
        }
    }

    /// Possível CSRF ou replay
    pub fn is_security_relevant(&self) -> bool {
        matches!(self, Self::StateMismatch)
    }
}

impl IntoResponse for AuthFlowError {
    fn into_response(self) -> Response {
        let page = render_message_page("Sign-up failed", self.user_message(), true);
        (self.status_code(), page).into_response()
    }
}
