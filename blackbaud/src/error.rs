use thiserror::Error;

/// Erros do cliente OAuth2 do Blackbaud
#[derive(Error, Debug)]
pub enum BlackbaudError {
    #[error("Erro de rede: {0}")]
    Transport(String),

    #[error("Timeout ao contatar o token endpoint")]
    Timeout,

    #[error("Token endpoint indisponível [{status}]")]
    Unavailable { status: u16, body: String },

    #[error("Grant rejeitado pelo provedor [{status}]: {error}")]
    Rejected {
        status: u16,
        error: String,
        description: Option<String>,
    },

    #[error("Resposta inválida do token endpoint: {0}")]
    InvalidResponse(String),

    #[error("Callback malformado: {0}")]
    MalformedCallback(String),
}

impl BlackbaudError {
    /// Falhas que podem desaparecer numa nova tentativa (rede, timeout, 5xx/429).
    ///
    /// Um grant rejeitado nunca é transitório: o code já foi consumido ou é inválido.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Timeout | Self::Unavailable { .. }
        )
    }

    pub fn malformed_callback(msg: impl Into<String>) -> Self {
        Self::MalformedCallback(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

impl From<reqwest::Error> for BlackbaudError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Tipo de resultado padrão do crate
pub type BlackbaudResult<T> = Result<T, BlackbaudError>;
