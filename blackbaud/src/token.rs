use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{BlackbaudError, BlackbaudResult};

/// Token endpoint padrão do Blackbaud SKY API
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.sky.blackbaud.com/token";

/// Resposta do token endpoint
///
/// Campos extras do Blackbaud (`user_id`, `email`, `environment_id`, ...) ficam
/// em `extra` sem interpretação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Corpo de erro OAuth2 (RFC 6749 §5.2)
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Credenciais do app registrado no Blackbaud
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl ClientCredentials {
    pub fn public(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
        }
    }

    pub fn confidential(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Some(client_secret.into()),
        }
    }
}

/// Dados de uma troca authorization_code
#[derive(Debug, Clone)]
pub struct CodeExchange {
    pub code: String,
    pub redirect_uri: String,
    pub code_verifier: Option<String>,
}

/// Cliente do token endpoint
///
/// Faz exatamente uma requisição por chamada; a política de retry fica com
/// quem chama, usando [`BlackbaudError::is_transient`].
#[derive(Debug, Clone)]
pub struct TokenClient {
    http_client: Client,
    token_url: Url,
    credentials: ClientCredentials,
}

impl TokenClient {
    /// Cria o cliente com timeout total por requisição
    pub fn new(
        token_url: Url,
        credentials: ClientCredentials,
        timeout: Duration,
    ) -> BlackbaudResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BlackbaudError::Transport(format!("falha ao criar cliente HTTP: {}", e)))?;

        Ok(Self::with_http_client(http_client, token_url, credentials))
    }

    pub fn with_http_client(http_client: Client, token_url: Url, credentials: ClientCredentials) -> Self {
        Self {
            http_client,
            token_url,
            credentials,
        }
    }

    /// Troca o authorization code por tokens
    ///
    /// # Retorno
    /// - `Ok(TokenResponse)`: tokens emitidos
    /// - `Err(Rejected)`: provedor recusou o grant (4xx)
    /// - `Err(Unavailable | Transport | Timeout)`: falha transitória
    /// - `Err(InvalidResponse)`: 2xx com corpo que não é um token
    pub async fn exchange_code(&self, exchange: &CodeExchange) -> BlackbaudResult<TokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "authorization_code"),
            ("code", exchange.code.trim()),
            ("redirect_uri", exchange.redirect_uri.trim()),
            ("client_id", self.credentials.client_id.trim()),
        ];

        if let Some(secret) = self
            .credentials
            .client_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            form.push(("client_secret", secret));
        }

        if let Some(verifier) = exchange.code_verifier.as_deref() {
            form.push(("code_verifier", verifier));
        }

        log::debug!("POST {} (grant_type=authorization_code)", self.token_url);

        let response = self
            .http_client
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        parse_token_response(response).await
    }
}

async fn parse_token_response(response: reqwest::Response) -> BlackbaudResult<TokenResponse> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        log::warn!("Token endpoint indisponível: {}", status);
        return Err(BlackbaudError::Unavailable {
            status: status.as_u16(),
            body,
        });
    }

    if !status.is_success() {
        let details: ProviderErrorBody = serde_json::from_str(&body).unwrap_or_default();
        log::warn!(
            "Token endpoint recusou o grant: {} - {:?}",
            status,
            details.error
        );
        return Err(BlackbaudError::Rejected {
            status: status.as_u16(),
            error: details.error.unwrap_or_else(|| "unknown_error".to_string()),
            description: details.error_description,
        });
    }

    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| BlackbaudError::invalid_response(format!("JSON inválido: {}", e)))?;

    if token.access_token.trim().is_empty() {
        return Err(BlackbaudError::invalid_response("access_token vazio"));
    }

    Ok(token)
}
