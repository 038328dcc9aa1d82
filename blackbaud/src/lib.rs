//! # Blackbaud OAuth2
//!
//! Cliente mínimo para o fluxo OAuth2 authorization code do Blackbaud SKY API.
//!
//! ## Features
//!
//! - Montagem da URL de autorização (`/oauth/authorize`)
//! - Geração de `state` e par PKCE (S256)
//! - Parsing dos parâmetros do callback
//! - Troca do authorization code no token endpoint
//!
//! ## Exemplo
//!
//! ```no_run
//! use blackbaud::{AuthorizationRequest, ClientCredentials, CodeExchange, PkcePair, TokenClient};
//! use std::time::Duration;
//! use url::Url;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let redirect = Url::parse("http://localhost:3000/redirect-auth")?;
//! let pkce = PkcePair::generate();
//! let request = AuthorizationRequest::new("client-id", redirect.clone(), blackbaud::generate_state())
//!     .with_code_challenge(pkce.code_challenge.clone());
//! let authorize_url = request.authorize_url(&Url::parse(blackbaud::DEFAULT_AUTHORIZE_URL)?);
//! println!("Abra: {}", authorize_url);
//!
//! let client = TokenClient::new(
//!     Url::parse(blackbaud::DEFAULT_TOKEN_URL)?,
//!     ClientCredentials::public("client-id"),
//!     Duration::from_secs(10),
//! )?;
//! let tokens = client
//!     .exchange_code(&CodeExchange {
//!         code: "code-do-callback".to_string(),
//!         redirect_uri: redirect.to_string(),
//!         code_verifier: Some(pkce.code_verifier),
//!     })
//!     .await?;
//! println!("expira em {:?}s", tokens.expires_in);
//! # Ok(())
//! # }
//! ```

/// Requisição de autorização e geração de `state`
pub mod authorize;

/// Parâmetros do callback de autorização
pub mod callback;

/// Tratamento de erros
pub mod error;

/// Proof Key for Code Exchange
pub mod pkce;

/// Token endpoint
pub mod token;

pub use authorize::{generate_state, AuthorizationRequest, ResponseType, DEFAULT_AUTHORIZE_URL};
pub use callback::{AuthorizationResult, CallbackQuery};
pub use error::{BlackbaudError, BlackbaudResult};
pub use pkce::PkcePair;
pub use token::{ClientCredentials, CodeExchange, TokenClient, TokenResponse, DEFAULT_TOKEN_URL};
