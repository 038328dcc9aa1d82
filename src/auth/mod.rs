//! # Blackbaud OAuth2 Sign-up Module
//!
//! Fluxo authorization code (com PKCE) para cadastrar usuários via Blackbaud.
//!
//! ## Responsabilidades:
//! - Iniciar a tentativa (state + PKCE + redirect para o Blackbaud)
//! - Validar o callback (state de uso único, comparação em tempo constante)
//! - Trocar o authorization code por tokens, com retry limitado
//! - Entregar os tokens ao estabelecimento de sessão
//!
//! ## Estrutura:
//! - `pending.rs`: Tentativas pendentes (TTL, capacidade, uso único)
//! - `redirector.rs`: AuthorizationRedirector
//! - `callback.rs`: CallbackHandler e sua máquina de estados
//! - `session.rs`: SessionEstablisher
//! - `error.rs`: AuthFlowError
//! - `handlers.rs`: Handlers HTTP (sign_up, redirect_auth)

pub mod callback;
pub mod error;
pub mod handlers;
pub mod pending;
pub mod redirector;
pub mod session;

pub use callback::{CallbackFlow, CallbackHandler, CallbackPhase, CallbackReport, ExchangePolicy};
pub use error::AuthFlowError;
pub use handlers::{redirect_auth, sign_up, ATTEMPT_COOKIE};
pub use pending::{PendingAuthorization, PendingAuthorizations};
pub use redirector::{AuthorizationRedirector, AuthorizationStart};
pub use session::{EstablishedSession, InMemorySessions, SessionEstablisher};
