use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use url::Url;

use crate::pkce::CODE_CHALLENGE_METHOD;

/// Endpoint de autorização padrão do Blackbaud
pub const DEFAULT_AUTHORIZE_URL: &str = "https://app.blackbaud.com/oauth/authorize";

/// O Blackbaud só suporta o fluxo authorization code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Code,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Code => "code",
        }
    }
}

/// Requisição de autorização de uma única tentativa de sign-up
///
/// Criada a cada tentativa e nunca persistida; o `state` (e o verifier PKCE,
/// quando houver) ficam do lado do servidor até o callback voltar.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: Url,
    pub response_type: ResponseType,
    pub state: String,
    pub code_challenge: Option<String>,
    pub scope: Option<String>,
}

impl AuthorizationRequest {
    pub fn new(client_id: impl Into<String>, redirect_uri: Url, state: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            response_type: ResponseType::Code,
            state: state.into(),
            code_challenge: None,
            scope: None,
        }
    }

    pub fn with_code_challenge(mut self, code_challenge: impl Into<String>) -> Self {
        self.code_challenge = Some(code_challenge.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Monta a URL de autorização sobre o endpoint informado
    ///
    /// Todos os valores saem percent-encoded; `code_challenge_method=S256`
    /// acompanha o challenge sempre que ele existir.
    pub fn authorize_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.client_id)
                .append_pair("response_type", self.response_type.as_str())
                .append_pair("redirect_uri", self.redirect_uri.as_str())
                .append_pair("state", &self.state);

            if let Some(challenge) = &self.code_challenge {
                query
                    .append_pair("code_challenge", challenge)
                    .append_pair("code_challenge_method", CODE_CHALLENGE_METHOD);
            }

            if let Some(scope) = &self.scope {
                query.append_pair("scope", scope);
            }
        }
        url
    }
}

/// Gera um `state` opaco: 32 bytes aleatórios em base64url
pub fn generate_state() -> String {
    let mut random = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut random);
    URL_SAFE_NO_PAD.encode(random)
}
