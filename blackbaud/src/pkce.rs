//! Par verifier/challenge PKCE (RFC 7636, método S256).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Método de challenge enviado na URL de autorização
pub const CODE_CHALLENGE_METHOD: &str = "S256";

#[derive(Debug, Clone)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkcePair {
    /// Gera um verifier de 64 bytes aleatórios (86 caracteres base64url) e o challenge S256.
    pub fn generate() -> Self {
        let mut random = [0u8; 64];
        rand::thread_rng().fill_bytes(&mut random);

        let code_verifier = URL_SAFE_NO_PAD.encode(random);
        let code_challenge = code_challenge_s256(&code_verifier);

        Self {
            code_verifier,
            code_challenge,
        }
    }
}

pub fn code_challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
