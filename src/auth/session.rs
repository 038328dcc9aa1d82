//! Session establishment
//!
//! O CallbackHandler entrega o `TokenResponse` a um `SessionEstablisher`.
//! O formato de sessão fica fora deste serviço; a implementação padrão só
//! guarda os tokens em memória indexados por um id opaco.

use std::collections::HashMap;
use std::sync::RwLock;

use blackbaud::TokenResponse;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::utils::{mask_secret, AppError, AppResult};
use crate::utils::logging::*;

/// Resultado local de um sign-up concluído
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstablishedSession {
    pub session_id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

pub trait SessionEstablisher: Send + Sync {
    fn establish(&self, tokens: TokenResponse) -> AppResult<EstablishedSession>;
}

#[derive(Debug, Clone)]
struct StoredTokens {
    tokens: TokenResponse,
    expires_at: Option<DateTime<Utc>>,
}

/// Sessões em memória (perdidas a cada restart)
#[derive(Default)]
pub struct InMemorySessions {
    sessions: RwLock<HashMap<String, StoredTokens>>,
}

impl InMemorySessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().ok()?;
        sessions
            .get(session_id)
            .map(|stored| stored.tokens.access_token.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionEstablisher for InMemorySessions {
    fn establish(&self, tokens: TokenResponse) -> AppResult<EstablishedSession> {
        let session_id = Uuid::new_v4().to_string();
        let expires_at = tokens
            .expires_in
            .and_then(|secs| i64::try_from(secs).ok())
            .map(|secs| Utc::now() + Duration::seconds(secs));

        log_info(&format!(
            "🔑 [Session] Sessão {} criada (token {}, expira em {:?}s)",
            session_id,
            mask_secret(&tokens.access_token),
            tokens.expires_in
        ));

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AppError::SessionError("lock de sessões envenenado".to_string()))?;
        sessions.insert(session_id.clone(), StoredTokens { tokens, expires_at });

        Ok(EstablishedSession {
            session_id,
            expires_at,
        })
    }
}
