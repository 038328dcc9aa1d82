//! Callback Handler
//!
//! Máquina de estados do retorno do Blackbaud:
//!
//! ```text
//! AwaitingCallback -> Validating -> Exchanging -> Succeeded
//!                          |             |
//!                          +--> Failed <-+
//! ```
//!
//! A tentativa pendente é consumida antes de qualquer validação, então um
//! callback repetido nunca gera uma segunda troca de código.

use std::sync::Arc;
use std::time::Duration;

use blackbaud::{AuthorizationResult, BlackbaudError, CallbackQuery, CodeExchange, TokenClient, TokenResponse};
use subtle::ConstantTimeEq;
use thiserror::Error;
use url::Url;

use super::error::AuthFlowError;
use super::pending::PendingAuthorizations;
use super::session::{EstablishedSession, SessionEstablisher};
use crate::config::OAuthSettings;
use crate::utils::logging::*;
use crate::utils::truncate_safe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPhase {
    AwaitingCallback,
    Validating,
    Exchanging,
    Succeeded,
    Failed,
}

impl CallbackPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transição inválida no callback: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: CallbackPhase,
    pub to: CallbackPhase,
}

impl From<InvalidTransition> for AuthFlowError {
    fn from(err: InvalidTransition) -> Self {
        AuthFlowError::Internal(err.to_string())
    }
}

/// Estado de um único callback, com o histórico de fases percorridas
#[derive(Debug, Clone)]
pub struct CallbackFlow {
    phase: CallbackPhase,
    history: Vec<CallbackPhase>,
}

impl Default for CallbackFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CallbackFlow {
    pub fn new() -> Self {
        Self {
            phase: CallbackPhase::AwaitingCallback,
            history: vec![CallbackPhase::AwaitingCallback],
        }
    }

    pub fn phase(&self) -> CallbackPhase {
        self.phase
    }

    pub fn history(&self) -> &[CallbackPhase] {
        &self.history
    }

    pub fn advance(&mut self, next: CallbackPhase) -> Result<(), InvalidTransition> {
        use CallbackPhase::*;

        let allowed = matches!(
            (self.phase, next),
            (AwaitingCallback, Validating)
                | (Validating, Exchanging)
                | (Exchanging, Succeeded)
                | (AwaitingCallback | Validating | Exchanging, Failed)
        );

        if !allowed {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        self.phase = next;
        self.history.push(next);
        Ok(())
    }

    /// Vai para `Failed` a partir de qualquer fase não terminal
    pub fn fail(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = CallbackPhase::Failed;
            self.history.push(CallbackPhase::Failed);
        }
    }
}

/// Limites da troca do código
#[derive(Debug, Clone, Copy)]
pub struct ExchangePolicy {
    /// Novas tentativas após a primeira, só para falhas transitórias
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl ExchangePolicy {
    pub fn from_settings(settings: &OAuthSettings) -> Self {
        Self {
            max_retries: settings.max_exchange_retries,
            initial_backoff: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    /// Espera antes da retentativa `retry` (1-based): `initial * 2^(retry-1)`
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for ExchangePolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// Resultado de um callback: fases percorridas + desfecho
#[derive(Debug)]
pub struct CallbackReport {
    pub phases: Vec<CallbackPhase>,
    pub outcome: Result<EstablishedSession, AuthFlowError>,
}

impl CallbackReport {
    pub fn final_phase(&self) -> CallbackPhase {
        self.phases
            .last()
            .copied()
            .unwrap_or(CallbackPhase::AwaitingCallback)
    }

    pub fn reached(&self, phase: CallbackPhase) -> bool {
        self.phases.contains(&phase)
    }
}

pub struct CallbackHandler {
    pending: Arc<PendingAuthorizations>,
    token_client: TokenClient,
    redirect_uri: Url,
    policy: ExchangePolicy,
    sessions: Arc<dyn SessionEstablisher>,
}

impl CallbackHandler {
    pub fn new(
        pending: Arc<PendingAuthorizations>,
        token_client: TokenClient,
        redirect_uri: Url,
        policy: ExchangePolicy,
        sessions: Arc<dyn SessionEstablisher>,
    ) -> Self {
        Self {
            pending,
            token_client,
            redirect_uri,
            policy,
            sessions,
        }
    }

    /// Processa um callback
    ///
    /// `attempt_id` vem do cookie da tentativa; sem ele nenhuma tentativa
    /// pendente é encontrada e o callback falha com `StateMismatch`.
    pub async fn handle(&self, attempt_id: Option<&str>, query: CallbackQuery) -> CallbackReport {
        self.process(attempt_id, Ok(query)).await
    }

    /// Callback cuja query string nem chegou a ser interpretada
    /// (ex.: `code` duplicado). A tentativa pendente é consumida do mesmo jeito.
    pub async fn handle_unparseable(&self, attempt_id: Option<&str>, reason: &str) -> CallbackReport {
        self.process(attempt_id, Err(reason.to_string())).await
    }

    async fn process(&self, attempt_id: Option<&str>, query: Result<CallbackQuery, String>) -> CallbackReport {
        let mut flow = CallbackFlow::new();
        let outcome = self.run(&mut flow, attempt_id, query).await;

        match &outcome {
            Ok(session) => {
                log_info(&format!(
                    "✅ [OAuth2] Sign-up concluído, sessão {}",
                    session.session_id
                ));
            }
            Err(e) => {
                flow.fail();
                if !e.is_security_relevant() {
                    log_warning(&format!("❌ [OAuth2] Callback falhou ({}): {}", e.kind(), e));
                }
            }
        }

        CallbackReport {
            phases: flow.history().to_vec(),
            outcome,
        }
    }

    async fn run(
        &self,
        flow: &mut CallbackFlow,
        attempt_id: Option<&str>,
        query: Result<CallbackQuery, String>,
    ) -> Result<EstablishedSession, AuthFlowError> {
        flow.advance(CallbackPhase::Validating)?;

        // Consumida antes de validar: uso único em qualquer desfecho
        let pending = match attempt_id {
            Some(id) => self.pending.take(id).await,
            None => None,
        };

        let result = query
            .map_err(BlackbaudError::malformed_callback)
            .and_then(AuthorizationResult::from_query)
            .map_err(|e| {
                log_warning(&format!("⚠️ [OAuth2] {}", e));
                AuthFlowError::MalformedCallback
            })?;

        let (code, received_state) = match result {
            AuthorizationResult::Denied {
                error,
                error_description,
                state,
            } => {
                // Um cancelamento com state alheio não é do usuário desta tentativa
                if let Some(received) = state {
                    let pending = pending.ok_or_else(|| missing_pending(attempt_id))?;
                    check_state(&pending.state, &received)?;
                }
                return Err(AuthFlowError::AuthorizationDenied {
                    error,
                    description: error_description,
                });
            }
            AuthorizationResult::Granted { code, state } => (code, state),
        };

        let pending = pending.ok_or_else(|| missing_pending(attempt_id))?;
        check_state(&pending.state, &received_state)?;

        flow.advance(CallbackPhase::Exchanging)?;
        log_info(&format!(
            "🔑 [OAuth2] State confere, trocando code {}...",
            truncate_safe(&code, 6)
        ));

        let exchange = CodeExchange {
            code,
            redirect_uri: self.redirect_uri.to_string(),
            code_verifier: pending.code_verifier,
        };
        let tokens = self.exchange_with_retry(&exchange).await?;

        let session = self
            .sessions
            .establish(tokens)
            .map_err(|e| AuthFlowError::Session(e.to_string()))?;

        flow.advance(CallbackPhase::Succeeded)?;
        Ok(session)
    }

    async fn exchange_with_retry(&self, exchange: &CodeExchange) -> Result<TokenResponse, AuthFlowError> {
        let max_attempts = self.policy.max_retries.saturating_add(1);

        for attempt in 1..=max_attempts {
            match self.token_client.exchange_code(exchange).await {
                Ok(tokens) => return Ok(tokens),
                Err(e) if e.is_transient() => {
                    if attempt < max_attempts {
                        let backoff = self.policy.backoff(attempt);
                        log_warning(&format!(
                            "⚠️ [OAuth2] Troca do code falhou ({}). Tentativa {}/{}, retry em {}ms...",
                            e,
                            attempt,
                            max_attempts,
                            backoff.as_millis()
                        ));
                        tokio::time::sleep(backoff).await;
                    } else {
                        log_error(&format!(
                            "❌ [OAuth2] Token endpoint indisponível após {} tentativas: {}",
                            max_attempts,
                            truncate_safe(&e.to_string(), 200)
                        ));
                        return Err(AuthFlowError::NetworkError(e.to_string()));
                    }
                }
                Err(e @ (BlackbaudError::Rejected { .. } | BlackbaudError::InvalidResponse(_))) => {
                    log_error(&format!(
                        "❌ [OAuth2] Token endpoint recusou o code: {}",
                        truncate_safe(&e.to_string(), 200)
                    ));
                    return Err(AuthFlowError::InvalidGrant(e.to_string()));
                }
                Err(e) => return Err(AuthFlowError::Internal(e.to_string())),
            }
        }

        Err(AuthFlowError::Internal("nenhuma tentativa de troca executada".to_string()))
    }
}

fn states_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

fn missing_pending(attempt_id: Option<&str>) -> AuthFlowError {
    log_security_event(&format!(
        "🚨 [OAuth2] Callback sem tentativa pendente (cookie {}): expirada, repetida ou forjada",
        if attempt_id.is_some() { "presente" } else { "ausente" }
    ));
    AuthFlowError::StateMismatch
}

fn check_state(expected: &str, received: &str) -> Result<(), AuthFlowError> {
    if states_match(expected, received) {
        Ok(())
    } else {
        log_security_event("🚨 [OAuth2] State divergente no callback, possível CSRF");
        Err(AuthFlowError::StateMismatch)
    }
}
