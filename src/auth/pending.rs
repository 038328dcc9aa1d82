//! Pending Authorizations
//!
//! Registro server-side, de uso único e com expiração, das tentativas de
//! sign-up que aguardam o callback. Cada entrada é indexada pelo `attempt_id`
//! que viaja no cookie do navegador.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};
use tokio::time::interval;

use crate::utils::logging::*;

/// Dados guardados entre o redirect e o callback
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub state: String,
    pub code_verifier: Option<String>,
    created_at: Instant,
}

impl PendingAuthorization {
    pub fn new(state: impl Into<String>, code_verifier: Option<String>) -> Self {
        Self {
            state: state.into(),
            code_verifier,
            created_at: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Store de tentativas pendentes
pub struct PendingAuthorizations {
    entries: Mutex<HashMap<String, PendingAuthorization>>,
    ttl: Duration,
    capacity: usize,
    shutdown_tx: watch::Sender<bool>,
}

impl PendingAuthorizations {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
            shutdown_tx,
        }
    }

    /// Registra uma tentativa; com o store cheio, a mais antiga é descartada
    pub async fn insert(&self, attempt_id: String, pending: PendingAuthorization) {
        let mut entries = self.entries.lock().await;

        if entries.len() >= self.capacity && !entries.contains_key(&attempt_id) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(id, _)| id.clone());

            if let Some(oldest) = oldest {
                entries.remove(&oldest);
                log_warning(&format!(
                    "⚠️ [PendingAuth] Capacidade {} atingida, tentativa mais antiga descartada",
                    self.capacity
                ));
            }
        }

        entries.insert(attempt_id, pending);
    }

    /// Remove e devolve a tentativa. Uso único: uma segunda chamada retorna `None`.
    ///
    /// Entradas expiradas também são removidas e tratadas como inexistentes.
    pub async fn take(&self, attempt_id: &str) -> Option<PendingAuthorization> {
        let pending = self.entries.lock().await.remove(attempt_id)?;

        if pending.age() >= self.ttl {
            log_info("⌛ [PendingAuth] Tentativa expirada descartada no callback");
            return None;
        }

        Some(pending)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Remove entradas expiradas e retorna quantas saíram
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, p| p.age() < ttl);
        before - entries.len()
    }

    pub fn stop_maintenance(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Loop de limpeza periódica; termina em `stop_maintenance`
    pub async fn run_maintenance(self: Arc<Self>, every: Duration) {
        let mut ticker = interval(every);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        if *shutdown_rx.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.purge_expired().await;
                    if purged > 0 {
                        log_info(&format!("🧹 [PendingAuth] {} tentativas expiradas removidas", purged));
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        log_info("🛑 [PendingAuth] Manutenção encerrada");
                        break;
                    }
                }
            }
        }
    }
}
