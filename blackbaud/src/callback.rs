use serde::Deserialize;

use crate::error::{BlackbaudError, BlackbaudResult};

/// Query string recebida no redirect URI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Resultado da autorização, consumido uma única vez
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationResult {
    Granted {
        code: String,
        state: String,
    },
    Denied {
        error: String,
        error_description: Option<String>,
        state: Option<String>,
    },
}

impl AuthorizationResult {
    /// Interpreta os parâmetros do callback
    ///
    /// `error` tem precedência sobre `code`. Um `code` sem `state` vira
    /// `state` vazio, que nunca confere com o valor armazenado.
    pub fn from_query(query: CallbackQuery) -> BlackbaudResult<Self> {
        if let Some(error) = non_empty(query.error) {
            return Ok(Self::Denied {
                error,
                error_description: non_empty(query.error_description),
                state: non_empty(query.state),
            });
        }

        let code = non_empty(query.code).ok_or_else(|| {
            BlackbaudError::malformed_callback("nem code nem error presentes")
        })?;

        Ok(Self::Granted {
            code,
            state: non_empty(query.state).unwrap_or_default(),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
