use std::fmt;

#[derive(Debug)]
pub enum AppError {
    ConfigError(String),
    ProviderError(blackbaud::BlackbaudError),
    SessionError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ProviderError(err) => write!(f, "Blackbaud error: {}", err),
            AppError::SessionError(msg) => write!(f, "Session error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::ProviderError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<blackbaud::BlackbaudError> for AppError {
    fn from(err: blackbaud::BlackbaudError) -> Self {
        AppError::ProviderError(err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = AppError::ConfigError("oauth.client_id vazio".to_string());
        assert_eq!(err.to_string(), "Configuration error: oauth.client_id vazio");

        let err = AppError::from(blackbaud::BlackbaudError::Timeout);
        assert_eq!(err.to_string(), "Blackbaud error: Timeout ao contatar o token endpoint");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_conversion() {
        let err = AppError::from(config::ConfigError::Message("porta inválida".to_string()));
        assert!(matches!(err, AppError::ConfigError(ref msg) if msg.contains("porta inválida")));
    }
}
