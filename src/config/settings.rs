use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, Environment, File};
use url::Url;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub oauth: OAuthSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Marca o cookie da tentativa como `Secure` (desligar só em http://localhost)
    pub cookie_secure: bool,
    /// Intervalo da limpeza de tentativas expiradas
    pub maintenance_interval_secs: u64,
    /// Certificado e chave PEM; com os dois definidos o servidor fala HTTPS
    #[serde(default)]
    pub tls_cert_path: Option<String>,
    #[serde(default)]
    pub tls_key_path: Option<String>,
    /// Espera máxima pelas conexões abertas no shutdown
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    #[serde(default)]
    pub scope: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub use_pkce: bool,
    pub pending_ttl_secs: u64,
    pub max_pending: usize,
    pub exchange_timeout_secs: u64,
    pub max_exchange_retries: u32,
    pub retry_backoff_ms: u64,
}

/// Rotas fixas que o redirect URI não pode sobrescrever
const RESERVED_PATHS: [&str; 2] = ["/sign-up", "/health"];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.cookie_secure", true)?
            .set_default("server.maintenance_interval_secs", 60)?
            .set_default("server.shutdown_grace_secs", 10)?
            .set_default("oauth.redirect_uri", "http://localhost:3000/redirect-auth")?
            .set_default("oauth.authorize_url", blackbaud::DEFAULT_AUTHORIZE_URL)?
            .set_default("oauth.token_url", blackbaud::DEFAULT_TOKEN_URL)?
            .set_default("oauth.use_pkce", true)?
            .set_default("oauth.pending_ttl_secs", 600)?
            .set_default("oauth.max_pending", 1000)?
            .set_default("oauth.exchange_timeout_secs", 10)?
            .set_default("oauth.max_exchange_retries", 2)?
            .set_default("oauth.retry_backoff_ms", 200)?
            // Arquivo de configuração base
            .add_source(File::with_name("config/default").required(false))
            // Arquivo específico do ambiente
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("EMAIL_SCHEDULE").separator("__"));

        // Variáveis do app registrado no Blackbaud
        let overrides = [
            ("BLACKBAUD_CLIENT_ID", "oauth.client_id"),
            ("BLACKBAUD_CLIENT_SECRET", "oauth.client_secret"),
            ("BLACKBAUD_REDIRECT_URI", "oauth.redirect_uri"),
            ("BLACKBAUD_AUTHORIZE_URL", "oauth.authorize_url"),
            ("BLACKBAUD_TOKEN_URL", "oauth.token_url"),
        ];
        for (var, key) in overrides {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_override(key, value)?;
            }
        }

        // No Cloud Run a porta vem de PORT
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let oauth = &self.oauth;

        if oauth.client_id.trim().is_empty() {
            return Err(invalid("oauth.client_id não pode ser vazio (BLACKBAUD_CLIENT_ID)"));
        }

        let redirect = oauth.redirect_url()?;
        if RESERVED_PATHS.contains(&redirect.path()) {
            return Err(invalid(format!(
                "oauth.redirect_uri não pode usar a rota reservada {}",
                redirect.path()
            )));
        }

        parse_http_url("oauth.authorize_url", &oauth.authorize_url)?;
        parse_http_url("oauth.token_url", &oauth.token_url)?;

        if oauth.pending_ttl_secs == 0 {
            return Err(invalid("oauth.pending_ttl_secs deve ser maior que zero"));
        }
        if oauth.max_pending == 0 {
            return Err(invalid("oauth.max_pending deve ser maior que zero"));
        }
        if oauth.exchange_timeout_secs == 0 {
            return Err(invalid("oauth.exchange_timeout_secs deve ser maior que zero"));
        }
        if self.server.maintenance_interval_secs == 0 {
            return Err(invalid("server.maintenance_interval_secs deve ser maior que zero"));
        }
        if self.server.tls_cert_path.is_some() != self.server.tls_key_path.is_some() {
            return Err(invalid(
                "server.tls_cert_path e server.tls_key_path devem ser definidos juntos",
            ));
        }

        Ok(())
    }
}

impl ServerSettings {
    /// (certificado, chave) quando HTTPS está habilitado
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        match (self.tls_cert_path.as_deref(), self.tls_key_path.as_deref()) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}

impl OAuthSettings {
    pub fn redirect_url(&self) -> Result<Url, ConfigError> {
        parse_http_url("oauth.redirect_uri", &self.redirect_uri)
    }

    pub fn authorize_endpoint(&self) -> Result<Url, ConfigError> {
        parse_http_url("oauth.authorize_url", &self.authorize_url)
    }

    pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
        parse_http_url("oauth.token_url", &self.token_url)
    }

    /// Path do redirect URI, onde o callback é servido
    pub fn callback_path(&self) -> String {
        self.redirect_url()
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| "/redirect-auth".to_string())
    }

    /// Scope opcional da URL de autorização, ignorando valor vazio
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Client secret configurado, ignorando valor vazio
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| invalid(format!("{} inválida ({}): {}", field, value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("{} deve ser http(s), recebido {}", field, other))),
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Message(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Settings {
        Settings {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 3000,
                cookie_secure: false,
                maintenance_interval_secs: 60,
                tls_cert_path: None,
                tls_key_path: None,
                shutdown_grace_secs: 10,
            },
            oauth: OAuthSettings {
                client_id: "client-1".to_string(),
                client_secret: None,
                redirect_uri: "http://localhost:3000/redirect-auth".to_string(),
                scope: None,
                authorize_url: blackbaud::DEFAULT_AUTHORIZE_URL.to_string(),
                token_url: blackbaud::DEFAULT_TOKEN_URL.to_string(),
                use_pkce: true,
                pending_ttl_secs: 600,
                max_pending: 1000,
                exchange_timeout_secs: 10,
                max_exchange_retries: 2,
                retry_backoff_ms: 200,
            },
        }
    }

    #[test]
    fn test_loads_from_env_with_defaults() {
        temp_env::with_vars(
            vec![
                ("BLACKBAUD_CLIENT_ID", Some("a73435c7-f62a-4101-86a5-0792c0c32ef2")),
                ("BLACKBAUD_CLIENT_SECRET", None),
                ("BLACKBAUD_REDIRECT_URI", None),
                ("BLACKBAUD_TOKEN_URL", None),
                ("PORT", Some("8080")),
            ],
            || {
                let settings = Settings::new().unwrap();

                assert_eq!(settings.oauth.client_id, "a73435c7-f62a-4101-86a5-0792c0c32ef2");
                assert_eq!(settings.oauth.authorize_url, "https://app.blackbaud.com/oauth/authorize");
                assert_eq!(settings.oauth.token_url, "https://oauth2.sky.blackbaud.com/token");
                assert_eq!(settings.oauth.max_exchange_retries, 2);
                assert_eq!(settings.oauth.exchange_timeout_secs, 10);
                assert!(settings.oauth.use_pkce);
                assert_eq!(settings.oauth.client_secret(), None);
                assert_eq!(settings.server.port, 8080);
                assert_eq!(settings.oauth.callback_path(), "/redirect-auth");
                assert_eq!(settings.server.shutdown_grace_secs, 10);
                assert!(settings.server.tls_paths().is_none());
            },
        );
    }

    #[test]
    fn test_missing_client_id_fails() {
        temp_env::with_vars_unset(vec!["BLACKBAUD_CLIENT_ID", "EMAIL_SCHEDULE__OAUTH__CLIENT_ID"], || {
            assert!(Settings::new().is_err());
        });
    }

    #[test]
    fn test_redirect_uri_override_changes_callback_path() {
        temp_env::with_vars(
            vec![
                ("BLACKBAUD_CLIENT_ID", Some("client-1")),
                ("BLACKBAUD_REDIRECT_URI", Some("https://rhs.example.org/oauth/blackbaud")),
                ("BLACKBAUD_CLIENT_SECRET", Some("s3cret")),
            ],
            || {
                let settings = Settings::new().unwrap();
                assert_eq!(settings.oauth.callback_path(), "/oauth/blackbaud");
                assert_eq!(settings.oauth.client_secret(), Some("s3cret"));
            },
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = sample();
        settings.oauth.client_id = "  ".to_string();
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.oauth.redirect_uri = "redirect-auth".to_string();
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.oauth.token_url = "ftp://oauth2.sky.blackbaud.com/token".to_string();
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.oauth.redirect_uri = "http://localhost:3000/sign-up".to_string();
        assert!(settings.validate().is_err());

        let mut settings = sample();
        settings.oauth.pending_ttl_secs = 0;
        assert!(settings.validate().is_err());

        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_tls_paths_must_come_in_pairs() {
        let mut settings = sample();
        settings.server.tls_cert_path = Some("certs/server.pem".to_string());
        assert!(settings.validate().is_err());

        settings.server.tls_key_path = Some("certs/server.key".to_string());
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.server.tls_paths(),
            Some(("certs/server.pem", "certs/server.key"))
        );
    }

    #[test]
    fn test_blank_client_secret_is_ignored() {
        let mut settings = sample();
        settings.oauth.client_secret = Some("   ".to_string());
        assert_eq!(settings.oauth.client_secret(), None);
    }
}
