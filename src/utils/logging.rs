use tracing::{debug, error, info, warn};

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Email schedule back-end starting on port {}", port);
}

pub fn log_server_ready(scheme: &str, host: &str, port: u16) {
    info!("✅ Server ready and listening on {}://{}:{}", scheme, host, port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

/// Eventos de segurança (state divergente, replay) vão para o target `security`
pub fn log_security_event(message: &str) {
    warn!(target: "security", "{}", message);
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
