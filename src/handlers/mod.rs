// Handlers de infraestrutura
pub mod health;

pub use health::*;

// Handlers do sign-up OAuth2 estão em src/auth/handlers.rs
