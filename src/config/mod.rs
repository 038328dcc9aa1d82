pub mod settings;

pub use settings::{OAuthSettings, ServerSettings, Settings};
