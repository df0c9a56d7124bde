// File: maowhook-core/src/auth/mod.rs

pub mod credentials;
pub mod token_source;

pub use credentials::CredentialManager;
pub use token_source::TwitchTokenSource;
