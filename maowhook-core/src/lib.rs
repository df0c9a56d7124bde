// File: maowhook-core/src/lib.rs

pub mod auth;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod http;
pub mod platforms;
pub mod tasks;

pub use config::ClientConfig;
pub use http::{DefaultHttpClient, HttpClient};
pub use maowhook_common::Error;
pub use platforms::twitch_webhook::{Client, ClientBuilder};
