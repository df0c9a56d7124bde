// File: maowhook-core/src/platforms/twitch_webhook/mod.rs

pub mod client;
pub mod handler;
pub mod subscriptions;
pub mod verification;

pub use client::{Client, ClientBuilder, EventHandler, RevocationHandler};
pub use handler::{webhook_handler, WebhookResponse};
