// File: maowhook-core/src/platforms/mod.rs

pub mod twitch_webhook;
