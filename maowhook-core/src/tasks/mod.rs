// File: maowhook-core/src/tasks/mod.rs

pub mod credential_refresh;
