// File: maowhook-core/src/cache/mod.rs

pub mod handled_events;

pub use handled_events::{BoundedHandledEvents, InMemoryHandledEvents};
