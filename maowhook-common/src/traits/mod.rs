// File: maowhook-common/src/traits/mod.rs

pub mod auth_traits;
pub mod handled_events;

pub use auth_traits::TokenSource;
pub use handled_events::HandledEventsChecker;
