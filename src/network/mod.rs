//! Network state tracking and observer notification

mod notifier;
mod tracker;

pub(crate) use notifier::Outbox;
pub use notifier::{ObserverCallback, ObserverNotifier, WwanCallStatusCallback};
pub use tracker::{BackhaulState, NetworkStateTracker};
