//! Observer subscriptions
//!
//! Tracks which data items the framework wants pushed. Only network info and
//! Wi-Fi hardware state need a connectivity service registration; this
//! platform never answers pull requests.

mod registry;

pub use registry::{Categories, SubscriptionChange, SubscriptionRegistry};
