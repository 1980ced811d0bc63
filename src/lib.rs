//! Location network interface
//!
//! Gives the location stack one view of device connectivity and one place to
//! ask for a data backhaul:
//! - Tracks the active backhaul and Wi-Fi hardware state from connectivity
//!   service indications and reports them to a single observer
//! - Shares the cellular backhaul between location clients, issuing only the
//!   first connect and the last disconnect
//! - Runs the dedicated positioning-assistance data call through the session
//!   library

pub mod backhaul;
pub mod config;
pub mod error;
mod indication;
pub mod manager;
pub mod network;
pub mod service;
pub mod subscription;
pub mod wwan;

pub use backhaul::PendingFlags;
pub use config::{IndicationPath, LocNetConfig, PlatformFeatures};
pub use error::{LocNetError, Result};
pub use indication::IndicationResult;
pub use manager::{Collaborators, LocNetIface};
pub use network::{BackhaulState, ObserverCallback, WwanCallStatusCallback};
