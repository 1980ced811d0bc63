//! Backhaul connection multiplexing across location clients

mod multiplexer;

pub use multiplexer::{BackhaulMultiplexer, PendingFlags};
