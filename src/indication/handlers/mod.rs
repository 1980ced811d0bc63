//! Handlers for the indications the connectivity service delivers

mod backhaul;
mod legacy;
mod roaming;
mod wlan;
mod wwan;

pub(crate) use backhaul::handle_backhaul_status;
pub(crate) use legacy::{handle_station_mode_status, handle_wwan_status};
pub(crate) use roaming::handle_roaming_status;
pub(crate) use wlan::handle_wlan_status;
pub(crate) use wwan::{handle_bring_up, handle_tear_down};

use crate::backhaul::BackhaulMultiplexer;
use crate::config::LocNetConfig;
use crate::network::{NetworkStateTracker, Outbox};
use tracing::{info, warn};

/// State a handler may touch, borrowed from the locked manager
pub(crate) struct HandlerContext<'a> {
    pub network: &'a mut NetworkStateTracker,
    pub backhaul: &'a mut BackhaulMultiplexer,
    pub config: &'a LocNetConfig,
    pub outbox: &'a mut Outbox,
    /// A connectivity service client is open
    pub registered: bool,
}

impl HandlerContext<'_> {
    /// Report the cached network info. Nothing is reported without a live
    /// registration or while the backhaul type is unknown.
    pub(crate) fn notify_network_info(&mut self) {
        if !self.registered {
            warn!("[IND] Not registered with the connectivity service, not notifying");
            return;
        }
        match self.network.network_info() {
            Some(item) => self.outbox.observe(item),
            None => info!("[IND] Unknown backhaul type, not notifying"),
        }
    }
}

/// Result of handling one indication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicationResult {
    /// State updated; any reports are in the outbox
    Handled,
    /// Nothing to act on
    Ignored { reason: String },
}

impl IndicationResult {
    pub(crate) fn ignored(reason: impl Into<String>) -> Self {
        IndicationResult::Ignored {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Owned state backing a [`HandlerContext`] in handler tests
    pub(crate) struct Fixture {
        pub network: NetworkStateTracker,
        pub backhaul: BackhaulMultiplexer,
        pub config: LocNetConfig,
        pub outbox: Outbox,
        pub registered: bool,
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                network: NetworkStateTracker::default(),
                backhaul: BackhaulMultiplexer::default(),
                config: LocNetConfig::default(),
                outbox: Outbox::default(),
                registered: true,
            }
        }
    }

    impl Fixture {
        pub(crate) fn ctx(&mut self) -> HandlerContext<'_> {
            HandlerContext {
                network: &mut self.network,
                backhaul: &mut self.backhaul,
                config: &self.config,
                outbox: &mut self.outbox,
                registered: self.registered,
            }
        }

        /// Take everything reported so far
        pub(crate) fn drain(&mut self) -> Outbox {
            std::mem::take(&mut self.outbox)
        }
    }
}
