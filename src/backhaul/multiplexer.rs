//! Shared backhaul reference counting
//!
//! Many clients may ask for the cellular backhaul. Only the first connect and
//! the last disconnect reach the connectivity service; everything in between
//! is coalesced onto the one outstanding operation.

use locnet_shared::{WwanCallEvent, WwanStatus};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

use crate::config::LocNetConfig;
use crate::error::{LocNetError, Result};
use crate::network::Outbox;
use crate::service::ConnectivityClient;

/// Flags guarding against re-issuing a command while one is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingFlags {
    pub request_sent: bool,
    pub connect_pending: bool,
    pub disconnect_pending: bool,
}

impl PendingFlags {
    fn any(&self) -> bool {
        self.request_sent || self.connect_pending || self.disconnect_pending
    }
}

#[derive(Debug, Default)]
pub struct BackhaulMultiplexer {
    clients: BTreeSet<String>,
    flags: PendingFlags,
    mobile_ap_enabled: bool,
}

impl BackhaulMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clients(&self) -> Vec<String> {
        self.clients.iter().cloned().collect()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn flags(&self) -> PendingFlags {
        self.flags
    }

    pub fn is_mobile_ap_enabled(&self) -> bool {
        self.mobile_ap_enabled
    }

    /// Record that mobile-AP was enabled outside of a connect
    pub fn set_mobile_ap_enabled(&mut self, enabled: bool) {
        self.mobile_ap_enabled = enabled;
    }

    /// Add `client_id` to the request set and bring the backhaul up if needed
    pub fn connect(
        &mut self,
        client_id: &str,
        conn: &mut dyn ConnectivityClient,
        config: &LocNetConfig,
        outbox: &mut Outbox,
    ) -> Result<()> {
        if self.clients.insert(client_id.to_owned()) {
            debug!("[BACKHAUL] Added client {} to request set", client_id);
        }
        debug!("[BACKHAUL] Clients holding backhaul: {:?}", self.clients);

        if config.features.mobile_ap_on_demand && !self.mobile_ap_enabled {
            info!("[BACKHAUL] Enabling mobile AP");
            if let Err(e) = conn.enable_mobile_ap() {
                error!("[BACKHAUL] Failed to enable mobile AP: {}", e);
                self.clients.clear();
                return Err(LocNetError::vendor("enable mobile AP")(e));
            }
            self.mobile_ap_enabled = true;
        }

        let (v4, v6) = match conn.wwan_status() {
            Ok(status) => status,
            Err(e) => {
                error!("[BACKHAUL] Failed to get WWAN status: {}", e);
                (WwanStatus::Unknown(0), WwanStatus::Unknown(0))
            }
        };
        if v4.is_connecting() || v6.is_connecting() {
            info!("[BACKHAUL] Connection attempt in progress, ignoring connect");
            return Ok(());
        }
        if v4.is_connected() || v6.is_connected() {
            info!("[BACKHAUL] Backhaul already connected, ignoring connect");
            outbox.call_status(config.call_status(WwanCallEvent::OpenSuccess));
            return Ok(());
        }

        if self.flags.any() {
            debug!("[BACKHAUL] Ignoring connect, outstanding request {:?}", self.flags);
            return Ok(());
        }

        info!("[BACKHAUL] Enabling roaming");
        conn.set_roaming(true).map_err(|e| {
            error!("[BACKHAUL] SetRoaming failed: {}", e);
            LocNetError::vendor("set roaming")(e)
        })?;

        // Mobile AP stays enabled on failure; the last disconnect turns it off
        let call_type = config.wwan_call_type();
        info!("[BACKHAUL] Sending connect request ({:?})", call_type);
        conn.connect_backhaul(call_type).map_err(|e| {
            error!("[BACKHAUL] Connect backhaul failed: {}", e);
            LocNetError::vendor("connect backhaul")(e)
        })?;

        self.flags.request_sent = true;
        self.flags.connect_pending = true;
        Ok(())
    }

    /// Drop `client_id` from the request set and tear the backhaul down
    /// once nobody holds it
    pub fn disconnect(
        &mut self,
        client_id: &str,
        conn: &mut dyn ConnectivityClient,
        config: &LocNetConfig,
        outbox: &mut Outbox,
    ) -> Result<()> {
        if self.clients.is_empty() {
            error!("[BACKHAUL] Disconnect from {} with no backhaul clients", client_id);
            return Err(LocNetError::NoBackhaulClients);
        }

        if !self.clients.remove(client_id) {
            debug!("[BACKHAUL] Client {} held no backhaul request", client_id);
        }

        info!(
            "[BACKHAUL] Request sent {}, remaining clients {}",
            self.flags.request_sent,
            self.clients.len()
        );
        if !self.clients.is_empty() {
            debug!("[BACKHAUL] Clients still holding backhaul: {:?}", self.clients);
            outbox.call_status(config.call_status(WwanCallEvent::CloseSuccess));
            return Ok(());
        }

        if self.mobile_ap_enabled {
            let call_type = config.wwan_call_type();
            info!("[BACKHAUL] Sending disconnect request ({:?})", call_type);
            if let Err(e) = conn.disconnect_backhaul(call_type) {
                // Mobile AP still has to go
                error!("[BACKHAUL] Disconnect backhaul failed: {}", e);
            }
        }
        self.mobile_ap_enabled = false;

        if config.features.mobile_ap_on_demand {
            info!("[BACKHAUL] Disabling mobile AP");
            conn.disable_mobile_ap().map_err(|e| {
                error!("[BACKHAUL] Failed to disable mobile AP: {}", e);
                LocNetError::vendor("disable mobile AP")(e)
            })?;
        }

        self.flags.request_sent = false;
        self.flags.disconnect_pending = true;
        Ok(())
    }

    /// Clear the connect flag. Returns whether a connect was outstanding.
    pub fn finish_connect(&mut self) -> bool {
        std::mem::take(&mut self.flags.connect_pending)
    }

    /// Clear the disconnect flag. Returns whether a disconnect was outstanding.
    pub fn finish_disconnect(&mut self) -> bool {
        std::mem::take(&mut self.flags.disconnect_pending)
    }
}
