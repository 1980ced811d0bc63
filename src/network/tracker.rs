//! Network and Wi-Fi state tracking
//!
//! Pure state plus the derivations the handlers and queries need. Callers hold
//! the manager lock while touching it.

use locnet_shared::{
    BackhaulReport, BackhaulType, ConnState, DataItem, NetworkInfo, WlanMode, WlanState,
};
use tracing::{debug, info};

/// Current backhaul as last reported by the connectivity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackhaulState {
    pub backhaul_type: BackhaulType,
    pub connectivity: ConnState,
    pub roaming: bool,
}

impl BackhaulState {
    pub fn is_connected(&self) -> bool {
        self.connectivity == ConnState::Connected
    }
}

#[derive(Debug, Default)]
pub struct NetworkStateTracker {
    backhaul: BackhaulState,
    wlan: WlanState,
}

impl NetworkStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backhaul(&self) -> BackhaulState {
        self.backhaul
    }

    pub fn wlan(&self) -> WlanState {
        self.wlan
    }

    /// Apply a valid backhaul report. Roaming only makes sense on WWAN.
    pub fn apply_report(&mut self, report: &BackhaulReport) {
        let backhaul_type = BackhaulType::from_vendor_code(report.backhaul_type);
        info!(
            "[NET] Backhaul status: type={} ({}) ipv4={} ipv6={}",
            backhaul_type, report.backhaul_type, report.ipv4_available, report.ipv6_available
        );

        self.backhaul.backhaul_type = backhaul_type;
        if backhaul_type != BackhaulType::Wwan {
            self.backhaul.roaming = false;
        }
        self.backhaul.connectivity = if report.is_available() {
            ConnState::Connected
        } else {
            ConnState::Disconnected
        };
    }

    /// Mark the backhaul unknown after a malformed status report
    pub fn invalidate(&mut self) {
        self.backhaul.backhaul_type = BackhaulType::Invalid;
        self.backhaul.connectivity = ConnState::Invalid;
    }

    /// Legacy status reports force the type and carry only connectivity
    pub fn set_status(&mut self, backhaul_type: BackhaulType, connectivity: ConnState) {
        self.backhaul.backhaul_type = backhaul_type;
        self.backhaul.connectivity = connectivity;
    }

    pub fn set_roaming(&mut self, roaming: bool) {
        self.backhaul.roaming = roaming;
    }

    pub fn set_wlan(&mut self, wlan: WlanState) {
        self.wlan = wlan;
    }

    /// Classify a queried Wi-Fi mode. Returns the enabled flag to report, or
    /// `None` for AP-only modes, which leave the state alone.
    pub fn apply_wlan_mode(&mut self, mode: WlanMode) -> Option<bool> {
        if mode == WlanMode::Unset {
            self.wlan = WlanState::Disabled;
            Some(false)
        } else if mode.is_station_capable() {
            self.wlan = WlanState::Enabled;
            Some(true)
        } else {
            debug!("[NET] Wi-Fi mode {:?} has no station, state unchanged", mode);
            None
        }
    }

    /// Network info item for observers, `None` while the type is unknown
    pub fn network_info(&self) -> Option<DataItem> {
        if !self.backhaul.backhaul_type.is_valid() {
            return None;
        }
        let connected = self.backhaul.is_connected();
        Some(DataItem::NetworkInfo(NetworkInfo {
            backhaul_type: self.backhaul.backhaul_type,
            available: connected,
            connected,
            roaming: self.backhaul.roaming,
        }))
    }

    pub fn wifi_hardware_state(&self) -> DataItem {
        DataItem::WifiHardwareState {
            enabled: self.wlan == WlanState::Enabled,
        }
    }

    pub fn is_wwan(&self) -> bool {
        self.backhaul.backhaul_type == BackhaulType::Wwan
    }

    /// Current type is valid and not cellular
    pub fn is_non_metered_type(&self) -> bool {
        self.backhaul.backhaul_type.is_valid() && !self.is_wwan()
    }
}
