//! Manager configuration
//!
//! Values are read from the platform configuration by an external loader and
//! handed to the manager read-only.

use locnet_shared::{CallType, IpType, WwanCallEvent, WwanCallStatus, WwanCallType};
use std::time::Duration;

/// Which family of status indications the platform's connectivity service emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicationPath {
    /// Backhaul-status and roaming-status indications, with status queries
    #[default]
    BackhaulStatus,
    /// Older station-mode-status and wwan-status indications only
    Legacy,
}

/// Platform capabilities of the connectivity service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformFeatures {
    /// Mobile-AP is enabled only while a backhaul is requested, and
    /// indications are registered with a mask. When false, mobile-AP is
    /// enabled at registration to receive status indications.
    pub mobile_ap_on_demand: bool,
    /// Indication family emitted by the service
    pub indication_path: IndicationPath,
}

impl Default for PlatformFeatures {
    fn default() -> Self {
        Self {
            mobile_ap_on_demand: true,
            indication_path: IndicationPath::BackhaulStatus,
        }
    }
}

/// Configuration for the location network interface
#[derive(Debug, Clone)]
pub struct LocNetConfig {
    /// APN for data calls
    pub apn: Option<String>,
    /// Preferred IP version, `None` when not configured
    pub ip_type: Option<IpType>,
    /// Call type the location stack uses
    pub call_type: CallType,
    /// Connectivity service capabilities
    pub features: PlatformFeatures,
    /// Pause after initialising the session library
    pub session_init_settle: Duration,
}

impl Default for LocNetConfig {
    fn default() -> Self {
        Self {
            apn: None,
            ip_type: Some(IpType::V4),
            call_type: CallType::WwanInternet,
            features: PlatformFeatures::default(),
            session_init_settle: Duration::from_millis(100),
        }
    }
}

impl LocNetConfig {
    /// Configured APN, treating an empty string as missing
    pub fn apn(&self) -> Option<&str> {
        self.apn.as_deref().filter(|apn| !apn.is_empty())
    }

    /// Call type for backhaul connect/disconnect commands
    pub fn wwan_call_type(&self) -> WwanCallType {
        WwanCallType::for_ip_preference(self.ip_type)
    }

    /// Call status report carrying the configured APN and IP type
    pub fn call_status(&self, event: WwanCallEvent) -> WwanCallStatus {
        WwanCallStatus::new(event, self.apn(), self.ip_type)
    }
}
