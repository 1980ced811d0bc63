//! locnet shared types
//!
//! This crate provides the connectivity types shared by the location network
//! interface manager and the collaborators that feed it: observer data items,
//! backhaul/IP enums, typed vendor indications, the raw indication boundary and
//! the dedicated WWAN call state machine.

pub mod codec;
pub mod indication;
pub mod state_machine;

pub use codec::{CodecError, PayloadDecoder, RawIndication};
pub use indication::{
    BackhaulReport, BackhaulStatusInd, Indication, IndicationMask, MessageKind,
    StationModeStatus, WlanMode, WlanStatus, WwanStatus,
};
pub use state_machine::{SessionEvent, SessionHandle, WwanCallSession};

use std::fmt;

/// Identifiers of the data items an observer can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataItemId {
    AirplaneMode,
    Enh,
    GpsState,
    NlpStatus,
    WifiHardwareState,
    NetworkInfo,
    RilVersion,
    RilServiceInfo,
    RilCellInfo,
    ServiceStatus,
    Model,
    Manufacturer,
    VoiceCall,
    AssistedGps,
    ScreenState,
    PowerConnectState,
    TimezoneChange,
    TimeChange,
    WifiSupplicantStatus,
    ShutdownState,
    Tac,
    MccMnc,
    BtLeScan,
    BtScan,
}

/// Type of the currently active backhaul
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackhaulType {
    Wwan,
    Wlan,
    Ethernet,
    UsbCradle,
    Bluetooth,
    #[default]
    Invalid,
}

impl BackhaulType {
    /// Map a connectivity service backhaul type code.
    ///
    /// Codes: 1 WWAN, 2 USB cradle, 3 WLAN, 4 Ethernet, 5 Bluetooth.
    pub fn from_vendor_code(code: i32) -> Self {
        match code {
            1 => BackhaulType::Wwan,
            2 => BackhaulType::UsbCradle,
            3 => BackhaulType::Wlan,
            4 => BackhaulType::Ethernet,
            5 => BackhaulType::Bluetooth,
            _ => BackhaulType::Invalid,
        }
    }

    /// Vendor code for this type, `None` for `Invalid`
    pub fn vendor_code(self) -> Option<i32> {
        match self {
            BackhaulType::Wwan => Some(1),
            BackhaulType::UsbCradle => Some(2),
            BackhaulType::Wlan => Some(3),
            BackhaulType::Ethernet => Some(4),
            BackhaulType::Bluetooth => Some(5),
            BackhaulType::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        self != BackhaulType::Invalid
    }
}

impl fmt::Display for BackhaulType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackhaulType::Wwan => write!(f, "WWAN"),
            BackhaulType::Wlan => write!(f, "WLAN"),
            BackhaulType::Ethernet => write!(f, "Ethernet"),
            BackhaulType::UsbCradle => write!(f, "USB-Cradle"),
            BackhaulType::Bluetooth => write!(f, "Bluetooth"),
            BackhaulType::Invalid => write!(f, "Invalid"),
        }
    }
}

/// Connectivity of the current backhaul
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnState {
    Connected,
    Disconnected,
    #[default]
    Invalid,
}

/// Wi-Fi hardware state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WlanState {
    Enabled,
    #[default]
    Disabled,
}

/// Preferred IP version for data calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpType {
    V4,
    V6,
    V4V6,
}

impl fmt::Display for IpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpType::V4 => write!(f, "v4"),
            IpType::V6 => write!(f, "v6"),
            IpType::V4V6 => write!(f, "v4v6"),
        }
    }
}

/// Kind of data call the location stack is configured to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallType {
    /// Shared internet backhaul through the connectivity service
    #[default]
    WwanInternet,
    /// Dedicated positioning-assistance session through the session library
    WwanSupl,
}

/// Call type passed to backhaul connect/disconnect commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WwanCallType {
    V4,
    V6,
}

impl WwanCallType {
    /// Only a strictly v6 preference selects the v6 call; v4 and v4v6 share the v4 call.
    pub fn for_ip_preference(ip_type: Option<IpType>) -> Self {
        match ip_type {
            Some(IpType::V6) => WwanCallType::V6,
            _ => WwanCallType::V4,
        }
    }
}

/// Network info item delivered to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    pub backhaul_type: BackhaulType,
    pub available: bool,
    pub connected: bool,
    pub roaming: bool,
}

/// Items delivered to the registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataItem {
    NetworkInfo(NetworkInfo),
    WifiHardwareState { enabled: bool },
}

impl DataItem {
    pub fn id(&self) -> DataItemId {
        match self {
            DataItem::NetworkInfo(_) => DataItemId::NetworkInfo,
            DataItem::WifiHardwareState { .. } => DataItemId::WifiHardwareState,
        }
    }
}

/// Outcome events reported through the WWAN call status callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WwanCallEvent {
    OpenSuccess,
    OpenFailed,
    CloseSuccess,
    CloseFailed,
}

impl WwanCallEvent {
    pub fn is_success(self) -> bool {
        matches!(self, WwanCallEvent::OpenSuccess | WwanCallEvent::CloseSuccess)
    }
}

/// Payload of the WWAN call status callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WwanCallStatus {
    pub event: WwanCallEvent,
    /// Configured APN, only present on success events
    pub apn: Option<String>,
    /// Configured IP type, only present on success events
    pub ip_type: Option<IpType>,
}

impl WwanCallStatus {
    /// Build a status; failure events never carry APN or IP type
    pub fn new(event: WwanCallEvent, apn: Option<&str>, ip_type: Option<IpType>) -> Self {
        if event.is_success() {
            Self {
                event,
                apn: apn.map(str::to_owned),
                ip_type,
            }
        } else {
            Self {
                event,
                apn: None,
                ip_type: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backhaul_type_codes() {
        assert_eq!(BackhaulType::from_vendor_code(1), BackhaulType::Wwan);
        assert_eq!(BackhaulType::from_vendor_code(3), BackhaulType::Wlan);
        assert_eq!(BackhaulType::from_vendor_code(0), BackhaulType::Invalid);
        assert_eq!(BackhaulType::from_vendor_code(42), BackhaulType::Invalid);
        assert_eq!(BackhaulType::Bluetooth.vendor_code(), Some(5));
        assert_eq!(BackhaulType::Invalid.vendor_code(), None);
    }

    #[test]
    fn test_call_type_follows_ip_preference() {
        assert_eq!(WwanCallType::for_ip_preference(Some(IpType::V6)), WwanCallType::V6);
        assert_eq!(WwanCallType::for_ip_preference(Some(IpType::V4V6)), WwanCallType::V4);
        assert_eq!(WwanCallType::for_ip_preference(Some(IpType::V4)), WwanCallType::V4);
        assert_eq!(WwanCallType::for_ip_preference(None), WwanCallType::V4);
    }

    #[test]
    fn test_failure_status_drops_apn() {
        let status = WwanCallStatus::new(WwanCallEvent::OpenFailed, Some("supl.apn"), Some(IpType::V4));
        assert_eq!(status.apn, None);
        assert_eq!(status.ip_type, None);

        let status = WwanCallStatus::new(WwanCallEvent::CloseSuccess, Some("supl.apn"), Some(IpType::V4));
        assert_eq!(status.apn.as_deref(), Some("supl.apn"));
    }
}
