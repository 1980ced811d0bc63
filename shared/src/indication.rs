//! Typed connectivity service indications
//!
//! Every asynchronous message the connectivity service can deliver is one
//! variant of [`Indication`]. Decoding the wire payload into these types is
//! done by the service glue; the manager only ever sees the typed form.

use std::fmt;

/// Message identifiers used by the connectivity service for indications
pub mod msg_id {
    pub const BRING_UP_WWAN: u32 = 0x0022;
    pub const TEAR_DOWN_WWAN: u32 = 0x0024;
    pub const WWAN_STATUS: u32 = 0x0026;
    pub const WLAN_STATUS: u32 = 0x0049;
    pub const STATION_MODE_STATUS: u32 = 0x0051;
    pub const BACKHAUL_STATUS: u32 = 0x00A1;
    pub const WWAN_ROAMING_STATUS: u32 = 0x00A2;
}

/// Kind of an indication, derived from its message identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    WlanStatus,
    BringUpWwan,
    TearDownWwan,
    BackhaulStatus,
    WwanRoamingStatus,
    StationModeStatus,
    WwanStatus,
}

impl MessageKind {
    /// Map a message identifier, `None` for identifiers we don't handle
    pub fn from_msg_id(id: u32) -> Option<Self> {
        match id {
            msg_id::WLAN_STATUS => Some(MessageKind::WlanStatus),
            msg_id::BRING_UP_WWAN => Some(MessageKind::BringUpWwan),
            msg_id::TEAR_DOWN_WWAN => Some(MessageKind::TearDownWwan),
            msg_id::BACKHAUL_STATUS => Some(MessageKind::BackhaulStatus),
            msg_id::WWAN_ROAMING_STATUS => Some(MessageKind::WwanRoamingStatus),
            msg_id::STATION_MODE_STATUS => Some(MessageKind::StationModeStatus),
            msg_id::WWAN_STATUS => Some(MessageKind::WwanStatus),
            _ => None,
        }
    }

    pub fn msg_id(self) -> u32 {
        match self {
            MessageKind::WlanStatus => msg_id::WLAN_STATUS,
            MessageKind::BringUpWwan => msg_id::BRING_UP_WWAN,
            MessageKind::TearDownWwan => msg_id::TEAR_DOWN_WWAN,
            MessageKind::BackhaulStatus => msg_id::BACKHAUL_STATUS,
            MessageKind::WwanRoamingStatus => msg_id::WWAN_ROAMING_STATUS,
            MessageKind::StationModeStatus => msg_id::STATION_MODE_STATUS,
            MessageKind::WwanStatus => msg_id::WWAN_STATUS,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:#06x})", self, self.msg_id())
    }
}

/// Registration mask selecting which indications the service should deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicationMask(u64);

impl IndicationMask {
    pub const WWAN_ROAMING_STATUS: Self = Self(1 << 0);
    pub const BACKHAUL_STATUS: Self = Self(1 << 1);
    pub const WWAN_STATUS: Self = Self(1 << 2);
    pub const MOBILE_AP_STATUS: Self = Self(1 << 3);
    pub const STATION_MODE_STATUS: Self = Self(1 << 4);
    pub const CRADLE_MODE_STATUS: Self = Self(1 << 5);
    pub const ETHERNET_MODE_STATUS: Self = Self(1 << 6);
    pub const BT_TETHERING_STATUS: Self = Self(1 << 7);
    pub const BT_TETHERING_WAN: Self = Self(1 << 8);
    pub const WLAN_STATUS: Self = Self(1 << 9);
    pub const PACKET_STATS_STATUS: Self = Self(1 << 10);

    /// Everything the location stack needs to follow backhaul availability
    pub const LOCATION: Self = Self(
        Self::WWAN_ROAMING_STATUS.0
            | Self::BACKHAUL_STATUS.0
            | Self::WWAN_STATUS.0
            | Self::MOBILE_AP_STATUS.0
            | Self::STATION_MODE_STATUS.0
            | Self::CRADLE_MODE_STATUS.0
            | Self::ETHERNET_MODE_STATUS.0
            | Self::BT_TETHERING_STATUS.0
            | Self::BT_TETHERING_WAN.0
            | Self::WLAN_STATUS.0
            | Self::PACKET_STATS_STATUS.0,
    );

    pub fn bits(self) -> u64 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// WWAN connection status as reported by the connectivity service.
///
/// IPv4 and IPv6 variants are reported separately but mean the same outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WwanStatus {
    Connecting,
    ConnectingFail,
    Connected,
    Disconnecting,
    DisconnectingFail,
    Disconnected,
    Ipv6Connecting,
    Ipv6ConnectingFail,
    Ipv6Connected,
    Ipv6Disconnecting,
    Ipv6DisconnectingFail,
    Ipv6Disconnected,
    Unknown(i32),
}

impl WwanStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => WwanStatus::Connecting,
            2 => WwanStatus::ConnectingFail,
            3 => WwanStatus::Connected,
            4 => WwanStatus::Disconnecting,
            5 => WwanStatus::DisconnectingFail,
            6 => WwanStatus::Disconnected,
            7 => WwanStatus::Ipv6Connecting,
            8 => WwanStatus::Ipv6ConnectingFail,
            9 => WwanStatus::Ipv6Connected,
            10 => WwanStatus::Ipv6Disconnecting,
            11 => WwanStatus::Ipv6DisconnectingFail,
            12 => WwanStatus::Ipv6Disconnected,
            other => WwanStatus::Unknown(other),
        }
    }

    pub fn is_connecting(self) -> bool {
        matches!(self, WwanStatus::Connecting | WwanStatus::Ipv6Connecting)
    }

    pub fn is_connected(self) -> bool {
        matches!(self, WwanStatus::Connected | WwanStatus::Ipv6Connected)
    }

    pub fn is_connect_failure(self) -> bool {
        matches!(self, WwanStatus::ConnectingFail | WwanStatus::Ipv6ConnectingFail)
    }

    pub fn is_disconnected(self) -> bool {
        matches!(self, WwanStatus::Disconnected | WwanStatus::Ipv6Disconnected)
    }

    pub fn is_disconnect_failure(self) -> bool {
        matches!(
            self,
            WwanStatus::DisconnectingFail | WwanStatus::Ipv6DisconnectingFail
        )
    }
}

/// Wi-Fi operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WlanMode {
    /// Wi-Fi not configured
    #[default]
    Unset,
    Ap,
    ApAp,
    ApSta,
    ApApAp,
    ApApSta,
    StaOnly,
    ApStaBridge,
    ApApStaBridge,
    StaOnlyBridge,
}

impl WlanMode {
    /// Station-capable modes count as "Wi-Fi enabled" for positioning
    pub fn is_station_capable(self) -> bool {
        matches!(
            self,
            WlanMode::StaOnly
                | WlanMode::ApSta
                | WlanMode::ApApSta
                | WlanMode::ApStaBridge
                | WlanMode::ApApStaBridge
                | WlanMode::StaOnlyBridge
        )
    }
}

/// Reported Wi-Fi radio status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WlanStatus {
    Enabled,
    Disabled,
    Unknown(i32),
}

/// Station (Wi-Fi client) mode connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationModeStatus {
    Connected,
    Disconnected,
    Unknown(i32),
}

/// A valid backhaul status, as returned by status queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackhaulReport {
    pub backhaul_type: i32,
    pub ipv4_available: bool,
    pub ipv6_available: bool,
}

impl BackhaulReport {
    pub fn is_available(&self) -> bool {
        self.ipv4_available || self.ipv6_available
    }
}

/// Backhaul status indication; every field carries its own validity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackhaulStatusInd {
    pub backhaul_type: Option<i32>,
    pub ipv4_available: Option<bool>,
    pub ipv6_available: Option<bool>,
}

impl BackhaulStatusInd {
    /// The report carried by this indication, `None` when the type is not valid.
    /// Invalid reachability flags count as unavailable.
    pub fn report(&self) -> Option<BackhaulReport> {
        self.backhaul_type.map(|backhaul_type| BackhaulReport {
            backhaul_type,
            ipv4_available: self.ipv4_available.unwrap_or(false),
            ipv6_available: self.ipv6_available.unwrap_or(false),
        })
    }
}

/// A decoded connectivity service indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indication {
    WlanStatus { status: WlanStatus, mode: WlanMode },
    BringUpWwan(WwanStatus),
    TearDownWwan(WwanStatus),
    BackhaulStatus(BackhaulStatusInd),
    /// Raw roaming indicator, 0 means not roaming
    WwanRoamingStatus(u8),
    StationModeStatus(StationModeStatus),
    WwanStatus(WwanStatus),
}

impl Indication {
    pub fn kind(&self) -> MessageKind {
        match self {
            Indication::WlanStatus { .. } => MessageKind::WlanStatus,
            Indication::BringUpWwan(_) => MessageKind::BringUpWwan,
            Indication::TearDownWwan(_) => MessageKind::TearDownWwan,
            Indication::BackhaulStatus(_) => MessageKind::BackhaulStatus,
            Indication::WwanRoamingStatus(_) => MessageKind::WwanRoamingStatus,
            Indication::StationModeStatus(_) => MessageKind::StationModeStatus,
            Indication::WwanStatus(_) => MessageKind::WwanStatus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_ids() {
        assert_eq!(MessageKind::from_msg_id(msg_id::WLAN_STATUS), Some(MessageKind::WlanStatus));
        assert_eq!(MessageKind::from_msg_id(0xFFFF), None);
        assert_eq!(MessageKind::BackhaulStatus.msg_id(), msg_id::BACKHAUL_STATUS);
    }

    #[test]
    fn test_wwan_status_families_are_equivalent() {
        assert!(WwanStatus::from_code(3).is_connected());
        assert!(WwanStatus::from_code(9).is_connected());
        assert!(WwanStatus::from_code(2).is_connect_failure());
        assert!(WwanStatus::from_code(8).is_connect_failure());
        assert!(WwanStatus::from_code(6).is_disconnected());
        assert!(WwanStatus::from_code(12).is_disconnected());
        assert!(WwanStatus::from_code(7).is_connecting());
        assert_eq!(WwanStatus::from_code(99), WwanStatus::Unknown(99));
    }

    #[test]
    fn test_station_capable_modes() {
        assert!(WlanMode::StaOnly.is_station_capable());
        assert!(WlanMode::ApApStaBridge.is_station_capable());
        assert!(!WlanMode::Ap.is_station_capable());
        assert!(!WlanMode::ApApAp.is_station_capable());
        assert!(!WlanMode::Unset.is_station_capable());
    }

    #[test]
    fn test_backhaul_report_requires_valid_type() {
        let ind = BackhaulStatusInd {
            backhaul_type: None,
            ipv4_available: Some(true),
            ipv6_available: None,
        };
        assert!(ind.report().is_none());

        let ind = BackhaulStatusInd {
            backhaul_type: Some(3),
            ipv4_available: None,
            ipv6_available: Some(true),
        };
        let report = ind.report().expect("valid type");
        assert!(!report.ipv4_available);
        assert!(report.is_available());
    }

    #[test]
    fn test_location_mask() {
        let mask = IndicationMask::LOCATION;
        assert!(mask.contains(IndicationMask::WLAN_STATUS));
        assert!(mask.contains(IndicationMask::BACKHAUL_STATUS));
        assert!(mask.contains(IndicationMask::WWAN_ROAMING_STATUS));
        assert!(!IndicationMask::WLAN_STATUS.contains(IndicationMask::LOCATION));
    }
}
