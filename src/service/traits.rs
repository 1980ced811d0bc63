//! Collaborator traits for the connectivity service and the session library

use locnet_shared::{
    BackhaulReport, Indication, IndicationMask, IpType, RawIndication, SessionEvent,
    SessionHandle, WlanMode, WwanCallType, WwanStatus,
};
use std::sync::Arc;
use thiserror::Error;

/// Error code returned by the connectivity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connectivity service error {code:#x}")]
pub struct VendorError {
    pub code: i32,
}

/// Errors returned by the session library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session library already initialised")]
    AlreadyInitialized,

    #[error("session library error {0}")]
    Rejected(i32),
}

/// Receives indications on the connectivity service's own thread
pub trait IndicationSink: Send + Sync {
    /// Undecoded indication straight from the service
    fn on_raw_indication(&self, raw: RawIndication);

    /// Indication already decoded by the service glue
    fn on_indication(&self, indication: Indication);
}

/// Receives data call events on the session library's own thread
pub trait SessionEventSink: Send + Sync {
    fn on_session_event(&self, handle: SessionHandle, event: SessionEvent);
}

/// Entry point of the connectivity service
pub trait ConnectivityService: Send + Sync {
    /// Open a client bound to `sink`. Indications flow until the client is dropped.
    fn open(&self, sink: Arc<dyn IndicationSink>) -> Result<Box<dyn ConnectivityClient>, VendorError>;
}

/// A live registration with the connectivity service
pub trait ConnectivityClient: Send {
    fn register_for_indications(&mut self, mask: IndicationMask) -> Result<(), VendorError>;

    fn register_wlan_status(&mut self, enable: bool) -> Result<(), VendorError>;

    fn enable_mobile_ap(&mut self) -> Result<(), VendorError>;

    fn disable_mobile_ap(&mut self) -> Result<(), VendorError>;

    fn wlan_mode(&self) -> Result<WlanMode, VendorError>;

    fn backhaul_status(&self) -> Result<BackhaulReport, VendorError>;

    /// Raw roaming indicator, 0 means not roaming
    fn wwan_roaming_status(&self) -> Result<u8, VendorError>;

    /// Live (IPv4, IPv6) WWAN call status
    fn wwan_status(&self) -> Result<(WwanStatus, WwanStatus), VendorError>;

    fn set_roaming(&mut self, allow: bool) -> Result<(), VendorError>;

    fn connect_backhaul(&mut self, call_type: WwanCallType) -> Result<(), VendorError>;

    fn disconnect_backhaul(&mut self, call_type: WwanCallType) -> Result<(), VendorError>;
}

/// Radio technology preference for a data call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioTech {
    Unknown,
}

/// Data call parameters set before starting a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallParam {
    TechPref(RadioTech),
    ApnName(String),
    IpVersion(IpType),
}

/// The cellular data session library
pub trait SessionLibrary: Send + Sync {
    fn init(&self) -> Result<(), SessionError>;

    /// Get a service handle whose events are delivered to `sink`
    fn acquire_handle(&self, sink: Arc<dyn SessionEventSink>) -> Option<SessionHandle>;

    fn set_param(&self, handle: SessionHandle, param: CallParam) -> Result<(), SessionError>;

    fn start_call(&self, handle: SessionHandle) -> Result<(), SessionError>;

    fn stop_call(&self, handle: SessionHandle) -> Result<(), SessionError>;
}
