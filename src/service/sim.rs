//! In-process simulation of the connectivity service and session library
//!
//! Both simulators record every command they receive and answer queries from
//! scripted state. Nothing happens on its own: indications and session events
//! are pushed explicitly with [`SimConnectivityService::indicate`] and
//! [`SimSessionLibrary::emit`], from whichever thread the caller chooses.

use super::traits::{
    CallParam, ConnectivityClient, ConnectivityService, IndicationSink, SessionError,
    SessionEventSink, SessionLibrary, VendorError,
};
use locnet_shared::{
    BackhaulReport, BackhaulStatusInd, BackhaulType, Indication, IndicationMask, RawIndication,
    SessionEvent, SessionHandle, WlanMode, WwanCallType, WwanStatus,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Operations of the connectivity service, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorOp {
    Open,
    RegisterForIndications,
    RegisterWlanStatus,
    EnableMobileAp,
    DisableMobileAp,
    WlanMode,
    BackhaulStatus,
    RoamingStatus,
    WwanStatus,
    SetRoaming,
    ConnectBackhaul,
    DisconnectBackhaul,
}

/// Commands received by the simulated connectivity service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorCommand {
    RegisterForIndications(IndicationMask),
    RegisterWlanStatus(bool),
    EnableMobileAp,
    DisableMobileAp,
    SetRoaming(bool),
    ConnectBackhaul(WwanCallType),
    DisconnectBackhaul(WwanCallType),
}

struct ServiceState {
    opens: usize,
    closes: usize,
    sink: Option<Arc<dyn IndicationSink>>,
    commands: Vec<VendorCommand>,
    queries: Vec<VendorOp>,
    failures: HashMap<VendorOp, i32>,
    wlan_mode: WlanMode,
    backhaul: BackhaulReport,
    roaming: u8,
    wwan: (WwanStatus, WwanStatus),
}

impl Default for ServiceState {
    fn default() -> Self {
        Self {
            opens: 0,
            closes: 0,
            sink: None,
            commands: Vec::new(),
            queries: Vec::new(),
            failures: HashMap::new(),
            wlan_mode: WlanMode::Unset,
            backhaul: BackhaulReport {
                backhaul_type: 0,
                ipv4_available: false,
                ipv6_available: false,
            },
            roaming: 0,
            wwan: (WwanStatus::Disconnected, WwanStatus::Ipv6Disconnected),
        }
    }
}

impl ServiceState {
    fn check(&self, op: VendorOp) -> Result<(), VendorError> {
        match self.failures.get(&op) {
            Some(&code) => Err(VendorError { code }),
            None => Ok(()),
        }
    }

    fn command(&mut self, op: VendorOp, command: VendorCommand) -> Result<(), VendorError> {
        self.commands.push(command);
        self.check(op)
    }

    fn query(&mut self, op: VendorOp) -> Result<(), VendorError> {
        self.queries.push(op);
        self.check(op)
    }
}

/// Simulated connectivity service
#[derive(Clone, Default)]
pub struct SimConnectivityService {
    state: Arc<Mutex<ServiceState>>,
}

impl SimConnectivityService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail with `code` until [`recover`](Self::recover) is called
    pub fn fail(&self, op: VendorOp, code: i32) {
        self.state.lock().failures.insert(op, code);
    }

    pub fn recover(&self, op: VendorOp) {
        self.state.lock().failures.remove(&op);
    }

    pub fn set_wlan_mode(&self, mode: WlanMode) {
        self.state.lock().wlan_mode = mode;
    }

    pub fn set_backhaul(&self, backhaul_type: BackhaulType, ipv4: bool, ipv6: bool) {
        self.state.lock().backhaul = BackhaulReport {
            backhaul_type: backhaul_type.vendor_code().unwrap_or(0),
            ipv4_available: ipv4,
            ipv6_available: ipv6,
        };
    }

    pub fn set_roaming_status(&self, status: u8) {
        self.state.lock().roaming = status;
    }

    pub fn set_wwan_status(&self, v4: WwanStatus, v6: WwanStatus) {
        self.state.lock().wwan = (v4, v6);
    }

    /// Number of clients opened so far
    pub fn opens(&self) -> usize {
        self.state.lock().opens
    }

    /// Number of clients dropped so far
    pub fn closes(&self) -> usize {
        self.state.lock().closes
    }

    pub fn is_registered(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    pub fn commands(&self) -> Vec<VendorCommand> {
        self.state.lock().commands.clone()
    }

    pub fn queries(&self) -> Vec<VendorOp> {
        self.state.lock().queries.clone()
    }

    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.commands.clear();
        state.queries.clear();
    }

    pub fn count(&self, pred: impl Fn(&VendorCommand) -> bool) -> usize {
        self.state.lock().commands.iter().filter(|&c| pred(c)).count()
    }

    pub fn connect_count(&self) -> usize {
        self.count(|c| matches!(c, VendorCommand::ConnectBackhaul(_)))
    }

    pub fn disconnect_count(&self) -> usize {
        self.count(|c| matches!(c, VendorCommand::DisconnectBackhaul(_)))
    }

    /// Deliver a decoded indication through the registered client.
    /// Returns false when no client is registered.
    pub fn indicate(&self, indication: Indication) -> bool {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => {
                sink.on_indication(indication);
                true
            }
            None => {
                debug!("[SIM] No registered client for {:?}", indication.kind());
                false
            }
        }
    }

    /// Deliver an undecoded indication through the registered client
    pub fn indicate_raw(&self, raw: RawIndication) -> bool {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => {
                sink.on_raw_indication(raw);
                true
            }
            None => false,
        }
    }

    /// Play out a successful bring-up: live status, bring-up and backhaul indications
    pub fn complete_bring_up(&self) {
        self.set_wwan_status(WwanStatus::Connected, WwanStatus::Ipv6Disconnected);
        self.set_backhaul(BackhaulType::Wwan, true, false);
        self.indicate(Indication::BringUpWwan(WwanStatus::Connected));
        self.indicate(Indication::BackhaulStatus(BackhaulStatusInd {
            backhaul_type: BackhaulType::Wwan.vendor_code(),
            ipv4_available: Some(true),
            ipv6_available: Some(false),
        }));
    }

    /// Play out a completed teardown
    pub fn complete_tear_down(&self) {
        self.set_wwan_status(WwanStatus::Disconnected, WwanStatus::Ipv6Disconnected);
        self.set_backhaul(BackhaulType::Wwan, false, false);
        self.indicate(Indication::TearDownWwan(WwanStatus::Disconnected));
        self.indicate(Indication::BackhaulStatus(BackhaulStatusInd {
            backhaul_type: BackhaulType::Wwan.vendor_code(),
            ipv4_available: Some(false),
            ipv6_available: Some(false),
        }));
    }
}

impl ConnectivityService for SimConnectivityService {
    fn open(&self, sink: Arc<dyn IndicationSink>) -> Result<Box<dyn ConnectivityClient>, VendorError> {
        let mut state = self.state.lock();
        state.check(VendorOp::Open)?;
        state.opens += 1;
        state.sink = Some(sink);
        Ok(Box::new(SimClient {
            state: self.state.clone(),
        }))
    }
}

struct SimClient {
    state: Arc<Mutex<ServiceState>>,
}

impl Drop for SimClient {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.closes += 1;
        state.sink = None;
    }
}

impl ConnectivityClient for SimClient {
    fn register_for_indications(&mut self, mask: IndicationMask) -> Result<(), VendorError> {
        self.state.lock().command(
            VendorOp::RegisterForIndications,
            VendorCommand::RegisterForIndications(mask),
        )
    }

    fn register_wlan_status(&mut self, enable: bool) -> Result<(), VendorError> {
        self.state
            .lock()
            .command(VendorOp::RegisterWlanStatus, VendorCommand::RegisterWlanStatus(enable))
    }

    fn enable_mobile_ap(&mut self) -> Result<(), VendorError> {
        self.state
            .lock()
            .command(VendorOp::EnableMobileAp, VendorCommand::EnableMobileAp)
    }

    fn disable_mobile_ap(&mut self) -> Result<(), VendorError> {
        self.state
            .lock()
            .command(VendorOp::DisableMobileAp, VendorCommand::DisableMobileAp)
    }

    fn wlan_mode(&self) -> Result<WlanMode, VendorError> {
        let mut state = self.state.lock();
        state.query(VendorOp::WlanMode)?;
        Ok(state.wlan_mode)
    }

    fn backhaul_status(&self) -> Result<BackhaulReport, VendorError> {
        let mut state = self.state.lock();
        state.query(VendorOp::BackhaulStatus)?;
        Ok(state.backhaul)
    }

    fn wwan_roaming_status(&self) -> Result<u8, VendorError> {
        let mut state = self.state.lock();
        state.query(VendorOp::RoamingStatus)?;
        Ok(state.roaming)
    }

    fn wwan_status(&self) -> Result<(WwanStatus, WwanStatus), VendorError> {
        let mut state = self.state.lock();
        state.query(VendorOp::WwanStatus)?;
        Ok(state.wwan)
    }

    fn set_roaming(&mut self, allow: bool) -> Result<(), VendorError> {
        self.state
            .lock()
            .command(VendorOp::SetRoaming, VendorCommand::SetRoaming(allow))
    }

    fn connect_backhaul(&mut self, call_type: WwanCallType) -> Result<(), VendorError> {
        self.state
            .lock()
            .command(VendorOp::ConnectBackhaul, VendorCommand::ConnectBackhaul(call_type))
    }

    fn disconnect_backhaul(&mut self, call_type: WwanCallType) -> Result<(), VendorError> {
        self.state.lock().command(
            VendorOp::DisconnectBackhaul,
            VendorCommand::DisconnectBackhaul(call_type),
        )
    }
}

/// Commands received by the simulated session library
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Init,
    AcquireHandle,
    SetParam(SessionHandle, CallParam),
    StartCall(SessionHandle),
    StopCall(SessionHandle),
}

#[derive(Default)]
struct LibraryState {
    initialized: bool,
    next_handle: u64,
    sink: Option<Arc<dyn SessionEventSink>>,
    commands: Vec<SessionCommand>,
    withhold_handle: bool,
    fail_init: Option<i32>,
    fail_start: Option<i32>,
    fail_stop: Option<i32>,
}

/// Simulated cellular data session library
#[derive(Clone, Default)]
pub struct SimSessionLibrary {
    state: Arc<Mutex<LibraryState>>,
}

impl SimSessionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend another component already initialised the library
    pub fn preinitialize(&self) {
        self.state.lock().initialized = true;
    }

    pub fn withhold_handle(&self, withhold: bool) {
        self.state.lock().withhold_handle = withhold;
    }

    pub fn fail_init(&self, code: Option<i32>) {
        self.state.lock().fail_init = code;
    }

    pub fn fail_start(&self, code: Option<i32>) {
        self.state.lock().fail_start = code;
    }

    pub fn fail_stop(&self, code: Option<i32>) {
        self.state.lock().fail_stop = code;
    }

    pub fn commands(&self) -> Vec<SessionCommand> {
        self.state.lock().commands.clone()
    }

    pub fn clear_log(&self) {
        self.state.lock().commands.clear();
    }

    pub fn start_count(&self) -> usize {
        self.count(|c| matches!(c, SessionCommand::StartCall(_)))
    }

    pub fn stop_count(&self) -> usize {
        self.count(|c| matches!(c, SessionCommand::StopCall(_)))
    }

    pub fn count(&self, pred: impl Fn(&SessionCommand) -> bool) -> usize {
        self.state.lock().commands.iter().filter(|&c| pred(c)).count()
    }

    /// Most recently issued handle
    pub fn handle(&self) -> Option<SessionHandle> {
        let state = self.state.lock();
        (state.next_handle > 0).then(|| SessionHandle(state.next_handle))
    }

    /// Deliver a session event to the bound sink. Returns false when no handle was issued.
    pub fn emit(&self, handle: SessionHandle, event: SessionEvent) -> bool {
        let sink = self.state.lock().sink.clone();
        match sink {
            Some(sink) => {
                sink.on_session_event(handle, event);
                true
            }
            None => false,
        }
    }
}

impl SessionLibrary for SimSessionLibrary {
    fn init(&self) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.commands.push(SessionCommand::Init);
        if let Some(code) = state.fail_init {
            return Err(SessionError::Rejected(code));
        }
        if state.initialized {
            return Err(SessionError::AlreadyInitialized);
        }
        state.initialized = true;
        Ok(())
    }

    fn acquire_handle(&self, sink: Arc<dyn SessionEventSink>) -> Option<SessionHandle> {
        let mut state = self.state.lock();
        state.commands.push(SessionCommand::AcquireHandle);
        if state.withhold_handle {
            return None;
        }
        state.next_handle += 1;
        state.sink = Some(sink);
        Some(SessionHandle(state.next_handle))
    }

    fn set_param(&self, handle: SessionHandle, param: CallParam) -> Result<(), SessionError> {
        self.state
            .lock()
            .commands
            .push(SessionCommand::SetParam(handle, param));
        Ok(())
    }

    fn start_call(&self, handle: SessionHandle) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.commands.push(SessionCommand::StartCall(handle));
        match state.fail_start {
            Some(code) => Err(SessionError::Rejected(code)),
            None => Ok(()),
        }
    }

    fn stop_call(&self, handle: SessionHandle) -> Result<(), SessionError> {
        let mut state = self.state.lock();
        state.commands.push(SessionCommand::StopCall(handle));
        match state.fail_stop {
            Some(code) => Err(SessionError::Rejected(code)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;

    impl IndicationSink for NullSink {
        fn on_raw_indication(&self, _raw: RawIndication) {}
        fn on_indication(&self, _indication: Indication) {}
    }

    #[test]
    fn test_client_drop_unregisters() {
        let sim = SimConnectivityService::new();
        let client = sim.open(Arc::new(NullSink)).expect("open failed");
        assert!(sim.is_registered());
        assert_eq!(sim.opens(), 1);

        drop(client);
        assert!(!sim.is_registered());
        assert_eq!(sim.closes(), 1);
        assert!(!sim.indicate(Indication::WwanRoamingStatus(1)));
    }

    #[test]
    fn test_failure_injection() {
        let sim = SimConnectivityService::new();
        let mut client = sim.open(Arc::new(NullSink)).expect("open failed");

        sim.fail(VendorOp::ConnectBackhaul, 0x1f);
        assert_eq!(
            client.connect_backhaul(WwanCallType::V4),
            Err(VendorError { code: 0x1f })
        );
        // Attempts are still recorded
        assert_eq!(sim.connect_count(), 1);

        sim.recover(VendorOp::ConnectBackhaul);
        assert!(client.connect_backhaul(WwanCallType::V4).is_ok());
    }

    #[test]
    fn test_session_library_init_twice() {
        let lib = SimSessionLibrary::new();
        assert!(lib.init().is_ok());
        assert_eq!(lib.init(), Err(SessionError::AlreadyInitialized));
    }
}
