//! Dedicated WWAN data call orchestration
//!
//! Drives the session library on behalf of the positioning assistance
//! channel. The state machine decides; this module talks to the library and
//! queues the call status reports.

use locnet_shared::state_machine::{EventOutcome, SetupDecision, StopDecision};
use locnet_shared::{CallType, IpType, SessionEvent, SessionHandle, WwanCallEvent, WwanCallSession};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::LocNetConfig;
use crate::error::{LocNetError, Result};
use crate::network::Outbox;
use crate::service::{CallParam, RadioTech, SessionError, SessionEventSink, SessionLibrary};

#[derive(Debug, Default)]
pub struct WwanCall {
    session: WwanCallSession,
    library_initialized: bool,
}

impl WwanCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &WwanCallSession {
        &self.session
    }

    /// First half of bringing the call up: initialise the session library if
    /// a start is due. Returns how long to let the library settle before
    /// [`setup`](Self::setup), when it was initialised just now.
    pub fn prepare(
        &mut self,
        library: &dyn SessionLibrary,
        config: &LocNetConfig,
    ) -> Result<Option<Duration>> {
        if config.call_type != CallType::WwanSupl {
            error!("[WWAN] Unsupported call type configured: {:?}", config.call_type);
            return Err(LocNetError::UnsupportedCallType(config.call_type));
        }
        if !matches!(self.session.check_setup(), SetupDecision::Proceed) {
            return Ok(None);
        }

        let settle = config.session_init_settle;
        Ok((self.init_library(library) && !settle.is_zero()).then_some(settle))
    }

    /// Bring the dedicated call up
    pub fn setup(
        &mut self,
        library: &dyn SessionLibrary,
        sink: &Arc<dyn SessionEventSink>,
        config: &LocNetConfig,
        outbox: &mut Outbox,
    ) -> Result<()> {
        if config.call_type != CallType::WwanSupl {
            error!("[WWAN] Unsupported call type configured: {:?}", config.call_type);
            return Err(LocNetError::UnsupportedCallType(config.call_type));
        }

        match self.session.check_setup() {
            SetupDecision::AlreadyStarting => {
                warn!("[WWAN] Start already pending, nothing to do");
                return Ok(());
            }
            SetupDecision::StopPending => {
                // The pending stop reports when it completes
                error!("[WWAN] Stop pending, can't start now");
                return Err(LocNetError::StopPending);
            }
            SetupDecision::AlreadyUp => {
                warn!("[WWAN] Data call already up");
                outbox.call_status(config.call_status(WwanCallEvent::OpenSuccess));
                return Ok(());
            }
            SetupDecision::Proceed => {}
        }

        self.init_library(library);
        let handle = self.acquire_handle(library, sink)?;

        set_param(library, handle, CallParam::TechPref(RadioTech::Unknown));

        let Some(apn) = config.apn() else {
            error!("[WWAN] No APN configured for data call setup");
            return Err(LocNetError::MissingApn);
        };
        debug!("[WWAN] APN {}", apn);
        set_param(library, handle, CallParam::ApnName(apn.to_owned()));

        let ip_type = config.ip_type.unwrap_or_else(|| {
            warn!("[WWAN] No IP type configured, using v4");
            IpType::V4
        });
        set_param(library, handle, CallParam::IpVersion(ip_type));

        self.session.start_requested();
        if let Err(e) = library.start_call(handle) {
            self.session.start_rejected();
            error!("[WWAN] Start data call failed: {}", e);
            return Err(LocNetError::session("start data call")(e));
        }

        info!("[WWAN] Data call start request sent");
        Ok(())
    }

    /// Stop the dedicated call.
    ///
    /// With no call up this still reports close-success and still asks the
    /// library to stop.
    pub fn stop(
        &mut self,
        library: &dyn SessionLibrary,
        config: &LocNetConfig,
        outbox: &mut Outbox,
    ) -> Result<()> {
        match self.session.check_stop() {
            StopDecision::AlreadyStopping => {
                warn!("[WWAN] Stop already pending, nothing to do");
                return Ok(());
            }
            StopDecision::NotUp => {
                error!("[WWAN] No ongoing data call to stop");
                outbox.call_status(config.call_status(WwanCallEvent::CloseSuccess));
            }
            StopDecision::Proceed => {}
        }

        let Some(handle) = self.session.handle() else {
            error!("[WWAN] No session handle, nothing for the library to stop");
            return Err(LocNetError::NoSessionHandle);
        };

        debug!("[WWAN] Stopping data call on {:?}", handle);
        self.session.stop_requested();
        if let Err(e) = library.stop_call(handle) {
            self.session.stop_rejected();
            error!("[WWAN] Stop data call failed: {}", e);
            return Err(LocNetError::session("stop data call")(e));
        }

        info!("[WWAN] Data call stop request sent");
        Ok(())
    }

    /// Apply a session library event
    pub fn on_event(
        &mut self,
        handle: SessionHandle,
        event: SessionEvent,
        config: &LocNetConfig,
        outbox: &mut Outbox,
    ) {
        debug!(
            "[WWAN] Event {:?} on {:?}, up {}, start pending {}, stop pending {}",
            event,
            handle,
            self.session.is_up(),
            self.session.is_start_pending(),
            self.session.is_stop_pending()
        );

        match self.session.process_event(handle, event) {
            EventOutcome::HandleMismatch { expected, received } => {
                error!("[WWAN] Handle mismatch: {:?} vs {:?}", expected, received);
            }
            EventOutcome::Unsupported(code) => {
                warn!("[WWAN] Unsupported session event {}", code);
            }
            EventOutcome::Applied(Some(event)) => {
                info!("[WWAN] Data call {:?}", event);
                outbox.call_status(config.call_status(event));
            }
            EventOutcome::Applied(None) => {}
        }
    }

    /// Returns whether the library was initialised by this call
    fn init_library(&mut self, library: &dyn SessionLibrary) -> bool {
        if self.library_initialized {
            return false;
        }

        match library.init() {
            Ok(()) => info!("[WWAN] Session library initialised"),
            Err(SessionError::AlreadyInitialized) => {
                info!("[WWAN] Session library already initialised")
            }
            Err(e) => error!("[WWAN] Session library init failed: {}", e),
        }
        self.library_initialized = true;
        true
    }

    fn acquire_handle(
        &mut self,
        library: &dyn SessionLibrary,
        sink: &Arc<dyn SessionEventSink>,
    ) -> Result<SessionHandle> {
        if let Some(handle) = self.session.handle() {
            return Ok(handle);
        }

        let handle = library.acquire_handle(sink.clone()).ok_or_else(|| {
            error!("[WWAN] Session library returned no handle");
            LocNetError::NoSessionHandle
        })?;
        debug!("[WWAN] Session handle {:?}", handle);
        self.session.set_handle(handle);
        Ok(handle)
    }
}

fn set_param(library: &dyn SessionLibrary, handle: SessionHandle, param: CallParam) {
    if let Err(e) = library.set_param(handle, param.clone()) {
        warn!("[WWAN] Setting {:?} failed: {}", param, e);
    }
}
