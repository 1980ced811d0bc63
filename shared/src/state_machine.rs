//! Dedicated WWAN call state machine
//!
//! Tracks the one data session used for positioning assistance. The session
//! library reports connect/disconnect events for the handle it gave us; the
//! manager asks this machine what each request or event means before acting.
//!
//! States: Idle → StartPending → Up → StopPending → Idle, plus the
//! StartPending → Idle failure path that reports open-failed.

use crate::WwanCallEvent;

/// Opaque session handle issued by the session library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Network events reported by the session library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Network is connected
    NetIsConn,
    /// Network is gone
    NoNet,
    /// Any other library event, ignored
    Other(i32),
}

/// What a setup request should do in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupDecision {
    /// Start already requested, nothing to do
    AlreadyStarting,
    /// A stop is in flight; its completion will notify the caller
    StopPending,
    /// Call already up, report open-success again
    AlreadyUp,
    /// Go ahead and start the call
    Proceed,
}

/// What a stop request should do in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// Stop already requested, nothing to do
    AlreadyStopping,
    /// No call is up: report close-success, but still issue the stop
    NotUp,
    /// Stop the running call
    Proceed,
}

/// Result of feeding a session event into the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Event was for a handle we don't own; nothing changed
    HandleMismatch {
        expected: Option<SessionHandle>,
        received: SessionHandle,
    },
    /// Event kind we don't act on
    Unsupported(i32),
    /// State updated, with the event to report (if any)
    Applied(Option<WwanCallEvent>),
}

/// The dedicated session. The handle survives start/stop cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WwanCallSession {
    handle: Option<SessionHandle>,
    up: bool,
    start_pending: bool,
    stop_pending: bool,
}

impl WwanCallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Option<SessionHandle> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: SessionHandle) {
        self.handle = Some(handle);
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    pub fn is_start_pending(&self) -> bool {
        self.start_pending
    }

    pub fn is_stop_pending(&self) -> bool {
        self.stop_pending
    }

    /// Decide how to handle a setup request
    pub fn check_setup(&self) -> SetupDecision {
        if self.start_pending {
            SetupDecision::AlreadyStarting
        } else if self.stop_pending {
            SetupDecision::StopPending
        } else if self.up {
            SetupDecision::AlreadyUp
        } else {
            SetupDecision::Proceed
        }
    }

    /// Decide how to handle a stop request
    pub fn check_stop(&self) -> StopDecision {
        if self.stop_pending {
            StopDecision::AlreadyStopping
        } else if !self.up {
            StopDecision::NotUp
        } else {
            StopDecision::Proceed
        }
    }

    pub fn start_requested(&mut self) {
        self.start_pending = true;
    }

    /// The library refused the start synchronously
    pub fn start_rejected(&mut self) {
        self.start_pending = false;
    }

    pub fn stop_requested(&mut self) {
        self.stop_pending = true;
    }

    /// The library refused the stop synchronously
    pub fn stop_rejected(&mut self) {
        self.stop_pending = false;
    }

    /// Process a session event and return the transition outcome
    pub fn process_event(&mut self, handle: SessionHandle, event: SessionEvent) -> EventOutcome {
        if self.handle != Some(handle) {
            return EventOutcome::HandleMismatch {
                expected: self.handle,
                received: handle,
            };
        }

        match event {
            SessionEvent::NetIsConn => {
                let report = self.start_pending.then_some(WwanCallEvent::OpenSuccess);
                self.up = true;
                self.start_pending = false;
                EventOutcome::Applied(report)
            }
            SessionEvent::NoNet => {
                let report = if self.stop_pending {
                    Some(WwanCallEvent::CloseSuccess)
                } else if self.start_pending {
                    // Session never came up
                    Some(WwanCallEvent::OpenFailed)
                } else {
                    None
                };
                self.up = false;
                self.stop_pending = false;
                self.start_pending = false;
                EventOutcome::Applied(report)
            }
            SessionEvent::Other(code) => EventOutcome::Unsupported(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDLE: SessionHandle = SessionHandle(7);

    fn started() -> WwanCallSession {
        let mut session = WwanCallSession::new();
        session.set_handle(HANDLE);
        session.start_requested();
        session
    }

    #[test]
    fn test_initial_state() {
        let session = WwanCallSession::new();
        assert!(!session.is_up());
        assert_eq!(session.handle(), None);
        assert_eq!(session.check_setup(), SetupDecision::Proceed);
        assert_eq!(session.check_stop(), StopDecision::NotUp);
    }

    #[test]
    fn test_normal_call_flow() {
        let mut session = started();
        assert_eq!(session.check_setup(), SetupDecision::AlreadyStarting);

        let outcome = session.process_event(HANDLE, SessionEvent::NetIsConn);
        assert_eq!(outcome, EventOutcome::Applied(Some(WwanCallEvent::OpenSuccess)));
        assert!(session.is_up());
        assert!(!session.is_start_pending());
        assert_eq!(session.check_setup(), SetupDecision::AlreadyUp);

        assert_eq!(session.check_stop(), StopDecision::Proceed);
        session.stop_requested();
        assert_eq!(session.check_setup(), SetupDecision::StopPending);
        assert_eq!(session.check_stop(), StopDecision::AlreadyStopping);

        let outcome = session.process_event(HANDLE, SessionEvent::NoNet);
        assert_eq!(outcome, EventOutcome::Applied(Some(WwanCallEvent::CloseSuccess)));
        assert!(!session.is_up());
        assert!(!session.is_stop_pending());
        assert_eq!(session.handle(), Some(HANDLE));
    }

    #[test]
    fn test_start_failure_reports_open_failed() {
        let mut session = started();
        let outcome = session.process_event(HANDLE, SessionEvent::NoNet);
        assert_eq!(outcome, EventOutcome::Applied(Some(WwanCallEvent::OpenFailed)));
        assert!(!session.is_start_pending());
        assert!(!session.is_up());
    }

    #[test]
    fn test_handle_mismatch_changes_nothing() {
        let mut session = started();
        let before = session.clone();

        let outcome = session.process_event(SessionHandle(99), SessionEvent::NetIsConn);
        assert!(matches!(outcome, EventOutcome::HandleMismatch { .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn test_unsolicited_events() {
        let mut session = WwanCallSession::new();
        session.set_handle(HANDLE);

        // Connect without a pending start marks the call up silently
        let outcome = session.process_event(HANDLE, SessionEvent::NetIsConn);
        assert_eq!(outcome, EventOutcome::Applied(None));
        assert!(session.is_up());

        let outcome = session.process_event(HANDLE, SessionEvent::NoNet);
        assert_eq!(outcome, EventOutcome::Applied(None));
        assert!(!session.is_up());

        let outcome = session.process_event(HANDLE, SessionEvent::Other(12));
        assert_eq!(outcome, EventOutcome::Unsupported(12));
    }

    #[test]
    fn test_rejections_clear_pending() {
        let mut session = started();
        session.start_rejected();
        assert_eq!(session.check_setup(), SetupDecision::Proceed);

        session.stop_requested();
        session.stop_rejected();
        assert!(!session.is_stop_pending());
    }
}
