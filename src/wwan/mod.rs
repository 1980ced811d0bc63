//! Dedicated WWAN data call for positioning assistance

mod call;

pub use call::WwanCall;

use locnet_shared::{SessionEvent, SessionHandle};
use std::sync::Weak;
use tracing::debug;

use crate::manager::Shared;
use crate::service::SessionEventSink;

/// Routes session library events back to the manager that acquired the handle
pub(crate) struct SessionEventRelay {
    shared: Weak<Shared>,
}

impl SessionEventRelay {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }
}

impl SessionEventSink for SessionEventRelay {
    fn on_session_event(&self, handle: SessionHandle, event: SessionEvent) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_session_event(handle, event),
            None => debug!("[WWAN] Manager gone, dropping {:?} on {:?}", event, handle),
        }
    }
}
