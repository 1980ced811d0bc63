//! Backhaul bring-up and teardown completion handlers.
//!
//! These only settle the pending flags the multiplexer set and report the
//! outcome. Backhaul state is owned by the status handlers.

use super::{HandlerContext, IndicationResult};
use locnet_shared::{WwanCallEvent, WwanStatus};
use tracing::{debug, info, warn};

pub(crate) fn handle_bring_up(ctx: &mut HandlerContext<'_>, status: WwanStatus) -> IndicationResult {
    debug!("[IND] WWAN bring-up status {:?}", status);

    let event = if status.is_connected() {
        WwanCallEvent::OpenSuccess
    } else if status.is_connect_failure() {
        WwanCallEvent::OpenFailed
    } else {
        warn!("[IND] Unsupported WWAN bring-up status {:?}", status);
        return IndicationResult::ignored(format!("unsupported bring-up status {:?}", status));
    };

    if ctx.backhaul.finish_connect() {
        info!("[IND] Backhaul connect finished: {:?}", event);
        ctx.outbox.call_status(ctx.config.call_status(event));
    }
    IndicationResult::Handled
}

pub(crate) fn handle_tear_down(ctx: &mut HandlerContext<'_>, status: WwanStatus) -> IndicationResult {
    debug!("[IND] WWAN teardown status {:?}", status);

    let event = if status.is_disconnected() {
        WwanCallEvent::CloseSuccess
    } else if status.is_disconnect_failure() {
        WwanCallEvent::CloseFailed
    } else {
        warn!("[IND] Unsupported WWAN teardown status {:?}", status);
        return IndicationResult::ignored(format!("unsupported teardown status {:?}", status));
    };

    if ctx.backhaul.finish_disconnect() {
        info!("[IND] Backhaul disconnect finished: {:?}", event);
        ctx.outbox.call_status(ctx.config.call_status(event));
    }
    IndicationResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::handlers::test_support::Fixture;
    use crate::network::BackhaulState;
    use crate::service::{ConnectivityService, IndicationSink, SimConnectivityService};
    use locnet_shared::{Indication, RawIndication};
    use std::sync::Arc;

    struct NullSink;

    impl IndicationSink for NullSink {
        fn on_raw_indication(&self, _raw: RawIndication) {}
        fn on_indication(&self, _indication: Indication) {}
    }

    /// Fixture with a connect outstanding
    fn connecting() -> Fixture {
        let sim = SimConnectivityService::new();
        let mut client = sim.open(Arc::new(NullSink)).expect("open failed");
        let mut fx = Fixture::default();
        fx.config.apn = Some("internet".into());
        let Fixture {
            backhaul,
            config,
            outbox,
            ..
        } = &mut fx;
        backhaul
            .connect("a", client.as_mut(), config, outbox)
            .expect("connect failed");
        fx
    }

    fn events(fx: &mut Fixture) -> Vec<WwanCallEvent> {
        fx.drain().call_statuses().into_iter().map(|s| s.event).collect()
    }

    #[test]
    fn test_bring_up_success_reports_once() {
        let mut fx = connecting();

        handle_bring_up(&mut fx.ctx(), WwanStatus::Ipv6Connected);
        let statuses = fx.drain().call_statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].event, WwanCallEvent::OpenSuccess);
        assert_eq!(statuses[0].apn.as_deref(), Some("internet"));
        assert!(!fx.backhaul.flags().connect_pending);

        // Flag already cleared
        handle_bring_up(&mut fx.ctx(), WwanStatus::Connected);
        assert!(events(&mut fx).is_empty());
    }

    #[test]
    fn test_bring_up_failure() {
        let mut fx = connecting();

        handle_bring_up(&mut fx.ctx(), WwanStatus::ConnectingFail);
        assert_eq!(events(&mut fx), vec![WwanCallEvent::OpenFailed]);
        assert!(!fx.backhaul.flags().connect_pending);
    }

    #[test]
    fn test_unsupported_status_keeps_flag() {
        let mut fx = connecting();

        let result = handle_bring_up(&mut fx.ctx(), WwanStatus::Connecting);
        assert!(matches!(result, IndicationResult::Ignored { .. }));
        assert!(fx.backhaul.flags().connect_pending);
    }

    #[test]
    fn test_completions_leave_backhaul_state() {
        let mut fx = connecting();

        handle_bring_up(&mut fx.ctx(), WwanStatus::Connected);
        handle_tear_down(&mut fx.ctx(), WwanStatus::Disconnected);
        assert_eq!(fx.network.backhaul(), BackhaulState::default());
    }

    #[test]
    fn test_tear_down_without_pending_disconnect() {
        let mut fx = Fixture::default();

        handle_tear_down(&mut fx.ctx(), WwanStatus::Ipv6DisconnectingFail);
        assert!(events(&mut fx).is_empty());
    }
}
