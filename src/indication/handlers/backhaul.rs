//! Backhaul status handler

use super::{HandlerContext, IndicationResult};
use locnet_shared::BackhaulStatusInd;
use tracing::error;

/// Handle a backhaul status report.
///
/// A report without valid type info marks the backhaul unknown and is not
/// reported, so observers never see a malformed report as a disconnect.
pub(crate) fn handle_backhaul_status(
    ctx: &mut HandlerContext<'_>,
    ind: &BackhaulStatusInd,
) -> IndicationResult {
    let Some(report) = ind.report() else {
        error!("[IND] Backhaul type is not valid: {:?}", ind);
        ctx.network.invalidate();
        return IndicationResult::Handled;
    };

    ctx.network.apply_report(&report);
    ctx.notify_network_info();
    IndicationResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::handlers::test_support::Fixture;
    use locnet_shared::{BackhaulType, ConnState, DataItem, NetworkInfo};

    fn ind(code: Option<i32>, v4: Option<bool>, v6: Option<bool>) -> BackhaulStatusInd {
        BackhaulStatusInd {
            backhaul_type: code,
            ipv4_available: v4,
            ipv6_available: v6,
        }
    }

    #[test]
    fn test_valid_report_notifies_cached_state() {
        let mut fx = Fixture::default();

        handle_backhaul_status(&mut fx.ctx(), &ind(Some(3), Some(true), None));

        let state = fx.network.backhaul();
        assert_eq!(state.backhaul_type, BackhaulType::Wlan);
        assert_eq!(state.connectivity, ConnState::Connected);
        assert_eq!(
            fx.drain().items(),
            vec![DataItem::NetworkInfo(NetworkInfo {
                backhaul_type: BackhaulType::Wlan,
                available: true,
                connected: true,
                roaming: false,
            })]
        );
    }

    #[test]
    fn test_invalid_type_suppresses_notification() {
        let mut fx = Fixture::default();
        handle_backhaul_status(&mut fx.ctx(), &ind(Some(1), Some(true), None));
        fx.drain();

        handle_backhaul_status(&mut fx.ctx(), &ind(None, Some(true), Some(true)));

        let state = fx.network.backhaul();
        assert_eq!(state.backhaul_type, BackhaulType::Invalid);
        assert_eq!(state.connectivity, ConnState::Invalid);
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn test_invalid_flags_mean_unavailable() {
        let mut fx = Fixture::default();

        handle_backhaul_status(&mut fx.ctx(), &ind(Some(4), None, None));
        assert_eq!(fx.network.backhaul().connectivity, ConnState::Disconnected);
        assert_eq!(fx.drain().items().len(), 1);
    }

    #[test]
    fn test_unregistered_updates_state_silently() {
        let mut fx = Fixture {
            registered: false,
            ..Default::default()
        };

        handle_backhaul_status(&mut fx.ctx(), &ind(Some(1), Some(true), None));
        assert_eq!(fx.network.backhaul().backhaul_type, BackhaulType::Wwan);
        assert!(fx.network.backhaul().is_connected());
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn test_unknown_type_code_not_notified() {
        let mut fx = Fixture::default();

        handle_backhaul_status(&mut fx.ctx(), &ind(Some(42), Some(true), None));
        assert_eq!(fx.network.backhaul().backhaul_type, BackhaulType::Invalid);
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn test_roaming_cleared_when_leaving_wwan() {
        let mut fx = Fixture::default();
        handle_backhaul_status(&mut fx.ctx(), &ind(Some(1), Some(true), None));
        fx.network.set_roaming(true);

        handle_backhaul_status(&mut fx.ctx(), &ind(Some(3), Some(true), None));
        assert!(!fx.network.backhaul().roaming);
    }
}
