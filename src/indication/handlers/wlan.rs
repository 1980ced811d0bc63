//! WLAN status handler

use super::{HandlerContext, IndicationResult};
use locnet_shared::{WlanMode, WlanState, WlanStatus};
use tracing::{debug, error};

/// Handle a WLAN enabled/disabled report
pub(crate) fn handle_wlan_status(
    ctx: &mut HandlerContext<'_>,
    status: WlanStatus,
    mode: WlanMode,
) -> IndicationResult {
    debug!("[IND] WLAN status {:?}, mode {:?}", status, mode);

    let wlan = match status {
        WlanStatus::Enabled => WlanState::Enabled,
        WlanStatus::Disabled => WlanState::Disabled,
        WlanStatus::Unknown(code) => {
            error!("[IND] Invalid WLAN status {}", code);
            return IndicationResult::ignored(format!("invalid WLAN status {}", code));
        }
    };

    ctx.network.set_wlan(wlan);
    ctx.outbox.observe(ctx.network.wifi_hardware_state());
    IndicationResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::handlers::test_support::Fixture;
    use locnet_shared::DataItem;

    #[test]
    fn test_enabled_notifies_once() {
        let mut fx = Fixture::default();

        let result = handle_wlan_status(&mut fx.ctx(), WlanStatus::Enabled, WlanMode::StaOnly);
        assert_eq!(result, IndicationResult::Handled);
        assert_eq!(fx.network.wlan(), WlanState::Enabled);
        assert_eq!(
            fx.drain().items(),
            vec![DataItem::WifiHardwareState { enabled: true }]
        );
    }

    #[test]
    fn test_disabled() {
        let mut fx = Fixture::default();
        fx.network.set_wlan(WlanState::Enabled);

        handle_wlan_status(&mut fx.ctx(), WlanStatus::Disabled, WlanMode::Unset);
        assert_eq!(fx.network.wlan(), WlanState::Disabled);
        assert_eq!(
            fx.drain().items(),
            vec![DataItem::WifiHardwareState { enabled: false }]
        );
    }

    #[test]
    fn test_unknown_status_is_dropped() {
        let mut fx = Fixture::default();
        fx.network.set_wlan(WlanState::Enabled);

        let result = handle_wlan_status(&mut fx.ctx(), WlanStatus::Unknown(9), WlanMode::Ap);
        assert!(matches!(result, IndicationResult::Ignored { .. }));
        assert_eq!(fx.network.wlan(), WlanState::Enabled);
        assert!(fx.drain().is_empty());
    }
}
