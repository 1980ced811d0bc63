//! WWAN roaming status handler

use super::{HandlerContext, IndicationResult};
use tracing::debug;

/// Update the roaming flag. Roaming only reaches observers inside a later
/// network info report.
pub(crate) fn handle_roaming_status(ctx: &mut HandlerContext<'_>, status: u8) -> IndicationResult {
    debug!("[IND] WWAN roaming status {}", status);
    ctx.network.set_roaming(status != 0);
    IndicationResult::Handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::handlers::test_support::Fixture;

    #[test]
    fn test_roaming_updates_without_notification() {
        let mut fx = Fixture::default();

        handle_roaming_status(&mut fx.ctx(), 2);
        assert!(fx.network.backhaul().roaming);

        handle_roaming_status(&mut fx.ctx(), 0);
        assert!(!fx.network.backhaul().roaming);
        assert!(fx.drain().is_empty());
    }
}
