//! Station-mode and WWAN status handlers for platforms without backhaul
//! status indications

use super::{HandlerContext, IndicationResult};
use locnet_shared::{BackhaulType, ConnState, StationModeStatus, WwanStatus};
use tracing::{error, info, warn};

pub(crate) fn handle_station_mode_status(
    ctx: &mut HandlerContext<'_>,
    status: StationModeStatus,
) -> IndicationResult {
    info!("[IND] Station mode status {:?}", status);

    let connectivity = match status {
        StationModeStatus::Connected => ConnState::Connected,
        StationModeStatus::Disconnected => ConnState::Disconnected,
        StationModeStatus::Unknown(code) => {
            error!("[IND] Unsupported station mode status {}", code);
            ConnState::Invalid
        }
    };
    ctx.network.set_status(BackhaulType::Wlan, connectivity);
    ctx.notify_network_info();
    IndicationResult::Handled
}

pub(crate) fn handle_wwan_status(
    ctx: &mut HandlerContext<'_>,
    status: WwanStatus,
) -> IndicationResult {
    info!("[IND] WWAN status {:?}", status);

    let connectivity = if status.is_connected() {
        ConnState::Connected
    } else if status.is_disconnected() {
        ConnState::Disconnected
    } else {
        warn!("[IND] Unsupported WWAN status {:?}", status);
        ConnState::Invalid
    };
    ctx.network.set_status(BackhaulType::Wwan, connectivity);
    ctx.notify_network_info();
    IndicationResult::Handled
}
