//! Indication routing
//!
//! The connectivity service calls in on its own thread. Raw messages are
//! decoded at this boundary; typed indications are then routed to exactly
//! one handler, or dropped with a log line.

use locnet_shared::{codec, Indication, PayloadDecoder, RawIndication};
use std::sync::{Arc, Weak};
use tracing::{debug, error, warn};

use super::handlers::{self, HandlerContext, IndicationResult};
use crate::config::IndicationPath;
use crate::manager::Shared;
use crate::service::IndicationSink;

/// Decode a raw indication, logging anything we can't use
pub(crate) fn decode_raw(decoder: &dyn PayloadDecoder, raw: &RawIndication) -> Option<Indication> {
    match codec::decode(raw, decoder) {
        Ok(Some(indication)) => Some(indication),
        Ok(None) => {
            warn!("[IND] Ignoring indication {:#06x}", raw.msg_id);
            None
        }
        Err(e) => {
            error!("[IND] Failed to decode indication {:#06x}: {}", raw.msg_id, e);
            None
        }
    }
}

/// Route a typed indication to its handler
pub(crate) fn dispatch(ctx: &mut HandlerContext<'_>, indication: &Indication) -> IndicationResult {
    let path = ctx.config.features.indication_path;
    debug!("[IND] Received {}", indication.kind());

    match (indication, path) {
        (Indication::WlanStatus { status, mode }, _) => {
            handlers::handle_wlan_status(ctx, *status, *mode)
        }
        (Indication::BringUpWwan(status), _) => handlers::handle_bring_up(ctx, *status),
        (Indication::TearDownWwan(status), _) => handlers::handle_tear_down(ctx, *status),
        (Indication::BackhaulStatus(ind), IndicationPath::BackhaulStatus) => {
            handlers::handle_backhaul_status(ctx, ind)
        }
        (Indication::WwanRoamingStatus(status), IndicationPath::BackhaulStatus) => {
            handlers::handle_roaming_status(ctx, *status)
        }
        (Indication::StationModeStatus(status), IndicationPath::Legacy) => {
            handlers::handle_station_mode_status(ctx, *status)
        }
        (Indication::WwanStatus(status), IndicationPath::Legacy) => {
            handlers::handle_wwan_status(ctx, *status)
        }
        (
            Indication::BackhaulStatus(_)
            | Indication::WwanRoamingStatus(_)
            | Indication::StationModeStatus(_)
            | Indication::WwanStatus(_),
            path,
        ) => IndicationResult::ignored(format!(
            "{} not used on {:?} platforms",
            indication.kind(),
            path
        )),
    }
}

/// Indication sink handed to the connectivity service
pub(crate) struct IndicationDispatcher {
    shared: Weak<Shared>,
    decoder: Arc<dyn PayloadDecoder>,
}

impl IndicationDispatcher {
    pub(crate) fn new(shared: Weak<Shared>, decoder: Arc<dyn PayloadDecoder>) -> Self {
        Self { shared, decoder }
    }
}

impl IndicationSink for IndicationDispatcher {
    fn on_raw_indication(&self, raw: RawIndication) {
        if let Some(indication) = decode_raw(self.decoder.as_ref(), &raw) {
            self.on_indication(indication);
        }
    }

    fn on_indication(&self, indication: Indication) {
        match self.shared.upgrade() {
            Some(shared) => shared.handle_indication(&indication),
            None => debug!("[IND] Manager gone, dropping {}", indication.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indication::handlers::test_support::Fixture;
    use locnet_shared::indication::msg_id;
    use locnet_shared::{
        BackhaulStatusInd, BackhaulType, CodecError, ConnState, MessageKind, StationModeStatus,
        WlanMode, WlanStatus, WwanStatus,
    };

    fn wlan_decoder() -> impl PayloadDecoder {
        |kind: MessageKind, payload: &[u8]| -> Result<Indication, CodecError> {
            codec::require_len(kind, payload, 1)?;
            let status = if payload[0] == 1 {
                WlanStatus::Enabled
            } else {
                WlanStatus::Disabled
            };
            Ok(Indication::WlanStatus {
                status,
                mode: WlanMode::StaOnly,
            })
        }
    }

    #[test]
    fn test_decode_raw() {
        let decoder = wlan_decoder();

        let raw = RawIndication::new(msg_id::WLAN_STATUS, vec![1u8]);
        assert_eq!(
            decode_raw(&decoder, &raw),
            Some(Indication::WlanStatus {
                status: WlanStatus::Enabled,
                mode: WlanMode::StaOnly,
            })
        );

        // Unknown id, short payload, wrong kind
        assert_eq!(decode_raw(&decoder, &RawIndication::new(0x7777, vec![1u8])), None);
        assert_eq!(decode_raw(&decoder, &RawIndication::new(msg_id::WLAN_STATUS, Vec::new())), None);
        assert_eq!(decode_raw(&decoder, &RawIndication::new(msg_id::WWAN_STATUS, vec![1u8])), None);
    }

    #[test]
    fn test_backhaul_path_drops_legacy_indications() {
        let mut fx = Fixture::default();

        let result = dispatch(
            &mut fx.ctx(),
            &Indication::StationModeStatus(StationModeStatus::Connected),
        );
        assert!(matches!(result, IndicationResult::Ignored { .. }));
        let result = dispatch(&mut fx.ctx(), &Indication::WwanStatus(WwanStatus::Connected));
        assert!(matches!(result, IndicationResult::Ignored { .. }));

        assert_eq!(fx.network.backhaul().connectivity, ConnState::Invalid);
        assert!(fx.drain().is_empty());
    }

    #[test]
    fn test_legacy_path_drops_backhaul_indications() {
        let mut fx = Fixture::default();
        fx.config.features.indication_path = IndicationPath::Legacy;

        let result = dispatch(
            &mut fx.ctx(),
            &Indication::BackhaulStatus(BackhaulStatusInd {
                backhaul_type: Some(3),
                ipv4_available: Some(true),
                ipv6_available: None,
            }),
        );
        assert!(matches!(result, IndicationResult::Ignored { .. }));
        dispatch(&mut fx.ctx(), &Indication::WwanRoamingStatus(1));
        assert!(!fx.network.backhaul().roaming);

        let result = dispatch(
            &mut fx.ctx(),
            &Indication::StationModeStatus(StationModeStatus::Connected),
        );
        assert_eq!(result, IndicationResult::Handled);
        assert_eq!(fx.network.backhaul().backhaul_type, BackhaulType::Wlan);
    }

    #[test]
    fn test_common_indications_on_both_paths() {
        for path in [IndicationPath::BackhaulStatus, IndicationPath::Legacy] {
            let mut fx = Fixture::default();
            fx.config.features.indication_path = path;

            let result = dispatch(
                &mut fx.ctx(),
                &Indication::WlanStatus {
                    status: WlanStatus::Enabled,
                    mode: WlanMode::ApSta,
                },
            );
            assert_eq!(result, IndicationResult::Handled);
            assert_eq!(
                dispatch(&mut fx.ctx(), &Indication::TearDownWwan(WwanStatus::Disconnected)),
                IndicationResult::Handled
            );
        }
    }
}
