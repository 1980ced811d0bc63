use anyhow::{Context, Result};
use bytes::Bytes;
use futures::future::join_all;
use locnet_iface::service::{SimConnectivityService, SimSessionLibrary};
use locnet_iface::{Collaborators, LocNetConfig, LocNetIface};
use locnet_shared::indication::msg_id;
use locnet_shared::{
    codec, BackhaulStatusInd, BackhaulType, CallType, CodecError, DataItem, DataItemId,
    Indication, MessageKind, RawIndication, SessionEvent, WlanMode, WlanStatus, WwanCallStatus,
    WwanStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = LocNetConfig {
        apn: Some("supl.example".into()),
        call_type: CallType::WwanSupl,
        session_init_settle: Duration::from_millis(10),
        ..Default::default()
    };
    info!("Location network interface starting");
    info!("  APN: {:?}, IP type: {:?}", config.apn, config.ip_type);

    let connectivity = SimConnectivityService::new();
    let sessions = SimSessionLibrary::new();

    let iface = LocNetIface::new(
        config,
        Collaborators {
            connectivity: Arc::new(connectivity.clone()),
            sessions: Arc::new(sessions.clone()),
            decoder: Arc::new(decode_payload),
        },
    );

    iface.register_observer(|items: &[DataItem]| {
        for item in items {
            info!("[MAIN] Observer: {:?}", item);
        }
    });
    iface.register_wwan_call_status_callback(|status: &WwanCallStatus| {
        info!(
            "[MAIN] Call status: {:?} apn={:?} ip={:?}",
            status.event, status.apn, status.ip_type
        );
    });

    // Wi-Fi already up as a station before we subscribe
    connectivity.set_wlan_mode(WlanMode::ApSta);
    connectivity.set_backhaul(BackhaulType::Wlan, true, false);
    iface.subscribe(&[DataItemId::NetworkInfo, DataItemId::WifiHardwareState]);

    // Several clients ask for the backhaul at once
    let completions = ["xtra", "ntp", "supl"].into_iter().map(|client| {
        let (tx, rx) = oneshot::channel();
        iface.connect_backhaul_async(client, move |result| {
            match &result {
                Ok(()) => info!("[MAIN] {} connect accepted", client),
                Err(e) => error!("[MAIN] {} connect failed: {}", client, e),
            }
            let _ = tx.send(result);
        });
        rx
    });
    for completion in join_all(completions).await {
        completion.context("connect worker dropped its completion")??;
    }
    info!("[MAIN] Backhaul clients: {:?}", iface.backhaul_clients());

    // Service side: bring-up completes, backhaul moves to WWAN
    connectivity.complete_bring_up();
    connectivity.indicate_raw(RawIndication::new(
        msg_id::WWAN_ROAMING_STATUS,
        Bytes::from_static(&[1]),
    ));
    iface.notify_current_network_info(false);

    // Wi-Fi radio switched off
    connectivity.indicate_raw(RawIndication::new(
        msg_id::WLAN_STATUS,
        Bytes::from_static(&[0, 0]),
    ));

    info!(
        "[MAIN] WWAN connected={} roaming={} any={} non-metered={}",
        iface.is_wwan_connected(),
        iface.is_wwan_roaming(),
        iface.is_any_backhaul_connected(),
        iface.is_non_metered_backhaul_type_connected()
    );

    for client in ["xtra", "ntp", "supl"] {
        if let Err(e) = iface.disconnect_backhaul(client) {
            warn!("[MAIN] {} disconnect failed: {}", client, e);
        }
    }
    connectivity.complete_tear_down();

    // Dedicated positioning-assistance call
    let worker = iface.clone();
    tokio::task::spawn_blocking(move || worker.setup_wwan_call())
        .await
        .context("setup worker panicked")?
        .context("data call setup")?;

    let handle = sessions
        .handle()
        .context("session library issued no handle")?;
    sessions.emit(handle, SessionEvent::NetIsConn);

    iface.stop_wwan_call().context("data call stop")?;
    sessions.emit(handle, SessionEvent::NoNet);

    iface.unsubscribe_all();
    info!("Location network interface stopped");
    Ok(())
}

/// Demo wire format, one byte per field
fn decode_payload(kind: MessageKind, payload: &[u8]) -> Result<Indication, CodecError> {
    match kind {
        MessageKind::WlanStatus => {
            codec::require_len(kind, payload, 2)?;
            let status = match payload[0] {
                0 => WlanStatus::Disabled,
                1 => WlanStatus::Enabled,
                other => WlanStatus::Unknown(other as i32),
            };
            let mode = if payload[1] == 0 {
                WlanMode::Unset
            } else {
                WlanMode::StaOnly
            };
            Ok(Indication::WlanStatus { status, mode })
        }
        MessageKind::BringUpWwan => {
            codec::require_len(kind, payload, 1)?;
            Ok(Indication::BringUpWwan(WwanStatus::from_code(payload[0] as i32)))
        }
        MessageKind::TearDownWwan => {
            codec::require_len(kind, payload, 1)?;
            Ok(Indication::TearDownWwan(WwanStatus::from_code(payload[0] as i32)))
        }
        MessageKind::BackhaulStatus => {
            codec::require_len(kind, payload, 3)?;
            Ok(Indication::BackhaulStatus(BackhaulStatusInd {
                backhaul_type: Some(payload[0] as i32),
                ipv4_available: Some(payload[1] != 0),
                ipv6_available: Some(payload[2] != 0),
            }))
        }
        MessageKind::WwanRoamingStatus => {
            codec::require_len(kind, payload, 1)?;
            Ok(Indication::WwanRoamingStatus(payload[0]))
        }
        MessageKind::WwanStatus => {
            codec::require_len(kind, payload, 1)?;
            Ok(Indication::WwanStatus(WwanStatus::from_code(payload[0] as i32)))
        }
        MessageKind::StationModeStatus => Err(CodecError::Malformed {
            kind,
            reason: "station mode status not used by this demo".into(),
        }),
    }
}
