//! Location network interface manager
//!
//! One manager per process, shared by cloning. Callers, the connectivity
//! service's indication thread and the session library's event thread all
//! meet at a single mutex. Reports to the observer and the call status
//! callback are queued while it is held and delivered once it is released,
//! in the order the state changed.

use locnet_shared::{
    BackhaulType, DataItem, DataItemId, Indication, IndicationMask, PayloadDecoder,
    SessionEvent, SessionHandle, WlanState, WwanCallSession, WwanCallStatus,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use crate::backhaul::{BackhaulMultiplexer, PendingFlags};
use crate::config::{IndicationPath, LocNetConfig};
use crate::error::{LocNetError, Result};
use crate::indication::{dispatch, HandlerContext, IndicationDispatcher, IndicationResult};
use crate::network::{BackhaulState, NetworkStateTracker, ObserverNotifier, Outbox};
use crate::service::{
    ConnectivityClient, ConnectivityService, IndicationSink, SessionEventSink, SessionLibrary,
};
use crate::subscription::SubscriptionRegistry;
use crate::wwan::{SessionEventRelay, WwanCall};

/// External components the manager drives
pub struct Collaborators {
    pub connectivity: Arc<dyn ConnectivityService>,
    pub sessions: Arc<dyn SessionLibrary>,
    /// Decodes raw indication payloads from the connectivity service
    pub decoder: Arc<dyn PayloadDecoder>,
}

/// Everything behind the manager lock
#[derive(Default)]
pub(crate) struct State {
    client: Option<Box<dyn ConnectivityClient>>,
    subscriptions: SubscriptionRegistry,
    network: NetworkStateTracker,
    backhaul: BackhaulMultiplexer,
    wwan: WwanCall,
}

pub(crate) struct Shared {
    config: LocNetConfig,
    connectivity: Arc<dyn ConnectivityService>,
    sessions: Arc<dyn SessionLibrary>,
    indication_sink: Arc<dyn IndicationSink>,
    session_sink: Arc<dyn SessionEventSink>,
    notifier: ObserverNotifier,
    /// Runtime the manager was built on, for detached work from foreign threads
    runtime: Option<Handle>,
    state: Mutex<State>,
}

impl Shared {
    /// Run `f` under the lock, then deliver whatever it reported
    fn with_state<R>(&self, f: impl FnOnce(&mut State, &mut Outbox) -> R) -> R {
        let result = {
            let mut guard = self.state.lock();
            let mut outbox = Outbox::default();
            let result = f(&mut guard, &mut outbox);
            self.notifier.enqueue(outbox);
            result
        };
        self.notifier.flush();
        result
    }

    pub(crate) fn handle_indication(&self, indication: &Indication) {
        let result = self.with_state(|state, outbox| {
            let mut ctx = HandlerContext {
                network: &mut state.network,
                backhaul: &mut state.backhaul,
                config: &self.config,
                outbox,
                registered: state.client.is_some(),
            };
            dispatch(&mut ctx, indication)
        });

        if let IndicationResult::Ignored { reason } = result {
            debug!("[IND] Dropped {}: {}", indication.kind(), reason);
        }
    }

    pub(crate) fn handle_session_event(&self, handle: SessionHandle, event: SessionEvent) {
        self.with_state(|state, outbox| {
            state.wwan.on_event(handle, event, &self.config, outbox);
        });
    }

    fn is_legacy(&self) -> bool {
        self.config.features.indication_path == IndicationPath::Legacy
    }

    fn register(&self, state: &mut State) {
        if state.client.is_some() {
            warn!("[SUBSCRIBE] Already registered with the connectivity service");
            return;
        }

        let mut client = match self.connectivity.open(self.indication_sink.clone()) {
            Ok(client) => client,
            Err(e) => {
                error!("[SUBSCRIBE] Failed to open connectivity service client: {}", e);
                return;
            }
        };
        info!("[SUBSCRIBE] Registered with the connectivity service");

        if self.config.features.mobile_ap_on_demand {
            let mask = IndicationMask::LOCATION;
            match client.register_for_indications(mask) {
                Ok(()) => info!("[SUBSCRIBE] Indications registered, mask {:#x}", mask.bits()),
                Err(e) => error!("[SUBSCRIBE] Indication registration failed: {}", e),
            }
        } else {
            // Status indications only flow while mobile AP is up
            if let Err(e) = client.enable_mobile_ap() {
                error!("[SUBSCRIBE] Failed to enable mobile AP: {}", e);
            }
            state.backhaul.set_mobile_ap_enabled(true);
            if let Err(e) = client.register_wlan_status(true) {
                error!("[SUBSCRIBE] WLAN status registration failed: {}", e);
            }
        }

        state.client = Some(client);
    }

    /// Take the client out of the state. The caller drops it after the
    /// lock is released.
    fn unregister(state: &mut State) -> Option<Box<dyn ConnectivityClient>> {
        let client = state.client.take();
        if client.is_some() {
            info!("[SUBSCRIBE] Unregistering from the connectivity service");
        } else {
            error!("[SUBSCRIBE] No registration to drop");
        }
        client
    }

    /// Re-query the backhaul, updating the cache. Returns whether it is connected.
    fn refresh_backhaul(&self, state: &mut State) -> bool {
        let Some(client) = state.client.as_deref() else {
            error!("[NET] Not registered with the connectivity service");
            return false;
        };
        if self.is_legacy() {
            return state.network.backhaul().is_connected();
        }

        match client.backhaul_status() {
            Ok(report) => {
                state.network.apply_report(&report);
                state.network.backhaul().is_connected()
            }
            Err(e) => {
                error!("[NET] Failed to fetch backhaul status: {}", e);
                false
            }
        }
    }

    fn query_roaming(&self, client: &dyn ConnectivityClient) -> bool {
        if self.is_legacy() {
            return false;
        }
        match client.wwan_roaming_status() {
            Ok(status) => {
                debug!("[NET] Roaming status {:#x}", status);
                status != 0
            }
            Err(e) => {
                error!("[NET] Failed to fetch roaming status: {}", e);
                false
            }
        }
    }

    fn notify_network_info(&self, state: &mut State, outbox: &mut Outbox, refresh: bool) {
        if state.client.is_none() {
            error!("[NOTIFY] Not registered with the connectivity service");
            return;
        }

        if refresh {
            self.refresh_backhaul(state);
            if state.network.is_wwan() {
                let roaming = state
                    .client
                    .as_deref()
                    .is_some_and(|client| self.query_roaming(client));
                state.network.set_roaming(roaming);
            }
        }

        match state.network.network_info() {
            Some(item) => outbox.observe(item),
            None => {
                let backhaul = state.network.backhaul();
                error!(
                    "[NOTIFY] Invalid connection type {}, state {:?}",
                    backhaul.backhaul_type, backhaul.connectivity
                );
            }
        }
    }

    fn notify_wifi_hardware_state(&self, state: &mut State, outbox: &mut Outbox, refresh: bool) {
        let Some(client) = state.client.as_deref() else {
            error!("[NOTIFY] Not registered with the connectivity service");
            return;
        };

        if !refresh {
            outbox.observe(state.network.wifi_hardware_state());
            return;
        }

        match client.wlan_mode() {
            Ok(mode) => {
                if let Some(enabled) = state.network.apply_wlan_mode(mode) {
                    outbox.observe(DataItem::WifiHardwareState { enabled });
                }
            }
            Err(e) => error!("[NOTIFY] Failed to fetch WLAN status: {}", e),
        }
    }

    fn connect_backhaul(&self, client_id: &str) -> Result<()> {
        self.with_state(|state, outbox| {
            let Some(conn) = state.client.as_deref_mut() else {
                error!("[BACKHAUL] Connect from {} without registration", client_id);
                return Err(LocNetError::ServiceUnavailable);
            };
            state.backhaul.connect(client_id, conn, &self.config, outbox)
        })
    }
}

/// Connectivity view and backhaul arbitration for location clients
#[derive(Clone)]
pub struct LocNetIface {
    shared: Arc<Shared>,
}

impl LocNetIface {
    pub fn new(config: LocNetConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            connectivity,
            sessions,
            decoder,
        } = collaborators;

        let shared = Arc::new_cyclic(|me: &Weak<Shared>| Shared {
            config,
            connectivity,
            sessions,
            indication_sink: Arc::new(IndicationDispatcher::new(me.clone(), decoder)),
            session_sink: Arc::new(SessionEventRelay::new(me.clone())),
            notifier: ObserverNotifier::new(),
            runtime: Handle::try_current().ok(),
            state: Mutex::new(State::default()),
        });

        Self { shared }
    }

    // ---- Subscriptions ----

    /// Subscribe to data items. Returns whether the subscription set changed.
    pub fn subscribe(&self, ids: &[DataItemId]) -> bool {
        let shared = &self.shared;
        shared.with_state(|state, outbox| {
            let change = state.subscriptions.subscribe(ids);
            debug!("[SUBSCRIBE] Subscribe {:?}: {:?}", ids, change);

            if change.registration_started() {
                shared.register(state);
            }
            if change.network_info_activated() {
                shared.notify_network_info(state, outbox, true);
            }
            if change.wifi_hardware_activated() {
                shared.notify_wifi_hardware_state(state, outbox, true);
            }
            change.changed
        })
    }

    /// Unsubscribe from data items. Returns whether the subscription set changed.
    pub fn unsubscribe(&self, ids: &[DataItemId]) -> bool {
        let (changed, retired) = self.shared.with_state(|state, _| {
            let change = state.subscriptions.unsubscribe(ids);
            debug!("[SUBSCRIBE] Unsubscribe {:?}: {:?}", ids, change);

            let retired = change
                .registration_ended()
                .then(|| Shared::unregister(state))
                .flatten();
            (change.changed, retired)
        });
        drop(retired);
        changed
    }

    pub fn unsubscribe_all(&self) {
        let retired = self.shared.with_state(|state, _| {
            let change = state.subscriptions.unsubscribe_all();
            debug!("[SUBSCRIBE] Unsubscribe all: {:?}", change);

            change
                .registration_ended()
                .then(|| Shared::unregister(state))
                .flatten()
        });
        drop(retired);
    }

    /// Pull requests are not supported; data is only ever pushed
    pub fn request_data(&self, ids: &[DataItemId]) {
        debug!("[SUBSCRIBE] Ignoring data request for {:?}", ids);
    }

    // ---- Backhaul ----

    /// Request the shared backhaul for `client_id`.
    ///
    /// Success means the request was accepted; the connection outcome is
    /// reported through the call status callback.
    pub fn connect_backhaul(&self, client_id: &str) -> Result<()> {
        self.shared.connect_backhaul(client_id)
    }

    /// Run [`connect_backhaul`](Self::connect_backhaul) in the background
    /// and hand the result to `completion`.
    ///
    /// Uses a blocking worker of the caller's Tokio runtime, or of the one the
    /// manager was built on. Without either, a dedicated thread runs it.
    pub fn connect_backhaul_async<F>(&self, client_id: impl Into<String>, completion: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let shared = self.shared.clone();
        let client_id = client_id.into();
        let work = move || {
            let result = shared.connect_backhaul(&client_id);
            completion(result);
        };

        match Handle::try_current().ok().or_else(|| self.shared.runtime.clone()) {
            Some(runtime) => {
                runtime.spawn_blocking(work);
            }
            None => {
                let spawned = std::thread::Builder::new()
                    .name("locnet-connect".into())
                    .spawn(work);
                if let Err(e) = spawned {
                    error!("[BACKHAUL] Failed to start connect worker: {}", e);
                }
            }
        }
    }

    /// Release the backhaul request held by `client_id`
    pub fn disconnect_backhaul(&self, client_id: &str) -> Result<()> {
        let shared = &self.shared;
        shared.with_state(|state, outbox| {
            let Some(conn) = state.client.as_deref_mut() else {
                error!("[BACKHAUL] Disconnect from {} without registration", client_id);
                return Err(LocNetError::ServiceUnavailable);
            };
            state.backhaul.disconnect(client_id, conn, &shared.config, outbox)
        })
    }

    // ---- Dedicated WWAN call ----

    pub fn setup_wwan_call(&self) -> Result<()> {
        let shared = &self.shared;
        let settle = shared.with_state(|state, _| {
            state.wwan.prepare(shared.sessions.as_ref(), &shared.config)
        })?;
        if let Some(settle) = settle {
            debug!("[WWAN] Waiting {:?} for library init", settle);
            std::thread::sleep(settle);
        }

        shared.with_state(|state, outbox| {
            state.wwan.setup(
                shared.sessions.as_ref(),
                &shared.session_sink,
                &shared.config,
                outbox,
            )
        })
    }

    pub fn stop_wwan_call(&self) -> Result<()> {
        let shared = &self.shared;
        shared.with_state(|state, outbox| {
            state
                .wwan
                .stop(shared.sessions.as_ref(), &shared.config, outbox)
        })
    }

    // ---- Queries ----

    /// Live check that WWAN is the backhaul and has an address
    pub fn is_wwan_connected(&self) -> bool {
        let shared = &self.shared;
        shared.with_state(|state, _| {
            let Some(client) = state.client.as_deref() else {
                error!("[NET] Not registered with the connectivity service");
                return false;
            };
            if shared.is_legacy() {
                return false;
            }

            match client.backhaul_status() {
                Ok(report) => {
                    let connected = BackhaulType::from_vendor_code(report.backhaul_type)
                        == BackhaulType::Wwan
                        && report.is_available();
                    debug!("[NET] WWAN connected: {}", connected);
                    connected
                }
                Err(e) => {
                    error!("[NET] Failed to fetch backhaul status: {}", e);
                    false
                }
            }
        })
    }

    /// Refresh the backhaul and report whether any is connected
    pub fn is_any_backhaul_connected(&self) -> bool {
        let shared = &self.shared;
        shared.with_state(|state, _| shared.refresh_backhaul(state))
    }

    /// Refresh the backhaul and report whether its type is valid and not WWAN.
    /// Connectivity of that backhaul is not checked.
    pub fn is_non_metered_backhaul_type_connected(&self) -> bool {
        let shared = &self.shared;
        shared.with_state(|state, _| {
            if state.client.is_none() {
                error!("[NET] Not registered with the connectivity service");
                return false;
            }
            shared.refresh_backhaul(state);
            state.network.is_non_metered_type()
        })
    }

    pub fn is_wwan_roaming(&self) -> bool {
        let shared = &self.shared;
        shared.with_state(|state, _| match state.client.as_deref() {
            Some(client) => shared.query_roaming(client),
            None => {
                error!("[NET] Not registered with the connectivity service");
                false
            }
        })
    }

    // ---- Callbacks and notification ----

    /// Set the call status callback, replacing any previous one
    pub fn register_wwan_call_status_callback<F>(&self, callback: F)
    where
        F: Fn(&WwanCallStatus) + Send + Sync + 'static,
    {
        self.shared.notifier.register_call_status(Arc::new(callback));
    }

    /// Set the data item observer, replacing any previous one
    pub fn register_observer<F>(&self, observer: F)
    where
        F: Fn(&[DataItem]) + Send + Sync + 'static,
    {
        self.shared.notifier.register_observer(Arc::new(observer));
    }

    /// Report network info, re-querying the service first if `refresh`
    pub fn notify_current_network_info(&self, refresh: bool) {
        let shared = &self.shared;
        shared.with_state(|state, outbox| shared.notify_network_info(state, outbox, refresh));
    }

    /// Report Wi-Fi hardware state, re-querying the service first if `refresh`
    pub fn notify_current_wifi_hardware_state(&self, refresh: bool) {
        let shared = &self.shared;
        shared.with_state(|state, outbox| {
            shared.notify_wifi_hardware_state(state, outbox, refresh)
        });
    }

    // ---- Snapshots ----

    pub fn backhaul_state(&self) -> BackhaulState {
        self.shared.state.lock().network.backhaul()
    }

    pub fn wlan_state(&self) -> WlanState {
        self.shared.state.lock().network.wlan()
    }

    /// Clients currently holding a backhaul request
    pub fn backhaul_clients(&self) -> Vec<String> {
        self.shared.state.lock().backhaul.clients()
    }

    pub fn backhaul_flags(&self) -> PendingFlags {
        self.shared.state.lock().backhaul.flags()
    }

    pub fn wwan_call_session(&self) -> WwanCallSession {
        self.shared.state.lock().wwan.session().clone()
    }

    pub fn is_registered(&self) -> bool {
        self.shared.state.lock().client.is_some()
    }
}
