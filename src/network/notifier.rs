//! Observer fan-out
//!
//! Work done under the manager lock only records what should be reported in
//! an [`Outbox`]. The outbox is queued before the lock is released and
//! delivered after, so callbacks may call straight back into the manager.
//!
//! One thread at a time drains the queue. Reports therefore reach the
//! callbacks in the order the state changed, whichever thread made the
//! change. A thread that finds the queue already being drained leaves its
//! reports to the draining thread.

use locnet_shared::{DataItem, WwanCallStatus};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives data item updates for subscribed categories
pub type ObserverCallback = Arc<dyn Fn(&[DataItem]) + Send + Sync>;

/// Receives WWAN call (backhaul or dedicated session) outcomes
pub type WwanCallStatusCallback = Arc<dyn Fn(&WwanCallStatus) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Observe(DataItem),
    CallStatus(WwanCallStatus),
}

/// Reports collected while the manager lock is held
#[derive(Debug, Default)]
pub(crate) struct Outbox {
    effects: Vec<Effect>,
}

impl Outbox {
    pub(crate) fn observe(&mut self, item: DataItem) {
        self.effects.push(Effect::Observe(item));
    }

    pub(crate) fn call_status(&mut self, status: WwanCallStatus) {
        self.effects.push(Effect::CallStatus(status));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn items(&self) -> Vec<DataItem> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::Observe(item) => Some(*item),
                Effect::CallStatus(_) => None,
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn call_statuses(&self) -> Vec<WwanCallStatus> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                Effect::CallStatus(status) => Some(status.clone()),
                Effect::Observe(_) => None,
            })
            .collect()
    }
}

/// Reports waiting for delivery, in the order they were produced
#[derive(Default)]
struct DeliveryQueue {
    effects: VecDeque<Effect>,
    draining: bool,
}

/// Holds the single observer and the single call status callback
#[derive(Default)]
pub struct ObserverNotifier {
    observer: RwLock<Option<ObserverCallback>>,
    call_status: RwLock<Option<WwanCallStatusCallback>>,
    queue: Mutex<DeliveryQueue>,
}

/// Releases the drain token if a callback panics mid-drain
struct DrainToken<'a> {
    queue: &'a Mutex<DeliveryQueue>,
    released: bool,
}

impl Drop for DrainToken<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.queue.lock().draining = false;
        }
    }
}

impl ObserverNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the observer; a later registration replaces it
    pub fn register_observer(&self, observer: ObserverCallback) {
        if self.observer.write().replace(observer).is_some() {
            debug!("[NOTIFY] Replaced previous observer");
        }
    }

    /// Set the call status callback; a later registration replaces it
    pub fn register_call_status(&self, callback: WwanCallStatusCallback) {
        if self.call_status.write().replace(callback).is_some() {
            debug!("[NOTIFY] Replaced previous call status callback");
        }
    }

    /// Queue the outbox for delivery. Called with the manager lock held so
    /// the queue follows the order of state changes.
    pub(crate) fn enqueue(&self, outbox: Outbox) {
        if outbox.is_empty() {
            return;
        }
        self.queue.lock().effects.extend(outbox.effects);
    }

    /// Deliver queued reports unless another caller is already doing so.
    ///
    /// A callback that re-enters the manager from the draining thread has
    /// its own reports delivered after it returns.
    pub(crate) fn flush(&self) {
        {
            let mut queue = self.queue.lock();
            if queue.draining || queue.effects.is_empty() {
                return;
            }
            queue.draining = true;
        }
        let mut token = DrainToken {
            queue: &self.queue,
            released: false,
        };

        loop {
            let next = {
                let mut queue = self.queue.lock();
                let next = queue.effects.pop_front();
                // Give up the token under the same lock that saw the queue empty
                if next.is_none() {
                    queue.draining = false;
                    token.released = true;
                }
                next
            };
            match next {
                Some(effect) => self.invoke(effect),
                None => break,
            }
        }
    }

    /// Queue and deliver in one step
    #[cfg(test)]
    pub(crate) fn deliver(&self, outbox: Outbox) {
        self.enqueue(outbox);
        self.flush();
    }

    fn invoke(&self, effect: Effect) {
        match effect {
            Effect::Observe(item) => {
                let observer = self.observer.read().clone();
                match observer {
                    Some(observer) => observer(&[item]),
                    None => warn!("[NOTIFY] No observer registered, dropping {:?}", item.id()),
                }
            }
            Effect::CallStatus(status) => {
                let callback = self.call_status.read().clone();
                match callback {
                    Some(callback) => callback(&status),
                    None => debug!("[NOTIFY] No call status callback for {:?}", status.event),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locnet_shared::WwanCallEvent;

    #[test]
    fn test_delivery_in_order() {
        let notifier = ObserverNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        notifier.register_observer(Arc::new(move |items: &[DataItem]| {
            sink.lock().extend_from_slice(items);
        }));

        let mut outbox = Outbox::default();
        outbox.observe(DataItem::WifiHardwareState { enabled: true });
        outbox.observe(DataItem::WifiHardwareState { enabled: false });
        notifier.deliver(outbox);

        assert_eq!(
            *seen.lock(),
            vec![
                DataItem::WifiHardwareState { enabled: true },
                DataItem::WifiHardwareState { enabled: false },
            ]
        );
    }

    #[test]
    fn test_last_registration_wins() {
        let notifier = ObserverNotifier::new();
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));

        let counter = first.clone();
        notifier.register_call_status(Arc::new(move |_: &WwanCallStatus| *counter.lock() += 1));
        let counter = second.clone();
        notifier.register_call_status(Arc::new(move |_: &WwanCallStatus| *counter.lock() += 1));

        let mut outbox = Outbox::default();
        outbox.call_status(WwanCallStatus::new(WwanCallEvent::CloseSuccess, None, None));
        notifier.deliver(outbox);

        assert_eq!(*first.lock(), 0);
        assert_eq!(*second.lock(), 1);
    }

    #[test]
    fn test_reentrant_reports_follow_current_one() {
        let notifier = Arc::new(ObserverNotifier::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let inner = Arc::downgrade(&notifier);
        notifier.register_observer(Arc::new(move |items: &[DataItem]| {
            sink.lock().extend_from_slice(items);
            if items == [DataItem::WifiHardwareState { enabled: true }] {
                let mut outbox = Outbox::default();
                outbox.observe(DataItem::WifiHardwareState { enabled: false });
                if let Some(notifier) = inner.upgrade() {
                    notifier.deliver(outbox);
                }
                // Not delivered yet: this call is still in progress
                assert_eq!(sink.lock().len(), 1);
            }
        }));

        let mut outbox = Outbox::default();
        outbox.observe(DataItem::WifiHardwareState { enabled: true });
        notifier.deliver(outbox);

        assert_eq!(
            *seen.lock(),
            vec![
                DataItem::WifiHardwareState { enabled: true },
                DataItem::WifiHardwareState { enabled: false },
            ]
        );
    }

    #[test]
    fn test_panicking_observer_releases_queue() {
        let notifier = Arc::new(ObserverNotifier::new());
        notifier.register_observer(Arc::new(|_: &[DataItem]| panic!("observer failed")));

        let worker = notifier.clone();
        let result = std::thread::spawn(move || {
            let mut outbox = Outbox::default();
            outbox.observe(DataItem::WifiHardwareState { enabled: true });
            worker.deliver(outbox);
        })
        .join();
        assert!(result.is_err());

        let seen = Arc::new(Mutex::new(0));
        let counter = seen.clone();
        notifier.register_observer(Arc::new(move |_: &[DataItem]| *counter.lock() += 1));
        let mut outbox = Outbox::default();
        outbox.observe(DataItem::WifiHardwareState { enabled: false });
        notifier.deliver(outbox);
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_unregistered_delivery_is_dropped() {
        let notifier = ObserverNotifier::new();
        let mut outbox = Outbox::default();
        outbox.observe(DataItem::WifiHardwareState { enabled: true });
        outbox.call_status(WwanCallStatus::new(WwanCallEvent::OpenFailed, None, None));
        notifier.deliver(outbox);
    }
}
