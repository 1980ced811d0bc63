//! Subscribed data item bookkeeping

use locnet_shared::DataItemId;
use std::collections::BTreeSet;

/// Which network categories are active, before or after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Categories {
    pub network_info: bool,
    pub wifi_hardware: bool,
}

impl Categories {
    pub fn any(self) -> bool {
        self.network_info || self.wifi_hardware
    }
}

/// Result of a subscription update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionChange {
    /// Membership changed at all
    pub changed: bool,
    pub before: Categories,
    pub after: Categories,
}

impl SubscriptionChange {
    pub fn network_info_activated(&self) -> bool {
        self.after.network_info && !self.before.network_info
    }

    pub fn wifi_hardware_activated(&self) -> bool {
        self.after.wifi_hardware && !self.before.wifi_hardware
    }

    /// Registration with the connectivity service is needed and wasn't before
    pub fn registration_started(&self) -> bool {
        self.after.any() && !self.before.any()
    }

    /// No network category is left
    pub fn registration_ended(&self) -> bool {
        self.changed && self.before.any() && !self.after.any()
    }
}

/// Set of subscribed data items.
///
/// A category is active iff its identifier is in the set.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    items: BTreeSet<DataItemId>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, id: DataItemId) -> bool {
        self.items.contains(&id)
    }

    pub fn categories(&self) -> Categories {
        Categories {
            network_info: self.is_subscribed(DataItemId::NetworkInfo),
            wifi_hardware: self.is_subscribed(DataItemId::WifiHardwareState),
        }
    }

    pub fn subscribe(&mut self, ids: &[DataItemId]) -> SubscriptionChange {
        let before = self.categories();
        let mut changed = false;
        for id in ids {
            changed |= self.items.insert(*id);
        }
        SubscriptionChange {
            changed,
            before,
            after: self.categories(),
        }
    }

    pub fn unsubscribe(&mut self, ids: &[DataItemId]) -> SubscriptionChange {
        let before = self.categories();
        let mut changed = false;
        for id in ids {
            changed |= self.items.remove(id);
        }
        SubscriptionChange {
            changed,
            before,
            after: self.categories(),
        }
    }

    pub fn unsubscribe_all(&mut self) -> SubscriptionChange {
        let before = self.categories();
        let changed = !self.items.is_empty();
        self.items.clear();
        SubscriptionChange {
            changed,
            before,
            after: Categories::default(),
        }
    }
}
