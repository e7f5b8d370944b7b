//! Component state and the selection state machine.
//!
//! A [`ComponentState`] always has exactly one active item. Every transition,
//! whether it comes from a user interaction or from reconciling an external
//! navigation, goes through [`ComponentState::set_active`].

use std::collections::HashSet;

use querystate_types::{InstanceId, ItemKey, ItemSpec, Location, NavigationEvent, RegisterOptions};
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec;
use crate::error::StateError;

/// What triggered a selection transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    /// The user picked an item inside the component.
    User,
    /// The host navigated and the synchronization hook reconciled it.
    Navigation,
}

/// Result of a successful [`ComponentState::set_active`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: ItemKey,
    pub current: ItemKey,
    /// Address carrying the new selection, derived from the cached location
    pub target: Location,
    pub origin: SelectionOrigin,
}

impl Transition {
    /// Only user-driven transitions ask the host to navigate; a reconciliation
    /// already reflects a navigation that happened.
    pub fn requests_navigation(&self) -> bool {
        self.origin == SelectionOrigin::User
    }

    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Outcome of reconciling one instance against a navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The event carried no value for this instance.
    Untouched,
    /// The event selected a known item (possibly the one already active).
    Selected(Transition),
    /// The event carried a value that is not one of the instance's items.
    Rejected { raw: String },
}

/// Private state of one mounted component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentState {
    id: InstanceId,
    active_key: ItemKey,
    items: Vec<ItemSpec>,
    passthrough: Option<Value>,
    current_location: Location,
    notify_on_change: bool,
}

impl ComponentState {
    /// Builds the state for a freshly mounted instance.
    ///
    /// The initial selection is the key decoded from `location` when it names
    /// one of the items, otherwise the first item.
    pub fn new(id: InstanceId, options: RegisterOptions, location: Location) -> Result<Self, StateError> {
        validate_items(&id, &options.initial_items)?;
        let active_key = codec::decode_valid(&id, &location, &options.initial_items)
            .unwrap_or_else(|| options.initial_items[0].key.clone());
        Ok(Self {
            id,
            active_key,
            items: options.initial_items,
            passthrough: options.passthrough,
            current_location: location,
            notify_on_change: options.notify_on_change,
        })
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn active_key(&self) -> &ItemKey {
        &self.active_key
    }

    pub fn items(&self) -> &[ItemSpec] {
        &self.items
    }

    pub fn passthrough(&self) -> Option<&Value> {
        self.passthrough.as_ref()
    }

    pub fn current_location(&self) -> &Location {
        &self.current_location
    }

    pub fn notify_on_change(&self) -> bool {
        self.notify_on_change
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.iter().any(|item| &item.key == key)
    }

    /// The currently active item. Always present by construction.
    pub fn active_item(&self) -> &ItemSpec {
        self.items
            .iter()
            .find(|item| item.key == self.active_key)
            .unwrap_or(&self.items[0])
    }

    /// Address that would select `key`, based on the cached location.
    pub fn location_for(&self, key: &ItemKey) -> Location {
        codec::encode(&self.id, key, &self.current_location)
    }

    /// Validates `key` against the current items and returns the address that
    /// selects it without changing any state.
    pub fn target_for(&self, key: &ItemKey) -> Result<Location, StateError> {
        if !self.contains(key) {
            return Err(StateError::invalid_key(self.id.as_str(), key.as_str()));
        }
        Ok(self.location_for(key))
    }

    /// The single funnel for selection changes.
    pub fn set_active(&mut self, key: &ItemKey, origin: SelectionOrigin) -> Result<Transition, StateError> {
        let target = self.target_for(key)?;
        let previous = std::mem::replace(&mut self.active_key, key.clone());
        debug!(
            instance_id = %self.id,
            from = %previous,
            to = %key,
            origin = ?origin,
            "selection transition"
        );
        Ok(Transition {
            previous,
            current: key.clone(),
            target,
            origin,
        })
    }

    /// Replaces the item list supplied by the host on render.
    ///
    /// When the active key no longer names an item the selection falls back
    /// to the first item.
    pub fn set_items(&mut self, items: Vec<ItemSpec>) -> Result<(), StateError> {
        validate_items(&self.id, &items)?;
        self.items = items;
        if !self.contains(&self.active_key) {
            let fallback = self.items[0].key.clone();
            debug!(
                instance_id = %self.id,
                stale = %self.active_key,
                fallback = %fallback,
                "active key no longer present; falling back to first item"
            );
            self.active_key = fallback;
        }
        Ok(())
    }

    pub fn set_passthrough(&mut self, passthrough: Option<Value>) {
        self.passthrough = passthrough;
    }

    /// Applies one external navigation to this instance only.
    ///
    /// The cached location is refreshed unconditionally. The selection moves
    /// only when the event carries a value for this instance's parameter and
    /// that value names a known item.
    pub fn reconcile(&mut self, event: &NavigationEvent) -> ReconcileOutcome {
        self.current_location = event.location.clone();

        let Some(raw) = event.params.get(self.id.as_str()) else {
            return ReconcileOutcome::Untouched;
        };
        let decoded = codec::decode_param(&self.id, &event.params).filter(|key| self.contains(key));
        let Some(key) = decoded else {
            warn!(
                instance_id = %self.id,
                value = %raw,
                "ignoring navigation value that names no item"
            );
            return ReconcileOutcome::Rejected { raw: raw.clone() };
        };

        match self.set_active(&key, SelectionOrigin::Navigation) {
            Ok(transition) => ReconcileOutcome::Selected(transition),
            Err(_) => ReconcileOutcome::Rejected { raw: raw.clone() },
        }
    }
}

fn validate_items(id: &InstanceId, items: &[ItemSpec]) -> Result<(), StateError> {
    if items.is_empty() {
        return Err(StateError::EmptyItems { id: id.to_string() });
    }
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(&item.key) {
            return Err(StateError::DuplicateKey {
                id: id.to_string(),
                key: item.key.to_string(),
            });
        }
    }
    Ok(())
}
