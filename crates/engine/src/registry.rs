//! Instance registry: one [`ComponentState`] per mounted instance id.
//!
//! Entries are kept in registration order so that every pass over the
//! registry (reconciliation in particular) is deterministic.

use indexmap::IndexMap;
use querystate_types::{InstanceId, Location, RegisterOptions};
use tracing::{debug, info};

use crate::error::StateError;
use crate::state::ComponentState;

#[derive(Debug, Default, Clone)]
pub struct InstanceRegistry {
    entries: IndexMap<InstanceId, ComponentState>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the entry for `id` if it does not exist yet.
    ///
    /// Re-registering an existing id leaves its state untouched, since hosts
    /// repeat the mount call whenever they re-render. Returns whether a new
    /// entry was created.
    pub fn register(&mut self, id: InstanceId, options: RegisterOptions, location: &Location) -> Result<bool, StateError> {
        if self.entries.contains_key(&id) {
            debug!(instance_id = %id, "instance already registered; ignoring");
            return Ok(false);
        }
        let state = ComponentState::new(id.clone(), options, location.clone())?;
        info!(
            instance_id = %id,
            active_key = %state.active_key(),
            item_count = state.items().len(),
            "instance registered"
        );
        self.entries.insert(id, state);
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Result<&ComponentState, StateError> {
        self.entries.get(id).ok_or_else(|| StateError::not_found(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut ComponentState, StateError> {
        self.entries.get_mut(id).ok_or_else(|| StateError::not_found(id))
    }

    /// Removes and returns the state for `id`.
    pub fn unregister(&mut self, id: &str) -> Result<ComponentState, StateError> {
        let state = self.entries.shift_remove(id).ok_or_else(|| StateError::not_found(id))?;
        info!(instance_id = %id, "instance unregistered");
        Ok(state)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &InstanceId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentState> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ComponentState> {
        self.entries.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querystate_types::{ItemKey, ItemSpec};

    fn options(keys: &[&str]) -> RegisterOptions {
        RegisterOptions {
            notify_on_change: false,
            initial_items: keys
                .iter()
                .map(|raw| ItemSpec::new(ItemKey::new(*raw).expect("key"), *raw, *raw))
                .collect(),
            passthrough: None,
        }
    }

    #[test]
    fn get_before_register_is_not_found() {
        let registry = InstanceRegistry::new();
        assert_eq!(registry.get("tabs_1").unwrap_err(), StateError::NotFound { id: "tabs_1".into() });
    }

    #[test]
    fn second_register_is_a_no_op() {
        let mut registry = InstanceRegistry::new();
        let id = InstanceId::new("tabs_1").expect("id");
        let location = Location::new("/");
        assert!(registry.register(id.clone(), options(&["name", "address"]), &location).expect("register"));
        let before = registry.get("tabs_1").expect("state").clone();

        let again = registry
            .register(id, options(&["other"]), &Location::parse("/?tabs_1=other").expect("parse"))
            .expect("register");
        assert!(!again);
        assert_eq!(registry.get("tabs_1").expect("state"), &before);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_register_leaves_no_entry() {
        let mut registry = InstanceRegistry::new();
        let result = registry.register(InstanceId::new("tabs_1").expect("id"), options(&[]), &Location::new("/"));
        assert!(result.is_err());
        assert!(!registry.contains("tabs_1"));
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = InstanceRegistry::new();
        for raw in ["b", "a", "c"] {
            registry
                .register(InstanceId::new(raw).expect("id"), options(&["x"]), &Location::new("/"))
                .expect("register");
        }
        registry.unregister("a").expect("unregister");
        let ids: Vec<_> = registry.ids().map(InstanceId::as_str).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(registry.unregister("a").is_err());
    }
}
