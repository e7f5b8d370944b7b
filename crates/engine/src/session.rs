//! Host-session context.
//!
//! A [`Session`] owns everything a host page needs to run any number of
//! component instances side by side: the instance registry, the effect queue
//! for the current processing cycle, the outward message bus and the host's
//! current address. Events are handled one at a time; effects produced while
//! handling an event are returned by [`Session::drain_effects`] once the
//! handler is done.

use querystate_types::{
    ContentRef, Effect, InstanceId, ItemKey, ItemSpec, Location, Msg, NavigationEvent, NoticeKind, RegisterOptions,
    SelectionChanged,
};
use querystate_util::SessionConfig;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::effects::EffectQueue;
use crate::error::StateError;
use crate::notify::{MessageBus, NoticeHandler};
use crate::registry::InstanceRegistry;
use crate::state::{ComponentState, SelectionOrigin};
use crate::sync::{Reconciliation, reconcile_all};

/// One selectable entry as the host should display it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabView {
    pub key: ItemKey,
    pub label: String,
    pub active: bool,
    /// Address that selects this entry
    pub href: Location,
}

/// Everything the host needs to draw one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderView {
    pub instance_id: InstanceId,
    pub active_key: ItemKey,
    pub tabs: Vec<TabView>,
    /// Content of the active entry
    pub content: ContentRef,
    /// Host value relayed unchanged to the active child
    pub passthrough: Option<Value>,
}

impl RenderView {
    fn from_state(state: &ComponentState) -> Self {
        let tabs = state
            .items()
            .iter()
            .map(|item| TabView {
                key: item.key.clone(),
                label: item.label.clone(),
                active: &item.key == state.active_key(),
                href: state.location_for(&item.key),
            })
            .collect();
        Self {
            instance_id: state.id().clone(),
            active_key: state.active_key().clone(),
            tabs,
            content: state.active_item().content.clone(),
            passthrough: state.passthrough().cloned(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    location: Location,
    registry: InstanceRegistry,
    effects: EffectQueue,
    bus: MessageBus,
    clear_param_on_unmount: bool,
}

impl Session {
    /// Creates a session whose host currently sits on `location`.
    pub fn new(location: Location) -> Self {
        Self {
            location,
            registry: InstanceRegistry::new(),
            effects: EffectQueue::new(),
            bus: MessageBus::new(),
            clear_param_on_unmount: false,
        }
    }

    pub fn with_config(config: &SessionConfig) -> Self {
        let mut session = Self::new(config.initial_location.clone());
        session.clear_param_on_unmount = config.clear_param_on_unmount;
        session
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn state(&self, id: &str) -> Result<&ComponentState, StateError> {
        self.registry.get(id)
    }

    /// Mounts an instance. Repeated mounts of the same id are no-ops.
    pub fn register(&mut self, id: InstanceId, options: RegisterOptions) -> Result<bool, StateError> {
        self.registry.register(id, options, &self.location)
    }

    /// Unmounts an instance and discards its state.
    pub fn unregister(&mut self, id: &str) -> Result<(), StateError> {
        let state = self.registry.unregister(id)?;
        if self.clear_param_on_unmount && state.current_location().param(id).is_some() {
            self.effects.request_navigation(state.current_location().without_param(id));
        }
        Ok(())
    }

    /// Applies the host's render inputs and returns the view to draw.
    ///
    /// The active key is re-validated against the freshly supplied items.
    pub fn render(&mut self, id: &str, items: Vec<ItemSpec>, passthrough: Option<Value>) -> Result<RenderView, StateError> {
        let state = self.registry.get_mut(id)?;
        state.set_items(items)?;
        state.set_passthrough(passthrough);
        Ok(RenderView::from_state(state))
    }

    /// Current view of an instance without changing it.
    pub fn view(&self, id: &str) -> Result<RenderView, StateError> {
        self.registry.get(id).map(RenderView::from_state)
    }

    /// User interaction: select `key` inside instance `id`.
    ///
    /// On success the new address is queued for navigation and, when the
    /// instance opted in, a [`SelectionChanged`] notice is queued.
    pub fn select(&mut self, id: &str, key: &ItemKey) -> Result<(), StateError> {
        let state = self.registry.get_mut(id)?;
        let transition = state.set_active(key, SelectionOrigin::User)?;
        let notify = state.notify_on_change();
        let instance_id = state.id().clone();

        if transition.requests_navigation() {
            self.effects.request_navigation(transition.target);
        }
        if notify {
            self.effects.push_notice(SelectionChanged {
                instance_id,
                active_key: transition.current,
            });
        }
        Ok(())
    }

    /// Host control: ask instance `id` to show `key`.
    ///
    /// Only a navigation is queued; the selection itself changes when that
    /// navigation comes back through [`Session::on_navigation`].
    pub fn command_select(&mut self, id: &str, key: &ItemKey) -> Result<(), StateError> {
        let target = self.registry.get(id)?.target_for(key)?;
        debug!(instance_id = %id, key = %key, target = %target, "host commanded selection");
        self.effects.request_navigation(target);
        Ok(())
    }

    /// Synchronization hook: call once per completed external navigation.
    pub fn on_navigation(&mut self, event: &NavigationEvent) -> Vec<Reconciliation> {
        self.location = event.location.clone();
        reconcile_all(&mut self.registry, event)
    }

    /// Handles one host event. Effects stay queued until drained.
    pub fn handle(&mut self, msg: Msg) -> Result<(), StateError> {
        match msg {
            Msg::Mount { id, options } => self.register(id, options).map(|_| ()),
            Msg::Render { id, items, passthrough } => self.render(id.as_str(), items, passthrough).map(|_| ()),
            Msg::Select { id, key } => self.select(id.as_str(), &key),
            Msg::Command { id, key } => self.command_select(id.as_str(), &key),
            Msg::Navigated(event) => {
                self.on_navigation(&event);
                Ok(())
            }
            Msg::Unmount { id } => self.unregister(id.as_str()),
        }
    }

    /// Handles one host event and ends the cycle, returning its effects.
    ///
    /// Effects queued before a failing event are still returned by the next
    /// drain; a failure never discards them.
    pub fn update(&mut self, msg: Msg) -> Result<Vec<Effect>, StateError> {
        self.handle(msg)?;
        Ok(self.drain_effects())
    }

    /// Ends the current processing cycle.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        self.effects.drain()
    }

    pub fn subscribe(&mut self, kind: NoticeKind, handler: NoticeHandler) {
        info!(kind = ?kind, "notice handler subscribed");
        self.bus.subscribe(kind, handler);
    }

    /// Hands a drained notice to its subscribers; returns how many ran.
    pub fn dispatch_notice(&mut self, notice: &SelectionChanged) -> usize {
        self.bus.deliver(notice)
    }
}
