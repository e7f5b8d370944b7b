//! Outward notification channel.
//!
//! Hosts subscribe handlers by message shape. Publishing a message with no
//! subscriber is not an error: the message is dropped.

use std::collections::HashMap;
use std::fmt;

use querystate_types::{NoticeKind, SelectionChanged};
use tracing::debug;

/// Callback invoked for each delivered selection notice.
pub type NoticeHandler = Box<dyn FnMut(&SelectionChanged) + Send>;

#[derive(Default)]
pub struct MessageBus {
    handlers: HashMap<NoticeKind, Vec<NoticeHandler>>,
}

impl fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(kind, list)| (*kind, list.len())).collect();
        f.debug_struct("MessageBus").field("handlers", &counts).finish()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for messages of `kind`. Handlers run in subscription order.
    pub fn subscribe(&mut self, kind: NoticeKind, handler: NoticeHandler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Delivers `notice` to every handler subscribed to its shape and returns
    /// how many handlers ran.
    pub fn deliver(&mut self, notice: &SelectionChanged) -> usize {
        let Some(handlers) = self.handlers.get_mut(&NoticeKind::SelectionChanged) else {
            debug!(
                instance_id = %notice.instance_id,
                active_key = %notice.active_key,
                "no subscriber for selection notice; dropping"
            );
            return 0;
        };
        for handler in handlers.iter_mut() {
            handler(notice);
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querystate_types::{InstanceId, ItemKey};
    use std::sync::{Arc, Mutex};

    fn notice() -> SelectionChanged {
        SelectionChanged {
            instance_id: InstanceId::new("tabs_1").expect("id"),
            active_key: ItemKey::new("address").expect("key"),
        }
    }

    #[test]
    fn delivery_without_subscribers_drops_message() {
        let mut bus = MessageBus::new();
        assert_eq!(bus.deliver(&notice()), 0);
    }

    #[test]
    fn every_subscriber_receives_the_notice() {
        let mut bus = MessageBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(
                NoticeKind::SelectionChanged,
                Box::new(move |notice| seen.lock().expect("lock").push((tag, notice.active_key.to_string()))),
            );
        }
        assert_eq!(bus.deliver(&notice()), 2);
        let seen = seen.lock().expect("lock");
        assert_eq!(*seen, vec![("first", "address".to_string()), ("second", "address".to_string())]);
    }
}
