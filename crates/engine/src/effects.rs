//! Effects queued during one processing cycle.
//!
//! A cycle ends when the host drains the queue. At most one navigation
//! survives a cycle: a later request replaces an earlier one (last write
//! wins). Notifications are kept in emission order.

use querystate_types::{Effect, Location, SelectionChanged};
use tracing::debug;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct EffectQueue {
    navigation: Option<Location>,
    notices: Vec<SelectionChanged>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a navigation request, replacing any request already queued in
    /// this cycle.
    pub fn request_navigation(&mut self, target: Location) {
        if let Some(superseded) = self.navigation.replace(target) {
            debug!(
                superseded = %superseded,
                winner = %self.navigation.as_ref().map(ToString::to_string).unwrap_or_default(),
                "navigation request superseded within cycle"
            );
        }
    }

    pub fn push_notice(&mut self, notice: SelectionChanged) {
        self.notices.push(notice);
    }

    /// Empties the queue: the navigation first, then notices in order.
    pub fn drain(&mut self) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(self.notices.len() + 1);
        if let Some(target) = self.navigation.take() {
            effects.push(Effect::Navigate(target));
        }
        effects.extend(self.notices.drain(..).map(Effect::Notify));
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use querystate_types::{InstanceId, ItemKey};

    #[test]
    fn last_navigation_request_wins() {
        let mut queue = EffectQueue::new();
        queue.request_navigation(Location::parse("/?a=1").expect("parse"));
        queue.request_navigation(Location::parse("/?b=2").expect("parse"));
        assert_eq!(queue.drain(), vec![Effect::Navigate(Location::parse("/?b=2").expect("parse"))]);
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn drain_orders_navigation_before_notices() {
        let mut queue = EffectQueue::new();
        let notice = SelectionChanged {
            instance_id: InstanceId::new("tabs_1").expect("id"),
            active_key: ItemKey::new("address").expect("key"),
        };
        queue.push_notice(notice.clone());
        queue.request_navigation(Location::parse("/?tabs_1=address").expect("parse"));
        let effects = queue.drain();
        assert!(matches!(effects[0], Effect::Navigate(_)));
        assert_eq!(effects[1], Effect::Notify(notice));
    }
}
