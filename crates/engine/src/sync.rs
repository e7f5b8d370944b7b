//! Synchronization hook run once per external navigation.

use querystate_types::{InstanceId, NavigationEvent};
use tracing::debug;

use crate::registry::InstanceRegistry;
use crate::state::ReconcileOutcome;

/// Reconciliation of one instance during a navigation event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub instance_id: InstanceId,
    pub outcome: ReconcileOutcome,
}

/// Reconciles every registered instance against `event`.
///
/// Instances are visited in registration order and each one only reads its
/// own parameter, so exactly one reconciliation happens per instance and
/// none of them can observe another's state.
pub fn reconcile_all(registry: &mut InstanceRegistry, event: &NavigationEvent) -> Vec<Reconciliation> {
    let reconciliations: Vec<_> = registry
        .iter_mut()
        .map(|state| Reconciliation {
            instance_id: state.id().clone(),
            outcome: state.reconcile(event),
        })
        .collect();
    let moved = reconciliations
        .iter()
        .filter(|entry| matches!(&entry.outcome, ReconcileOutcome::Selected(transition) if transition.changed()))
        .count();
    debug!(
        location = %event.location,
        instance_count = reconciliations.len(),
        moved,
        "navigation reconciled"
    );
    reconciliations
}
