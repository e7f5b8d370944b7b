//! Component state synchronization for host applications that keep UI
//! selections in their query string.
//!
//! The crate is organized leaves first:
//! - [`codec`]: active key <-> query parameter
//! - [`state`]: per-instance state and the selection state machine
//! - [`registry`]: keyed store of instance states
//! - [`sync`]: reconciliation of external navigations
//! - [`notify`] and [`effects`]: outward notices and queued navigation
//! - [`session`]: the host-session context tying them together

pub mod codec;
pub mod effects;
pub mod error;
pub mod notify;
pub mod registry;
pub mod session;
pub mod state;
pub mod sync;

pub use effects::EffectQueue;
pub use error::StateError;
pub use notify::{MessageBus, NoticeHandler};
pub use registry::InstanceRegistry;
pub use session::{RenderView, Session, TabView};
pub use state::{ComponentState, ReconcileOutcome, SelectionOrigin, Transition};
pub use sync::{Reconciliation, reconcile_all};
