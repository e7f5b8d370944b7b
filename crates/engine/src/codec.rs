//! Parameter codec: maps an instance's active key to and from the host's
//! shared query-parameter space.
//!
//! The instance id is the parameter name and the key's string form is the
//! value. Encoding only ever touches that one parameter.

use indexmap::IndexMap;
use querystate_types::{InstanceId, ItemKey, ItemSpec, Location};

/// Returns `current` with the parameter named `id` set to `key`.
///
/// The path, the fragment and every other parameter are preserved verbatim.
/// Applying the same key twice yields the same address.
pub fn encode(id: &InstanceId, key: &ItemKey, current: &Location) -> Location {
    current.with_param(id.as_str(), key.as_str())
}

/// Reads the parameter named `id` from `location` and parses it as a key.
///
/// Returns `None` when the parameter is absent or empty.
pub fn decode(id: &InstanceId, location: &Location) -> Option<ItemKey> {
    location.param(id.as_str()).and_then(|raw| raw.parse().ok())
}

/// Like [`decode`], but reads from already-decoded navigation parameters.
pub fn decode_param(id: &InstanceId, params: &IndexMap<String, String>) -> Option<ItemKey> {
    params.get(id.as_str()).and_then(|raw| raw.parse().ok())
}

/// Decodes the key for `id` and accepts it only if it names one of `items`.
///
/// External input never selects an unknown item: anything that fails
/// validation decodes to `None`.
pub fn decode_valid(id: &InstanceId, location: &Location, items: &[ItemSpec]) -> Option<ItemKey> {
    decode(id, location).filter(|key| items.iter().any(|item| &item.key == key))
}
