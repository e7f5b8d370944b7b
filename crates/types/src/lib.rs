//! Shared type definitions for querystate.
//!
//! These are plain data types exchanged between the engine, the host runtime
//! and the command-line driver. Behavior lives in `querystate-engine`.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub mod location;

pub use location::{Location, LocationError};

/// Errors raised when constructing identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("instance id must not be empty")]
    EmptyInstanceId,
    #[error("item key must not be empty")]
    EmptyItemKey,
}

/// Identifier of one mounted component instance.
///
/// Doubles as the registry key and as the name of the query parameter that
/// carries the instance's active selection. Uniqueness among co-mounted
/// instances is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::EmptyInstanceId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for InstanceId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<InstanceId> for String {
    fn from(value: InstanceId) -> Self {
        value.0
    }
}

impl FromStr for InstanceId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Borrow<str> for InstanceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of one child item. Its `Display` form is what travels in the query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Result<Self, IdentifierError> {
        let key = key.into();
        if key.is_empty() {
            return Err(IdentifierError::EmptyItemKey);
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemKey {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemKey> for String {
    fn from(value: ItemKey) -> Self {
        value.0
    }
}

impl FromStr for ItemKey {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Borrow<str> for ItemKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque reference to a child item's content (a template name, a route, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(pub String);

/// One child item of a component: a tab, a wizard step, a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    /// Unique key within one component state
    pub key: ItemKey,
    /// Human-friendly label shown by the host
    pub label: String,
    /// Reference to the content rendered when this item is active
    pub content: ContentRef,
}

impl ItemSpec {
    pub fn new(key: ItemKey, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            content: ContentRef(content.into()),
        }
    }
}

/// Options supplied by the host when it mounts an instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterOptions {
    /// Whether user-driven selection changes are broadcast to the host
    #[serde(default)]
    pub notify_on_change: bool,
    /// Items available at mount time
    #[serde(default)]
    pub initial_items: Vec<ItemSpec>,
    /// Host-owned value relayed to the active child
    #[serde(default)]
    pub passthrough: Option<Value>,
}

/// An external navigation observed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEvent {
    /// Address the host ended up on
    pub location: Location,
    /// Decoded query parameters of the navigation
    pub params: IndexMap<String, String>,
}

impl NavigationEvent {
    /// Builds the event for a completed navigation to `location`.
    pub fn from_location(location: Location) -> Self {
        let params = location.params();
        Self { location, params }
    }
}

/// Outward message emitted when a user changes an instance's selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChanged {
    pub instance_id: InstanceId,
    pub active_key: ItemKey,
}

/// Discriminant used by hosts to subscribe to outward messages by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    SelectionChanged,
}

/// Events the host delivers to a session, one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Mount an instance before its first render
    Mount { id: InstanceId, options: RegisterOptions },
    /// Render an instance with a fresh item list
    Render {
        id: InstanceId,
        items: Vec<ItemSpec>,
        passthrough: Option<Value>,
    },
    /// A user picked an item inside the component
    Select { id: InstanceId, key: ItemKey },
    /// Host code commands an instance to change its selection
    Command { id: InstanceId, key: ItemKey },
    /// The host finished an external navigation
    Navigated(NavigationEvent),
    /// Unmount an instance and discard its state
    Unmount { id: InstanceId },
}

/// Side effects queued while handling a `Msg` and performed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the host to navigate to the given address
    Navigate(Location),
    /// Deliver an outward selection notice
    Notify(SelectionChanged),
}
