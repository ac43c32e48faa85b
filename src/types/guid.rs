// ABOUTME: Phantom-typed GUIDs for cloud controller resources.
// ABOUTME: Prevents accidental swapping of application, organization, and space GUIDs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Empty enums prevent instantiation and require no trait bounds.
pub enum AppMarker {}
pub enum OrgMarker {}
pub enum SpaceMarker {}

/// A type-safe resource GUID.
///
/// Every cloud controller resource is addressed by GUID. The phantom parameter
/// keeps an application GUID from being passed where a space GUID is expected,
/// catching the mixup at compile time instead of as a 404 at runtime.
#[must_use = "GUIDs reference remote resources and should not be ignored"]
pub struct Guid<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Guid<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

// Manual trait implementations that don't require T to implement the trait.
// T is only a phantom marker and never carries data.

impl<T> std::fmt::Debug for Guid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guid").field("value", &self.value).finish()
    }
}

impl<T> Clone for Guid<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Guid<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Guid<T> {}

impl<T> Hash for Guid<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> std::fmt::Display for Guid<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Guid<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Guid<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

pub type AppGuid = Guid<AppMarker>;
pub type OrgGuid = Guid<OrgMarker>;
pub type SpaceGuid = Guid<SpaceMarker>;
