// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compute partial updates between two snapshots of a resource.
//!
//! Patch requests carry a [PatchDocument]: a JSON object with one key for
//! each field that changes. A key mapped to `null` removes the field, keys
//! not present in the document leave the field unchanged.
//!
//! [diff] computes the minimal document that turns one snapshot into
//! another. For every patchable field of the desired snapshot:
//! - an unset field is omitted,
//! - a cleared field is always included as `null`,
//! - a field with a value is included only if it differs from the original.
//!
//! Composite fields, such as `labels`, `cors`, or `lifecycle`, are compared
//! and replaced as a whole.
//!
//! # Example
//! ```
//! # use bucket_admin::model::Bucket;
//! # use bucket_admin::patch::diff;
//! # fn sample() -> anyhow::Result<()> {
//! let original = Bucket::new().set_name("b1").set_storage_class("STANDARD");
//! let desired = original.clone().set_storage_class("COLDLINE").clear_website();
//! let patch = diff(&original, &desired)?;
//! assert_eq!(
//!     patch.into_value(),
//!     serde_json::json!({"storageClass": "COLDLINE", "website": null})
//! );
//! # Ok(()) }
//! ```

use crate::error::RequestError;
use crate::model::{Bucket, BucketAccessControl, Field, NotificationConfig, ObjectAccessControl};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Resources that support partial updates.
pub trait Patchable: Serialize + DeserializeOwned + Default {
    /// The wire names of the fields that may appear in a patch.
    const PATCHABLE_FIELDS: &'static [&'static str];
}

impl Patchable for Bucket {
    const PATCHABLE_FIELDS: &'static [&'static str] = &[
        "acl",
        "autoclass",
        "billing",
        "cors",
        "defaultEventBasedHold",
        "defaultObjectAcl",
        "encryption",
        "iamConfiguration",
        "labels",
        "lifecycle",
        "logging",
        "retentionPolicy",
        "rpo",
        "storageClass",
        "versioning",
        "website",
    ];
}

// The entity is the address of an entry, only the role can change.
impl Patchable for BucketAccessControl {
    const PATCHABLE_FIELDS: &'static [&'static str] = &["role"];
}

impl Patchable for ObjectAccessControl {
    const PATCHABLE_FIELDS: &'static [&'static str] = &["role"];
}

impl Patchable for NotificationConfig {
    const PATCHABLE_FIELDS: &'static [&'static str] = &[];
}

/// The body of a patch request.
///
/// Keys are the wire names of the fields, values are the new value of the
/// field, or `null` to remove the field.
///
/// # Example
/// ```
/// # use bucket_admin::patch::PatchDocument;
/// # fn sample() -> anyhow::Result<()> {
/// let patch = PatchDocument::new()
///     .set("storageClass", "NEARLINE")?
///     .clear("website");
/// assert_eq!(patch.len(), 2);
/// # Ok(()) }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PatchDocument(Map<String, Value>);

impl PatchDocument {
    /// Creates an empty document. An empty document is still sent, so any
    /// preconditions attached to the request are still checked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the minimal document to turn `original` into `desired`.
    pub fn diff<T: Patchable>(original: &T, desired: &T) -> Result<Self> {
        let original = to_map(original)?;
        let mut desired = to_map(desired)?;
        let mut patch = Map::new();
        for name in T::PATCHABLE_FIELDS {
            match desired.remove(*name) {
                // `Unset` fields are not serialized.
                None => {}
                Some(Value::Null) => {
                    patch.insert(name.to_string(), Value::Null);
                }
                Some(v) if original.get(*name) == Some(&v) => {}
                Some(v) => {
                    patch.insert(name.to_string(), v);
                }
            }
        }
        Ok(Self(patch))
    }

    /// Computes the document for a desired state, without an original.
    ///
    /// Every patchable field set in `desired` is included, and every cleared
    /// field is included as `null`.
    pub fn from_desired<T: Patchable>(desired: &T) -> Result<Self> {
        Self::diff(&T::default(), desired)
    }

    /// Returns the state resulting from applying this patch to `state`.
    ///
    /// The service applies patches the same way: each key in the document
    /// replaces the corresponding field, `null` values remove the field.
    pub fn apply_to<T: Patchable>(&self, state: &T) -> Result<T> {
        let mut map = to_map(state)?;
        for (k, v) in &self.0 {
            map.insert(k.clone(), v.clone());
        }
        serde_json::from_value(Value::Object(map)).map_err(Error::deser)
    }

    /// Sets a field to a new value.
    pub fn set<K, V>(mut self, key: K, value: V) -> Result<Self>
    where
        K: Into<String>,
        V: Serialize,
    {
        let value = serde_json::to_value(value).map_err(Error::ser)?;
        self.0.insert(key.into(), value);
        Ok(self)
    }

    /// Removes a field.
    pub fn clear<K: Into<String>>(mut self, key: K) -> Self {
        self.0.insert(key.into(), Value::Null);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Computes the minimal [PatchDocument] to turn `original` into `desired`.
///
/// `diff(s, s)` is always empty.
pub fn diff<T: Patchable>(original: &T, desired: &T) -> Result<PatchDocument> {
    PatchDocument::diff(original, desired)
}

fn to_map<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).map_err(Error::ser)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::ser(format!("expected a JSON object, got {other}"))),
    }
}

/// Rejects bucket patches the service would refuse.
///
/// Bucket names are immutable, and a locked retention policy can only grow.
pub(crate) fn validate_bucket_patch(
    original: &Bucket,
    desired: &Bucket,
) -> std::result::Result<(), RequestError> {
    if let Field::Set(name) = &original.name {
        match &desired.name {
            Field::Unset => {}
            Field::Set(d) if d == name => {}
            other => {
                return Err(RequestError::BucketRename {
                    original: name.clone(),
                    desired: other.as_option().cloned(),
                });
            }
        }
    }
    let locked = match &original.retention_policy {
        Field::Set(p) if p.is_locked => p,
        _ => return Ok(()),
    };
    match &desired.retention_policy {
        Field::Unset => Ok(()),
        Field::Cleared => Err(RequestError::LockedRetentionPolicyRemoved),
        Field::Set(p) if !p.is_locked => Err(RequestError::LockedRetentionPolicyUnlocked),
        Field::Set(p) if p.retention_period < locked.retention_period => {
            Err(RequestError::LockedRetentionPeriodReduced {
                locked: locked.retention_period,
                desired: p.retention_period,
            })
        }
        Field::Set(_) => Ok(()),
    }
}
