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

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A metadata field that may be unset, set to a value, or explicitly cleared.
///
/// Bucket metadata distinguishes between "this field has no opinion" and
/// "this field must be removed". The first is [Field::Unset]: the field is
/// omitted from requests and left unchanged by patches. The second is
/// [Field::Cleared]: the field is sent as `null`, and a patch removes it from
/// the resource.
///
/// On the wire a missing key decodes as `Unset`, a `null` decodes as
/// `Cleared`, and any other value decodes as `Set`. Containing structs must
/// annotate the field with `#[serde(default, skip_serializing_if = "Field::is_unset")]`.
///
/// # Example
/// ```
/// # use bucket_admin::model::Field;
/// let storage_class: Field<String> = Field::Set("COLDLINE".into());
/// assert_eq!(storage_class.as_option().map(String::as_str), Some("COLDLINE"));
/// assert!(Field::<String>::Cleared.is_cleared());
/// assert!(Field::<String>::default().is_unset());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Field<T> {
    /// No value, and no intent to change the value.
    Unset,
    /// The field has a value.
    Set(T),
    /// The field must be removed.
    Cleared,
}

impl<T> Field<T> {
    /// Returns true for [Field::Unset].
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    /// Returns true for [Field::Set].
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Returns true for [Field::Cleared].
    pub fn is_cleared(&self) -> bool {
        matches!(self, Self::Cleared)
    }

    /// The value, if any.
    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            Self::Unset | Self::Cleared => None,
        }
    }

    /// Consumes the field, returning the value, if any.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Set(v) => Some(v),
            Self::Unset | Self::Cleared => None,
        }
    }

    /// Changes the field to [Field::Set].
    pub fn set<V: Into<T>>(&mut self, v: V) {
        *self = Self::Set(v.into());
    }

    /// Changes the field to [Field::Cleared].
    pub fn clear(&mut self) {
        *self = Self::Cleared;
    }

    /// Changes the field to [Field::Unset], returning the previous value.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::Unset)
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Self::Set).unwrap_or(Self::Unset)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Set(v) => serializer.serialize_some(v),
            // `Unset` fields are skipped by the containing struct, if they
            // are not we send them as `null`, same as `Cleared`.
            Self::Unset | Self::Cleared => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<T>::deserialize(deserializer)?;
        Ok(value.map(Self::Set).unwrap_or(Self::Cleared))
    }
}
