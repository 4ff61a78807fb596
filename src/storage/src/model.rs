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

//! The resource model for bucket metadata.
//!
//! Buckets carry many optional fields. Each one is a [Field], which can be
//! unset, set, or cleared. Clients manipulate snapshots of this state: a copy
//! of the bucket metadata as last received from the service (the "original")
//! and a modified copy (the "desired" state). The [patch][crate::patch]
//! module computes the minimal update between the two.
//!
//! The generation, metageneration and etag of a resource are opaque tokens.
//! They can be compared for equality and used in preconditions, but they
//! carry no ordering.

mod field;
pub use field::Field;

use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, DisplayFromStr, serde_as, skip_serializing_none};
use std::collections::{BTreeMap, BTreeSet};

macro_rules! opaque_token {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new token from its wire representation.
            pub fn new<T: Into<String>>(v: T) -> Self {
                Self(v.into())
            }

            /// The wire representation of the token.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_token!(
    /// The generation of a resource.
    ///
    /// On the wire this is an `int64` formatted as a decimal string.
    Generation
);

opaque_token!(
    /// The metadata generation of a resource.
    ///
    /// The service increments the metageneration each time the metadata
    /// changes. Applications should only compare metagenerations for
    /// equality.
    Metageneration
);

opaque_token!(
    /// The HTTP entity tag of a resource.
    Etag
);

impl From<i64> for Generation {
    fn from(value: i64) -> Self {
        Self::new(value.to_string())
    }
}

impl From<i64> for Metageneration {
    fn from(value: i64) -> Self {
        Self::new(value.to_string())
    }
}

// Generates consuming setters. Fields listed as `clearable` also get a
// function to mark the field as `Cleared`.
macro_rules! field_setters {
    ($type:ident {
        $($setter:ident => $field:ident: $value:ty;)*
    } clearable {
        $($csetter:ident, $clearer:ident => $cfield:ident: $cvalue:ty;)*
    }) => {
        impl $type {
            $(
                #[doc = concat!("Sets the value of [", stringify!($field), "][", stringify!($type), "::", stringify!($field), "].")]
                pub fn $setter<T: Into<$value>>(mut self, v: T) -> Self {
                    self.$field = Field::Set(v.into());
                    self
                }
            )*
            $(
                #[doc = concat!("Sets the value of [", stringify!($cfield), "][", stringify!($type), "::", stringify!($cfield), "].")]
                pub fn $csetter<T: Into<$cvalue>>(mut self, v: T) -> Self {
                    self.$cfield = Field::Set(v.into());
                    self
                }

                #[doc = concat!("Clears [", stringify!($cfield), "][", stringify!($type), "::", stringify!($cfield), "].")]
                pub fn $clearer(mut self) -> Self {
                    self.$cfield = Field::Cleared;
                    self
                }
            )*
        }
    };
}

/// The metadata for a bucket.
///
/// # Example
/// ```
/// # use bucket_admin::model::Bucket;
/// let desired = Bucket::new()
///     .set_name("my-bucket")
///     .set_storage_class("COLDLINE")
///     .clear_website();
/// assert!(desired.website.is_cleared());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Bucket {
    /// Access controls on the bucket.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub acl: Field<Vec<BucketAccessControl>>,

    /// The Autoclass configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub autoclass: Field<Autoclass>,

    /// The billing configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub billing: Field<Billing>,

    /// The Cross-Origin Resource Sharing (CORS) configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub cors: Field<Vec<Cors>>,

    /// The default value for event-based hold on newly created objects.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default_event_based_hold: Field<bool>,

    /// Default access controls to apply to new objects.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub default_object_acl: Field<Vec<ObjectAccessControl>>,

    /// Encryption configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub encryption: Field<Encryption>,

    /// HTTP 1.1 entity tag for the bucket.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub etag: Field<Etag>,

    /// The generation of the bucket, set by the service.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub generation: Field<Generation>,

    /// The IAM configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub iam_configuration: Field<IamConfiguration>,

    /// The ID of the bucket, same as the name.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,

    /// The kind of item this is, always `storage#bucket`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub kind: Field<String>,

    /// User-provided labels, in key/value pairs.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub labels: Field<BTreeMap<String, String>>,

    /// The bucket's lifecycle configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub lifecycle: Field<Lifecycle>,

    /// The location of the bucket. Immutable.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub location: Field<String>,

    /// The type of location, e.g. `region` or `multi-region`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub location_type: Field<String>,

    /// The bucket's logging configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub logging: Field<Logging>,

    /// The metadata generation of the bucket.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub metageneration: Field<Metageneration>,

    /// The name of the bucket. Immutable after creation.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,

    /// The owner of the bucket.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub owner: Field<Owner>,

    /// The project number of the project the bucket belongs to.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub project_number: Field<String>,

    /// The bucket's retention policy.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub retention_policy: Field<RetentionPolicy>,

    /// The recovery point objective for cross-region replication.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub rpo: Field<String>,

    /// The URI of this bucket.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub self_link: Field<String>,

    /// The default storage class for new objects.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub storage_class: Field<String>,

    /// The creation time, in RFC 3339 format.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub time_created: Field<String>,

    /// The modification time, in RFC 3339 format.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated: Field<String>,

    /// The bucket's versioning configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub versioning: Field<Versioning>,

    /// The bucket's website configuration.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub website: Field<Website>,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }
}

field_setters!(Bucket {
    set_etag => etag: Etag;
    set_generation => generation: Generation;
    set_id => id: String;
    set_kind => kind: String;
    set_location => location: String;
    set_location_type => location_type: String;
    set_metageneration => metageneration: Metageneration;
    set_name => name: String;
    set_owner => owner: Owner;
    set_project_number => project_number: String;
    set_self_link => self_link: String;
    set_time_created => time_created: String;
    set_updated => updated: String;
} clearable {
    set_acl, clear_acl => acl: Vec<BucketAccessControl>;
    set_autoclass, clear_autoclass => autoclass: Autoclass;
    set_billing, clear_billing => billing: Billing;
    set_cors, clear_cors => cors: Vec<Cors>;
    set_default_event_based_hold, clear_default_event_based_hold => default_event_based_hold: bool;
    set_default_object_acl, clear_default_object_acl => default_object_acl: Vec<ObjectAccessControl>;
    set_encryption, clear_encryption => encryption: Encryption;
    set_iam_configuration, clear_iam_configuration => iam_configuration: IamConfiguration;
    set_labels, clear_labels => labels: BTreeMap<String, String>;
    set_lifecycle, clear_lifecycle => lifecycle: Lifecycle;
    set_logging, clear_logging => logging: Logging;
    set_retention_policy, clear_retention_policy => retention_policy: RetentionPolicy;
    set_rpo, clear_rpo => rpo: String;
    set_storage_class, clear_storage_class => storage_class: String;
    set_versioning, clear_versioning => versioning: Versioning;
    set_website, clear_website => website: Website;
});

/// The Autoclass configuration for a bucket.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Autoclass {
    #[serde(default)]
    pub enabled: bool,
    pub toggle_time: Option<String>,
    pub terminal_storage_class: Option<String>,
}

impl Autoclass {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }
}

/// The billing configuration for a bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Billing {
    /// When set to true, Requester Pays is enabled for this bucket.
    #[serde(default)]
    pub requester_pays: bool,
}

impl Billing {
    pub fn new(requester_pays: bool) -> Self {
        Self { requester_pays }
    }
}

/// A Cross-Origin Resource Sharing (CORS) entry.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Cors {
    pub max_age_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub origin: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_header: Vec<String>,
}

impl Cors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_max_age_seconds(mut self, v: i32) -> Self {
        self.max_age_seconds = Some(v);
        self
    }

    pub fn set_method<I, V>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.method = v.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_origin<I, V>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.origin = v.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_response_header<I, V>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.response_header = v.into_iter().map(Into::into).collect();
        self
    }
}

/// The encryption configuration for a bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Encryption {
    /// The Cloud KMS key used to encrypt objects inserted into this bucket.
    #[serde(default)]
    pub default_kms_key_name: String,
}

impl Encryption {
    pub fn new<T: Into<String>>(default_kms_key_name: T) -> Self {
        Self {
            default_kms_key_name: default_kms_key_name.into(),
        }
    }
}

/// The IAM configuration for a bucket.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct IamConfiguration {
    pub uniform_bucket_level_access: Option<UniformBucketLevelAccess>,
    /// One of `inherited` or `enforced`.
    pub public_access_prevention: Option<String>,
}

/// Configures uniform bucket-level access.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct UniformBucketLevelAccess {
    #[serde(default)]
    pub enabled: bool,
    pub locked_time: Option<String>,
}

impl IamConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_uniform_bucket_level_access(mut self, enabled: bool) -> Self {
        self.uniform_bucket_level_access = Some(UniformBucketLevelAccess {
            enabled,
            locked_time: None,
        });
        self
    }

    pub fn set_public_access_prevention<T: Into<String>>(mut self, v: T) -> Self {
        self.public_access_prevention = Some(v.into());
        self
    }
}

/// The lifecycle configuration for a bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Lifecycle {
    #[serde(default)]
    pub rule: Vec<LifecycleRule>,
}

impl Lifecycle {
    pub fn new<I: IntoIterator<Item = LifecycleRule>>(rules: I) -> Self {
        Self {
            rule: rules.into_iter().collect(),
        }
    }
}

/// A lifecycle rule: an action and the conditions that trigger it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LifecycleRule {
    pub action: LifecycleAction,
    #[serde(default)]
    pub condition: LifecycleCondition,
}

impl LifecycleRule {
    pub fn new(action: LifecycleAction, condition: LifecycleCondition) -> Self {
        Self { action, condition }
    }
}

/// The action taken by a lifecycle rule.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LifecycleAction {
    /// One of `Delete`, `SetStorageClass`, or `AbortIncompleteMultipartUpload`.
    #[serde(rename = "type")]
    pub action_type: String,
    /// The target storage class, only for `SetStorageClass`.
    pub storage_class: Option<String>,
}

impl LifecycleAction {
    pub fn delete() -> Self {
        Self {
            action_type: "Delete".into(),
            storage_class: None,
        }
    }

    pub fn set_storage_class<T: Into<String>>(storage_class: T) -> Self {
        Self {
            action_type: "SetStorageClass".into(),
            storage_class: Some(storage_class.into()),
        }
    }
}

/// The conditions that trigger a lifecycle action.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct LifecycleCondition {
    pub age: Option<i32>,
    pub created_before: Option<String>,
    pub custom_time_before: Option<String>,
    pub days_since_custom_time: Option<i32>,
    pub days_since_noncurrent_time: Option<i32>,
    pub is_live: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches_prefix: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches_storage_class: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches_suffix: Vec<String>,
    pub noncurrent_time_before: Option<String>,
    pub num_newer_versions: Option<i32>,
}

impl LifecycleCondition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_age(mut self, v: i32) -> Self {
        self.age = Some(v);
        self
    }

    pub fn set_is_live(mut self, v: bool) -> Self {
        self.is_live = Some(v);
        self
    }

    pub fn set_num_newer_versions(mut self, v: i32) -> Self {
        self.num_newer_versions = Some(v);
        self
    }

    pub fn set_matches_storage_class<I, V>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.matches_storage_class = v.into_iter().map(Into::into).collect();
        self
    }
}

/// The logging configuration for a bucket.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Logging {
    #[serde(default)]
    pub log_bucket: String,
    pub log_object_prefix: Option<String>,
}

impl Logging {
    pub fn new<T: Into<String>>(log_bucket: T) -> Self {
        Self {
            log_bucket: log_bucket.into(),
            log_object_prefix: None,
        }
    }

    pub fn set_log_object_prefix<T: Into<String>>(mut self, v: T) -> Self {
        self.log_object_prefix = Some(v.into());
        self
    }
}

/// The owner of a bucket.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Owner {
    #[serde(default)]
    pub entity: String,
    pub entity_id: Option<String>,
}

/// The retention policy for a bucket.
///
/// Once locked, the retention policy cannot be removed and the retention
/// period cannot be reduced.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct RetentionPolicy {
    /// The retention period, in seconds.
    #[serde_as(as = "DisplayFromStr")]
    pub retention_period: i64,
    /// The time from which the policy was enforced, in RFC 3339 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<String>,
    /// Set by the service once the policy is locked.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_locked: bool,
}

impl RetentionPolicy {
    pub fn new(retention_period: i64) -> Self {
        Self {
            retention_period,
            ..Default::default()
        }
    }
}

/// The versioning configuration for a bucket.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Versioning {
    #[serde(default)]
    pub enabled: bool,
}

impl Versioning {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// The website configuration for a bucket.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct Website {
    pub main_page_suffix: Option<String>,
    pub not_found_page: Option<String>,
}

impl Website {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_main_page_suffix<T: Into<String>>(mut self, v: T) -> Self {
        self.main_page_suffix = Some(v.into());
        self
    }

    pub fn set_not_found_page<T: Into<String>>(mut self, v: T) -> Self {
        self.not_found_page = Some(v.into());
        self
    }
}

/// The project team associated with an ACL entity.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ProjectTeam {
    pub project_number: Option<String>,
    /// One of `editors`, `owners`, or `viewers`.
    pub team: Option<String>,
}

/// An access control entry on a bucket.
///
/// Only `entity` and `role` can be set by the application, all other fields
/// are assigned by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct BucketAccessControl {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub bucket: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub domain: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub email: Field<String>,
    /// The entity holding the permission, e.g. `user-liz@example.com` or
    /// `allAuthenticatedUsers`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub entity: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub entity_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub etag: Field<Etag>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub kind: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub project_team: Field<ProjectTeam>,
    /// The access permission for the entity: `OWNER`, `WRITER` or `READER`.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub role: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub self_link: Field<String>,
}

impl BucketAccessControl {
    /// Creates an entry with only the client-settable fields.
    pub fn new<E: Into<String>, R: Into<String>>(entity: E, role: R) -> Self {
        Self {
            entity: Field::Set(entity.into()),
            role: Field::Set(role.into()),
            ..Default::default()
        }
    }
}

field_setters!(BucketAccessControl {
    set_bucket => bucket: String;
    set_domain => domain: String;
    set_email => email: String;
    set_entity => entity: String;
    set_entity_id => entity_id: String;
    set_etag => etag: Etag;
    set_id => id: String;
    set_kind => kind: String;
    set_project_team => project_team: ProjectTeam;
    set_self_link => self_link: String;
} clearable {
    set_role, clear_role => role: String;
});

/// An access control entry on an object, used for default object ACLs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ObjectAccessControl {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub bucket: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub domain: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub email: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub entity: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub entity_id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub etag: Field<Etag>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub generation: Field<Generation>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub kind: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub object: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub project_team: Field<ProjectTeam>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub role: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub self_link: Field<String>,
}

impl ObjectAccessControl {
    /// Creates an entry with only the client-settable fields.
    pub fn new<E: Into<String>, R: Into<String>>(entity: E, role: R) -> Self {
        Self {
            entity: Field::Set(entity.into()),
            role: Field::Set(role.into()),
            ..Default::default()
        }
    }
}

field_setters!(ObjectAccessControl {
    set_bucket => bucket: String;
    set_domain => domain: String;
    set_email => email: String;
    set_entity => entity: String;
    set_entity_id => entity_id: String;
    set_etag => etag: Etag;
    set_generation => generation: Generation;
    set_id => id: String;
    set_kind => kind: String;
    set_object => object: String;
    set_project_team => project_team: ProjectTeam;
    set_self_link => self_link: String;
} clearable {
    set_role, clear_role => role: String;
});

/// A Pub/Sub notification configuration on a bucket.
///
/// Notification configurations cannot be changed once created. Applications
/// must delete and recreate them instead.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct NotificationConfig {
    /// The service-assigned identifier.
    pub id: Option<String>,
    /// The Pub/Sub topic, in `//pubsub.googleapis.com/projects/{project}/topics/{topic}` format.
    #[serde(default)]
    pub topic: String,
    /// One of `JSON_API_V1` or `NONE`.
    pub payload_format: Option<String>,
    /// If not empty, only send notifications for these event types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_types: Vec<String>,
    /// Attributes included in every notification.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_attributes: BTreeMap<String, String>,
    /// If set, only send notifications for objects with this prefix.
    pub object_name_prefix: Option<String>,
    pub etag: Option<Etag>,
    #[serde(rename = "selfLink")]
    pub self_link: Option<String>,
    pub kind: Option<String>,
}

impl NotificationConfig {
    pub fn new<T: Into<String>>(topic: T) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn set_id<T: Into<String>>(mut self, v: T) -> Self {
        self.id = Some(v.into());
        self
    }

    pub fn set_payload_format<T: Into<String>>(mut self, v: T) -> Self {
        self.payload_format = Some(v.into());
        self
    }

    pub fn set_event_types<I, V>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.event_types = v.into_iter().map(Into::into).collect();
        self
    }

    pub fn set_custom_attributes<I, K, V>(mut self, v: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.custom_attributes = v.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    pub fn set_object_name_prefix<T: Into<String>>(mut self, v: T) -> Self {
        self.object_name_prefix = Some(v.into());
        self
    }
}

/// The role that must keep at least one member in any bucket IAM policy.
pub const LEGACY_BUCKET_OWNER_ROLE: &str = "roles/storage.legacyBucketOwner";

/// The IAM policy of a bucket.
///
/// Bindings are represented as a map from role to the set of members. On the
/// wire they are a list of `{"role": ..., "members": [...]}` objects.
///
/// # Example
/// ```
/// # use bucket_admin::model::IamPolicy;
/// let mut policy = IamPolicy::default();
/// policy.add_member("roles/storage.objectViewer", "user:liz@example.com");
/// assert!(policy.has_member("roles/storage.objectViewer", "user:liz@example.com"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "wire::IamPolicy", into = "wire::IamPolicy")]
#[non_exhaustive]
pub struct IamPolicy {
    pub version: i32,
    pub bindings: BTreeMap<String, BTreeSet<String>>,
    /// The policy etag, required to write the policy back.
    pub etag: Option<Etag>,
    pub resource_id: Option<String>,
}

impl IamPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_etag<T: Into<Etag>>(mut self, v: T) -> Self {
        self.etag = Some(v.into());
        self
    }

    pub fn set_version(mut self, v: i32) -> Self {
        self.version = v;
        self
    }

    /// Adds a member to a role, returns true if the member was not present.
    pub fn add_member<R: Into<String>, M: Into<String>>(&mut self, role: R, member: M) -> bool {
        self.bindings
            .entry(role.into())
            .or_default()
            .insert(member.into())
    }

    /// Removes a member from a role, returns true if the member was present.
    ///
    /// Roles without members are removed from the policy.
    pub fn remove_member(&mut self, role: &str, member: &str) -> bool {
        let Some(members) = self.bindings.get_mut(role) else {
            return false;
        };
        let removed = members.remove(member);
        if members.is_empty() {
            self.bindings.remove(role);
        }
        removed
    }

    /// Returns true if `member` is bound to `role`.
    pub fn has_member(&self, role: &str, member: &str) -> bool {
        self.bindings
            .get(role)
            .is_some_and(|members| members.contains(member))
    }

    /// Returns true if some member is bound to the legacy bucket owner role.
    pub fn has_legacy_bucket_owner(&self) -> bool {
        self.bindings
            .get(LEGACY_BUCKET_OWNER_ROLE)
            .is_some_and(|members| !members.is_empty())
    }
}

mod wire {
    use super::{Deserialize, Etag, Serialize, skip_serializing_none};

    #[skip_serializing_none]
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct IamPolicy {
        pub kind: Option<String>,
        pub resource_id: Option<String>,
        #[serde(default)]
        pub version: i32,
        #[serde(default)]
        pub bindings: Vec<Binding>,
        pub etag: Option<Etag>,
    }

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct Binding {
        pub role: String,
        #[serde(default)]
        pub members: Vec<String>,
    }

    impl From<IamPolicy> for super::IamPolicy {
        fn from(value: IamPolicy) -> Self {
            let mut bindings = super::BTreeMap::<String, super::BTreeSet<String>>::new();
            for b in value.bindings {
                bindings.entry(b.role).or_default().extend(b.members);
            }
            bindings.retain(|_, members| !members.is_empty());
            Self {
                version: value.version,
                bindings,
                etag: value.etag,
                resource_id: value.resource_id,
            }
        }
    }

    impl From<super::IamPolicy> for IamPolicy {
        fn from(value: super::IamPolicy) -> Self {
            let bindings = value
                .bindings
                .into_iter()
                .filter(|(_, members)| !members.is_empty())
                .map(|(role, members)| Binding {
                    role,
                    members: members.into_iter().collect(),
                })
                .collect();
            Self {
                kind: Some("storage#policy".to_string()),
                resource_id: value.resource_id,
                version: value.version,
                bindings,
                etag: value.etag,
            }
        }
    }
}

/// A page of buckets.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ListBucketsResponse {
    #[serde(default)]
    #[serde_as(as = "DefaultOnNull")]
    pub items: Vec<Bucket>,
    /// The token to fetch the next page, empty on the last page.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    #[serde_as(as = "DefaultOnNull")]
    pub next_page_token: String,
}

impl gax::paginator::PageableResponse for ListBucketsResponse {
    type PageItem = Bucket;

    fn items(self) -> Vec<Bucket> {
        self.items
    }

    fn next_page_token(&self) -> String {
        self.next_page_token.clone()
    }
}

/// The response for list requests of sub-resources, which are not paginated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct ListItems<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

impl<T> Default for ListItems<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

/// The response for [Storage::test_bucket_iam_permissions][crate::client::Storage::test_bucket_iam_permissions].
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct TestIamPermissionsResponse {
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Controls which fields are returned by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Projection {
    /// Omit `acl` and `defaultObjectAcl`.
    NoAcl,
    /// Include all fields.
    Full,
}

impl Projection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAcl => "noAcl",
            Self::Full => "full",
        }
    }
}

/// A predefined set of access controls for a bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PredefinedAcl {
    AuthenticatedRead,
    Private,
    ProjectPrivate,
    PublicRead,
    PublicReadWrite,
}

impl PredefinedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticatedRead => "authenticatedRead",
            Self::Private => "private",
            Self::ProjectPrivate => "projectPrivate",
            Self::PublicRead => "publicRead",
            Self::PublicReadWrite => "publicReadWrite",
        }
    }
}

/// A predefined set of default access controls for new objects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum PredefinedObjectAcl {
    AuthenticatedRead,
    BucketOwnerFullControl,
    BucketOwnerRead,
    Private,
    ProjectPrivate,
    PublicRead,
}

impl PredefinedObjectAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticatedRead => "authenticatedRead",
            Self::BucketOwnerFullControl => "bucketOwnerFullControl",
            Self::BucketOwnerRead => "bucketOwnerRead",
            Self::Private => "private",
            Self::ProjectPrivate => "projectPrivate",
            Self::PublicRead => "publicRead",
        }
    }
}
