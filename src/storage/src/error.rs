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

//! Custom errors for the bucket metadata client.
//!
//! The client validates requests before sending them. Invalid requests fail
//! with an [Error][crate::Error] where `is_binding()` is true, and the
//! `source()` of that error is one of the types defined here.
//!
//! # Example
//! ```
//! # use bucket_admin::client::Storage;
//! # use bucket_admin::error::PreconditionError;
//! # async fn sample(client: &Storage) -> anyhow::Result<()> {
//! use bucket_admin::builder::storage::PreconditionsBuilder;
//! use std::error::Error as _;
//! let result = client
//!     .get_bucket("my-bucket")
//!     .with_if_metageneration_match(7)
//!     .with_if_metageneration_not_match(7)
//!     .send()
//!     .await;
//! match result {
//!     Err(e) if e.is_binding() => {
//!         let details = e.source().and_then(|s| s.downcast_ref::<PreconditionError>());
//!         println!("invalid preconditions {details:?}");
//!     }
//!     Err(e) => return Err(e.into()),
//!     Ok(bucket) => println!("bucket={bucket:?}"),
//! }
//! # Ok(()) }
//! ```

/// Invalid combinations of preconditions.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum PreconditionError {
    /// The request sets both `ifGenerationMatch` and `ifGenerationNotMatch`.
    #[error("cannot set both `ifGenerationMatch` and `ifGenerationNotMatch`")]
    ConflictingGeneration,

    /// The request sets both `ifMetagenerationMatch` and `ifMetagenerationNotMatch`.
    #[error("cannot set both `ifMetagenerationMatch` and `ifMetagenerationNotMatch`")]
    ConflictingMetageneration,

    /// The client is configured to require a match precondition on all
    /// updates and patches, and the request has none.
    #[error("the client requires a match precondition for updates and patches")]
    MissingMatchPrecondition,
}

/// Requests rejected by the client before they are sent.
#[derive(thiserror::Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum RequestError {
    /// Every bucket request needs a bucket name.
    #[error("the bucket name cannot be empty")]
    EmptyBucketName,

    /// Creating and listing buckets needs a project.
    #[error("the project cannot be empty")]
    EmptyProject,

    /// Bucket names are immutable.
    #[error("the bucket `{original}` cannot be renamed to {desired:?}")]
    BucketRename {
        original: String,
        desired: Option<String>,
    },

    /// A locked retention policy cannot be removed.
    #[error("the retention policy is locked and cannot be removed")]
    LockedRetentionPolicyRemoved,

    /// A locked retention policy cannot be unlocked.
    #[error("the retention policy is locked and cannot be unlocked")]
    LockedRetentionPolicyUnlocked,

    /// The retention period of a locked policy can only grow.
    #[error(
        "the retention policy is locked, its period cannot be reduced from {locked}s to {desired}s"
    )]
    LockedRetentionPeriodReduced { locked: i64, desired: i64 },

    /// The entry does not include the value used to address it.
    #[error("the {resource} entry must include a value for `{field}`")]
    MissingKey {
        resource: &'static str,
        field: &'static str,
    },

    /// The sub-resource cannot be changed once created.
    #[error("{0} entries are immutable, they cannot be updated or patched")]
    ImmutableResource(&'static str),

    /// Setting an IAM policy requires the etag of the policy it replaces.
    #[error("the IAM policy must include an etag")]
    MissingPolicyEtag,

    /// A bucket IAM policy must always keep a bucket owner.
    #[error("the IAM policy must keep at least one member in `{0}`")]
    MissingLegacyBucketOwner(&'static str),

    /// Testing permissions requires at least one permission.
    #[error("the list of permissions cannot be empty")]
    EmptyPermissions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let e = RequestError::BucketRename {
            original: "b1".into(),
            desired: Some("b2".into()),
        };
        assert_eq!(e.to_string(), "the bucket `b1` cannot be renamed to Some(\"b2\")");

        let e = RequestError::LockedRetentionPeriodReduced {
            locked: 3600,
            desired: 60,
        };
        assert!(e.to_string().contains("3600s to 60s"), "{e}");

        let e = RequestError::ImmutableResource("notification");
        assert!(e.to_string().starts_with("notification entries"), "{e}");

        let e = PreconditionError::ConflictingMetageneration;
        assert!(e.to_string().contains("ifMetagenerationNotMatch"), "{e}");
    }
}
