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

//! Bucket metadata management for Cloud Storage.
//!
//! This crate manages the configuration of Cloud Storage buckets: the bucket
//! resource itself, its access control lists, its default object access
//! control lists, its Pub/Sub notification configurations, its IAM policy,
//! and its retention policy lock. Most applications will use the
//! [Storage][client::Storage] client defined in the [client] module.
//!
//! Updates may be expressed as partial changes computed from two versions of
//! a resource, see [patch]. Any update may be made conditional on the
//! generation, metageneration, or etag of the resource, see [precondition].
//!
//! # Example
//! ```
//! # use bucket_admin::client::Storage;
//! # use bucket_admin::model::Field;
//! # async fn sample(client: &Storage) -> anyhow::Result<()> {
//! use bucket_admin::builder::storage::PreconditionsBuilder;
//! let original = client.get_bucket("my-bucket").send().await?;
//! let mut desired = original.clone();
//! desired.storage_class = Field::Set("COLDLINE".into());
//! let mut builder = client.patch_bucket("my-bucket", original.clone(), desired);
//! if let Some(m) = original.metageneration.as_option() {
//!     builder = builder.with_if_metageneration_match(m.clone());
//! }
//! let updated = builder.send().await?;
//! println!("updated bucket {updated:?}");
//! # Ok(()) }
//! ```

pub use gax::Result;
pub use gax::error::Error;

pub mod backoff_policy;
pub mod error;
pub mod iam_occ;
pub mod model;
pub mod patch;
pub mod precondition;
pub mod retry_policy;
pub mod transport;

mod storage;

/// Clients to interact with Cloud Storage bucket metadata.
pub mod client {
    pub use crate::storage::client::{PreconditionPolicy, Storage};
}

/// Request builders.
pub mod builder {
    pub mod storage {
        pub use crate::precondition::PreconditionsBuilder;
        pub use crate::storage::acl::*;
        pub use crate::storage::buckets::*;
        pub use crate::storage::client::ClientBuilder;
        pub use crate::storage::iam::*;
        pub use crate::storage::notifications::*;
        pub use crate::storage::retention::*;
        pub use crate::storage::sub_resource::*;
        pub use gax::options::RequestOptionsBuilder;
    }
}
