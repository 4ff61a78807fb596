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

//! Preconditions on the generation, metageneration and etag of a resource.
//!
//! Preconditions make a request conditional on the current state of the
//! resource in the service. They are the building block for safe
//! read-modify-write cycles: read the resource, compute a change, and write
//! it back only if the resource did not change in between.
//!
//! Generation and metageneration preconditions are sent as query parameters,
//! the etag precondition is sent as an `If-Match` header. A request that
//! carries any "match" precondition is idempotent: retrying it cannot apply
//! the change twice.

use crate::Error;
use crate::error::PreconditionError;
use crate::model::{Etag, Generation, Metageneration};
use crate::transport::HttpRequest;

/// The set of preconditions attached to a request.
///
/// # Example
/// ```
/// # use bucket_admin::precondition::Preconditions;
/// let preconditions = Preconditions::new().set_if_metageneration_match(7);
/// assert!(preconditions.has_match());
/// assert!(preconditions.validate().is_ok());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct Preconditions {
    pub if_generation_match: Option<Generation>,
    pub if_generation_not_match: Option<Generation>,
    pub if_metageneration_match: Option<Metageneration>,
    pub if_metageneration_not_match: Option<Metageneration>,
    pub if_etag_match: Option<Etag>,
}

impl Preconditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_if_generation_match<T: Into<Generation>>(mut self, v: T) -> Self {
        self.if_generation_match = Some(v.into());
        self
    }

    pub fn set_if_generation_not_match<T: Into<Generation>>(mut self, v: T) -> Self {
        self.if_generation_not_match = Some(v.into());
        self
    }

    pub fn set_if_metageneration_match<T: Into<Metageneration>>(mut self, v: T) -> Self {
        self.if_metageneration_match = Some(v.into());
        self
    }

    pub fn set_if_metageneration_not_match<T: Into<Metageneration>>(mut self, v: T) -> Self {
        self.if_metageneration_not_match = Some(v.into());
        self
    }

    pub fn set_if_etag_match<T: Into<Etag>>(mut self, v: T) -> Self {
        self.if_etag_match = Some(v.into());
        self
    }

    /// Returns true if any "match" precondition is set.
    pub fn has_match(&self) -> bool {
        self.if_generation_match.is_some()
            || self.if_metageneration_match.is_some()
            || self.if_etag_match.is_some()
    }

    /// Rejects contradictory preconditions.
    pub fn validate(&self) -> Result<(), PreconditionError> {
        if self.if_generation_match.is_some() && self.if_generation_not_match.is_some() {
            return Err(PreconditionError::ConflictingGeneration);
        }
        if self.if_metageneration_match.is_some() && self.if_metageneration_not_match.is_some() {
            return Err(PreconditionError::ConflictingMetageneration);
        }
        Ok(())
    }

    /// Adds the preconditions to an HTTP request.
    pub(crate) fn apply(&self, request: HttpRequest) -> crate::Result<HttpRequest> {
        let request = self
            .if_generation_match
            .iter()
            .fold(request, |r, v| r.with_query("ifGenerationMatch", v.as_str()));
        let request = self
            .if_generation_not_match
            .iter()
            .fold(request, |r, v| r.with_query("ifGenerationNotMatch", v.as_str()));
        let request = self
            .if_metageneration_match
            .iter()
            .fold(request, |r, v| r.with_query("ifMetagenerationMatch", v.as_str()));
        let request = self
            .if_metageneration_not_match
            .iter()
            .fold(request, |r, v| {
                r.with_query("ifMetagenerationNotMatch", v.as_str())
            });
        match &self.if_etag_match {
            None => Ok(request),
            Some(etag) => {
                let value = http::HeaderValue::from_str(etag.as_str()).map_err(Error::binding)?;
                Ok(request.with_header(http::header::IF_MATCH, value))
            }
        }
    }
}

/// Add preconditions to a request builder.
///
/// This trait is implemented by all the request builders that accept
/// preconditions.
///
/// # Example
/// ```
/// # use bucket_admin::client::Storage;
/// # async fn sample(client: &Storage) -> anyhow::Result<()> {
/// use bucket_admin::builder::storage::PreconditionsBuilder;
/// client
///     .delete_bucket("my-bucket")
///     .with_if_metageneration_match(7)
///     .send()
///     .await?;
/// # Ok(()) }
/// ```
pub trait PreconditionsBuilder: internal::PreconditionsHolder {
    /// Makes the request conditional on the current generation.
    fn with_if_generation_match<T: Into<Generation>>(mut self, v: T) -> Self {
        self.preconditions().if_generation_match = Some(v.into());
        self
    }

    /// Makes the request conditional on the generation not matching.
    fn with_if_generation_not_match<T: Into<Generation>>(mut self, v: T) -> Self {
        self.preconditions().if_generation_not_match = Some(v.into());
        self
    }

    /// Makes the request conditional on the current metageneration.
    fn with_if_metageneration_match<T: Into<Metageneration>>(mut self, v: T) -> Self {
        self.preconditions().if_metageneration_match = Some(v.into());
        self
    }

    /// Makes the request conditional on the metageneration not matching.
    ///
    /// On reads, the service responds with `304 Not Modified` if the
    /// metageneration matches. The client reports this as a failed
    /// precondition.
    fn with_if_metageneration_not_match<T: Into<Metageneration>>(mut self, v: T) -> Self {
        self.preconditions().if_metageneration_not_match = Some(v.into());
        self
    }

    /// Makes the request conditional on the current etag.
    fn with_if_etag_match<T: Into<Etag>>(mut self, v: T) -> Self {
        self.preconditions().if_etag_match = Some(v.into());
        self
    }

    /// Replaces all the preconditions.
    fn with_preconditions(mut self, v: Preconditions) -> Self {
        *self.preconditions() = v;
        self
    }
}

impl<T: internal::PreconditionsHolder> PreconditionsBuilder for T {}

#[doc(hidden)]
pub mod internal {
    //! Implementation details. Not part of the public API.

    pub trait PreconditionsHolder: Sized {
        fn preconditions(&mut self) -> &mut super::Preconditions;
    }
}
