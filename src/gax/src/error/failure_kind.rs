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

use super::rpc::Code;

/// A coarse classification of errors.
///
/// Applications that implement their own recovery strategies typically need
/// to distinguish "the resource does not exist" from "somebody else changed
/// the resource" from "the service is having problems". This type captures
/// those distinctions without requiring applications to inspect HTTP status
/// codes or [Code] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum FailureKind {
    /// The resource, or its container, does not exist.
    NotFound,
    /// A generation, metageneration, or etag precondition did not hold.
    PreconditionFailed,
    /// A concurrent modification was detected, e.g. an IAM policy etag mismatch.
    Conflict,
    /// The request was malformed, or rejected locally before it was sent.
    InvalidArgument,
    /// The caller lacks permission, or could not be authenticated.
    PermissionDenied,
    /// A network problem, a timeout, or a server-side error.
    Transient,
    /// The caller cancelled the request.
    Cancelled,
    /// The retry policy stopped retrying a transient error.
    RetriesExhausted,
    /// Anything else, including problems (de)serializing payloads.
    Other,
}

impl FailureKind {
    pub(crate) fn from_http_status(code: u16) -> Self {
        match code {
            304 | 412 => Self::PreconditionFailed,
            400 => Self::InvalidArgument,
            401 | 403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::Conflict,
            408 | 429 | 500..600 => Self::Transient,
            _ => Self::Other,
        }
    }

    pub(crate) fn from_code(code: Code) -> Self {
        match code {
            Code::NotFound => Self::NotFound,
            Code::FailedPrecondition => Self::PreconditionFailed,
            Code::Aborted | Code::AlreadyExists => Self::Conflict,
            Code::InvalidArgument | Code::OutOfRange => Self::InvalidArgument,
            Code::PermissionDenied | Code::Unauthenticated => Self::PermissionDenied,
            Code::Unavailable
            | Code::Internal
            | Code::DeadlineExceeded
            | Code::ResourceExhausted => Self::Transient,
            Code::Cancelled => Self::Cancelled,
            _ => Self::Other,
        }
    }
}
