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

//! Client helpers for the bucket metadata engine.
//!
//! This crate contains the error model, the retry and backoff policies, the
//! retry loop, and the paginator used by the `bucket-admin` client. The types
//! are independent of Cloud Storage and may be reused by other request /
//! response clients.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all functions wrapping requests.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The core error types used by the clients.
pub mod error;

/// Defines some types and traits to convert and use List requests as a Stream.
pub mod paginator;

pub mod backoff_policy;
pub mod client_builder;
pub mod exponential_backoff;
pub mod options;
pub mod retry_policy;
pub mod retry_result;
pub mod retry_state;

#[doc(hidden)]
pub mod retry_loop_internal;
