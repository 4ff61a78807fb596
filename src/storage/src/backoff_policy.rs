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

//! The default backoff policy for the bucket metadata client.

use gax::{backoff_policy::BackoffPolicy, exponential_backoff::ExponentialBackoffBuilder};
use std::time::Duration;

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAXIMUM_DELAY: Duration = Duration::from_secs(60);
const SCALING: f64 = 2.0;

/// The default backoff policy for the Storage clients.
///
/// The service recommends exponential backoff with jitter, starting with a one
/// second backoff and doubling on each attempt, up to one minute.
pub(crate) fn default() -> impl BackoffPolicy {
    ExponentialBackoffBuilder::new()
        .with_initial_delay(INITIAL_DELAY)
        .with_maximum_delay(MAXIMUM_DELAY)
        .with_scaling(SCALING)
        .clamp()
}
