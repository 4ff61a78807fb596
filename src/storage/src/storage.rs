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

pub(crate) mod acl;
pub(crate) mod buckets;
pub(crate) mod client;
pub(crate) mod iam;
pub(crate) mod notifications;
pub(crate) mod perform_request;
pub(crate) mod retention;
pub(crate) mod sub_resource;

use crate::error::RequestError;
use crate::{Error, Result};

/// Implements the option traits for a request builder.
///
/// The builder must have a `common` field of type
/// [RequestCommon][perform_request::RequestCommon].
macro_rules! request_builder {
    ($type:ident) => {
        crate::storage::request_builder!(@impl [] $type);
    };
    ($type:ident<$param:ident>) => {
        crate::storage::request_builder!(@impl [$param] $type<$param>);
    };
    (@impl [$($param:ident)?] $type:ty) => {
        impl<$($param)?> gax::options::internal::RequestBuilder for $type {
            fn request_options(&mut self) -> &mut gax::options::RequestOptions {
                &mut self.common.options
            }
        }

        impl<$($param)?> crate::precondition::internal::PreconditionsHolder for $type {
            fn preconditions(&mut self) -> &mut crate::precondition::Preconditions {
                &mut self.common.preconditions
            }
        }

        impl<$($param)?> $type {
            /// Bills the request to this project, for buckets with
            /// requester pays enabled.
            pub fn with_user_project<V: Into<String>>(mut self, v: V) -> Self {
                self.common.user_project = Some(v.into());
                self
            }

            /// Restricts the response to a subset of the fields.
            ///
            /// The value uses the [partial response] syntax, e.g.
            /// `name,metageneration`.
            ///
            /// [partial response]: https://cloud.google.com/storage/docs/json_api#partial-response
            pub fn with_fields<V: Into<String>>(mut self, v: V) -> Self {
                self.common.fields = Some(v.into());
                self
            }
        }
    };
}
pub(crate) use request_builder;

/// The set of characters that are percent encoded.
///
/// This set is defined at https://cloud.google.com/storage/docs/request-endpoints#encoding:
///
/// Encode the following characters: `!`, `#`, `$`, `&`, `'`, `(`, `)`, `*`,
/// `+`, `,`, `/`, `:`, `;`, `=`, `?`, `@`, `[`, `]`, and space characters.
///
/// In addition, the `%` character and the characters that are never valid in
/// a URL are encoded.
const ENCODED_CHARS: percent_encoding::AsciiSet = percent_encoding::CONTROLS
    .add(b'!')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'*')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'=')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b']')
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent encode a string.
///
/// Used for path segments (bucket names, ACL entities, notification ids) and
/// for query parameter keys and values.
pub(crate) fn enc(value: &str) -> String {
    percent_encoding::utf8_percent_encode(value, &ENCODED_CHARS).to_string()
}

const BUCKET_PREFIX: &str = "projects/_/buckets/";

/// Returns the bucket id from a bucket name.
///
/// Buckets may be named by their id, e.g. `my-bucket`, or by their full
/// resource name, e.g. `projects/_/buckets/my-bucket`.
pub(crate) fn bucket_id(name: &str) -> Result<&str> {
    let id = name.strip_prefix(BUCKET_PREFIX).unwrap_or(name);
    if id.is_empty() {
        return Err(Error::binding(RequestError::EmptyBucketName));
    }
    Ok(id)
}

/// The path for a bucket, e.g. `/b/my-bucket`.
pub(crate) fn bucket_path(name: &str) -> Result<String> {
    bucket_id(name).map(|id| format!("/b/{}", enc(id)))
}
