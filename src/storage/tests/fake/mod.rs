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

//! An in-memory implementation of the bucket metadata service.
//!
//! The fake implements just enough of the JSON API to exercise the client
//! end to end: buckets with metageneration preconditions, ACLs with etag
//! preconditions, notifications, IAM policies, and retention locks. Tests
//! may inject failures that are returned before the next request is
//! processed.

#![allow(dead_code)]

use bucket_admin::transport::{HttpRequest, HttpResponse, Transport};
use bucket_admin::{Error, Result};
use http::Method;
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const PROJECT: &str = "test-project";

/// Permissions the caller holds on every bucket.
pub const GRANTED: [&str; 2] = ["storage.buckets.get", "storage.buckets.update"];

/// A failure returned instead of processing a request.
#[derive(Clone, Copy, Debug)]
pub enum Fault {
    /// The request never left the client.
    Connect,
    /// The connection dropped after the request was sent.
    Io,
    /// The service returned this HTTP status code.
    Status(u16),
}

#[derive(Clone, Debug, Default)]
pub struct FakeService {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    buckets: BTreeMap<String, BucketState>,
    faults: VecDeque<Fault>,
    requests: Vec<HttpRequest>,
    etag_counter: u64,
}

#[derive(Debug, Default)]
struct BucketState {
    metadata: Map<String, Value>,
    metageneration: i64,
    acl: BTreeMap<String, Map<String, Value>>,
    default_object_acl: BTreeMap<String, Map<String, Value>>,
    notifications: BTreeMap<String, Map<String, Value>>,
    next_notification_id: u64,
    policy_bindings: Value,
    policy_etag: String,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bucket with the given metadata, as if created by another client.
    pub fn insert_bucket(&self, name: &str, metadata: Value) {
        let mut state = self.state.lock().unwrap();
        let mut bucket = BucketState::new(name, &mut state.etag_counter);
        if let Value::Object(fields) = metadata {
            bucket.metadata.extend(fields);
        }
        state.buckets.insert(name.to_string(), bucket);
    }

    /// The metadata of a bucket, as stored by the service.
    pub fn bucket(&self, name: &str) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state.buckets.get(name).map(|b| b.resource())
    }

    /// Changes the IAM policy of a bucket, as if changed by another client.
    pub fn touch_policy(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        let etag = next_etag(&mut state.etag_counter);
        if let Some(b) = state.buckets.get_mut(name) {
            b.policy_etag = etag;
        }
    }

    /// The next request fails with `fault`.
    pub fn inject(&self, fault: Fault) {
        self.state.lock().unwrap().faults.push_back(fault);
    }

    /// All the requests received, including those that failed.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// The body of the last request, as JSON.
    pub fn last_body(&self) -> Option<Value> {
        let state = self.state.lock().unwrap();
        state
            .requests
            .last()
            .and_then(|r| r.body.as_ref())
            .and_then(|b| serde_json::from_slice(b).ok())
    }
}

#[async_trait::async_trait]
impl Transport for FakeService {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        match state.faults.pop_front() {
            Some(Fault::Connect) => return Err(Error::connect("connection refused")),
            Some(Fault::Io) => return Err(Error::io("connection reset")),
            Some(Fault::Status(code)) => return Ok(error(code, "injected failure")),
            None => {}
        }
        Ok(state.handle(&request))
    }
}

impl State {
    fn handle(&mut self, request: &HttpRequest) -> HttpResponse {
        let segments = request
            .path
            .trim_start_matches('/')
            .split('/')
            .map(|s| percent_encoding::percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect::<Vec<_>>();
        let segments = segments.iter().map(String::as_str).collect::<Vec<_>>();
        let method = request.method.clone();
        match segments.as_slice() {
            ["b"] if method == Method::GET => self.list_buckets(request),
            ["b"] if method == Method::POST => self.create_bucket(request),
            ["b", name] => self.bucket_request(name, request),
            ["b", name, "lockRetentionPolicy"] if method == Method::POST => {
                self.lock_retention_policy(name, request)
            }
            ["b", name, "iam"] if method == Method::GET => self.get_policy(name),
            ["b", name, "iam"] if method == Method::PUT => self.set_policy(name, request),
            ["b", name, "iam", "testPermissions"] if method == Method::GET => {
                self.test_permissions(name, request)
            }
            ["b", name, "notificationConfigs"] => self.notifications(name, None, request),
            ["b", name, "notificationConfigs", id] => self.notifications(name, Some(*id), request),
            ["b", name, collection] => self.acl(name, collection, None, request),
            ["b", name, collection, entity] => self.acl(name, collection, Some(*entity), request),
            _ => error(404, "no such route"),
        }
    }

    fn list_buckets(&self, request: &HttpRequest) -> HttpResponse {
        if request.query_value("project") != Some(PROJECT) {
            return error(400, "invalid project");
        }
        let prefix = request.query_value("prefix").unwrap_or_default();
        let max_results = request
            .query_value("maxResults")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1000);
        let start = request.query_value("pageToken").unwrap_or_default();
        let mut names = self
            .buckets
            .keys()
            .filter(|n| n.starts_with(prefix) && n.as_str() >= start);
        let page = names.by_ref().take(max_results).collect::<Vec<_>>();
        let items = page
            .iter()
            .filter_map(|n| self.buckets.get(*n))
            .map(BucketState::resource)
            .collect::<Vec<_>>();
        let mut body = json!({"kind": "storage#buckets", "items": items});
        if let Some(next) = names.next() {
            body["nextPageToken"] = json!(next);
        }
        ok(body)
    }

    fn create_bucket(&mut self, request: &HttpRequest) -> HttpResponse {
        if request.query_value("project") != Some(PROJECT) {
            return error(400, "invalid project");
        }
        let Some(Value::Object(fields)) = body(request) else {
            return error(400, "missing bucket metadata");
        };
        let Some(name) = fields.get("name").and_then(Value::as_str).map(str::to_string) else {
            return error(400, "missing bucket name");
        };
        if self.buckets.contains_key(&name) {
            return error(409, "the bucket already exists");
        }
        let mut bucket = BucketState::new(&name, &mut self.etag_counter);
        bucket.metadata.extend(fields);
        let response = bucket.resource();
        self.buckets.insert(name, bucket);
        ok(response)
    }

    fn bucket_request(&mut self, name: &str, request: &HttpRequest) -> HttpResponse {
        let Some(bucket) = self.buckets.get_mut(name) else {
            return error(404, "the bucket does not exist");
        };
        if let Some(response) = bucket.check_preconditions(request) {
            return response;
        }
        match request.method {
            Method::GET => ok(bucket.resource()),
            Method::DELETE => {
                self.buckets.remove(name);
                HttpResponse::new(204)
            }
            Method::PUT => {
                let Some(Value::Object(fields)) = body(request) else {
                    return error(400, "missing bucket metadata");
                };
                bucket.metadata = fields.into_iter().filter(|(_, v)| !v.is_null()).collect();
                bucket.metadata.insert("name".into(), json!(name));
                bucket.bump();
                ok(bucket.resource())
            }
            Method::PATCH => {
                let Some(Value::Object(fields)) = body(request) else {
                    return error(400, "missing patch");
                };
                if bucket.is_locked() && fields.contains_key("retentionPolicy") {
                    return error(403, "the retention policy is locked");
                }
                for (k, v) in fields {
                    match v {
                        Value::Null => bucket.metadata.remove(&k),
                        v => bucket.metadata.insert(k, v),
                    };
                }
                bucket.bump();
                ok(bucket.resource())
            }
            _ => error(405, "method not allowed"),
        }
    }

    fn lock_retention_policy(&mut self, name: &str, request: &HttpRequest) -> HttpResponse {
        let Some(bucket) = self.buckets.get_mut(name) else {
            return error(404, "the bucket does not exist");
        };
        if request.query_value("ifMetagenerationMatch").is_none() {
            return error(400, "missing metageneration");
        }
        if let Some(response) = bucket.check_preconditions(request) {
            return response;
        }
        if bucket.is_locked() {
            return error(412, "the retention policy is already locked");
        }
        let Some(Value::Object(policy)) = bucket.metadata.get_mut("retentionPolicy") else {
            return error(400, "the bucket has no retention policy");
        };
        policy.insert("isLocked".into(), json!(true));
        bucket.bump();
        ok(bucket.resource())
    }

    fn get_policy(&self, name: &str) -> HttpResponse {
        match self.buckets.get(name) {
            None => error(404, "the bucket does not exist"),
            Some(b) => ok(b.policy(name)),
        }
    }

    fn set_policy(&mut self, name: &str, request: &HttpRequest) -> HttpResponse {
        let etag = next_etag(&mut self.etag_counter);
        let Some(bucket) = self.buckets.get_mut(name) else {
            return error(404, "the bucket does not exist");
        };
        let Some(policy) = body(request) else {
            return error(400, "missing policy");
        };
        if policy["etag"].as_str() != Some(bucket.policy_etag.as_str()) {
            return error(412, "the policy etag does not match");
        }
        bucket.policy_bindings = policy["bindings"].clone();
        bucket.policy_etag = etag;
        ok(bucket.policy(name))
    }

    fn test_permissions(&self, name: &str, request: &HttpRequest) -> HttpResponse {
        if !self.buckets.contains_key(name) {
            return error(404, "the bucket does not exist");
        }
        let permissions = request
            .query_values("permissions")
            .filter(|p| GRANTED.contains(p))
            .collect::<Vec<_>>();
        ok(json!({"kind": "storage#testIamPermissionsResponse", "permissions": permissions}))
    }

    fn notifications(&mut self, name: &str, id: Option<&str>, request: &HttpRequest) -> HttpResponse {
        let Some(bucket) = self.buckets.get_mut(name) else {
            return error(404, "the bucket does not exist");
        };
        match (&request.method, id) {
            (&Method::GET, None) => ok(list(bucket.notifications.values())),
            (&Method::POST, None) => {
                let Some(Value::Object(mut config)) = body(request) else {
                    return error(400, "missing notification");
                };
                bucket.next_notification_id += 1;
                let id = bucket.next_notification_id.to_string();
                config.insert("id".into(), json!(id));
                config.insert("kind".into(), json!("storage#notification"));
                config.insert("etag".into(), json!(id));
                bucket.notifications.insert(id, config.clone());
                ok(Value::Object(config))
            }
            (&Method::GET, Some(id)) => match bucket.notifications.get(id) {
                None => error(404, "the notification does not exist"),
                Some(c) => ok(Value::Object(c.clone())),
            },
            (&Method::DELETE, Some(id)) => match bucket.notifications.remove(id) {
                None => error(404, "the notification does not exist"),
                Some(_) => HttpResponse::new(204),
            },
            _ => error(405, "notifications cannot be modified"),
        }
    }

    fn acl(
        &mut self,
        name: &str,
        collection: &str,
        entity: Option<&str>,
        request: &HttpRequest,
    ) -> HttpResponse {
        let etag = next_etag(&mut self.etag_counter);
        let Some(bucket) = self.buckets.get_mut(name) else {
            return error(404, "the bucket does not exist");
        };
        let entries = match collection {
            "acl" => &mut bucket.acl,
            "defaultObjectAcl" => &mut bucket.default_object_acl,
            _ => return error(404, "no such route"),
        };
        let Some(entity) = entity else {
            return match request.method {
                Method::GET => ok(list(entries.values())),
                Method::POST => {
                    let Some(Value::Object(mut entry)) = body(request) else {
                        return error(400, "missing entry");
                    };
                    let Some(entity) = entry.get("entity").and_then(Value::as_str).map(str::to_string) else {
                        return error(400, "missing entity");
                    };
                    entry.insert("bucket".into(), json!(name));
                    entry.insert("etag".into(), json!(etag));
                    entries.insert(entity, entry.clone());
                    ok(Value::Object(entry))
                }
                _ => error(405, "method not allowed"),
            };
        };
        let Some(current) = entries.get_mut(entity) else {
            return error(404, "the entry does not exist");
        };
        if let Some(expected) = request.headers.get(http::header::IF_MATCH) {
            if current.get("etag").and_then(Value::as_str) != expected.to_str().ok() {
                return error(412, "the entry etag does not match");
            }
        }
        match request.method {
            Method::GET => ok(Value::Object(current.clone())),
            Method::DELETE => {
                entries.remove(entity);
                HttpResponse::new(204)
            }
            Method::PUT | Method::PATCH => {
                let Some(Value::Object(fields)) = body(request) else {
                    return error(400, "missing entry");
                };
                if let Some(role) = fields.get("role") {
                    current.insert("role".into(), role.clone());
                }
                current.insert("etag".into(), json!(etag));
                ok(Value::Object(current.clone()))
            }
            _ => error(405, "method not allowed"),
        }
    }
}

impl BucketState {
    fn new(name: &str, etag_counter: &mut u64) -> Self {
        let mut metadata = Map::new();
        metadata.insert("name".into(), json!(name));
        metadata.insert("id".into(), json!(name));
        metadata.insert("kind".into(), json!("storage#bucket"));
        metadata.insert("storageClass".into(), json!("STANDARD"));
        Self {
            metadata,
            metageneration: 1,
            policy_bindings: json!([
                {"role": "roles/storage.legacyBucketOwner", "members": ["projectOwner:test-project"]}
            ]),
            policy_etag: next_etag(etag_counter),
            ..Default::default()
        }
    }

    fn resource(&self) -> Value {
        let mut metadata = self.metadata.clone();
        metadata.insert("metageneration".into(), json!(self.metageneration.to_string()));
        metadata.insert("etag".into(), json!(format!("m{}", self.metageneration)));
        Value::Object(metadata)
    }

    fn policy(&self, name: &str) -> Value {
        json!({
            "kind": "storage#policy",
            "resourceId": format!("projects/_/buckets/{name}"),
            "version": 1,
            "bindings": self.policy_bindings,
            "etag": self.policy_etag,
        })
    }

    fn is_locked(&self) -> bool {
        self.metadata
            .get("retentionPolicy")
            .and_then(|p| p.get("isLocked"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn bump(&mut self) {
        self.metageneration += 1;
    }

    fn check_preconditions(&self, request: &HttpRequest) -> Option<HttpResponse> {
        let current = self.metageneration.to_string();
        if let Some(v) = request.query_value("ifMetagenerationMatch") {
            if v != current {
                return Some(error(412, "metageneration does not match"));
            }
        }
        if let Some(v) = request.query_value("ifMetagenerationNotMatch") {
            if v == current {
                let code = if request.method == Method::GET { 304 } else { 412 };
                return Some(error(code, "metageneration matches"));
            }
        }
        None
    }
}

fn next_etag(counter: &mut u64) -> String {
    *counter += 1;
    format!("CA{counter}=")
}

fn body(request: &HttpRequest) -> Option<Value> {
    request
        .body
        .as_ref()
        .and_then(|b| serde_json::from_slice(b).ok())
}

fn list<'a, I: Iterator<Item = &'a Map<String, Value>>>(entries: I) -> Value {
    let items = entries.cloned().map(Value::Object).collect::<Vec<_>>();
    json!({"items": items})
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse::new(200).with_body(body.to_string())
}

fn error(code: u16, message: &str) -> HttpResponse {
    if code == 304 {
        return HttpResponse::new(304);
    }
    HttpResponse::new(code).with_body(json!({"error": {"code": code, "message": message}}).to_string())
}
