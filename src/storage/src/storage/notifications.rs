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

use super::client::Storage;
use super::sub_resource::{
    CreateSubResource, DeleteSubResource, GetSubResource, ListSubResources, SubResource,
};
use crate::model::NotificationConfig;

/// The request builder for [Storage::create_notification] calls.
pub type CreateNotification = CreateSubResource<NotificationConfig>;
/// The request builder for [Storage::get_notification] calls.
pub type GetNotification = GetSubResource<NotificationConfig>;
/// The request builder for [Storage::list_notifications] calls.
pub type ListNotifications = ListSubResources<NotificationConfig>;
/// The request builder for [Storage::delete_notification] calls.
pub type DeleteNotification = DeleteSubResource<NotificationConfig>;

impl SubResource for NotificationConfig {
    const COLLECTION: &'static str = "notificationConfigs";
    const NAME: &'static str = "notification";
    const KEY_FIELD: &'static str = "id";
    const MUTABLE: bool = false;

    fn key(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn create_payload(&self) -> Self {
        Self {
            id: None,
            etag: None,
            self_link: None,
            kind: None,
            ..self.clone()
        }
    }
}

impl Storage {
    /// Creates a Pub/Sub notification configuration on a bucket.
    ///
    /// Notification configurations cannot be changed. To change a
    /// configuration delete it and create a new one.
    ///
    /// # Example
    /// ```
    /// # use bucket_admin::client::Storage;
    /// # async fn sample(client: &Storage) -> anyhow::Result<()> {
    /// use bucket_admin::model::NotificationConfig;
    /// let config = NotificationConfig::new("//pubsub.googleapis.com/projects/my-project/topics/my-topic")
    ///     .set_payload_format("JSON_API_V1")
    ///     .set_event_types(["OBJECT_FINALIZE", "OBJECT_DELETE"]);
    /// let created = client.create_notification("my-bucket", config).send().await?;
    /// println!("created notification {:?}", created.id);
    /// # Ok(()) }
    /// ```
    pub fn create_notification<B: Into<String>>(
        &self,
        bucket: B,
        config: NotificationConfig,
    ) -> CreateNotification {
        self.create_sub_resource(bucket, config)
    }

    /// Fetches a notification configuration.
    pub fn get_notification<B, I>(&self, bucket: B, id: I) -> GetNotification
    where
        B: Into<String>,
        I: Into<String>,
    {
        self.get_sub_resource(bucket, id)
    }

    /// Lists the notification configurations on a bucket.
    pub fn list_notifications<B: Into<String>>(&self, bucket: B) -> ListNotifications {
        self.list_sub_resources(bucket)
    }

    /// Deletes a notification configuration.
    pub fn delete_notification<B, I>(&self, bucket: B, id: I) -> DeleteNotification
    where
        B: Into<String>,
        I: Into<String>,
    {
        self.delete_sub_resource(bucket, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use crate::storage::client::tests::test_client;
    use crate::transport::{HttpRequest, HttpResponse, MockTransport};
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::error::Error as _;

    const TOPIC: &str = "//pubsub.googleapis.com/projects/p/topics/t";

    fn body(request: &HttpRequest) -> anyhow::Result<Value> {
        let body = request.body.clone().unwrap_or_default();
        Ok(serde_json::from_slice(&body)?)
    }

    #[test]
    fn create() -> anyhow::Result<()> {
        let config = NotificationConfig::new(TOPIC)
            .set_id("ignored")
            .set_payload_format("JSON_API_V1")
            .set_event_types(["OBJECT_FINALIZE"])
            .set_custom_attributes([("team", "storage")])
            .set_object_name_prefix("logs/");
        let request = test_client(MockTransport::new())
            .create_notification("b1", config)
            .http_request()?;
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/b/b1/notificationConfigs");
        assert_eq!(
            body(&request)?,
            json!({
                "topic": TOPIC,
                "payload_format": "JSON_API_V1",
                "event_types": ["OBJECT_FINALIZE"],
                "custom_attributes": {"team": "storage"},
                "object_name_prefix": "logs/",
            })
        );
        Ok(())
    }

    #[tokio::test]
    async fn get_list_delete() -> anyhow::Result<()> {
        let mut seq = mockall::Sequence::new();
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|r| r.method == Method::GET && r.path == "/b/b1/notificationConfigs/7")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| HttpResponse::json(200, &json!({"id": "7", "topic": TOPIC})));
        transport
            .expect_execute()
            .withf(|r| r.method == Method::GET && r.path == "/b/b1/notificationConfigs")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| HttpResponse::json(200, &json!({"items": [{"id": "7", "topic": TOPIC}]})));
        transport
            .expect_execute()
            .withf(|r| r.method == Method::DELETE && r.path == "/b/b1/notificationConfigs/7")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(204)));

        let client = test_client(transport);
        let got = client.get_notification("b1", "7").send().await?;
        assert_eq!(got, NotificationConfig::new(TOPIC).set_id("7"));
        let list = client.list_notifications("b1").send().await?;
        assert_eq!(list, vec![got]);
        client.delete_notification("b1", "7").send().await?;
        Ok(())
    }

    #[tokio::test]
    async fn update_and_patch_rejected() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let client = test_client(transport);
        let config = NotificationConfig::new(TOPIC).set_id("7");

        let err = client
            .update_sub_resource("b1", config.clone())
            .send()
            .await
            .expect_err("notifications are immutable");
        assert!(err.is_binding(), "{err:?}");
        let source = err.source().and_then(|e| e.downcast_ref::<RequestError>());
        assert_eq!(source, Some(&RequestError::ImmutableResource("notification")));

        let desired = config.clone().set_object_name_prefix("new/");
        let err = client
            .patch_sub_resource("b1", "7", config, desired)
            .send()
            .await
            .expect_err("notifications are immutable");
        assert!(err.is_binding(), "{err:?}");
    }
}
