use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};

use super::{EventPublisher, SupplierError};
use crate::config::KafkaConfig;

const KAFKA_JSON: &str = "application/vnd.kafka.json.v2+json";
const KAFKA_ACCEPT: &str = "application/vnd.kafka.v2+json";

/// Publishes JSON records through a Confluent-compatible Kafka REST proxy
#[derive(Debug, Clone)]
pub struct KafkaRestPublisher {
    base_url: String,
    http_client: Client,
}

impl KafkaRestPublisher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    pub fn from_config(config: &KafkaConfig) -> Self {
        Self::new(config.rest_proxy_url.clone())
    }
}

#[async_trait]
impl EventPublisher for KafkaRestPublisher {
    async fn publish(&self, topic: &str, key: &str, value: Value) -> Result<(), SupplierError> {
        let payload = json!({
            "records": [{ "key": key, "value": value }]
        });

        let response = self
            .http_client
            .post(format!("{}/topics/{}", self.base_url, topic))
            .header(CONTENT_TYPE, KAFKA_JSON)
            .header(ACCEPT, KAFKA_ACCEPT)
            .body(serde_json::to_vec(&payload)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SupplierError::Rejected(format!(
                "Kafka proxy returned {status}: {body}"
            )));
        }

        // The proxy answers 200 even when individual records fail.
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if let Some(failed) = body["offsets"]
            .as_array()
            .and_then(|offsets| offsets.iter().find(|o| !o["error_code"].is_null()))
        {
            return Err(SupplierError::Rejected(format!(
                "record rejected: {}",
                failed["error"].as_str().unwrap_or("unknown error")
            )));
        }

        tracing::debug!(topic, key, "event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_publish_posts_single_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/topics/customer-invites"))
            .and(header("content-type", KAFKA_JSON))
            .and(body_json(json!({
                "records": [{ "key": "c-1", "value": { "email": "a@b.c" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offsets": [{ "partition": 0, "offset": 12, "error_code": null, "error": null }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let publisher = KafkaRestPublisher::new(format!("{}/", server.uri()));
        publisher
            .publish("customer-invites", "c-1", json!({ "email": "a@b.c" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_level_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/topics/customer-invites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offsets": [{ "partition": null, "offset": null, "error_code": 50002, "error": "Kafka error" }]
            })))
            .mount(&server)
            .await;

        let publisher = KafkaRestPublisher::new(server.uri());
        let result = publisher.publish("customer-invites", "c-1", json!({})).await;
        assert!(matches!(result, Err(SupplierError::Rejected(msg)) if msg.contains("Kafka error")));
    }

    #[tokio::test]
    async fn test_proxy_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("topic not found"))
            .mount(&server)
            .await;

        let publisher = KafkaRestPublisher::new(server.uri());
        let result = publisher.publish("missing", "k", json!({})).await;
        assert!(matches!(result, Err(SupplierError::Rejected(_))));
    }
}
