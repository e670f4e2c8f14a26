//! PostHog HogQL 查询客户端
//!
//! `POST {host}/api/projects/{id}/query`，请求体
//! `{"query": {"kind": "HogQLQuery", "query": ..., "values": {...}}}`，
//! 响应中的 `results` 为二维数组。

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, error};
use ureq::Agent;

use super::{AuthScope, HogQlQuery, HogQlRunner};
use crate::config::AnalyticsConfig;
use crate::errors::{AdminError, Result};
use crate::utils::http::{HttpFailure, build_agent, read_json, run_blocking};

#[derive(Clone)]
pub struct PostHogClient {
    agent: Agent,
    query_url: String,
    api_key: String,
    personal_api_key: String,
}

impl PostHogClient {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            agent: build_agent(config.timeout_secs),
            query_url: format!(
                "{}/api/projects/{}/query",
                config.host.trim_end_matches('/'),
                config.project_id
            ),
            api_key: config.api_key.clone(),
            personal_api_key: config.personal_api_key.clone(),
        }
    }

    fn key_for(&self, scope: AuthScope) -> &str {
        match scope {
            AuthScope::Project => &self.api_key,
            AuthScope::Personal => &self.personal_api_key,
        }
    }

    fn request_body(query: &HogQlQuery) -> Value {
        let mut inner = json!({ "kind": "HogQLQuery", "query": query.query });
        if !query.values.is_empty() {
            inner["values"] = Value::Object(query.values.clone());
        }
        json!({ "query": inner })
    }

    fn send_sync(
        agent: Agent,
        url: String,
        token: String,
        body: Value,
    ) -> std::result::Result<Value, HttpFailure> {
        let resp = agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send_json(&body)?;
        read_json(resp)
    }
}

/// 取出 `results`，必须是数组的数组
fn extract_results(value: Value) -> Result<Vec<Vec<Value>>> {
    let Some(Value::Array(rows)) = value.get("results").cloned() else {
        return Err(AdminError::analytics_service(
            "Query response is missing results",
        ));
    };
    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) => Ok(cells),
            other => Err(AdminError::analytics_service(format!(
                "Expected a row array, got {}",
                other
            ))),
        })
        .collect()
}

#[async_trait]
impl HogQlRunner for PostHogClient {
    async fn run(&self, query: &HogQlQuery) -> Result<Vec<Vec<Value>>> {
        let agent = self.agent.clone();
        let url = self.query_url.clone();
        let token = self.key_for(query.scope).to_string();
        let body = Self::request_body(query);

        debug!("PostHog query ({:?} scope)", query.scope);
        let value = run_blocking(move || Self::send_sync(agent, url, token, body))
            .await
            .map_err(|e| {
                error!("PostHog query failed: {}", e);
                AdminError::analytics_service(e.to_string())
            })?;
        extract_results(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_and_keys() {
        let client = PostHogClient::new(&AnalyticsConfig {
            host: "https://eu.posthog.com/".into(),
            project_id: "123".into(),
            api_key: "phc".into(),
            personal_api_key: "phx".into(),
            timeout_secs: 5,
        });
        assert_eq!(client.query_url, "https://eu.posthog.com/api/projects/123/query");
        assert_eq!(client.key_for(AuthScope::Project), "phc");
        assert_eq!(client.key_for(AuthScope::Personal), "phx");
    }

    #[test]
    fn test_request_body_carries_values() {
        let body = PostHogClient::request_body(&HogQlQuery::user_sessions("u-1", 10, 0));
        assert_eq!(body["query"]["kind"], "HogQLQuery");
        assert_eq!(body["query"]["values"]["userId"], "u-1");

        let body = PostHogClient::request_body(&HogQlQuery::top_pages());
        assert!(body["query"].get("values").is_none());
    }

    #[test]
    fn test_extract_results() {
        let rows = extract_results(json!({"results": [["/a", 1], ["/b", 2]]})).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][1], 2);

        assert!(extract_results(json!({"error": "bad"})).is_err());
        assert!(extract_results(json!({"results": [1, 2]})).is_err());
    }
}
