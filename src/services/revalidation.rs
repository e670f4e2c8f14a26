//! 主站缓存刷新
//!
//! `POST {main_app_url}/api/revalidate`，Bearer token，请求体 `{"tag": ...}`。
//! 调用方只记录失败，不会因此让变更失败。

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use ureq::Agent;

use crate::config::RevalidationConfig;
use crate::errors::{AdminError, Result};
use crate::utils::http::{build_agent, read_json, run_blocking};

#[async_trait]
pub trait Revalidator: Send + Sync {
    async fn revalidate(&self, tag: &str) -> Result<()>;
}

pub struct HttpRevalidator {
    agent: Agent,
    url: String,
    token: Option<String>,
}

impl HttpRevalidator {
    pub fn new(config: &RevalidationConfig) -> Self {
        Self {
            agent: build_agent(config.timeout_secs),
            url: format!("{}/api/revalidate", config.main_app_url.trim_end_matches('/')),
            token: config.token.clone().filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait]
impl Revalidator for HttpRevalidator {
    async fn revalidate(&self, tag: &str) -> Result<()> {
        let Some(token) = self.token.clone() else {
            return Err(AdminError::config("Revalidation token is not set"));
        };
        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = json!({ "tag": tag });

        run_blocking(move || {
            let resp = agent
                .post(&url)
                .header("Authorization", format!("Bearer {}", token))
                .send_json(&body)?;
            read_json(resp)
        })
        .await
        .map_err(|e| AdminError::revalidation(format!("Revalidation failed: {}", e)))?;

        info!("Revalidated tag '{}'", tag);
        Ok(())
    }
}
