//! 出站 HTTP 共享逻辑
//!
//! 所有外部服务（Appwrite、PostHog、主站刷新）都使用同步的 ureq 客户端，
//! 通过 spawn_blocking 在阻塞线程池中执行。

use std::time::Duration;

use serde_json::Value;
use ureq::Agent;
use ureq::http::Response;

/// 出站请求失败原因
#[derive(Debug, Clone, PartialEq)]
pub enum HttpFailure {
    /// 服务端返回 4xx/5xx，附带服务端的错误信息
    Status(u16, String),
    Transport(String),
    Decode(String),
    /// 阻塞任务被取消或 panic
    Join(String),
}

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            Self::Transport(msg) => write!(f, "request failed: {}", msg),
            Self::Decode(msg) => write!(f, "invalid response body: {}", msg),
            Self::Join(msg) => write!(f, "background task failed: {}", msg),
        }
    }
}

impl From<ureq::Error> for HttpFailure {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Status(code, String::new()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// 构建带全局超时的 Agent
///
/// 状态码不作为错误返回，由 [`read_json`] 统一读取错误体。
pub fn build_agent(timeout_secs: u64) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(timeout_secs.max(1))))
        .http_status_as_error(false)
        .build()
        .into()
}

/// 读取 JSON 响应；4xx/5xx 转为 `HttpFailure::Status`
///
/// 空响应（204）返回 `Value::Null`。
pub fn read_json(resp: Response<ureq::Body>) -> Result<Value, HttpFailure> {
    let status = resp.status().as_u16();
    let mut body = resp.into_body();

    if status >= 400 {
        let text = body.read_to_string().unwrap_or_default();
        return Err(HttpFailure::Status(status, error_message(&text)));
    }

    let text = body
        .read_to_string()
        .map_err(|e| HttpFailure::Decode(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| HttpFailure::Decode(e.to_string()))
}

/// 从错误体中提取 `message` 字段，否则返回原文
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}

/// 在阻塞线程池中运行同步请求
pub async fn run_blocking<T, F>(f: F) -> Result<T, HttpFailure>
where
    F: FnOnce() -> Result<T, HttpFailure> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| HttpFailure::Join(e.to_string()))?
}
