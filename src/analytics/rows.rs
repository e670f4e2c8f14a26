//! HogQL 结果行的类型化解码
//!
//! PostHog 返回 `results: [[...], ...]`，每个查询在边界处解码成对应的元组结构体，
//! 列数或类型不符视为外部服务错误。

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{AdminError, Result};

/// (day, users)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyActiveRow(pub String, pub u64);

/// (day, desktop, mobile)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceRow(pub String, pub u64, pub u64);

/// (url, views)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageViewRow(pub String, pub u64);

/// (name?, email?, pageviews)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopUserRow(pub Option<String>, pub Option<String>, pub u64);

/// (session_id?, start, end?, duration?, browser?, os?)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionRow(
    pub Option<String>,
    pub String,
    pub Option<String>,
    pub Option<i64>,
    pub Option<String>,
    pub Option<String>,
);

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Vec<Value>>) -> Result<Vec<T>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value(Value::Array(row)).map_err(|e| {
                AdminError::analytics_service(format!("Malformed analytics row {}: {}", i, e))
            })
        })
        .collect()
}
