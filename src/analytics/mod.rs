//! 产品分析（PostHog / HogQL）
//!
//! - `hogql`: 查询模板与占位符参数
//! - `posthog`: HTTP 实现
//! - `rows`: 结果行的类型化解码
//! - `aggregation`: 纯函数，把结果行整理成图表数据

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;

pub mod aggregation;
pub mod hogql;
pub mod posthog;
pub mod rows;

pub use hogql::{DevicePeriod, HogQlQuery};
pub use posthog::PostHogClient;

/// 查询使用的凭证
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScope {
    /// 项目 API key
    Project,
    /// 个人 API key，可读取 person 属性
    Personal,
}

/// HogQL 执行器
#[async_trait]
pub trait HogQlRunner: Send + Sync {
    /// 执行查询并返回原始表格行
    async fn run(&self, query: &HogQlQuery) -> Result<Vec<Vec<Value>>>;
}
