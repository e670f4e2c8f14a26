//! Admin API 服务模块
//!
//! - 用户、笔记、链接、学科的列表与增删改
//! - 批量删除与 CSV 导入
//! - 仪表盘统计、PostHog 趋势
//! - 手动缓存失效

mod dashboard;
mod helpers;
mod links;
mod notes;
pub mod routes;
mod subjects;
mod trends;
pub mod types;
mod users;

pub use helpers::{api_result, error_from_admin, error_response, success_response};
pub use routes::api_config;
pub use types::*;
