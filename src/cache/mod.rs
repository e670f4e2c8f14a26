//! 查询缓存与失效
//!
//! 缓存只是建议性的：随时可以丢弃并重新获取。

pub mod invalidation;
pub mod keys;
pub mod query_cache;

pub use invalidation::{Entity, InvalidationRule, RULES, rule_for};
pub use keys::{QueryFamily, QueryKey};
pub use query_cache::QueryCache;
