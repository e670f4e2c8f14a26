//! 批量操作
//!
//! 独立的子操作并发执行（有上限），全部完成后汇总结果；不重试，不回滚。

use std::future::Future;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

use crate::errors::Result;

/// 单个失败项
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: String,
    pub reason: String,
}

/// 批量操作结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    /// 拆分子操作结果，返回汇总和成功项的返回值
    pub fn from_results<R>(results: Vec<(String, Result<R>)>) -> (Self, Vec<R>) {
        let mut outcome = Self::default();
        let mut values = Vec::new();
        for (id, result) in results {
            match result {
                Ok(value) => {
                    outcome.succeeded.push(id);
                    values.push(value);
                }
                Err(e) => outcome.failed.push(BulkFailure {
                    id,
                    reason: e.message().to_string(),
                }),
            }
        }
        (outcome, values)
    }

    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.id.as_str())
    }

    pub fn summary(&self, noun: &str) -> String {
        let total = self.succeeded.len() + self.failed.len();
        if self.failed.is_empty() {
            format!("Deleted {} {}", self.succeeded.len(), noun)
        } else {
            format!(
                "Deleted {} of {} {}; {} failed",
                self.succeeded.len(),
                total,
                noun,
                self.failed.len()
            )
        }
    }
}

/// 有 id 的批量操作对象
pub trait BulkItem {
    fn bulk_id(&self) -> String;
}

impl BulkItem for String {
    fn bulk_id(&self) -> String {
        self.clone()
    }
}

/// 并发执行 `op`，同时最多 `max_concurrency` 个，结果按输入顺序返回
pub async fn run_bulk<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrency: usize,
    op: F,
) -> Vec<(String, Result<R>)>
where
    T: BulkItem,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    stream::iter(items)
        .map(|item| {
            let id = item.bulk_id();
            let fut = op(item);
            async move { (id, fut.await) }
        })
        .buffered(max_concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AdminError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_respects_concurrency_cap() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let ids: Vec<String> = (0..20).map(|i| i.to_string()).collect();

        let results = run_bulk(ids, 3, |_id| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

        assert_eq!(results.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(results[0].0, "0");
        assert_eq!(results[19].0, "19");
    }

    #[tokio::test]
    async fn test_outcome_partial_failure() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = run_bulk(ids, 8, |id| async move {
            if id == "b" {
                Err(AdminError::database_service("boom"))
            } else {
                Ok(id.len())
            }
        })
        .await;

        let (outcome, values) = BulkOutcome::from_results(results);
        assert_eq!(outcome.succeeded, vec!["a", "c"]);
        assert_eq!(outcome.failed[0].id, "b");
        assert_eq!(outcome.failed[0].reason, "boom");
        assert!(outcome.is_partial_failure());
        assert!(outcome.any_succeeded());
        assert_eq!(values, vec![1, 1]);
        assert_eq!(outcome.summary("users"), "Deleted 2 of 3 users; 1 failed");
    }

    #[test]
    fn test_summary_all_ok() {
        let outcome = BulkOutcome {
            succeeded: vec!["x".into()],
            failed: Vec::new(),
        };
        assert_eq!(outcome.summary("notes"), "Deleted 1 notes");
        assert!(!outcome.is_partial_failure());
    }
}
