//! 无限滚动列表累积器
//!
//! 按获取顺序追加页面，过滤条件变化时清空回到第 0 页；
//! 旧过滤条件的迟到响应会被丢弃。

use std::collections::HashSet;
use std::future::Future;

use super::{Page, PageRequest};
use crate::errors::Result;

/// 有稳定 id 的记录
pub trait Identified {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct InfiniteList<F, T> {
    filter: F,
    limit: u64,
    pages: Vec<Page<T>>,
}

impl<F, T> InfiniteList<F, T>
where
    F: Clone + PartialEq,
    T: Identified,
{
    pub fn new(filter: F, limit: u64) -> Self {
        Self {
            filter,
            limit: PageRequest::clamp_limit(Some(limit)),
            pages: Vec::new(),
        }
    }

    pub fn filter(&self) -> &F {
        &self.filter
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// 过滤条件不同则清空已加载页面，返回是否发生了重置
    pub fn set_filter(&mut self, filter: F) -> bool {
        if filter == self.filter {
            return false;
        }
        self.filter = filter;
        self.pages.clear();
        true
    }

    /// 下一页的页码；未加载任何页时为 `Some(0)`
    pub fn next_page_param(&self) -> Option<u64> {
        let Some(last) = self.pages.last() else {
            return Some(0);
        };
        let loaded = self.pages.len() as u64;
        (loaded.saturating_mul(self.limit) < last.total).then_some(loaded)
    }

    /// 追加一页；快照与当前过滤条件不一致时忽略，返回是否接受
    pub fn append(&mut self, snapshot: &F, page: Page<T>) -> bool {
        if *snapshot != self.filter {
            return false;
        }
        self.pages.push(page);
        true
    }

    /// 按获取顺序展开的记录，同一 id 只保留第一次出现
    pub fn items(&self) -> Vec<&T> {
        let mut seen = HashSet::new();
        self.pages
            .iter()
            .flat_map(|p| p.documents.iter())
            .filter(|item| seen.insert(item.id()))
            .collect()
    }

    pub fn fetched_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages.len()
    }

    /// 最近一页报告的总数
    pub fn total(&self) -> Option<u64> {
        self.pages.last().map(|p| p.total)
    }

    pub fn has_next_page(&self) -> bool {
        self.next_page_param().is_some()
    }

    /// 获取并追加下一页，没有下一页时返回 `Ok(false)`
    pub async fn fetch_next<Fetch, Fut>(&mut self, fetcher: Fetch) -> Result<bool>
    where
        Fetch: FnOnce(F, PageRequest) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let Some(page) = self.next_page_param() else {
            return Ok(false);
        };
        let snapshot = self.filter.clone();
        let request = PageRequest::for_page(page, Some(self.limit));
        let fetched = fetcher(snapshot.clone(), request).await?;
        Ok(self.append(&snapshot, fetched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(String);

    impl Identified for Row {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn page(ids: &[&str], total: u64) -> Page<Row> {
        Page::new(ids.iter().map(|i| Row(i.to_string())).collect(), total)
    }

    #[test]
    fn test_empty_list_starts_at_zero() {
        let list: InfiniteList<String, Row> = InfiniteList::new("all".into(), 2);
        assert_eq!(list.next_page_param(), Some(0));
        assert!(list.items().is_empty());
        assert_eq!(list.total(), None);
    }

    #[test]
    fn test_next_page_param_follows_total() {
        let mut list = InfiniteList::new(String::new(), 2);
        assert!(list.append(&String::new(), page(&["a", "b"], 5)));
        assert_eq!(list.next_page_param(), Some(1));
        list.append(&String::new(), page(&["c", "d"], 5));
        assert_eq!(list.next_page_param(), Some(2));
        list.append(&String::new(), page(&["e"], 5));
        assert_eq!(list.next_page_param(), None);
        assert_eq!(list.fetched_count(), 5);
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let mut list = InfiniteList::new("teacher".to_string(), 2);
        assert!(!list.append(&"student".to_string(), page(&["x"], 1)));
        assert_eq!(list.pages_loaded(), 0);
    }

    #[test]
    fn test_filter_change_resets() {
        let mut list = InfiniteList::new("a".to_string(), 2);
        list.append(&"a".to_string(), page(&["1", "2"], 4));
        assert!(!list.set_filter("a".to_string()));
        assert_eq!(list.pages_loaded(), 1);

        assert!(list.set_filter("b".to_string()));
        assert_eq!(list.next_page_param(), Some(0));
        list.append(&"b".to_string(), page(&["9"], 1));
        let ids: Vec<&str> = list.items().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["9"]);
    }

    #[test]
    fn test_items_dedupe_first_wins() {
        let mut list = InfiniteList::new((), 2);
        list.append(&(), page(&["a", "b"], 4));
        list.append(&(), page(&["b", "c"], 4));
        let ids: Vec<&str> = list.items().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_fetch_next_until_exhausted() {
        let data: Vec<String> = (0..7).map(|i| format!("r{}", i)).collect();
        let mut list = InfiniteList::new((), 3);

        loop {
            let source = data.clone();
            let fetched = list
                .fetch_next(|_, req| async move {
                    let start = req.offset as usize;
                    let end = (start + req.limit as usize).min(source.len());
                    let docs = source[start..end].iter().cloned().map(Row).collect();
                    Ok(Page::new(docs, source.len() as u64))
                })
                .await
                .unwrap();
            if !fetched {
                break;
            }
        }

        assert_eq!(list.pages_loaded(), 3);
        assert_eq!(list.items().len(), 7);
        assert!(!list.has_next_page());
    }
}
