//! 分页
//!
//! - 服务端：`PageRequest` 规范化 limit/offset，`Page` 携带总数并计算下一页
//! - 客户端：`InfiniteList` 按过滤快照累积页面
//! - `Selection`：批量操作后保留失败项的选择集

use serde::Serialize;

pub mod filters;
pub mod infinite;
pub mod selection;

pub use filters::{LinkFilter, ListParams, NoteFilter, SubjectFilter, UserFilter};
pub use infinite::{Identified, InfiniteList};
pub use selection::Selection;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// 规范化后的分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    /// limit 默认 10，限制在 1..=100
    pub fn clamp_limit(limit: Option<u64>) -> u64 {
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn for_page(page: u64, limit: Option<u64>) -> Self {
        let limit = Self::clamp_limit(limit);
        Self {
            limit,
            offset: page.saturating_mul(limit),
        }
    }

    pub fn from_offset(offset: u64, limit: Option<u64>) -> Self {
        Self {
            limit: Self::clamp_limit(limit),
            offset,
        }
    }

    /// `page` 优先于 `offset`
    pub fn from_params(params: &ListParams) -> Self {
        match params.page {
            Some(page) => Self::for_page(page, params.limit),
            None => Self::from_offset(params.offset.unwrap_or(0), params.limit),
        }
    }

    pub fn page_index(&self) -> u64 {
        self.offset / self.limit.max(1)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::for_page(0, None)
    }
}

/// 一页记录及过滤后的总数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub documents: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(documents: Vec<T>, total: u64) -> Self {
        Self { documents, total }
    }

    pub fn empty() -> Self {
        Self {
            documents: Vec::new(),
            total: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// `(page + 1) * limit < total` 时返回下一页
pub fn next_page(page: u64, limit: u64, total: u64) -> Option<u64> {
    let next = page.saturating_add(1);
    (next.saturating_mul(limit) < total).then_some(next)
}

/// 返回给客户端的分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub documents: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub next_page: Option<u64>,
}

impl<T> PageResponse<T> {
    pub fn new(page: Page<T>, request: PageRequest) -> Self {
        let index = request.page_index();
        Self {
            next_page: next_page(index, request.limit, page.total),
            total: page.total,
            documents: page.documents,
            page: index,
            limit: request.limit,
        }
    }
}
