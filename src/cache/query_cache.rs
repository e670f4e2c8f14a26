//! 共享查询缓存
//!
//! 基于 Moka：
//! - 按查询族设置 TTL，学期选项永不过期
//! - `try_get_with` 提供 Singleflight：相同键的并发读取只触发一次上游请求
//! - 每个查询族有一个代数计数器，失效时递增；
//!   失效前发起的请求会写入旧代数，之后不会再被读到

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::policy::Expiry;
use strum::{EnumCount, IntoEnumIterator};
use tracing::{debug, trace, warn};

use super::invalidation::{Entity, rule_for};
use super::keys::{QueryFamily, QueryKey};
use crate::config::CacheConfig;
use crate::errors::{AdminError, Result};

type Entry = Arc<dyn Any + Send + Sync>;
type CacheKey = (QueryKey, u64);

/// 各查询族的 TTL
#[derive(Debug, Clone)]
struct FamilyExpiry {
    list_ttl: Duration,
    options_ttl: Duration,
    dashboard_ttl: Duration,
    analytics_ttl: Duration,
}

impl FamilyExpiry {
    fn from_config(config: &CacheConfig) -> Self {
        Self {
            list_ttl: Duration::from_secs(config.list_ttl_secs),
            options_ttl: Duration::from_secs(config.options_ttl_secs),
            dashboard_ttl: Duration::from_secs(config.dashboard_ttl_secs),
            analytics_ttl: Duration::from_secs(config.analytics_ttl_secs),
        }
    }

    fn ttl_for(&self, family: QueryFamily) -> Option<Duration> {
        match family {
            QueryFamily::AdminUsers
            | QueryFamily::AdminNotes
            | QueryFamily::AdminLinks
            | QueryFamily::AdminSubjects => Some(self.list_ttl),
            QueryFamily::NotesFilterOptions
            | QueryFamily::LinksFilterOptions
            | QueryFamily::TeacherContributions => Some(self.options_ttl),
            QueryFamily::SemesterOptions => None,
            QueryFamily::DashboardStats | QueryFamily::RecentActivity => Some(self.dashboard_ttl),
            QueryFamily::DailyActiveUsers
            | QueryFamily::DeviceUsers
            | QueryFamily::TopPages
            | QueryFamily::TopUsers => Some(self.analytics_ttl),
        }
    }
}

impl Expiry<CacheKey, Entry> for FamilyExpiry {
    fn expire_after_create(
        &self,
        key: &CacheKey,
        _value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.ttl_for(key.0.family())
    }
}

pub struct QueryCache {
    inner: Cache<CacheKey, Entry>,
    generations: [AtomicU64; QueryFamily::COUNT],
}

impl QueryCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(FamilyExpiry::from_config(config))
            .support_invalidation_closures()
            .build();

        debug!(
            "QueryCache initialized with max capacity: {}, list TTL: {}s",
            config.max_capacity, config.list_ttl_secs
        );

        Self {
            inner,
            generations: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    pub fn generation(&self, family: QueryFamily) -> u64 {
        self.generations[family.index()].load(Ordering::Acquire)
    }

    /// 读取缓存，未命中时调用 `fetch`
    ///
    /// 相同键的并发调用共享一次 `fetch`；`fetch` 失败不会写入缓存。
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let generation = self.generation(key.family());
        let entry = self
            .inner
            .try_get_with((key, generation), async move {
                trace!("Query cache miss, fetching");
                let value = fetch().await?;
                Ok::<Entry, AdminError>(Arc::new(value))
            })
            .await
            .map_err(|e| (*e).clone())?;

        entry
            .downcast::<T>()
            .map(|value| (*value).clone())
            .map_err(|_| AdminError::serialization("Cached value has an unexpected type"))
    }

    /// 当前代数下是否已缓存
    pub fn contains(&self, key: &QueryKey) -> bool {
        let cache_key = (key.clone(), self.generation(key.family()));
        self.inner.contains_key(&cache_key)
    }

    pub fn invalidate_family(&self, family: QueryFamily) {
        self.generations[family.index()].fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.0.family() == family)
        {
            warn!("Failed to evict entries for {}: {}", family, e);
        }
        debug!("Invalidated query family {}", family);
    }

    /// 按失效表失效某个实体相关的所有查询族
    pub fn invalidate_entity(&self, entity: Entity) {
        for family in rule_for(entity).families {
            self.invalidate_family(*family);
        }
    }

    pub fn invalidate_all(&self) {
        for family in QueryFamily::iter() {
            self.generations[family.index()].fetch_add(1, Ordering::AcqRel);
        }
        self.inner.invalidate_all();
        debug!("Invalidated all query families");
    }

    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}
