//! Analytics service
//!
//! Runs the HogQL queries, decodes rows at the boundary and shapes them for
//! the dashboard charts. Trend queries are cached; per-user sessions are not.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::analytics::aggregation::{
    DailyActiveUsers, DeviceUsers, PageViews, SessionsPage, TopUser, aggregate_top_pages,
    format_daily_active, format_device_users, format_top_users, shape_sessions,
};
use crate::analytics::hogql::TOP_N;
use crate::analytics::rows::{
    DailyActiveRow, DeviceRow, PageViewRow, SessionRow, TopUserRow, decode_rows,
};
use crate::analytics::{DevicePeriod, HogQlQuery, HogQlRunner};
use crate::cache::{QueryCache, QueryKey};
use crate::errors::{AdminError, Result};

pub const DEFAULT_SESSIONS_LIMIT: u32 = 10;
pub const MAX_SESSIONS_LIMIT: u32 = 100;

pub struct AnalyticsService {
    runner: Arc<dyn HogQlRunner>,
    cache: Arc<QueryCache>,
}

impl AnalyticsService {
    pub fn new(runner: Arc<dyn HogQlRunner>, cache: Arc<QueryCache>) -> Self {
        Self { runner, cache }
    }

    pub async fn daily_active_users(&self) -> Result<Vec<DailyActiveUsers>> {
        self.cache
            .get_or_fetch(QueryKey::DailyActiveUsers, || async {
                let rows = self.runner.run(&HogQlQuery::daily_active_users()).await?;
                format_daily_active(decode_rows::<DailyActiveRow>(rows)?)
            })
            .await
    }

    pub async fn device_users(&self, period: DevicePeriod) -> Result<Vec<DeviceUsers>> {
        self.cache
            .get_or_fetch(QueryKey::DeviceUsers(period), || async move {
                debug!("Fetching device users for {}", period.as_str());
                let rows = self.runner.run(&HogQlQuery::device_users(period)).await?;
                format_device_users(decode_rows::<DeviceRow>(rows)?)
            })
            .await
    }

    pub async fn top_pages(&self) -> Result<Vec<PageViews>> {
        self.cache
            .get_or_fetch(QueryKey::TopPages, || async {
                let rows = self.runner.run(&HogQlQuery::top_pages()).await?;
                Ok(aggregate_top_pages(decode_rows::<PageViewRow>(rows)?, TOP_N))
            })
            .await
    }

    pub async fn top_users(&self) -> Result<Vec<TopUser>> {
        self.cache
            .get_or_fetch(QueryKey::TopUsers, || async {
                let rows = self.runner.run(&HogQlQuery::top_users()).await?;
                Ok(format_top_users(decode_rows::<TopUserRow>(rows)?))
            })
            .await
    }

    /// Sessions of one person, newest first
    pub async fn user_sessions(
        &self,
        user_id: &str,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<SessionsPage> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AdminError::validation("userId: User id is required"));
        }
        let limit = limit
            .unwrap_or(DEFAULT_SESSIONS_LIMIT)
            .clamp(1, MAX_SESSIONS_LIMIT);
        let offset = offset.unwrap_or(0);

        let rows = self
            .runner
            .run(&HogQlQuery::user_sessions(user_id, limit, offset))
            .await?;
        let rows = decode_rows::<SessionRow>(rows)?;
        Ok(shape_sessions(rows, limit as usize, Utc::now()))
    }
}
