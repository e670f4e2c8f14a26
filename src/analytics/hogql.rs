//! HogQL 查询模板
//!
//! 用户输入只能通过 `values` 占位符传入，不能拼接进查询文本。

use serde::Deserialize;
use serde_json::{Map, Value};

use super::AuthScope;

/// 排行查询从 PostHog 拉取的行数，本地聚合后再截断
const TOP_PAGES_FETCH_LIMIT: u32 = 100;
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct HogQlQuery {
    pub query: String,
    pub values: Map<String, Value>,
    pub scope: AuthScope,
}

impl HogQlQuery {
    fn new(query: impl Into<String>, scope: AuthScope) -> Self {
        Self {
            query: query.into(),
            values: Map::new(),
            scope,
        }
    }

    fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// 最近 7 天每日活跃人数
    pub fn daily_active_users() -> Self {
        Self::new(
            "SELECT toStartOfDay(timestamp) AS day, count(DISTINCT person_id) AS users \
             FROM events \
             WHERE event = '$pageview' AND timestamp >= now() - INTERVAL 7 DAY \
             GROUP BY day ORDER BY day ASC",
            AuthScope::Project,
        )
    }

    /// 按设备类型统计的每日已识别用户数
    pub fn device_users(period: DevicePeriod) -> Self {
        Self::new(
            format!(
                "SELECT toStartOfDay(timestamp) AS day, \
                 count(DISTINCT if(properties.$device_type = 'Desktop', person.properties.email, NULL)) AS desktop_users, \
                 count(DISTINCT if(properties.$device_type = 'Mobile', person.properties.email, NULL)) AS mobile_users \
                 FROM events \
                 WHERE event = '$pageview' AND timestamp >= now() - INTERVAL {} \
                 AND person.properties.email IS NOT NULL \
                 GROUP BY day ORDER BY day ASC",
                period.interval()
            ),
            AuthScope::Project,
        )
    }

    /// 页面浏览量（原始 URL，规范化在本地完成）
    pub fn top_pages() -> Self {
        Self::new(
            format!(
                "SELECT properties.$current_url AS url, count() AS views \
                 FROM events \
                 WHERE event = '$pageview' AND properties.$current_url IS NOT NULL \
                 AND properties.$current_url NOT LIKE '%/admin%' \
                 GROUP BY url ORDER BY views DESC LIMIT {}",
                TOP_PAGES_FETCH_LIMIT
            ),
            AuthScope::Project,
        )
    }

    /// 最近 7 天浏览量最高的用户
    pub fn top_users() -> Self {
        Self::new(
            format!(
                "SELECT person.properties.name AS name, person.properties.email AS email, count() AS pageviews \
                 FROM events \
                 WHERE event = '$pageview' AND timestamp >= now() - INTERVAL 7 DAY \
                 AND person.properties.name IS NOT NULL \
                 GROUP BY name, email ORDER BY pageviews DESC LIMIT {}",
                TOP_N
            ),
            AuthScope::Personal,
        )
    }

    /// 某个用户的会话列表，`user_id` 作为占位符传入
    pub fn user_sessions(user_id: &str, limit: u32, offset: u32) -> Self {
        Self::new(
            format!(
                "SELECT properties.$session_id AS session_id, \
                 min(timestamp) AS start_time, max(timestamp) AS end_time, \
                 date_diff('second', min(timestamp), max(timestamp)) AS duration_seconds, \
                 any(properties.$browser) AS browser, any(properties.$os) AS os \
                 FROM events \
                 WHERE distinct_id = {{userId}} \
                 GROUP BY session_id ORDER BY start_time DESC \
                 LIMIT {} OFFSET {}",
                limit, offset
            ),
            AuthScope::Project,
        )
        .with_value("userId", user_id)
    }
}

/// 设备统计的时间范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum DevicePeriod {
    #[default]
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl DevicePeriod {
    /// 未知值回退到 1 个月
    pub fn parse(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some("3m") => Self::ThreeMonths,
            Some("1y") => Self::OneYear,
            _ => Self::OneMonth,
        }
    }

    pub fn interval(&self) -> &'static str {
        match self {
            Self::OneMonth => "1 MONTH",
            Self::ThreeMonths => "3 MONTH",
            Self::OneYear => "1 YEAR",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::OneYear => "1y",
        }
    }
}
