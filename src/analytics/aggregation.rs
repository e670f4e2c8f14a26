//! 分析数据整理
//!
//! 纯函数：输入解码后的结果行，输出排序、去重、截断后的图表数据。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use super::rows::{DailyActiveRow, DeviceRow, PageViewRow, SessionRow, TopUserRow};
use crate::errors::{AdminError, Result};
use crate::utils::time::{parse_timestamp, parse_timestamp_utc};

/// 超过该时长没有事件的会话视为已结束
pub const ACTIVITY_THRESHOLD_MINUTES: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageViews {
    pub path: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActiveUsers {
    pub date: String,
    pub users: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceUsers {
    pub date: String,
    pub desktop: u64,
    pub mobile: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUser {
    pub name: String,
    pub activity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSession {
    pub id: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_seconds: Option<i64>,
    pub browser: Option<String>,
    pub os: Option<String>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsPage {
    pub sessions: Vec<UserSession>,
    pub has_next_page: bool,
}

/// 规范化页面路径
///
/// 去掉协议、主机、查询串和片段；连续的前导斜杠合并为一个，非根路径去掉末尾斜杠。
/// 输出再次规范化时保持不变。
pub fn canonical_path(raw: &str) -> String {
    let raw = raw.trim();
    let strip_suffix = |s: &str| s.split(['?', '#']).next().unwrap_or_default().to_string();

    // 以 `/` 开头的输入按路径处理，避免 `//x` 被当作无协议 URL
    let path = if raw.starts_with('/') {
        strip_suffix(raw)
    } else {
        let parsed = Url::parse(raw)
            .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(raw)));
        match parsed {
            Ok(url) => url.path().to_string(),
            Err(_) => strip_suffix(raw),
        }
    };

    let trimmed = path.trim_end_matches('/').trim_start_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// 聚合页面浏览量
///
/// 同一规范路径的浏览量相加，排除根路径，按浏览量降序（相同则按路径升序），取前 `n` 个。
pub fn aggregate_top_pages<I>(rows: I, n: usize) -> Vec<PageViews>
where
    I: IntoIterator<Item = PageViewRow>,
{
    let mut totals: HashMap<String, u64> = HashMap::new();
    for PageViewRow(url, views) in rows {
        *totals.entry(canonical_path(&url)).or_default() += views;
    }

    let mut pages: Vec<PageViews> = totals
        .into_iter()
        .filter(|(path, _)| path != "/")
        .map(|(path, views)| PageViews { path, views })
        .collect();

    pages.sort_by(|a, b| b.views.cmp(&a.views).then_with(|| a.path.cmp(&b.path)));
    pages.truncate(n);
    pages
}

fn invalid_day(day: &str) -> AdminError {
    AdminError::analytics_service(format!("Unrecognized day value: {}", day))
}

/// `(day, users)` → `{date: "Jan 5", users}`
pub fn format_daily_active(rows: Vec<DailyActiveRow>) -> Result<Vec<DailyActiveUsers>> {
    rows.into_iter()
        .map(|DailyActiveRow(day, users)| {
            let dt = parse_timestamp(&day).ok_or_else(|| invalid_day(&day))?;
            Ok(DailyActiveUsers {
                date: dt.format("%b %-d").to_string(),
                users,
            })
        })
        .collect()
}

/// `(day, desktop, mobile)` → `{date: "YYYY-MM-DD", desktop, mobile}`，保持原顺序
pub fn format_device_users(rows: Vec<DeviceRow>) -> Result<Vec<DeviceUsers>> {
    rows.into_iter()
        .map(|DeviceRow(day, desktop, mobile)| {
            let dt = parse_timestamp(&day).ok_or_else(|| invalid_day(&day))?;
            Ok(DeviceUsers {
                date: dt.format("%Y-%m-%d").to_string(),
                desktop,
                mobile,
            })
        })
        .collect()
}

/// 名称缺失时依次回退到邮箱、"Unknown"
pub fn format_top_users(rows: Vec<TopUserRow>) -> Vec<TopUser> {
    rows.into_iter()
        .map(|TopUserRow(name, email, pageviews)| TopUser {
            name: name
                .filter(|n| !n.is_empty())
                .or(email.filter(|e| !e.is_empty()))
                .unwrap_or_else(|| "Unknown".to_string()),
            activity: pageviews,
        })
        .collect()
}

/// 整理会话列表
///
/// 最后一个事件距 `now` 不足 30 分钟的会话视为活跃，
/// 活跃会话的时长按 `now - start` 实时计算。
pub fn shape_sessions(rows: Vec<SessionRow>, limit: usize, now: DateTime<Utc>) -> SessionsPage {
    let threshold = chrono::Duration::minutes(ACTIVITY_THRESHOLD_MINUTES);

    let sessions: Vec<UserSession> = rows
        .into_iter()
        .map(|SessionRow(id, start_time, end_time, duration, browser, os)| {
            let last_seen = end_time.as_deref().and_then(parse_timestamp_utc);
            let is_active = last_seen.is_some_and(|seen| now - seen < threshold);

            let duration_seconds = if is_active {
                parse_timestamp_utc(&start_time)
                    .map(|start| {
                        let millis = (now - start).num_milliseconds().max(0);
                        (millis as f64 / 1000.0).round() as i64
                    })
                    .or(duration)
            } else {
                duration
            };

            UserSession {
                id: id.unwrap_or_default(),
                start_time,
                end_time,
                duration_seconds,
                browser,
                os,
                is_active,
            }
        })
        .collect();

    SessionsPage {
        has_next_page: sessions.len() == limit,
        sessions,
    }
}
