//! 列表过滤条件
//!
//! 原始查询参数在这里规范化：`"all"`、空串或纯空白都表示不过滤。
//! 过滤条件同时是缓存键的一部分，因此必须可哈希。

use serde::Deserialize;

use crate::errors::{AdminError, Result};
use crate::storage::models::{LinkKind, Role};

/// 规范化单个过滤值
pub fn normalize(raw: Option<&str>) -> Option<String> {
    match raw.map(str::trim) {
        None | Some("") => None,
        Some(v) if v.eq_ignore_ascii_case("all") => None,
        Some(v) => Some(v.to_string()),
    }
}

/// 规范化搜索词（只去掉空白，"all" 是合法搜索词）
pub fn normalize_search(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// 列表查询的原始参数（来自 HTTP 查询串或 CLI）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub role: Option<String>,
    pub type_filter: Option<String>,
    pub teacher_filter: Option<String>,
    pub semester_filter: Option<String>,
    pub limit: Option<u64>,
    pub page: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

impl UserFilter {
    pub fn from_params(params: &ListParams) -> Result<Self> {
        let role = match normalize(params.role.as_deref()) {
            Some(r) => Some(
                r.parse::<Role>()
                    .map_err(|_| AdminError::validation(format!("Unknown role filter: {}", r)))?,
            ),
            None => None,
        };
        Ok(Self {
            search: normalize_search(params.search.as_deref()),
            role,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NoteFilter {
    pub search: Option<String>,
    pub type_of_file: Option<String>,
    pub teacher: Option<String>,
}

impl NoteFilter {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            search: normalize_search(params.search.as_deref()),
            type_of_file: normalize(params.type_filter.as_deref()),
            teacher: normalize(params.teacher_filter.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LinkFilter {
    pub search: Option<String>,
    /// None 表示两个集合合并
    pub kind: Option<LinkKind>,
    pub teacher: Option<String>,
}

impl LinkFilter {
    pub fn from_params(params: &ListParams) -> Result<Self> {
        let kind = match normalize(params.type_filter.as_deref()) {
            Some(k) => Some(
                k.parse::<LinkKind>().map_err(|_| {
                    AdminError::validation(format!("Unknown link type filter: {}", k))
                })?,
            ),
            None => None,
        };
        Ok(Self {
            search: normalize_search(params.search.as_deref()),
            kind,
            teacher: normalize(params.teacher_filter.as_deref()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SubjectFilter {
    pub search: Option<String>,
    pub semester: Option<String>,
}

impl SubjectFilter {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            search: normalize_search(params.search.as_deref()),
            semester: normalize(params.semester_filter.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_and_blank_mean_no_filter() {
        assert_eq!(normalize(Some("all")), None);
        assert_eq!(normalize(Some("ALL")), None);
        assert_eq!(normalize(Some("   ")), None);
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(" Notes ")), Some("Notes".into()));
        assert_eq!(normalize_search(Some("  ")), None);
    }

    #[test]
    fn test_user_filter() {
        let params = ListParams {
            search: Some(" asha ".into()),
            role: Some("teacher".into()),
            ..Default::default()
        };
        let filter = UserFilter::from_params(&params).unwrap();
        assert_eq!(filter.search.as_deref(), Some("asha"));
        assert_eq!(filter.role, Some(Role::Teacher));

        let bad = ListParams {
            role: Some("janitor".into()),
            ..Default::default()
        };
        assert!(UserFilter::from_params(&bad).is_err());
    }

    #[test]
    fn test_link_filter_kind() {
        let params = ListParams {
            type_filter: Some("form".into()),
            ..Default::default()
        };
        assert_eq!(
            LinkFilter::from_params(&params).unwrap().kind,
            Some(LinkKind::Form)
        );
        let all = ListParams {
            type_filter: Some("all".into()),
            ..Default::default()
        };
        assert_eq!(LinkFilter::from_params(&all).unwrap().kind, None);
    }
}
