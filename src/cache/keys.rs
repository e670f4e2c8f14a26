//! 查询缓存键
//!
//! 每个读取操作对应一个 `QueryKey`，键所属的 `QueryFamily` 是失效的最小单位。

use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString};

use crate::analytics::DevicePeriod;
use crate::pagination::{LinkFilter, NoteFilter, PageRequest, SubjectFilter, UserFilter};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, EnumCount, AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum QueryFamily {
    AdminUsers,
    AdminNotes,
    AdminLinks,
    AdminSubjects,
    NotesFilterOptions,
    LinksFilterOptions,
    SemesterOptions,
    DashboardStats,
    RecentActivity,
    TeacherContributions,
    DailyActiveUsers,
    DeviceUsers,
    TopPages,
    TopUsers,
}

impl QueryFamily {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Users(UserFilter, PageRequest),
    Notes(NoteFilter, PageRequest),
    Links(LinkFilter, PageRequest),
    Subjects(SubjectFilter, PageRequest),
    NotesFilterOptions,
    LinksFilterOptions,
    SemesterOptions,
    DashboardStats,
    RecentActivity,
    TeacherContributions,
    DailyActiveUsers,
    DeviceUsers(DevicePeriod),
    TopPages,
    TopUsers,
}

impl QueryKey {
    pub fn family(&self) -> QueryFamily {
        match self {
            QueryKey::Users(..) => QueryFamily::AdminUsers,
            QueryKey::Notes(..) => QueryFamily::AdminNotes,
            QueryKey::Links(..) => QueryFamily::AdminLinks,
            QueryKey::Subjects(..) => QueryFamily::AdminSubjects,
            QueryKey::NotesFilterOptions => QueryFamily::NotesFilterOptions,
            QueryKey::LinksFilterOptions => QueryFamily::LinksFilterOptions,
            QueryKey::SemesterOptions => QueryFamily::SemesterOptions,
            QueryKey::DashboardStats => QueryFamily::DashboardStats,
            QueryKey::RecentActivity => QueryFamily::RecentActivity,
            QueryKey::TeacherContributions => QueryFamily::TeacherContributions,
            QueryKey::DailyActiveUsers => QueryFamily::DailyActiveUsers,
            QueryKey::DeviceUsers(_) => QueryFamily::DeviceUsers,
            QueryKey::TopPages => QueryFamily::TopPages,
            QueryKey::TopUsers => QueryFamily::TopUsers,
        }
    }
}
