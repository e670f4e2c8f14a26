//! 变更后的缓存失效表
//!
//! 每种实体在变更成功后失效的查询族是固定的，全部集中在 [`RULES`] 中。

use serde::Deserialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::keys::QueryFamily;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Entity {
    User,
    Note,
    Link,
    Subject,
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidationRule {
    pub entity: Entity,
    pub families: &'static [QueryFamily],
    /// 推送给主站的缓存标签
    pub revalidate_tag: Option<&'static str>,
}

const USER_RULE: InvalidationRule = InvalidationRule {
    entity: Entity::User,
    families: &[
        QueryFamily::AdminUsers,
        QueryFamily::LinksFilterOptions,
        QueryFamily::DashboardStats,
    ],
    revalidate_tag: None,
};

const NOTE_RULE: InvalidationRule = InvalidationRule {
    entity: Entity::Note,
    families: &[QueryFamily::AdminNotes, QueryFamily::DashboardStats],
    revalidate_tag: None,
};

const LINK_RULE: InvalidationRule = InvalidationRule {
    entity: Entity::Link,
    families: &[QueryFamily::AdminLinks, QueryFamily::DashboardStats],
    revalidate_tag: None,
};

const SUBJECT_RULE: InvalidationRule = InvalidationRule {
    entity: Entity::Subject,
    families: &[QueryFamily::AdminSubjects, QueryFamily::DashboardStats],
    revalidate_tag: Some("subjects"),
};

pub static RULES: &[InvalidationRule] = &[USER_RULE, NOTE_RULE, LINK_RULE, SUBJECT_RULE];

pub fn rule_for(entity: Entity) -> &'static InvalidationRule {
    match entity {
        Entity::User => &USER_RULE,
        Entity::Note => &NOTE_RULE,
        Entity::Link => &LINK_RULE,
        Entity::Subject => &SUBJECT_RULE,
    }
}
