use std::collections::BTreeSet;

use serde::Serialize;

/// 批量操作的选择集
///
/// 批量操作完成后只保留失败的 id，方便客户端重试。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// 只保留失败的 id
    pub fn retain_failed<'a, I>(&mut self, failed: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let failed: BTreeSet<&str> = failed.into_iter().collect();
        self.ids.retain(|id| failed.contains(id.as_str()));
    }
}
