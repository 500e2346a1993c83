//! 状态快照数据模型
//!
//! 磁盘格式（JSON，键有序）：
//!
//! ```json
//! {
//!   "last_run": "2026-01-12T01:00:00Z",
//!   "sent": {
//!     "2501.01234": { "sent_at": "2026-01-12T01:00:00Z", "updated": "2026-01-11T18:00:00Z" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 去掉末尾版本号：`2501.01234v2` -> `2501.01234`
///
/// 仅当最后一个 `v` 之后全是数字（且至少一位）时才剥离，否则原样返回。
pub fn base_identity(paper_id: &str) -> &str {
    let id = paper_id.trim();
    match id.rsplit_once('v') {
        Some((base, version))
            if !version.is_empty() && version.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => id,
    }
}

/// 单篇论文（按 base id）的最近一次投递记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeenRecord {
    /// 投递时该论文版本的 updated 时间
    #[serde(rename = "updated")]
    pub last_updated: DateTime<Utc>,
    /// 记录投递的时间（系统时钟，UTC）
    pub sent_at: DateTime<Utc>,
}

/// 完整状态快照：已投递记录 + 上次成功保存时间
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
    pub sent: BTreeMap<String, SeenRecord>,
}

impl StateSnapshot {
    pub fn get(&self, paper_id: &str) -> Option<&SeenRecord> {
        self.sent.get(base_identity(paper_id))
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }
}
