//! StateStore：一次运行内唯一的状态实例
//!
//! 生命周期：`load`（运行开始）→ `should_send`（只读判定）→ `mark_sent`（投递成功后）→ `save`（整批成功后一次）。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::atomic::write_atomic;
use super::snapshot::{base_identity, SeenRecord, StateSnapshot};
use super::StateError;

#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    snapshot: StateSnapshot,
}

impl StateStore {
    /// 加载状态文件；文件不存在时为空快照（首次运行），存在但无法解析时报错，不静默重置
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).map_err(|source| StateError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No state file at {:?}, starting empty", path);
                StateSnapshot::default()
            }
            Err(source) => return Err(StateError::Read { path, source }),
        };
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &StateSnapshot {
        &self.snapshot
    }

    /// 本次是否应推送该论文
    ///
    /// - 从未推送过：推送
    /// - 推送过且 `resend_on_update == false`：不再推送
    /// - 推送过且 `resend_on_update == true`：仅当 updated 与记录不同（出现新版本）时推送
    pub fn should_send(
        &self,
        paper_id: &str,
        updated: DateTime<Utc>,
        resend_on_update: bool,
    ) -> bool {
        match self.snapshot.get(paper_id) {
            None => true,
            Some(_) if !resend_on_update => false,
            Some(record) => record.last_updated != updated,
        }
    }

    /// 记录一次成功投递；同一 base id 重复调用时后写覆盖
    pub fn mark_sent(&mut self, paper_id: &str, updated: DateTime<Utc>) {
        self.snapshot.sent.insert(
            base_identity(paper_id).to_string(),
            SeenRecord {
                last_updated: updated,
                sent_at: Utc::now(),
            },
        );
    }

    /// 更新 last_run 并原子写回磁盘
    pub fn save(&mut self) -> Result<(), StateError> {
        self.snapshot.last_run = Some(Utc::now());
        let data = serde_json::to_string_pretty(&self.snapshot).map_err(StateError::Serialize)?;
        write_atomic(&self.path, data.as_bytes())?;
        tracing::debug!("State saved: {} record(s) -> {:?}", self.snapshot.len(), self.path);
        Ok(())
    }
}
