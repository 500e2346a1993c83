//! 发送状态：记录哪些论文已经推送过，决定本次运行哪些论文需要（重新）推送
//!
//! - **snapshot**: 类型化的状态快照（base id → SeenRecord）与 base id 推导
//! - **store**: StateStore，加载 / 判定 / 标记 / 原子保存
//! - **atomic**: 临时文件 + rename 的原子写入
//!
//! 调用约定：一次运行只有一个 StateStore 实例；`mark_sent` 只能在邮件投递成功后调用，
//! `save` 在整批投递成功后调用一次。投递失败时磁盘上的状态保持不变。

mod atomic;
pub mod snapshot;
pub mod store;

use std::path::PathBuf;

use thiserror::Error;

pub use snapshot::{base_identity, SeenRecord, StateSnapshot};
pub use store::StateStore;

/// 状态文件读写错误；全部视为致命错误（静默重置会导致全部论文重发）
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to read state file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {} is malformed: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to create state directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write temporary state file in {}: {source}", .dir.display())]
    WriteTemp {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to replace state file {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
