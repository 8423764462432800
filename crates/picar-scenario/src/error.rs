//! 场景编排错误类型

use thiserror::Error;

/// 场景错误
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// 阶段进程启动失败
    #[error("Failed to spawn stage `{stage}`: {source}")]
    Spawn {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    /// 等待进程失败
    #[error("Failed to wait for process: {0}")]
    Wait(#[from] std::io::Error),

    /// 发送信号失败
    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },
}
