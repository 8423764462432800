//! 外部停止信号

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 协作式停止标志
///
/// 克隆共享同一个标志；通常由 Ctrl+C 处理器置位，控制循环每个 tick 检查一次。
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求停止
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// 底层原子标志（供信号处理器等外部代码共享）
    pub fn as_atomic(&self) -> Arc<AtomicBool> {
        self.0.clone()
    }
}

impl From<Arc<AtomicBool>> for StopFlag {
    fn from(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }
}
