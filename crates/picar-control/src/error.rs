//! 控制层错误类型定义

use picar_hal::HalError;
use thiserror::Error;

use crate::config::ConfigError;

/// 连续硬件错误容忍次数
///
/// 单次执行器 / 感知错误只记录日志并继续；连续超过此次数才中止控制循环。
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// 控制错误
#[derive(Debug, Error)]
pub enum ControlError {
    /// 硬件错误
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),

    /// 连续错误超过阈值
    #[error("Consecutive hardware failures: {count}, last error: {last_error}")]
    ConsecutiveFailures {
        count: u32,
        #[source]
        last_error: HalError,
    },

    /// 配置错误
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// 连续失败计数器
///
/// 成功一次即清零；连续失败超过 `max` 次时返回 [`ControlError::ConsecutiveFailures`]。
#[derive(Debug, Clone)]
pub(crate) struct FailureBudget {
    count: u32,
    max: u32,
}

impl FailureBudget {
    pub(crate) fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    /// 记录一次操作结果
    ///
    /// - `Ok(Some(v))`: 操作成功
    /// - `Ok(None)`: 操作失败但仍在容忍范围内
    /// - `Err(..)`: 连续失败超过阈值
    pub(crate) fn absorb<T>(&mut self, result: Result<T, HalError>) -> Result<Option<T>, ControlError> {
        match result {
            Ok(value) => {
                self.count = 0;
                Ok(Some(value))
            },
            Err(e) => {
                self.count += 1;
                if self.count > self.max {
                    return Err(ControlError::ConsecutiveFailures {
                        count: self.count,
                        last_error: e,
                    });
                }
                tracing::warn!("Hardware hiccup ({}/{}): {}", self.count, self.max, e);
                Ok(None)
            },
        }
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> u32 {
        self.count
    }
}
