//! 硬件抽象层错误类型定义

use thiserror::Error;

/// HAL 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HalError {
    /// 执行器写入失败（舵机 / 电机通道）
    #[error("Actuator error on channel {channel}: {reason}")]
    Actuator { channel: u8, reason: String },

    /// 传感器读取失败
    #[error("Sensor error on pin {pin}: {reason}")]
    Sensor { pin: u8, reason: String },

    /// 相机取帧失败
    #[error("Camera error: {0}")]
    Camera(String),

    /// 检测器（推理服务）失败
    #[error("Detector error: {0}")]
    Detector(String),

    /// 油门超出 [-1, 1]
    #[error("Invalid throttle {0} (must be within [-1.0, 1.0])")]
    InvalidThrottle(f64),
}
