//! # PiCar HAL
//!
//! 硬件抽象层：控制核心只通过本 crate 的 trait 访问执行器、传感器和视觉。
//!
//! - [`Actuators`] - 舵机角度 / 电机油门 / 全停
//! - [`LineSensor`] - 数字输入（红外巡线传感器）
//! - [`Camera`] / [`Detector`] - 取帧与目标检测（外部推理服务的黑盒接口）
//! - [`Clock`] - 单调时钟与休眠（控制循环定时）
//!
//! 物理驱动（PWM 舵机板、电机驱动、GPIO）不在本 crate 中实现，
//! 由上层在进程启动时提供具体实现。[`sim`] 模块提供可脚本化的模拟后端，
//! 用于测试和 CLI 的 dry-run。

mod clock;
mod error;
mod traits;
mod types;

pub mod sim;

pub use clock::{Clock, SystemClock};
pub use error::HalError;
pub use traits::{Actuators, Camera, Detector, LineSensor, read_triplet};
pub use types::{DetectionBox, DriveDirection, Frame, SensorPins, SensorTriplet};
