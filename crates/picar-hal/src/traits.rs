//! 硬件接口 trait
//!
//! 控制器在构造时接收这些接口对象，并在一次控制循环运行期间独占它们，
//! 不存在全局共享的硬件句柄。

use crate::error::HalError;
use crate::types::{DetectionBox, Frame, SensorPins, SensorTriplet};

/// 执行器接口（PWM 舵机 + 直流电机）
///
/// 写入为 fire-and-forget：调用返回即视为已下发，不等待硬件确认。
pub trait Actuators {
    /// 设置舵机角度（度）
    fn set_servo_angle(&mut self, channel: u8, degrees: f64) -> Result<(), HalError>;

    /// 设置电机油门，`value` 必须在 `[-1.0, 1.0]` 内
    fn set_motor_throttle(&mut self, channel: u8, value: f64) -> Result<(), HalError>;

    /// 停止全部电机输出
    fn stop_all(&mut self) -> Result<(), HalError>;
}

/// 数字输入接口（巡线传感器）
pub trait LineSensor {
    fn read_digital(&mut self, pin: u8) -> Result<bool, HalError>;
}

/// 相机接口
pub trait Camera {
    fn get_frame(&mut self) -> Result<Frame, HalError>;
}

/// 目标检测接口（外部推理服务的黑盒）
pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionBox>, HalError>;
}

/// 一次读取三个巡线传感器
pub fn read_triplet<S: LineSensor + ?Sized>(
    sensor: &mut S,
    pins: &SensorPins,
) -> Result<SensorTriplet, HalError> {
    Ok(SensorTriplet {
        left: sensor.read_digital(pins.left)?,
        middle: sensor.read_digital(pins.middle)?,
        right: sensor.read_digital(pins.right)?,
    })
}

impl<T: Actuators + ?Sized> Actuators for &mut T {
    fn set_servo_angle(&mut self, channel: u8, degrees: f64) -> Result<(), HalError> {
        (**self).set_servo_angle(channel, degrees)
    }

    fn set_motor_throttle(&mut self, channel: u8, value: f64) -> Result<(), HalError> {
        (**self).set_motor_throttle(channel, value)
    }

    fn stop_all(&mut self) -> Result<(), HalError> {
        (**self).stop_all()
    }
}

impl<T: LineSensor + ?Sized> LineSensor for &mut T {
    fn read_digital(&mut self, pin: u8) -> Result<bool, HalError> {
        (**self).read_digital(pin)
    }
}

impl<T: Camera + ?Sized> Camera for &mut T {
    fn get_frame(&mut self) -> Result<Frame, HalError> {
        (**self).get_frame()
    }
}

impl<T: Detector + ?Sized> Detector for &mut T {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectionBox>, HalError> {
        (**self).detect(frame)
    }
}

impl<T: Actuators + ?Sized> Actuators for Box<T> {
    fn set_servo_angle(&mut self, channel: u8, degrees: f64) -> Result<(), HalError> {
        (**self).set_servo_angle(channel, degrees)
    }

    fn set_motor_throttle(&mut self, channel: u8, value: f64) -> Result<(), HalError> {
        (**self).set_motor_throttle(channel, value)
    }

    fn stop_all(&mut self) -> Result<(), HalError> {
        (**self).stop_all()
    }
}
