//! 底盘：前轮转向舵机 + 后轮驱动电机

use picar_hal::{Actuators, DriveDirection, HalError};

use crate::config::{HardwareConfig, MotorConfig};

/// 舵机可寻址角度范围
const SERVO_RANGE: (f64, f64) = (0.0, 180.0);

/// 底盘
///
/// 持有执行器句柄；所有驱动电机同速同向，反接的电机油门取反。
#[derive(Debug)]
pub struct Chassis<A: Actuators> {
    actuators: A,
    steering_channel: u8,
    motors: Vec<MotorConfig>,
    center_deg: f64,
}

impl<A: Actuators> Chassis<A> {
    pub fn new(actuators: A, hardware: &HardwareConfig, center_deg: f64) -> Self {
        Self {
            actuators,
            steering_channel: hardware.steering_channel,
            motors: hardware.motors.clone(),
            center_deg,
        }
    }

    /// 设置转向角（仅钳位到舵机物理范围，不做巡线限幅）
    ///
    /// 返回实际写入的角度。
    pub fn steer(&mut self, degrees: f64) -> Result<f64, HalError> {
        let degrees = degrees.clamp(SERVO_RANGE.0, SERVO_RANGE.1);
        self.actuators.set_servo_angle(self.steering_channel, degrees)?;
        Ok(degrees)
    }

    /// 转向回正
    pub fn center(&mut self) -> Result<f64, HalError> {
        self.steer(self.center_deg)
    }

    /// 以 `speed ∈ [0, 1]` 向指定方向行驶
    pub fn drive(&mut self, direction: DriveDirection, speed: f64) -> Result<(), HalError> {
        let throttle = direction.sign() * speed.clamp(0.0, 1.0);
        for motor in &self.motors {
            let value = if motor.inverted { -throttle } else { throttle };
            self.actuators.set_motor_throttle(motor.channel, value)?;
        }
        Ok(())
    }

    /// 停车
    pub fn stop(&mut self) -> Result<(), HalError> {
        self.actuators.stop_all()
    }

    pub fn center_deg(&self) -> f64 {
        self.center_deg
    }

    /// 尽力进入安全状态：停车并回正，两个动作都会尝试
    pub fn halt(&mut self) -> Result<(), HalError> {
        let stopped = self.stop();
        let centered = self.center().map(|_| ());
        stopped.and(centered)
    }

    pub fn into_inner(self) -> A {
        self.actuators
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picar_hal::sim::{SimEvent, SimHardware};

    use crate::config::{RobotConfig, RobotVariant};

    #[test]
    fn test_drive_respects_direction_and_inversion() {
        let config = RobotConfig::preset(RobotVariant::Mk2);
        let hw = SimHardware::new([22, 27, 17]);
        let mut chassis = Chassis::new(hw.clone(), &config.hardware, 90.0);

        chassis.drive(DriveDirection::Forward, 0.3).unwrap();
        // Mk2 电机反接
        assert_eq!(hw.motor_throttle(1), -0.3);
        assert_eq!(hw.motor_throttle(2), -0.3);

        chassis.drive(DriveDirection::Backward, 0.2).unwrap();
        assert_eq!(hw.motor_throttle(1), 0.2);
    }

    #[test]
    fn test_steer_clamps_to_servo_range() {
        let config = RobotConfig::default();
        let hw = SimHardware::new([19, 16, 20]);
        let mut chassis = Chassis::new(hw.clone(), &config.hardware, 90.0);

        assert_eq!(chassis.steer(250.0).unwrap(), 180.0);
        assert_eq!(chassis.steer(-10.0).unwrap(), 0.0);
        assert_eq!(hw.servo_angle(0), Some(0.0));
    }

    #[test]
    fn test_halt_stops_then_centers() {
        let config = RobotConfig::default();
        let hw = SimHardware::new([19, 16, 20]);
        let mut chassis = Chassis::new(hw.clone(), &config.hardware, 90.0);
        chassis.drive(DriveDirection::Forward, 0.5).unwrap();
        hw.clear_events();

        chassis.halt().unwrap();
        assert_eq!(
            hw.commands(),
            vec![
                SimEvent::StopAll,
                SimEvent::Servo {
                    channel: 0,
                    degrees: 90.0
                }
            ]
        );
        assert_eq!(hw.motor_throttle(0), 0.0);
    }
}
