//! 开环定时动作：90° 转弯与定时直行
//!
//! 没有传感器反馈，完全由角度、速度和时长决定。
//! 驱动期间的等待按控制周期切片，每片检查一次停止标志。

use std::time::Duration;

use picar_hal::{Actuators, Clock, DriveDirection};
use tracing::info;

use crate::chassis::Chassis;
use crate::config::{RobotConfig, TurnConfig, TurnsConfig};
use crate::error::ControlError;
use crate::stop::StopFlag;

/// 预设转弯
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    /// 左转 90°（倒车入位）
    Left,
    /// 回正 90°
    Return,
}

impl TurnsConfig {
    pub fn get(&self, kind: TurnKind) -> &TurnConfig {
        match kind {
            TurnKind::Left => &self.left,
            TurnKind::Return => &self.ret,
        }
    }
}

/// 动作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManeuverOutcome {
    Completed,
    Interrupted,
}

/// 定时转弯
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnManeuver {
    pub steer_deg: f64,
    pub direction: DriveDirection,
    pub speed: f64,
    pub duration: Duration,
}

impl From<&TurnConfig> for TurnManeuver {
    fn from(config: &TurnConfig) -> Self {
        Self {
            steer_deg: config.steer_deg,
            direction: config.direction,
            speed: config.speed,
            duration: config.duration(),
        }
    }
}

/// 开环动作执行器
pub struct ManeuverRunner<A: Actuators, C: Clock> {
    chassis: Chassis<A>,
    clock: C,
    turns: TurnsConfig,
    slice: Duration,
}

impl<A: Actuators, C: Clock> ManeuverRunner<A, C> {
    pub fn new(actuators: A, clock: C, config: &RobotConfig) -> Self {
        Self {
            chassis: Chassis::new(actuators, &config.hardware, config.steering.center_deg),
            clock,
            turns: config.turns,
            slice: config.line.loop_period(),
        }
    }

    pub fn into_inner(self) -> (A, C) {
        (self.chassis.into_inner(), self.clock)
    }

    fn settle(&self, ms: u64) {
        self.clock.sleep(Duration::from_millis(ms));
    }

    /// 可中断的等待；被中断返回 `false`
    fn wait(&self, duration: Duration, stop: &StopFlag) -> bool {
        let start = self.clock.now();
        loop {
            if stop.is_raised() {
                return false;
            }
            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed >= duration {
                return true;
            }
            self.clock.sleep((duration - elapsed).min(self.slice));
        }
    }

    fn interrupted(&mut self) -> Result<ManeuverOutcome, ControlError> {
        info!("Maneuver interrupted");
        self.chassis.halt()?;
        Ok(ManeuverOutcome::Interrupted)
    }

    /// 执行预设转弯
    pub fn turn_preset(
        &mut self,
        kind: TurnKind,
        stop: &StopFlag,
    ) -> Result<ManeuverOutcome, ControlError> {
        let maneuver = TurnManeuver::from(self.turns.get(kind));
        info!("Turn {:?}: {:?}", kind, maneuver);
        self.turn(&maneuver, stop)
    }

    /// 停车 → 回正 → 打方向 → 定时驱动 → 停车 → 回正
    pub fn turn(
        &mut self,
        maneuver: &TurnManeuver,
        stop: &StopFlag,
    ) -> Result<ManeuverOutcome, ControlError> {
        let t = self.turns;
        self.chassis.stop()?;
        self.chassis.center()?;
        self.settle(t.center_settle_ms);

        self.chassis.steer(maneuver.steer_deg)?;
        self.settle(t.steer_settle_ms);

        self.chassis.drive(maneuver.direction, maneuver.speed)?;
        if !self.wait(maneuver.duration, stop) {
            return self.interrupted();
        }

        self.chassis.stop()?;
        self.settle(t.stop_settle_ms);
        self.chassis.center()?;
        self.settle(t.steer_settle_ms);
        info!("Turn done");
        Ok(ManeuverOutcome::Completed)
    }

    /// 回正后以固定速度直行一段时间
    pub fn timed_drive(
        &mut self,
        direction: DriveDirection,
        speed: Option<f64>,
        duration: Duration,
        stop: &StopFlag,
    ) -> Result<ManeuverOutcome, ControlError> {
        let speed = speed.unwrap_or(self.turns.straight_speed);
        info!("Timed drive {} at {:.2} for {:?}", direction, speed, duration);
        self.chassis.center()?;
        self.settle(self.turns.center_settle_ms);

        self.chassis.drive(direction, speed)?;
        if !self.wait(duration, stop) {
            return self.interrupted();
        }
        self.chassis.stop()?;
        Ok(ManeuverOutcome::Completed)
    }
}
