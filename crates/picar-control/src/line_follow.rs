//! # 巡线控制器
//!
//! 以固定周期读取三路巡线传感器，输出转向角与驱动速度。
//!
//! 每个 tick 按固定优先级判断，前面的分支命中后直接返回：
//!
//! 1. 十字 / 终点 `(1,1,1)`：停车、回正，按方向配置结束或短暂停顿
//! 2. 丢线 `(0,0,0)`：分阶段恢复（沿行驶方向蠕行 → 反向蠕行 → 扫摆）
//! 3. 右弯锁存：右传感器亮、左传感器灭时锁定最大右转 + 低速，中间亮且右灭时释放
//! 4. 比例控制：`error = R - L`（前进）或 `L - R`（倒车）
//!
//! 转向先钳位到 `[right_max, left_max]` 再做指数平滑；
//! 速度随转向偏离中心线性降低，并经过每 tick 的斜率限制。

use std::time::Duration;

use picar_hal::{
    Actuators, Clock, DriveDirection, HalError, LineSensor, SensorPins, SensorTriplet,
    read_triplet,
};
use tracing::{debug, error, info, warn};

use crate::chassis::Chassis;
use crate::config::{CrossAction, LineFollowConfig, RobotConfig, SteeringConfig};
use crate::error::{ControlError, FailureBudget, MAX_CONSECUTIVE_FAILURES};
use crate::stop::StopFlag;

/// 斜率限制：`prev` 向 `raw` 最多移动 `slew`，结果钳位到 `[0, 1]`
pub fn slew_limit(prev: f64, raw: f64, slew: f64) -> f64 {
    let delta = (raw - prev).clamp(-slew, slew);
    (prev + delta).clamp(0.0, 1.0)
}

/// 指数平滑：`α * prev + (1 - α) * target`
pub fn smooth_steer(prev: f64, target: f64, alpha: f64) -> f64 {
    alpha * prev + (1.0 - alpha) * target
}

/// 巡线控制状态
///
/// 一次控制器运行期间有效，每个 tick 更新一次，退出时重置为中立。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub current_steer_deg: f64,
    pub prev_pwm: f64,
    /// 最近一次比例控制的误差（丢线时用其符号决定转向）
    pub last_error: i32,
    /// 连续丢线 tick 数
    pub lost_count: u32,
    /// 右弯锁存持续的 tick 数（0 = 未锁存）
    pub corner_frames: u32,
}

impl ControlState {
    pub fn neutral(center_deg: f64) -> Self {
        Self {
            current_steer_deg: center_deg,
            prev_pwm: 0.0,
            last_error: 0,
            lost_count: 0,
            corner_frames: 0,
        }
    }
}

/// 单个 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// 遇到终点标记（十字动作为 `Finish`）
    Finished,
}

/// 巡线结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 到达终点标记
    Finished,
    /// 达到设定时长
    DurationElapsed,
    /// 外部停止信号
    Interrupted,
}

/// 一次巡线运行的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRunSummary {
    pub ticks: u64,
    pub reason: StopReason,
    /// 丢线次数（连续丢线算一次）
    pub lost_events: u64,
    /// 右弯锁存次数
    pub corner_events: u64,
}

/// 巡线控制器
pub struct LineFollower<A: Actuators, S: LineSensor, C: Clock> {
    chassis: Chassis<A>,
    sensor: S,
    clock: C,
    config: LineFollowConfig,
    steering: SteeringConfig,
    pins: SensorPins,
    direction: DriveDirection,
    cross_action: CrossAction,
    state: ControlState,
    lost_events: u64,
    corner_events: u64,
}

impl<A: Actuators, S: LineSensor, C: Clock> LineFollower<A, S, C> {
    /// 创建控制器；十字动作取该方向的配置值
    pub fn new(
        actuators: A,
        sensor: S,
        clock: C,
        config: &RobotConfig,
        direction: DriveDirection,
    ) -> Self {
        let center = config.steering.center_deg;
        Self {
            chassis: Chassis::new(actuators, &config.hardware, center),
            sensor,
            clock,
            config: config.line.for_direction(direction),
            steering: config.steering,
            pins: config.hardware.line_pins,
            direction,
            cross_action: config.line.cross_action(direction),
            state: ControlState::neutral(center),
            lost_events: 0,
            corner_events: 0,
        }
    }

    /// 覆盖十字动作
    pub fn with_cross_action(mut self, action: CrossAction) -> Self {
        self.cross_action = action;
        self
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn direction(&self) -> DriveDirection {
        self.direction
    }

    pub fn into_parts(self) -> (A, S, C) {
        (self.chassis.into_inner(), self.sensor, self.clock)
    }

    /// 当前转向偏角对应的目标速度（未做斜率限制）
    fn speed_for_steer(&self, steer_deg: f64) -> f64 {
        let deviation = (steer_deg - self.steering.center_deg).abs();
        (self.config.base_speed - deviation * self.config.turn_slowdown_gain)
            .clamp(self.config.min_speed, 1.0)
    }

    /// 钳位 + 平滑后写入转向舵机
    fn steer_toward(&mut self, target_deg: f64) -> Result<f64, HalError> {
        let target = self.steering.clamp(target_deg);
        let smoothed = smooth_steer(self.state.current_steer_deg, target, self.config.smooth_alpha);
        let applied = self.chassis.steer(self.steering.clamp(smoothed))?;
        self.state.current_steer_deg = applied;
        Ok(applied)
    }

    /// 经斜率限制后驱动
    fn drive_limited(&mut self, raw_speed: f64) -> Result<f64, HalError> {
        let speed = slew_limit(self.state.prev_pwm, raw_speed, self.config.pwm_slew);
        self.state.prev_pwm = speed;
        self.chassis.drive(self.direction, speed)?;
        Ok(speed)
    }

    fn stop_drive(&mut self) -> Result<(), HalError> {
        self.state.prev_pwm = 0.0;
        self.chassis.stop()
    }

    /// 执行一个控制 tick
    pub fn tick(&mut self) -> Result<TickOutcome, HalError> {
        let triplet = read_triplet(&mut self.sensor, &self.pins)?;

        if triplet.is_cross() && self.cross_action != CrossAction::Ignore {
            return self.on_cross();
        }

        if triplet.is_lost() {
            self.recover()?;
            return Ok(TickOutcome::Continue);
        }
        self.state.lost_count = 0;

        if triplet.is_right_corner() || self.state.corner_frames > 0 {
            if triplet.releases_corner() {
                info!("Corner latch released at {}", triplet);
                self.state.corner_frames = 0;
            } else {
                if self.state.corner_frames == 0 {
                    self.corner_events += 1;
                    info!("Corner latch engaged at {}", triplet);
                }
                self.state.corner_frames += 1;
                let steer = self.steer_toward(self.steering.right_max_deg)?;
                let speed = self.drive_limited(self.config.corner_speed)?;
                debug!(lmr = %triplet, steer, speed, "corner tick");
                return Ok(TickOutcome::Continue);
            }
        }

        self.follow(triplet)?;
        Ok(TickOutcome::Continue)
    }

    fn on_cross(&mut self) -> Result<TickOutcome, HalError> {
        self.stop_drive()?;
        self.state.current_steer_deg = self.chassis.center()?;
        self.state.lost_count = 0;
        self.state.corner_frames = 0;

        match self.cross_action {
            CrossAction::Finish => {
                info!("Cross/end marker detected, stopping ({})", self.direction);
                Ok(TickOutcome::Finished)
            },
            _ => {
                info!("Cross marker detected, pausing");
                self.clock.sleep(self.config.cross_pause());
                Ok(TickOutcome::Continue)
            },
        }
    }

    /// 丢线分阶段恢复
    fn recover(&mut self) -> Result<(), HalError> {
        self.state.lost_count += 1;
        self.state.corner_frames = 0;
        let stage = self.state.lost_count;
        if stage == 1 {
            self.lost_events += 1;
        }
        warn!("Line lost, recovery stage {}", stage);

        self.stop_drive()?;
        let toward = match self.state.last_error.signum() {
            1 => self.steering.right_max_deg,
            -1 => self.steering.left_max_deg,
            _ => self.steering.center_deg,
        };
        self.steer_toward(toward)?;

        let along = self.direction;
        let creep = self.config.corner_speed;
        if stage <= self.config.creep_along_ticks {
            self.chassis.drive(along, creep)?;
            self.clock.sleep(self.config.recovery_creep());
        } else if stage <= self.config.creep_reverse_ticks {
            self.chassis.drive(along.reversed(), creep)?;
            self.clock.sleep(self.config.recovery_creep());
        } else {
            let (right, left) = (self.steering.right_max_deg, self.steering.left_max_deg);
            for target in [right, left, right] {
                self.steer_toward(target)?;
                self.chassis.drive(along, creep)?;
                self.clock.sleep(self.config.sweep_dwell());
            }
        }
        Ok(())
    }

    /// 比例控制
    fn follow(&mut self, triplet: SensorTriplet) -> Result<(), HalError> {
        let error = match self.direction {
            DriveDirection::Forward => triplet.right_minus_left(),
            DriveDirection::Backward => -triplet.right_minus_left(),
        };
        let target = self.steering.center_deg - self.config.kp * error as f64;
        let steer = self.steer_toward(target)?;
        let raw_speed = self.speed_for_steer(steer);
        let speed = self.drive_limited(raw_speed)?;
        self.state.last_error = error;

        debug!(lmr = %triplet, error, steer, speed, "line tick");
        Ok(())
    }

    /// 停车、回正、重置状态
    fn shutdown(&mut self) -> Result<(), HalError> {
        self.state = ControlState::neutral(self.steering.center_deg);
        self.chassis.halt()
    }

    /// 以固定周期运行，直到终点、超时、停止信号或连续硬件错误
    ///
    /// 任何退出路径都会停车并回正。
    pub fn run(
        &mut self,
        stop: &StopFlag,
        max_duration: Option<Duration>,
    ) -> Result<LineRunSummary, ControlError> {
        info!(
            "Line following {} started (max duration: {:?})",
            self.direction, max_duration
        );
        let start = self.clock.now();
        let mut budget = FailureBudget::new(MAX_CONSECUTIVE_FAILURES);
        let mut ticks = 0u64;
        self.lost_events = 0;
        self.corner_events = 0;
        self.state = ControlState::neutral(self.steering.center_deg);
        if let Err(e) = self.chassis.center() {
            warn!("Failed to center steering: {}", e);
        }

        let reason = loop {
            if stop.is_raised() {
                break StopReason::Interrupted;
            }
            if let Some(max) = max_duration
                && self.clock.now().saturating_sub(start) >= max
            {
                break StopReason::DurationElapsed;
            }

            let outcome = match budget.absorb(self.tick()) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Line following aborted: {}", e);
                    if let Err(halt_err) = self.shutdown() {
                        error!("Failed to halt chassis: {}", halt_err);
                    }
                    return Err(e);
                },
            };
            ticks += 1;
            if outcome == Some(TickOutcome::Finished) {
                break StopReason::Finished;
            }
            self.clock.sleep(self.config.loop_period());
        };

        self.shutdown()?;
        let summary = LineRunSummary {
            ticks,
            reason,
            lost_events: self.lost_events,
            corner_events: self.corner_events,
        };
        info!("Line following stopped: {:?}", summary);
        Ok(summary)
    }
}
