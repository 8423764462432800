//! # 抓取状态机
//!
//! 把帧级的、时有时无的检测结果转换为"抓取 / 重试"决策。
//!
//! ```text
//! SEARCH ──N 帧连续有目标──▶ LOCK ──M 帧同一区域──▶ STEER ──▶ LOWER ──▶ LIFT ──▶ VERIFY
//!   ▲                        │  ▲                                                  │
//!   └──────丢失目标───────────┘  └──────────失败且 attempt <= max_retries（软恢复）───┤
//!   ▲                                                                              │
//!   └──────────────────────────失败且 attempt > max_retries（完全恢复）─────────────┘
//! ```
//!
//! VERIFY 是基于"消失"的启发式：抬起后在原位置仍能看到大框，说明没抓到。
//! 这不是直接的抓取传感器，采样数与阈值都可调。
//!
//! 看门狗：处于 LOWER 或 VERIFY 时，若距上次看到目标超过 `lose_sight_timeout`，
//! 强制软恢复并回到 LOCK。

use std::fmt;
use std::time::Duration;

use picar_hal::{Actuators, Camera, Clock, DetectionBox, Detector, HalError};
use tracing::{debug, error, info, warn};

use crate::arm::ArmSequencer;
use crate::config::{PickConfig, RobotConfig};
use crate::error::{ControlError, FailureBudget, MAX_CONSECUTIVE_FAILURES};
use crate::selector::{Target, TargetSelector, Zone};
use crate::stop::StopFlag;

/// 状态机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickState {
    #[default]
    Search,
    Lock,
    Steer,
    Lower,
    Lift,
    Verify,
}

impl fmt::Display for PickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PickState::Search => "SEARCH",
            PickState::Lock => "LOCK",
            PickState::Steer => "STEER",
            PickState::Lower => "LOWER",
            PickState::Lift => "LIFT",
            PickState::Verify => "VERIFY",
        };
        f.write_str(name)
    }
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionState {
    pub state: PickState,
    /// SEARCH 中连续看到目标的帧数
    pub seen_stable: u32,
    /// LOCK 中目标停留在同一区域的帧数
    pub pos_stable: u32,
    /// 本次锁定后验证失败的次数
    pub attempt: u32,
    /// 上次看到目标的时刻
    pub last_seen: Option<Duration>,
    /// LOCK 中跟踪的区域
    pub locked_zone: Option<Zone>,
}

/// 单步结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    /// 验证通过，`attempts` 为本次抓取尝试次数（含成功那次）
    Success { attempts: u32 },
}

/// 运行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    Grasped { attempts: u32 },
    Interrupted,
}

/// 统计计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickStats {
    pub soft_recoveries: u32,
    pub full_recoveries: u32,
    pub watchdog_trips: u32,
    pub verifications: u32,
}

/// 抓取状态机
pub struct PickPlace<A: Actuators, Cam: Camera, Det: Detector, C: Clock> {
    arm: ArmSequencer<A, C>,
    camera: Cam,
    detector: Det,
    selector: TargetSelector,
    config: PickConfig,
    session: SessionState,
    stats: PickStats,
    perception_failures: FailureBudget,
    actuator_failures: FailureBudget,
}

impl<A, Cam, Det, C> PickPlace<A, Cam, Det, C>
where
    A: Actuators,
    Cam: Camera,
    Det: Detector,
    C: Clock,
{
    pub fn new(actuators: A, camera: Cam, detector: Det, clock: C, config: &RobotConfig) -> Self {
        Self {
            arm: ArmSequencer::new(actuators, clock, config.arm.clone()),
            camera,
            detector,
            selector: TargetSelector::new(&config.vision),
            config: config.pick,
            session: SessionState::default(),
            stats: PickStats::default(),
            perception_failures: FailureBudget::new(MAX_CONSECUTIVE_FAILURES),
            actuator_failures: FailureBudget::new(MAX_CONSECUTIVE_FAILURES),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stats(&self) -> &PickStats {
        &self.stats
    }

    pub fn arm(&mut self) -> &mut ArmSequencer<A, C> {
        &mut self.arm
    }

    fn now(&self) -> Duration {
        self.arm.clock().now()
    }

    fn transition(&mut self, next: PickState) {
        if self.session.state != next {
            info!("[STATE] {} -> {}", self.session.state, next);
            self.session.state = next;
        }
    }

    /// 取一帧并检测
    fn capture(&mut self) -> Result<(Vec<DetectionBox>, u32, u32), HalError> {
        let frame = self.camera.get_frame()?;
        let boxes = self.detector.detect(&frame)?;
        Ok((boxes, frame.width, frame.height))
    }

    /// 本帧的目标；感知错误视为无目标
    fn perceive(&mut self) -> Result<Option<Target>, ControlError> {
        let result = self.capture();
        let Some((boxes, width, height)) = self.perception_failures.absorb(result)? else {
            return Ok(None);
        };
        Ok(self.selector.select(&boxes, width, height))
    }

    /// 执行一个感知 tick：取帧 → 检测 → 选择 → 看门狗 → 状态分派
    pub fn step(&mut self) -> Result<StepOutcome, ControlError> {
        let target = self.perceive()?;
        if target.is_some() {
            self.session.last_seen = Some(self.now());
        }
        if let Some(t) = &target {
            debug!(
                state = %self.session.state,
                zone = %t.zone,
                cx = t.center.0,
                conf = t.bbox.confidence,
                "target"
            );
        }

        let result = if self.watchdog_expired() {
            self.on_watchdog()
        } else {
            self.dispatch(target)
        };

        match result {
            Ok(outcome) => {
                self.actuator_failures.absorb(Ok(()))?;
                Ok(outcome)
            },
            Err(ControlError::Hal(e)) => {
                self.actuator_failures.absorb::<()>(Err(e))?;
                Ok(StepOutcome::Continue)
            },
            Err(e) => Err(e),
        }
    }

    fn watchdog_expired(&self) -> bool {
        if !matches!(self.session.state, PickState::Lower | PickState::Verify) {
            return false;
        }
        let timeout = self.config.lose_sight_timeout();
        let now = self.now();
        self.session
            .last_seen
            .is_some_and(|seen| now.saturating_sub(seen) > timeout)
    }

    fn on_watchdog(&mut self) -> Result<StepOutcome, ControlError> {
        warn!(
            "[WATCHDOG] target lost for more than {:?} in {}, soft recovery",
            self.config.lose_sight_timeout(),
            self.session.state
        );
        self.stats.watchdog_trips += 1;
        self.enter_lock();
        self.arm.recover_soft()?;
        Ok(StepOutcome::Continue)
    }

    fn enter_lock(&mut self) {
        self.session.pos_stable = 0;
        self.session.locked_zone = None;
        self.transition(PickState::Lock);
    }

    fn enter_search(&mut self) {
        self.session.seen_stable = 0;
        self.session.pos_stable = 0;
        self.session.attempt = 0;
        self.session.locked_zone = None;
        self.transition(PickState::Search);
    }

    fn dispatch(&mut self, target: Option<Target>) -> Result<StepOutcome, ControlError> {
        match self.session.state {
            PickState::Search => {
                match target {
                    Some(_) => {
                        self.session.seen_stable += 1;
                        if self.session.seen_stable >= self.config.detect_stable_frames {
                            self.session.attempt = 0;
                            self.enter_lock();
                        }
                    },
                    None => self.session.seen_stable = 0,
                }
                Ok(StepOutcome::Continue)
            },
            PickState::Lock => {
                let Some(target) = target else {
                    info!("Target lost during LOCK");
                    self.enter_search();
                    return Ok(StepOutcome::Continue);
                };
                if self.session.locked_zone == Some(target.zone) {
                    self.session.pos_stable += 1;
                } else {
                    self.session.locked_zone = Some(target.zone);
                    self.session.pos_stable = 1;
                }
                if self.session.pos_stable >= self.config.pos_stable_frames {
                    self.transition(PickState::Steer);
                }
                Ok(StepOutcome::Continue)
            },
            PickState::Steer => {
                let zone = self.session.locked_zone.unwrap_or(Zone::Center);
                self.arm.steer_zone(zone)?;
                self.transition(PickState::Lower);
                Ok(StepOutcome::Continue)
            },
            PickState::Lower => {
                self.arm.grab()?;
                self.transition(PickState::Lift);
                Ok(StepOutcome::Continue)
            },
            PickState::Lift => {
                self.arm.lift_from_pick()?;
                self.drain_frames()?;
                self.session.last_seen = Some(self.now());
                self.transition(PickState::Verify);
                Ok(StepOutcome::Continue)
            },
            PickState::Verify => self.verify(),
        }
    }

    /// 丢弃相机缓冲中的陈旧帧
    fn drain_frames(&mut self) -> Result<(), ControlError> {
        for _ in 0..self.config.drain_frames {
            let frame = self.camera.get_frame();
            self.perception_failures.absorb(frame)?;
            self.arm.clock().sleep(self.config.drain_gap());
        }
        Ok(())
    }

    /// 采样 K 帧，返回 (含大框的帧数, 取帧失败数)
    fn count_large_boxes(&mut self) -> Result<(u32, u32), ControlError> {
        let mut large = 0;
        let mut missed = 0;
        for shot in 0..self.config.verify_shots {
            let result = self.capture();
            match self.perception_failures.absorb(result)? {
                Some((boxes, _, _)) => {
                    if boxes
                        .iter()
                        .any(|b| b.height() >= self.config.large_box_height)
                    {
                        large += 1;
                    }
                },
                None => missed += 1,
            }
            if shot + 1 < self.config.verify_shots {
                self.arm.clock().sleep(self.config.verify_gap());
            }
        }
        Ok((large, missed))
    }

    /// 取帧失败的帧按含大框计
    fn verify(&mut self) -> Result<StepOutcome, ControlError> {
        let (large, missed) = self.count_large_boxes()?;
        self.stats.verifications += 1;
        let threshold = self.config.verify_miss_threshold;
        info!(
            "[VERIFY] large boxes: {}/{}, missed frames: {} (miss threshold {})",
            large, self.config.verify_shots, missed, threshold
        );

        if large + missed < threshold {
            let attempts = self.session.attempt + 1;
            info!("[VERIFY] grasp succeeded after {} attempt(s)", attempts);
            self.session = SessionState::default();
            return Ok(StepOutcome::Success { attempts });
        }

        self.session.attempt += 1;
        if self.session.attempt <= self.config.max_retries {
            warn!(
                "[VERIFY] grasp failed, soft recovery ({}/{})",
                self.session.attempt, self.config.max_retries
            );
            self.stats.soft_recoveries += 1;
            self.enter_lock();
            self.arm.recover_soft()?;
        } else {
            warn!(
                "[VERIFY] grasp failed {} times, full recovery and restart search",
                self.session.attempt
            );
            self.stats.full_recoveries += 1;
            self.enter_search();
            self.arm.recover_full()?;
        }
        Ok(StepOutcome::Continue)
    }

    /// 运行直到抓取成功或外部停止
    ///
    /// 中断时机械臂回到安全姿态。
    pub fn run(&mut self, stop: &StopFlag) -> Result<PickOutcome, ControlError> {
        info!("Pick-and-place started");
        self.session = SessionState::default();
        self.arm.reset_pose()?;
        let period = self.config.tick_period();

        loop {
            if stop.is_raised() {
                info!("Pick-and-place interrupted, moving arm to safe pose");
                self.arm.safe_pose()?;
                return Ok(PickOutcome::Interrupted);
            }

            let tick_start = self.now();
            match self.step() {
                Ok(StepOutcome::Success { attempts }) => {
                    return Ok(PickOutcome::Grasped { attempts });
                },
                Ok(StepOutcome::Continue) => {},
                Err(e) => {
                    error!("Pick-and-place aborted: {}", e);
                    if let Err(pose_err) = self.arm.safe_pose() {
                        error!("Failed to reach safe pose: {}", pose_err);
                    }
                    return Err(e);
                },
            }

            let elapsed = self.now().saturating_sub(tick_start);
            if elapsed < period {
                self.arm.clock().sleep(period - elapsed);
            }
        }
    }
}
