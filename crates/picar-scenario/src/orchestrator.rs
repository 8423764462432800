//! # 场景编排器
//!
//! 严格按顺序运行各阶段：前一个阶段（包括强制结束后的清理）完全退出后，
//! 才会启动下一个阶段。阶段异常退出只记录日志，场景继续；
//! 只有外部中止请求会在下一个阶段开始前停止编排。

use std::time::Duration;

use picar_control::StopFlag;
use picar_control::config::ScenarioConfig;
use picar_hal::Clock;
use tracing::{error, info, warn};

use crate::error::ScenarioError;
use crate::plan::ScenarioPlan;
use crate::process::{ProcessControl, StageSpec, WaitStatus};

/// 超时升级策略：terminate → 等待 grace → kill → 等待退出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    pub grace: Duration,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(2),
        }
    }
}

/// 单个阶段的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// 正常结束（退出码 0）
    Completed,
    /// 非零退出或被信号终止
    Failed { code: Option<i32> },
    /// 超时被终止；`killed` 表示宽限期后仍需强制结束
    TimedOut { killed: bool },
    SpawnFailed,
    /// 运行中收到中止请求
    Aborted,
}

/// 阶段报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub name: String,
    pub outcome: StageOutcome,
    pub elapsed: Duration,
}

/// 场景报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioReport {
    pub stages: Vec<StageReport>,
    /// 是否因中止请求提前结束
    pub aborted: bool,
}

impl ScenarioReport {
    /// 所有阶段都正常结束或按计划超时
    pub fn all_ok(&self) -> bool {
        !self.aborted
            && self.stages.iter().all(|s| {
                matches!(
                    s.outcome,
                    StageOutcome::Completed | StageOutcome::TimedOut { .. }
                )
            })
    }
}

/// 场景编排器
pub struct Orchestrator<P: ProcessControl, C: Clock> {
    process: P,
    clock: C,
    policy: EscalationPolicy,
    /// 阶段之间的稳定等待
    settle: Duration,
    /// 运行中检查中止标志的间隔
    poll: Duration,
}

impl<P: ProcessControl, C: Clock> Orchestrator<P, C> {
    pub fn new(process: P, clock: C) -> Self {
        Self {
            process,
            clock,
            policy: EscalationPolicy::default(),
            settle: Duration::from_millis(500),
            poll: Duration::from_millis(100),
        }
    }

    pub fn from_config(process: P, clock: C, config: &ScenarioConfig) -> Self {
        Self::new(process, clock)
            .with_policy(EscalationPolicy {
                grace: config.grace(),
            })
            .with_settle(config.stage_settle())
            .with_poll(config.poll())
    }

    pub fn with_policy(mut self, policy: EscalationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_poll(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    /// 依次运行计划中的所有阶段
    pub fn run_scenario(&mut self, plan: &ScenarioPlan, abort: &StopFlag) -> ScenarioReport {
        info!("Scenario `{}` started ({} stages)", plan.name, plan.stages.len());
        let mut report = ScenarioReport::default();

        for (index, stage) in plan.stages.iter().enumerate() {
            if abort.is_raised() {
                warn!("Abort requested, skipping remaining stages");
                report.aborted = true;
                break;
            }

            info!(
                "[STEP {}/{}] {} ({})",
                index + 1,
                plan.stages.len(),
                stage.name,
                stage.command_line()
            );
            let start = self.clock.now();
            let outcome = self.run_stage(stage, abort);
            let elapsed = self.clock.now().saturating_sub(start);

            match outcome {
                StageOutcome::Completed => info!("Stage `{}` completed in {:?}", stage.name, elapsed),
                StageOutcome::TimedOut { killed } => info!(
                    "Stage `{}` stopped after timeout (killed: {})",
                    stage.name, killed
                ),
                other => error!("Stage `{}` ended abnormally: {:?}", stage.name, other),
            }
            report.stages.push(StageReport {
                name: stage.name.clone(),
                outcome,
                elapsed,
            });

            if outcome == StageOutcome::Aborted {
                report.aborted = true;
                break;
            }
            // 等待上一阶段的执行器输出释放
            self.clock.sleep(self.settle);
        }

        info!("Scenario `{}` finished", plan.name);
        report
    }

    /// 运行单个阶段直到退出、超时或中止
    pub fn run_stage(&mut self, stage: &StageSpec, abort: &StopFlag) -> StageOutcome {
        let mut handle = match self.process.spawn(stage) {
            Ok(handle) => handle,
            Err(e) => {
                error!("{}", e);
                return StageOutcome::SpawnFailed;
            },
        };

        match self.supervise(stage, &mut handle, abort) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Lost track of stage `{}`: {}", stage.name, e);
                if let Err(e) = self.escalate(&mut handle) {
                    error!("Failed to stop stage `{}`: {}", stage.name, e);
                }
                StageOutcome::Failed { code: None }
            },
        }
    }

    fn supervise(
        &mut self,
        stage: &StageSpec,
        handle: &mut P::Handle,
        abort: &StopFlag,
    ) -> Result<StageOutcome, ScenarioError> {
        let start = self.clock.now();
        loop {
            if abort.is_raised() {
                warn!("Abort requested while `{}` is running", stage.name);
                self.escalate(handle)?;
                return Ok(StageOutcome::Aborted);
            }

            let slice = match stage.timeout {
                Some(timeout) => {
                    let elapsed = self.clock.now().saturating_sub(start);
                    if elapsed >= timeout {
                        info!("Stage `{}` reached its {:?} timeout", stage.name, timeout);
                        let killed = self.escalate(handle)?;
                        return Ok(StageOutcome::TimedOut { killed });
                    }
                    (timeout - elapsed).min(self.poll)
                },
                None => self.poll,
            };

            if let WaitStatus::Exited(info) = self.process.wait(handle, Some(slice))? {
                if info.success() {
                    return Ok(StageOutcome::Completed);
                }
                warn!("Stage `{}` exited with {}", stage.name, info);
                return Ok(StageOutcome::Failed { code: info.code });
            }
        }
    }

    /// terminate → 等待 grace → kill → 等待退出；返回是否需要强制结束
    fn escalate(&mut self, handle: &mut P::Handle) -> Result<bool, ScenarioError> {
        self.process.terminate(handle)?;
        if let WaitStatus::Exited(info) = self.process.wait(handle, Some(self.policy.grace))? {
            info!("Stage exited after terminate ({})", info);
            return Ok(false);
        }

        warn!(
            "Stage still alive {:?} after terminate, killing",
            self.policy.grace
        );
        self.process.kill(handle)?;
        self.process.wait(handle, None)?;
        Ok(true)
    }
}
