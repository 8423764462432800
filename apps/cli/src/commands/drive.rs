//! 底盘命令：巡线、预设转弯、定时直行

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use picar_control::{LineFollower, ManeuverOutcome, ManeuverRunner, StopReason};
use picar_hal::SystemClock;

use super::{Completion, DirectionArg, RunContext, TurnArg};
use crate::bench;

/// 巡线命令参数
#[derive(Args, Debug)]
pub struct LineFollowCommand {
    /// 行驶方向
    #[arg(short, long, value_enum)]
    pub direction: DirectionArg,

    /// 最长运行时间（秒），不指定则运行到终点标记
    #[arg(long)]
    pub duration: Option<f64>,
}

impl LineFollowCommand {
    pub fn execute(&self, ctx: &RunContext) -> Result<Completion> {
        let duration = self.duration.map(seconds).transpose()?;
        let hw = bench::line_bench(&ctx.config);
        let mut follower = LineFollower::new(
            hw.clone(),
            hw,
            SystemClock::new(),
            &ctx.config,
            self.direction.into(),
        );

        println!("🚗 巡线开始（{}）", follower.direction());
        let summary = follower.run(&ctx.stop, duration).context("巡线失败")?;
        println!(
            "✅ 巡线结束: {:?}，{} ticks，丢线 {} 次，右弯 {} 次",
            summary.reason, summary.ticks, summary.lost_events, summary.corner_events
        );

        Ok(match summary.reason {
            StopReason::Interrupted => Completion::Interrupted,
            StopReason::Finished | StopReason::DurationElapsed => Completion::Done,
        })
    }
}

/// 预设转弯命令参数
#[derive(Args, Debug)]
pub struct TurnCommand {
    /// 转弯预设
    #[arg(value_enum)]
    pub kind: TurnArg,
}

impl TurnCommand {
    pub fn execute(&self, ctx: &RunContext) -> Result<Completion> {
        let hw = bench::hardware(&ctx.config);
        let mut runner = ManeuverRunner::new(hw, SystemClock::new(), &ctx.config);

        println!("↩️  转弯: {:?}", self.kind);
        let outcome = runner
            .turn_preset(self.kind.into(), &ctx.stop)
            .context("转弯失败")?;
        Ok(report(outcome))
    }
}

/// 定时直行命令参数
#[derive(Args, Debug)]
pub struct DriveCommand {
    /// 行驶方向
    #[arg(short, long, value_enum)]
    pub direction: DirectionArg,

    /// 行驶时间（秒）
    #[arg(long)]
    pub duration: f64,

    /// 油门（0.0 - 1.0），默认使用配置中的直行速度
    #[arg(short, long)]
    pub speed: Option<f64>,
}

impl DriveCommand {
    pub fn execute(&self, ctx: &RunContext) -> Result<Completion> {
        let duration = seconds(self.duration)?;
        if let Some(speed) = self.speed {
            anyhow::ensure!(
                (0.0..=1.0).contains(&speed),
                "速度必须在 0.0 - 1.0 之间，当前: {}",
                speed
            );
        }

        let hw = bench::hardware(&ctx.config);
        let mut runner = ManeuverRunner::new(hw, SystemClock::new(), &ctx.config);
        let outcome = runner
            .timed_drive(self.direction.into(), self.speed, duration, &ctx.stop)
            .context("直行失败")?;
        Ok(report(outcome))
    }
}

fn report(outcome: ManeuverOutcome) -> Completion {
    match outcome {
        ManeuverOutcome::Completed => {
            println!("✅ 动作完成");
            Completion::Done
        },
        ManeuverOutcome::Interrupted => {
            println!("🛑 动作被中断，已停车");
            Completion::Interrupted
        },
    }
}

/// 秒数转换为时长（拒绝负数和非有限值）
fn seconds(value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("无效的时长: {}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use picar_control::{RobotConfig, StopFlag};

    use crate::settings::ConfigSource;

    fn context() -> RunContext {
        RunContext {
            config: RobotConfig::default(),
            source: ConfigSource::Preset(Default::default()),
            stop: StopFlag::new(),
        }
    }

    #[test]
    fn test_seconds_rejects_negative() {
        assert_eq!(seconds(1.5).unwrap(), Duration::from_millis(1500));
        assert!(seconds(-1.0).is_err());
        assert!(seconds(f64::NAN).is_err());
    }

    #[test]
    fn test_line_follow_interrupted_before_start() {
        let ctx = context();
        ctx.stop.raise();
        let cmd = LineFollowCommand {
            direction: DirectionArg::Backward,
            duration: None,
        };
        assert_eq!(cmd.execute(&ctx).unwrap(), Completion::Interrupted);
    }

    #[test]
    fn test_drive_rejects_bad_speed() {
        let cmd = DriveCommand {
            direction: DirectionArg::Forward,
            duration: 0.1,
            speed: Some(1.5),
        };
        assert!(cmd.execute(&context()).is_err());
    }
}
