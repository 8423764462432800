//! 机械臂命令：抓取、放入箱子、复位

use anyhow::{Context, Result};
use clap::Args;
use picar_control::{ArmSequencer, PickOutcome, PickPlace};
use picar_hal::SystemClock;
use tracing::warn;

use super::{Completion, RunContext};
use crate::bench;

/// 搜索并抓取目标
pub fn pick(ctx: &RunContext) -> Result<Completion> {
    let hw = bench::pick_bench(&ctx.config);
    let mut machine = PickPlace::new(
        hw.clone(),
        hw.clone(),
        hw,
        SystemClock::new(),
        &ctx.config,
    );

    println!("🔍 开始搜索目标...");
    let outcome = machine.run(&ctx.stop).context("抓取失败")?;
    let stats = machine.stats();
    println!(
        "📊 软恢复 {} 次，完全恢复 {} 次，看门狗 {} 次，验证 {} 次",
        stats.soft_recoveries, stats.full_recoveries, stats.watchdog_trips, stats.verifications
    );

    Ok(match outcome {
        PickOutcome::Grasped { attempts } => {
            println!("✅ 抓取成功（第 {} 次尝试）", attempts);
            Completion::Done
        },
        PickOutcome::Interrupted => {
            println!("🛑 抓取被中断，机械臂已回到安全姿态");
            Completion::Interrupted
        },
    })
}

/// 放入箱子命令参数
#[derive(Args, Debug)]
pub struct PlaceCommand {
    /// 放置后复位机械臂
    #[arg(long)]
    pub reset: bool,
}

impl PlaceCommand {
    pub fn execute(&self, ctx: &RunContext) -> Result<Completion> {
        let mut arm = sequencer(ctx);

        println!("📦 放入箱子...");
        arm.place_in_box().context("放置失败")?;
        if ctx.stop.is_raised() {
            // 固定序列不可中途打断，结束后再进入安全姿态
            arm.safe_pose().context("进入安全姿态失败")?;
            println!("🛑 放置后收到停止信号，机械臂已回到安全姿态");
            return Ok(Completion::Interrupted);
        }
        if self.reset {
            arm.reset_pose().context("复位失败")?;
        }
        println!("✅ 放置完成");
        Ok(Completion::Done)
    }
}

/// 机械臂复位
pub fn reset_arm(ctx: &RunContext) -> Result<Completion> {
    let mut arm = sequencer(ctx);
    if let Err(e) = arm.reset_pose() {
        warn!("Reset pose failed: {}", e);
        arm.safe_pose().context("进入安全姿态失败")?;
        return Err(e).context("复位失败");
    }
    println!("✅ 机械臂已复位");
    Ok(Completion::Done)
}

fn sequencer(ctx: &RunContext) -> ArmSequencer<picar_hal::sim::SimHardware, SystemClock> {
    ArmSequencer::new(
        bench::hardware(&ctx.config),
        SystemClock::new(),
        ctx.config.arm.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use picar_control::{RobotConfig, StopFlag};

    use crate::settings::ConfigSource;

    #[test]
    fn test_place_reports_interrupt_after_sequence() {
        let mut config = RobotConfig::default();
        config.arm.move_dwell_ms = 0;
        config.arm.box_dwell_ms = 0;
        config.arm.recover_dwell_ms = 0;
        let ctx = RunContext {
            config,
            source: ConfigSource::Preset(Default::default()),
            stop: StopFlag::new(),
        };
        ctx.stop.raise();

        let cmd = PlaceCommand { reset: false };
        assert_eq!(cmd.execute(&ctx).unwrap(), Completion::Interrupted);
    }
}
