//! 递送场景命令
//!
//! 每个阶段都以本程序的子命令作为独立进程运行，由编排器统一处理超时升级。

use anyhow::{Context, Result};
use clap::Args;
use picar_hal::SystemClock;
use picar_scenario::{Orchestrator, OsProcessControl, ScenarioPlan, ScenarioReport, StageOutcome};
use tracing::info;

use super::{Completion, RunContext};

/// 场景命令参数
#[derive(Args, Debug)]
pub struct ScenarioCommand {
    /// 先执行抓取阶段
    #[arg(long)]
    pub with_pick: bool,

    /// 只打印阶段计划，不运行
    #[arg(long)]
    pub dry_run: bool,
}

impl ScenarioCommand {
    /// 构建阶段计划
    pub fn plan(&self, ctx: &RunContext) -> Result<ScenarioPlan> {
        let program = std::env::current_exe().context("无法确定当前可执行文件路径")?;
        let global_args = ctx.global_args();
        let scenario = &ctx.config.scenario;
        Ok(if self.with_pick {
            ScenarioPlan::full_cycle(program, &global_args, scenario)
        } else {
            ScenarioPlan::delivery(program, &global_args, scenario)
        })
    }

    pub fn execute(&self, ctx: &RunContext) -> Result<Completion> {
        let plan = self.plan(ctx)?;

        if self.dry_run {
            println!("📋 场景 `{}`（{} 个阶段）", plan.name, plan.stages.len());
            for (index, stage) in plan.stages.iter().enumerate() {
                let timeout = stage
                    .timeout
                    .map(|t| format!("{:?}", t))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {}. {:<22} timeout={:<6} {}",
                    index + 1,
                    stage.name,
                    timeout,
                    stage.command_line()
                );
            }
            return Ok(Completion::Done);
        }

        info!("Running scenario with config from {}", ctx.source);
        let process = OsProcessControl::new(ctx.config.scenario.poll());
        let mut orchestrator =
            Orchestrator::from_config(process, SystemClock::new(), &ctx.config.scenario);
        let report = orchestrator.run_scenario(&plan, &ctx.stop);
        print_report(&report);

        if report.aborted {
            return Ok(Completion::Interrupted);
        }
        anyhow::ensure!(report.all_ok(), "场景 `{}` 未能全部完成", plan.name);
        Ok(Completion::Done)
    }
}

fn print_report(report: &ScenarioReport) {
    println!("📊 场景报告:");
    for stage in &report.stages {
        let mark = match stage.outcome {
            StageOutcome::Completed => "✅",
            StageOutcome::TimedOut { killed: false } => "⏱️",
            StageOutcome::TimedOut { killed: true } => "⚠️",
            StageOutcome::Aborted => "🛑",
            StageOutcome::Failed { .. } | StageOutcome::SpawnFailed => "❌",
        };
        println!(
            "  {} {:<22} {:?} ({:.1}s)",
            mark,
            stage.name,
            stage.outcome,
            stage.elapsed.as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picar_control::{RobotConfig, RobotVariant, StopFlag};

    use crate::settings::ConfigSource;

    #[test]
    fn test_plan_forwards_variant_to_every_stage() {
        let ctx = RunContext {
            config: RobotConfig::preset(RobotVariant::Mk2),
            source: ConfigSource::Preset(RobotVariant::Mk2),
            stop: StopFlag::new(),
        };
        let cmd = ScenarioCommand {
            with_pick: true,
            dry_run: true,
        };
        let plan = cmd.plan(&ctx).unwrap();
        assert_eq!(plan.stages.len(), 6);
        assert!(
            plan.stages
                .iter()
                .all(|s| s.args.starts_with(&["--variant".to_string(), "mk2".to_string()]))
        );
    }
}
