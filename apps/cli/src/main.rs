//! # PiCar CLI
//!
//! 每个阶段都是一个独立的子命令，也可以由 `scenario` 串成一次完整递送。
//!
//! ```bash
//! # 倒车巡线直到终点标记
//! picar-cli line-follow --direction backward
//!
//! # 使用 Mk2 预设执行左转
//! picar-cli --variant mk2 turn left
//!
//! # 查看递送场景的阶段计划
//! picar-cli scenario --with-pick --dry-run
//! ```
//!
//! Ctrl+C / SIGTERM 会让当前阶段停车、回到安全姿态后以退出码 130 结束；
//! 再次收到信号则立即退出。

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use picar_control::StopFlag;
use tracing::debug;

mod bench;
mod commands;
mod settings;

use commands::{
    Completion, ConfigCommand, DriveCommand, LineFollowCommand, PlaceCommand, RunContext,
    ScenarioCommand, TurnCommand, VariantArg,
};

/// PiCar CLI - 巡线 / 抓取小车命令行工具
#[derive(Parser, Debug)]
#[command(name = "picar-cli")]
#[command(about = "Line-following and pick-and-place robot car", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（覆盖 $PICAR_CONFIG 和用户配置目录）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 没有配置文件时使用的机器人预设
    #[arg(long, value_enum, global = true)]
    variant: Option<VariantArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 巡线行驶
    LineFollow {
        #[command(flatten)]
        args: LineFollowCommand,
    },

    /// 执行预设转弯
    Turn {
        #[command(flatten)]
        args: TurnCommand,
    },

    /// 定时直行
    Drive {
        #[command(flatten)]
        args: DriveCommand,
    },

    /// 搜索并抓取目标
    Pick,

    /// 把夹爪中的物体放入箱子
    Place {
        #[command(flatten)]
        args: PlaceCommand,
    },

    /// 机械臂回到初始姿态
    ResetArm,

    /// 运行递送场景
    Scenario {
        #[command(flatten)]
        args: ScenarioCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),
}

fn main() -> ExitCode {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "picar_cli=info,picar_control=info,picar_scenario=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(completion) => ExitCode::from(completion.exit_code()),
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<Completion> {
    let (config, source) = settings::load(cli.config, cli.variant.map(Into::into))?;
    debug!("Config source: {}", source);

    let stop = StopFlag::new();
    install_stop_handler(&stop)?;

    let ctx = RunContext {
        config,
        source,
        stop,
    };

    match cli.command {
        Commands::LineFollow { args } => args.execute(&ctx),
        Commands::Turn { args } => args.execute(&ctx),
        Commands::Drive { args } => args.execute(&ctx),
        Commands::Pick => commands::arm::pick(&ctx),
        Commands::Place { args } => args.execute(&ctx),
        Commands::ResetArm => commands::arm::reset_arm(&ctx),
        Commands::Scenario { args } => args.execute(&ctx),
        Commands::Config(cmd) => cmd.execute(&ctx),
    }
}

/// Ctrl+C / SIGTERM：第一次请求停止，第二次立即退出
fn install_stop_handler(stop: &StopFlag) -> Result<()> {
    let stop = stop.clone();
    ctrlc::set_handler(move || {
        if stop.is_raised() {
            eprintln!("\nReceived second interrupt, exiting now");
            std::process::exit(130);
        }
        eprintln!("\nReceived interrupt signal, stopping...");
        stop.raise();
    })
    .context("Failed to set signal handler")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["picar-cli", "turn", "left", "--variant", "mk2"]).unwrap();
        assert_eq!(cli.variant, Some(VariantArg::Mk2));
        assert!(matches!(cli.command, Commands::Turn { .. }));
    }

    #[test]
    fn test_line_follow_requires_direction() {
        assert!(Cli::try_parse_from(["picar-cli", "line-follow"]).is_err());
        let cli = Cli::try_parse_from([
            "picar-cli",
            "line-follow",
            "--direction",
            "backward",
            "--duration",
            "1.5",
        ])
        .unwrap();
        match cli.command {
            Commands::LineFollow { args } => assert_eq!(args.duration, Some(1.5)),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
