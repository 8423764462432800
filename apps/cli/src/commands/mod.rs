//! 命令定义和实现

pub mod arm;
pub mod config;
pub mod drive;
pub mod scenario;

pub use arm::PlaceCommand;
pub use config::ConfigCommand;
pub use drive::{DriveCommand, LineFollowCommand, TurnCommand};
pub use scenario::ScenarioCommand;

use clap::ValueEnum;
use picar_control::{RobotConfig, RobotVariant, StopFlag, TurnKind};
use picar_hal::DriveDirection;

use crate::settings::ConfigSource;

/// 命令的结束方式（决定进程退出码）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// 被停止信号打断（已进入安全状态）
    Interrupted,
}

impl Completion {
    pub fn exit_code(self) -> u8 {
        match self {
            Completion::Done => 0,
            Completion::Interrupted => 130,
        }
    }
}

/// 所有命令共享的运行上下文
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: RobotConfig,
    pub source: ConfigSource,
    pub stop: StopFlag,
}

impl RunContext {
    /// 子进程需要继承的全局参数（让每个阶段读到同一份配置）
    pub fn global_args(&self) -> Vec<String> {
        match &self.source {
            ConfigSource::File(path) => vec!["--config".to_string(), path.to_string_lossy().into_owned()],
            ConfigSource::Preset(variant) => {
                vec!["--variant".to_string(), VariantArg::from(*variant).name().to_string()]
            },
        }
    }
}

/// 机器人变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Mk1,
    Mk2,
}

impl VariantArg {
    fn name(self) -> &'static str {
        match self {
            VariantArg::Mk1 => "mk1",
            VariantArg::Mk2 => "mk2",
        }
    }
}

impl From<VariantArg> for RobotVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Mk1 => RobotVariant::Mk1,
            VariantArg::Mk2 => RobotVariant::Mk2,
        }
    }
}

impl From<RobotVariant> for VariantArg {
    fn from(variant: RobotVariant) -> Self {
        match variant {
            RobotVariant::Mk1 => VariantArg::Mk1,
            RobotVariant::Mk2 => VariantArg::Mk2,
        }
    }
}

/// 行驶方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Forward,
    Backward,
}

impl From<DirectionArg> for DriveDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => DriveDirection::Forward,
            DirectionArg::Backward => DriveDirection::Backward,
        }
    }
}

/// 预设转弯
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TurnArg {
    /// 左转 90°（进入放置位）
    Left,
    /// 回正 90°（回到赛道）
    Return,
}

impl From<TurnArg> for TurnKind {
    fn from(arg: TurnArg) -> Self {
        match arg {
            TurnArg::Left => TurnKind::Left,
            TurnArg::Return => TurnKind::Return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn context(source: ConfigSource) -> RunContext {
        RunContext {
            config: RobotConfig::default(),
            source,
            stop: StopFlag::new(),
        }
    }

    #[test]
    fn test_global_args_forward_config_file() {
        let ctx = context(ConfigSource::File(PathBuf::from("/etc/picar/robot.toml")));
        assert_eq!(ctx.global_args(), vec!["--config", "/etc/picar/robot.toml"]);
    }

    #[test]
    fn test_global_args_forward_variant() {
        let ctx = context(ConfigSource::Preset(RobotVariant::Mk2));
        assert_eq!(ctx.global_args(), vec!["--variant", "mk2"]);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Completion::Done.exit_code(), 0);
        assert_eq!(Completion::Interrupted.exit_code(), 130);
    }
}
