//! 配置管理命令

use anyhow::{Context, Result};
use clap::Subcommand;

use super::{Completion, RunContext};
use crate::settings::{self, CONFIG_ENV};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 打印生效的配置（TOML）
    Show,

    /// 校验生效的配置
    Check,

    /// 打印配置文件的查找位置
    Path,
}

impl ConfigCommand {
    pub fn execute(&self, ctx: &RunContext) -> Result<Completion> {
        match self {
            ConfigCommand::Show => {
                let content = ctx.config.to_toml_string().context("序列化配置失败")?;
                println!("# source: {}", ctx.source);
                print!("{}", content);
            },
            ConfigCommand::Check => {
                ctx.config.validate().context("配置校验失败")?;
                println!("✅ 配置有效（{}）", ctx.source);
            },
            ConfigCommand::Path => {
                println!("环境变量: {}", CONFIG_ENV);
                match settings::user_config_file() {
                    Some(path) => println!("用户配置: {}", path.display()),
                    None => println!("用户配置: 无法确定配置目录"),
                }
                println!("当前来源: {}", ctx.source);
            },
        }
        Ok(Completion::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picar_control::{RobotConfig, StopFlag};

    use crate::settings::ConfigSource;

    #[test]
    fn test_check_rejects_invalid_config() {
        let mut config = RobotConfig::default();
        config.line.min_speed = 2.0;
        let ctx = RunContext {
            config,
            source: ConfigSource::Preset(Default::default()),
            stop: StopFlag::new(),
        };
        assert!(ConfigCommand::Check.execute(&ctx).is_err());
        assert!(ConfigCommand::Show.execute(&ctx).is_ok());
    }
}
