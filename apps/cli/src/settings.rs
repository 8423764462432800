//! 配置来源解析
//!
//! 优先级：`--config` > `$PICAR_CONFIG` > `<用户配置目录>/picar/robot.toml`（存在时）> 变体预设

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use picar_control::{RobotConfig, RobotVariant};
use tracing::{info, warn};

/// 环境变量名
pub const CONFIG_ENV: &str = "PICAR_CONFIG";

/// 配置来自哪里
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Preset(RobotVariant),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "file {}", path.display()),
            ConfigSource::Preset(variant) => write!(f, "preset {:?}", variant),
        }
    }
}

/// 用户级配置文件路径
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("picar").join("robot.toml"))
}

/// 按优先级选出配置文件路径
///
/// 用户目录下的文件只有存在时才会被选中；显式给出的路径即使不存在也会返回（加载时报错）。
pub fn pick_config_path(
    flag: Option<PathBuf>,
    env: Option<PathBuf>,
    user_file: Option<PathBuf>,
) -> Option<PathBuf> {
    flag.or(env)
        .or_else(|| user_file.filter(|path| path.is_file()))
}

/// 加载本次进程使用的配置
pub fn load(
    flag: Option<PathBuf>,
    variant: Option<RobotVariant>,
) -> Result<(RobotConfig, ConfigSource)> {
    let env = std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    match pick_config_path(flag, env, user_config_file()) {
        Some(path) => {
            if variant.is_some() {
                warn!("--variant is ignored because a config file is used");
            }
            let config = load_file(&path)?;
            info!("Loaded config from {}", path.display());
            Ok((config, ConfigSource::File(path)))
        },
        None => {
            let variant = variant.unwrap_or_default();
            Ok((RobotConfig::preset(variant), ConfigSource::Preset(variant)))
        },
    }
}

fn load_file(path: &Path) -> Result<RobotConfig> {
    RobotConfig::load(path).with_context(|| format!("加载配置文件失败: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flag_wins_over_env() {
        let picked = pick_config_path(
            Some(PathBuf::from("/a.toml")),
            Some(PathBuf::from("/b.toml")),
            None,
        );
        assert_eq!(picked, Some(PathBuf::from("/a.toml")));
    }

    #[test]
    fn test_env_used_without_flag() {
        let picked = pick_config_path(None, Some(PathBuf::from("/b.toml")), None);
        assert_eq!(picked, Some(PathBuf::from("/b.toml")));
    }

    #[test]
    fn test_user_file_only_if_present() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("robot.toml");
        assert_eq!(pick_config_path(None, None, Some(path.clone())), None);

        fs::write(&path, "").unwrap();
        assert_eq!(pick_config_path(None, None, Some(path.clone())), Some(path));
    }

    #[test]
    fn test_load_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[line\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.toml"));
    }
}
