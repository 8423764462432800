//! 场景计划：按顺序排列的阶段

use std::path::PathBuf;
use std::time::Duration;

use picar_control::config::ScenarioConfig;

use crate::process::StageSpec;

/// 有序阶段列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPlan {
    pub name: String,
    pub stages: Vec<StageSpec>,
}

impl ScenarioPlan {
    pub fn new(name: impl Into<String>, stages: Vec<StageSpec>) -> Self {
        Self {
            name: name.into(),
            stages,
        }
    }

    /// 递送场景：倒车巡线 → 左转 90° → 放入箱子 → 回正 90° → 前进巡线
    ///
    /// 每个阶段都以 `program` 的子命令运行，`global_args`（如 `--config`）放在子命令之前。
    pub fn delivery(
        program: impl Into<PathBuf>,
        global_args: &[String],
        config: &ScenarioConfig,
    ) -> Self {
        let program = program.into();
        let stage = |name: &str, args: &[&str], timeout: Option<Duration>| {
            StageSpec::new(name, program.clone())
                .args(global_args.iter().cloned())
                .args(args.iter().copied())
                .timeout(timeout)
        };

        Self::new(
            "delivery",
            vec![
                stage(
                    "line-follow-backward",
                    &["line-follow", "--direction", "backward"],
                    config.backward_follow_ms.map(Duration::from_millis),
                ),
                stage("turn-left", &["turn", "left"], None),
                stage("place", &["place"], None),
                stage("turn-return", &["turn", "return"], None),
                stage(
                    "line-follow-forward",
                    &["line-follow", "--direction", "forward"],
                    config.forward_follow_ms.map(Duration::from_millis),
                ),
            ],
        )
    }

    /// 完整循环：先抓取，再执行递送场景
    pub fn full_cycle(
        program: impl Into<PathBuf>,
        global_args: &[String],
        config: &ScenarioConfig,
    ) -> Self {
        let program = program.into();
        let mut plan = Self::delivery(program.clone(), global_args, config);
        plan.name = "full-cycle".to_string();
        plan.stages.insert(
            0,
            StageSpec::new("pick", program)
                .args(global_args.iter().cloned())
                .args(["pick"]),
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_stage_order_and_timeouts() {
        let global = vec!["--config".to_string(), "/etc/picar.toml".to_string()];
        let plan = ScenarioPlan::delivery("picar-cli", &global, &ScenarioConfig::default());

        let names: Vec<_> = plan.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "line-follow-backward",
                "turn-left",
                "place",
                "turn-return",
                "line-follow-forward"
            ]
        );
        assert_eq!(plan.stages[0].timeout, Some(Duration::from_secs(2)));
        assert_eq!(plan.stages[1].timeout, None);
        assert_eq!(
            plan.stages[0].args,
            vec![
                "--config",
                "/etc/picar.toml",
                "line-follow",
                "--direction",
                "backward"
            ]
        );
    }

    #[test]
    fn test_full_cycle_starts_with_pick() {
        let plan = ScenarioPlan::full_cycle("picar-cli", &[], &ScenarioConfig::default());
        assert_eq!(plan.stages.len(), 6);
        assert_eq!(plan.stages[0].name, "pick");
        assert_eq!(plan.stages[0].args, vec!["pick"]);
        assert_eq!(plan.stages[0].timeout, None);
    }

    #[test]
    fn test_untimed_follow_stage() {
        let config = ScenarioConfig {
            forward_follow_ms: None,
            ..ScenarioConfig::default()
        };
        let plan = ScenarioPlan::delivery("picar-cli", &[], &config);
        assert_eq!(plan.stages[4].timeout, None);
    }
}
