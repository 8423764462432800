//! 真实子进程上的超时升级（仅 Unix）

#![cfg(unix)]

use std::time::Duration;

use picar_control::StopFlag;
use picar_hal::SystemClock;
use picar_scenario::{
    EscalationPolicy, OsProcessControl, Orchestrator, ScenarioPlan, StageOutcome, StageSpec,
};

fn orchestrator() -> Orchestrator<OsProcessControl, SystemClock> {
    Orchestrator::new(OsProcessControl::default(), SystemClock::new())
        .with_policy(EscalationPolicy {
            grace: Duration::from_millis(300),
        })
        .with_settle(Duration::ZERO)
        .with_poll(Duration::from_millis(20))
}

fn sh(name: &str, script: &str) -> StageSpec {
    StageSpec::new(name, "/bin/sh").args(["-c", script])
}

#[test]
fn exit_codes_are_reported() {
    let mut orch = orchestrator();
    assert_eq!(
        orch.run_stage(&sh("ok", "exit 0"), &StopFlag::new()),
        StageOutcome::Completed
    );
    assert_eq!(
        orch.run_stage(&sh("fail", "exit 3"), &StopFlag::new()),
        StageOutcome::Failed { code: Some(3) }
    );
}

#[test]
fn timed_out_stage_exits_on_sigterm() {
    let mut orch = orchestrator();
    let stage = sh("sleepy", "exec sleep 5").timeout(Some(Duration::from_millis(200)));
    assert_eq!(
        orch.run_stage(&stage, &StopFlag::new()),
        StageOutcome::TimedOut { killed: false }
    );
}

#[test]
fn stage_ignoring_sigterm_is_killed() {
    let mut orch = orchestrator();
    let stage = sh("stubborn", "trap '' TERM; while true; do sleep 0.05; done")
        .timeout(Some(Duration::from_millis(200)));
    assert_eq!(
        orch.run_stage(&stage, &StopFlag::new()),
        StageOutcome::TimedOut { killed: true }
    );
}

#[test]
fn missing_program_is_spawn_failure() {
    let mut orch = orchestrator();
    let plan = ScenarioPlan::new(
        "missing",
        vec![
            StageSpec::new("ghost", "/nonexistent/picar-stage"),
            sh("after", "exit 0"),
        ],
    );
    let report = orch.run_scenario(&plan, &StopFlag::new());
    assert_eq!(report.stages[0].outcome, StageOutcome::SpawnFailed);
    assert_eq!(report.stages[1].outcome, StageOutcome::Completed);
}
