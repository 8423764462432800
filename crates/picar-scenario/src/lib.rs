//! # PiCar Scenario
//!
//! 把巡线、转弯、放置、抓取作为独立进程按顺序编排成一次完整递送。
//!
//! - [`ProcessControl`] - 进程控制抽象（`spawn` / `wait` / `terminate` / `kill`）
//! - [`Orchestrator`] - 统一的超时升级策略：优雅信号 → 宽限等待 → 强制结束
//! - [`ScenarioPlan`] - 阶段列表

mod error;
mod orchestrator;
mod plan;
mod process;

pub use error::ScenarioError;
pub use orchestrator::{
    EscalationPolicy, Orchestrator, ScenarioReport, StageOutcome, StageReport,
};
pub use plan::ScenarioPlan;
pub use process::{ExitInfo, OsProcessControl, ProcessControl, StageSpec, WaitStatus};
