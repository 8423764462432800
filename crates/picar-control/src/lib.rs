//! # PiCar Control
//!
//! 闭环控制核心：
//!
//! - [`line_follow`] - 三路传感器巡线控制器（比例转向 + 分阶段丢线恢复）
//! - [`pick_place`] - 感知驱动的抓取状态机（带重试阶梯和看门狗）
//! - [`arm`] - 机械臂固定动作序列
//! - [`selector`] - 每帧目标选择与区域划分
//! - [`maneuver`] - 开环定时转弯 / 直行
//! - [`config`] - 每台机器人一份的配置（TOML + 变体预设）
//!
//! 所有控制器在构造时接收显式的硬件句柄（见 `picar-hal`），运行期间独占。
//!
//! # 示例
//!
//! ```no_run
//! use picar_control::{LineFollower, RobotConfig, StopFlag};
//! use picar_hal::{DriveDirection, sim::SimHardware};
//!
//! let config = RobotConfig::default();
//! let hw = SimHardware::new([19, 16, 20]);
//! let clock = hw.manual_clock();
//! let mut follower = LineFollower::new(hw.clone(), hw, clock, &config, DriveDirection::Forward);
//! let summary = follower.run(&StopFlag::new(), None)?;
//! println!("{:?}", summary);
//! # Ok::<(), picar_control::ControlError>(())
//! ```

pub mod arm;
pub mod chassis;
pub mod config;
mod error;
pub mod line_follow;
pub mod maneuver;
pub mod pick_place;
pub mod selector;
mod stop;

pub use arm::ArmSequencer;
pub use chassis::Chassis;
pub use config::{ConfigError, CrossAction, RobotConfig, RobotVariant};
pub use error::{ControlError, MAX_CONSECUTIVE_FAILURES};
pub use line_follow::{ControlState, LineFollower, LineRunSummary, StopReason, TickOutcome};
pub use maneuver::{ManeuverOutcome, ManeuverRunner, TurnKind, TurnManeuver};
pub use pick_place::{PickOutcome, PickPlace, PickState, PickStats, SessionState, StepOutcome};
pub use selector::{Target, TargetSelector, Zone, classify_zone};
pub use stop::StopFlag;
