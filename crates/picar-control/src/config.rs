//! # 机器人配置
//!
//! 每个机器人实例一份配置（角度、速度、阈值、超时），进程启动时加载一次，
//! 以引用形式传给各控制器。
//!
//! 配置文件为 TOML，所有字段均有默认值，文件中只需写出要覆盖的项：
//!
//! ```toml
//! [steering]
//! left_max_deg = 140.0
//!
//! [pick]
//! max_retries = 3
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use picar_hal::{DriveDirection, SensorPins};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 字段取值不合法
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// 已知的机器人变体
///
/// 两台车的 PWM 范围、夹爪角度、电机接线不同，以预设代替复制粘贴的常量文件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotVariant {
    /// GPIO H 桥驱动，宽转向范围
    #[default]
    Mk1,
    /// PCA9685 驱动电机（方向反接），绝对角度抓取
    Mk2,
}

/// 机器人配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub hardware: HardwareConfig,
    pub steering: SteeringConfig,
    pub line: LineFollowConfig,
    pub arm: ArmConfig,
    pub vision: VisionConfig,
    pub pick: PickConfig,
    pub turns: TurnsConfig,
    pub scenario: ScenarioConfig,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self::preset(RobotVariant::Mk1)
    }
}

impl RobotConfig {
    /// 变体预设
    pub fn preset(variant: RobotVariant) -> Self {
        match variant {
            RobotVariant::Mk1 => Self {
                hardware: HardwareConfig::default(),
                steering: SteeringConfig::default(),
                line: LineFollowConfig::default(),
                arm: ArmConfig::default(),
                vision: VisionConfig::default(),
                pick: PickConfig::default(),
                turns: TurnsConfig::default(),
                scenario: ScenarioConfig::default(),
            },
            RobotVariant::Mk2 => Self {
                hardware: HardwareConfig {
                    steering_channel: 0,
                    motors: vec![
                        MotorConfig {
                            channel: 1,
                            inverted: true,
                        },
                        MotorConfig {
                            channel: 2,
                            inverted: true,
                        },
                    ],
                    line_pins: SensorPins {
                        left: 22,
                        middle: 27,
                        right: 17,
                    },
                },
                steering: SteeringConfig {
                    center_deg: 90.0,
                    left_max_deg: 92.0,
                    right_max_deg: 88.0,
                },
                // 倒车巡线用更快的蠕行、更短的恢复时长；前进保持默认
                line: LineFollowConfig {
                    backward_corner_speed: Some(0.2),
                    backward_recovery_creep_ms: Some(150),
                    ..LineFollowConfig::default()
                },
                arm: ArmConfig {
                    height_neutral: 130.0,
                    grip_open: 120.0,
                    grip_close: 45.0,
                    grip_repeats: 3,
                    zone_left: 84.0,
                    zone_right: 93.0,
                    pick_wrist_ready: 120.0,
                    pick_height_down: 155.0,
                    pick_height_lift: 105.0,
                    pick_wrist_lift: 140.0,
                    gripper_dwell_ms: 700,
                    move_dwell_ms: 700,
                    close_settle_ms: 3000,
                    ..ArmConfig::default()
                },
                vision: VisionConfig::default(),
                pick: PickConfig {
                    lose_sight_timeout_ms: 1000,
                    ..PickConfig::default()
                },
                turns: TurnsConfig {
                    left: TurnConfig {
                        steer_deg: 50.0,
                        direction: DriveDirection::Backward,
                        speed: 0.2,
                        duration_ms: 3000,
                    },
                    ret: TurnConfig {
                        steer_deg: 50.0,
                        direction: DriveDirection::Backward,
                        speed: 0.3,
                        duration_ms: 2500,
                    },
                    center_settle_ms: 300,
                    ..TurnsConfig::default()
                },
                scenario: ScenarioConfig {
                    stage_settle_ms: 1500,
                    ..ScenarioConfig::default()
                },
            },
        }
    }

    /// 从 TOML 文件加载并校验
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验配置自洽性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hardware.validate()?;
        self.steering.validate()?;
        self.line.validate()?;
        self.arm.validate()?;
        self.vision.validate()?;
        self.pick.validate()?;
        self.turns.validate()?;
        Ok(())
    }
}

// ==================== 硬件 ====================

/// 单个驱动电机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorConfig {
    /// 电机通道
    pub channel: u8,
    /// 接线反向（油门取反）
    #[serde(default)]
    pub inverted: bool,
}

/// 硬件接线
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    /// 前轮转向舵机通道
    pub steering_channel: u8,
    /// 后轮驱动电机（同速）
    pub motors: Vec<MotorConfig>,
    /// 巡线传感器引脚
    pub line_pins: SensorPins,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            steering_channel: 0,
            motors: vec![
                MotorConfig {
                    channel: 0,
                    inverted: false,
                },
                MotorConfig {
                    channel: 1,
                    inverted: false,
                },
            ],
            line_pins: SensorPins::default(),
        }
    }
}

impl HardwareConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.motors.is_empty() {
            return Err(invalid("hardware.motors", "at least one drive motor is required"));
        }
        let pins = self.line_pins;
        if pins.left == pins.middle || pins.left == pins.right || pins.middle == pins.right {
            return Err(invalid("hardware.line_pins", "sensor pins must be distinct"));
        }
        Ok(())
    }
}

// ==================== 转向 ====================

/// 前轮转向舵机范围（度）
///
/// 角度越大越偏左：`right_max_deg < center_deg < left_max_deg`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    pub center_deg: f64,
    pub left_max_deg: f64,
    pub right_max_deg: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            center_deg: 90.0,
            left_max_deg: 150.0,
            right_max_deg: 35.0,
        }
    }
}

impl SteeringConfig {
    /// 把角度钳位到 `[right_max, left_max]`
    pub fn clamp(&self, degrees: f64) -> f64 {
        degrees.clamp(self.right_max_deg, self.left_max_deg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.right_max_deg <= self.center_deg && self.center_deg <= self.left_max_deg) {
            return Err(invalid(
                "steering",
                format!(
                    "expected right_max ({}) <= center ({}) <= left_max ({})",
                    self.right_max_deg, self.center_deg, self.left_max_deg
                ),
            ));
        }
        if !(0.0..=180.0).contains(&self.right_max_deg) || !(0.0..=180.0).contains(&self.left_max_deg)
        {
            return Err(invalid("steering", "servo angles must be within [0, 180]"));
        }
        Ok(())
    }
}

// ==================== 巡线 ====================

/// 检测到十字 / 终点 (1,1,1) 时的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossAction {
    /// 停车并结束本次巡线
    Finish,
    /// 停车、回正、短暂停顿后继续
    Pause,
    /// 当作普通读数处理
    Ignore,
}

/// 巡线控制参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFollowConfig {
    /// 比例增益（度 / 单位误差）
    pub kp: f64,
    /// 转向指数平滑系数 α：`new = α * prev + (1 - α) * target`
    pub smooth_alpha: f64,
    pub base_speed: f64,
    pub min_speed: f64,
    /// 右弯锁存和丢线恢复时的低速
    pub corner_speed: f64,
    /// 每偏离中心 1 度降低的速度
    pub turn_slowdown_gain: f64,
    /// 控制周期
    pub loop_period_ms: u64,
    /// 每个周期速度最大变化量
    pub pwm_slew: f64,
    /// 丢线恢复：每次蠕行时长
    pub recovery_creep_ms: u64,
    /// 丢线恢复：扫摆每个方向的停留时长
    pub sweep_dwell_ms: u64,
    /// 十字停顿时长
    pub cross_pause_ms: u64,
    /// 丢线第 1..=N 个 tick：沿行驶方向蠕行
    pub creep_along_ticks: u32,
    /// 丢线第 (creep_along_ticks, N] 个 tick：反向蠕行；之后扫摆
    pub creep_reverse_ticks: u32,
    pub forward_cross: CrossAction,
    pub backward_cross: CrossAction,
    /// 倒车巡线时覆盖 `corner_speed`
    pub backward_corner_speed: Option<f64>,
    /// 倒车巡线时覆盖 `recovery_creep_ms`
    pub backward_recovery_creep_ms: Option<u64>,
}

impl Default for LineFollowConfig {
    fn default() -> Self {
        Self {
            kp: 34.0,
            smooth_alpha: 0.45,
            base_speed: 0.25,
            min_speed: 0.15,
            corner_speed: 0.10,
            turn_slowdown_gain: 0.018,
            loop_period_ms: 50,
            pwm_slew: 0.05,
            recovery_creep_ms: 250,
            sweep_dwell_ms: 180,
            cross_pause_ms: 300,
            creep_along_ticks: 3,
            creep_reverse_ticks: 6,
            forward_cross: CrossAction::Pause,
            backward_cross: CrossAction::Finish,
            backward_corner_speed: None,
            backward_recovery_creep_ms: None,
        }
    }
}

impl LineFollowConfig {
    pub fn loop_period(&self) -> Duration {
        Duration::from_millis(self.loop_period_ms)
    }

    pub fn recovery_creep(&self) -> Duration {
        Duration::from_millis(self.recovery_creep_ms)
    }

    pub fn sweep_dwell(&self) -> Duration {
        Duration::from_millis(self.sweep_dwell_ms)
    }

    pub fn cross_pause(&self) -> Duration {
        Duration::from_millis(self.cross_pause_ms)
    }

    /// 指定方向的十字动作
    pub fn cross_action(&self, direction: DriveDirection) -> CrossAction {
        match direction {
            DriveDirection::Forward => self.forward_cross,
            DriveDirection::Backward => self.backward_cross,
        }
    }

    /// 指定方向生效的参数（应用倒车覆盖值）
    pub fn for_direction(&self, direction: DriveDirection) -> Self {
        let mut resolved = *self;
        if direction == DriveDirection::Backward {
            if let Some(speed) = self.backward_corner_speed {
                resolved.corner_speed = speed;
            }
            if let Some(ms) = self.backward_recovery_creep_ms {
                resolved.recovery_creep_ms = ms;
            }
        }
        resolved
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.smooth_alpha) {
            return Err(invalid("line.smooth_alpha", "must be within [0, 1)"));
        }
        for (field, value) in [
            ("line.base_speed", self.base_speed),
            ("line.min_speed", self.min_speed),
            ("line.corner_speed", self.corner_speed),
            (
                "line.backward_corner_speed",
                self.backward_corner_speed.unwrap_or(self.corner_speed),
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{} is outside [0, 1]", value)));
            }
        }
        if !(self.pwm_slew > 0.0 && self.pwm_slew.is_finite()) {
            return Err(invalid("line.pwm_slew", "must be > 0"));
        }
        if self.loop_period_ms == 0 {
            return Err(invalid("line.loop_period_ms", "must be > 0"));
        }
        for (field, gain) in [
            ("line.kp", self.kp),
            ("line.turn_slowdown_gain", self.turn_slowdown_gain),
        ] {
            if !gain.is_finite() || gain < 0.0 {
                return Err(invalid(field, format!("{} is not a finite non-negative gain", gain)));
            }
        }
        if self.creep_reverse_ticks < self.creep_along_ticks {
            return Err(invalid(
                "line.creep_reverse_ticks",
                "must be >= creep_along_ticks",
            ));
        }
        Ok(())
    }
}

// ==================== 机械臂 ====================

/// 机械臂舵机通道与姿态角度（度）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmConfig {
    /// B：底座左右
    pub base_channel: u8,
    /// C：大臂高度
    pub height_channel: u8,
    /// D：手腕
    pub wrist_channel: u8,
    /// E：夹爪
    pub gripper_channel: u8,

    pub base_neutral: f64,
    pub height_neutral: f64,
    pub wrist_neutral: f64,

    /// 夹爪全开（不遮挡相机）
    pub grip_open: f64,
    /// 夹爪闭合（每次重试相同）
    pub grip_close: f64,
    /// 闭合命令重复次数
    pub grip_repeats: u32,

    /// 目标在左 / 中 / 右区域时的底座角度
    pub zone_left: f64,
    pub zone_center: f64,
    pub zone_right: f64,

    pub pick_wrist_ready: f64,
    pub pick_height_down: f64,
    pub pick_height_lift: f64,
    pub pick_wrist_lift: f64,

    /// 箱子方向的底座角度
    pub box_base: f64,
    /// 越过箱子的安全高度
    pub box_height_safe: f64,
    /// 放入箱子的高度
    pub box_height_down: f64,
    pub box_wrist: f64,

    pub gripper_dwell_ms: u64,
    pub move_dwell_ms: u64,
    pub steer_dwell_ms: u64,
    pub recover_dwell_ms: u64,
    pub box_dwell_ms: u64,
    /// 闭合后等待夹爪完全夹紧
    pub close_settle_ms: u64,
}

impl Default for ArmConfig {
    fn default() -> Self {
        Self {
            base_channel: 1,
            height_channel: 2,
            wrist_channel: 3,
            gripper_channel: 4,
            base_neutral: 90.0,
            height_neutral: 60.0,
            wrist_neutral: 90.0,
            grip_open: 180.0,
            grip_close: 80.0,
            grip_repeats: 1,
            zone_left: 82.0,
            zone_center: 90.0,
            zone_right: 98.0,
            pick_wrist_ready: 90.0,
            pick_height_down: 55.0,
            pick_height_lift: 90.0,
            pick_wrist_lift: 90.0,
            box_base: 120.0,
            box_height_safe: 80.0,
            box_height_down: 30.0,
            box_wrist: 90.0,
            gripper_dwell_ms: 350,
            move_dwell_ms: 350,
            steer_dwell_ms: 100,
            recover_dwell_ms: 200,
            box_dwell_ms: 300,
            close_settle_ms: 0,
        }
    }
}

impl ArmConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let channels = [
            self.base_channel,
            self.height_channel,
            self.wrist_channel,
            self.gripper_channel,
        ];
        for (i, a) in channels.iter().enumerate() {
            if channels[i + 1..].contains(a) {
                return Err(invalid("arm", format!("servo channel {} assigned twice", a)));
            }
        }
        let angles = [
            self.base_neutral,
            self.height_neutral,
            self.wrist_neutral,
            self.grip_open,
            self.grip_close,
            self.zone_left,
            self.zone_center,
            self.zone_right,
            self.pick_wrist_ready,
            self.pick_height_down,
            self.pick_height_lift,
            self.pick_wrist_lift,
            self.box_base,
            self.box_height_safe,
            self.box_height_down,
            self.box_wrist,
        ];
        if let Some(bad) = angles.iter().find(|a| !(0.0..=180.0).contains(*a)) {
            return Err(invalid("arm", format!("servo angle {} outside [0, 180]", bad)));
        }
        if self.grip_repeats == 0 {
            return Err(invalid("arm.grip_repeats", "must be >= 1"));
        }
        Ok(())
    }
}

// ==================== 视觉 ====================

/// 目标选择参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// 中心带左边界（相对帧宽）
    pub center_band_low: f64,
    /// 中心带右边界（相对帧宽）
    pub center_band_high: f64,
    /// 评分中置信度的权重
    pub confidence_weight: f64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            center_band_low: 0.35,
            center_band_high: 0.65,
            confidence_weight: 2000.0,
        }
    }
}

impl VisionConfig {
    pub fn band(&self) -> (f64, f64) {
        (self.center_band_low, self.center_band_high)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (low, high) = self.band();
        if !(0.0 < low && low < high && high < 1.0) {
            return Err(invalid(
                "vision.center_band",
                format!("expected 0 < low ({}) < high ({}) < 1", low, high),
            ));
        }
        if !self.confidence_weight.is_finite() || self.confidence_weight < 0.0 {
            return Err(invalid(
                "vision.confidence_weight",
                format!("{} is not a finite non-negative weight", self.confidence_weight),
            ));
        }
        Ok(())
    }
}

// ==================== 抓取状态机 ====================

/// 抓取状态机参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    /// SEARCH → LOCK：连续看到目标的帧数
    pub detect_stable_frames: u32,
    /// LOCK → STEER：目标在同一区域的连续帧数
    pub pos_stable_frames: u32,
    /// 软恢复重试次数上限（总尝试次数 = 1 + max_retries）
    pub max_retries: u32,
    /// LOWER / VERIFY 中丢失目标的超时
    pub lose_sight_timeout_ms: u64,
    /// 验证采样帧数
    pub verify_shots: u32,
    pub verify_gap_ms: u64,
    /// 大框帧数 >= 此值判定抓取失败
    pub verify_miss_threshold: u32,
    /// "大框"高度阈值（像素）
    pub large_box_height: i32,
    /// 抬起后丢弃的陈旧帧数（相机延迟）
    pub drain_frames: u32,
    pub drain_gap_ms: u64,
    /// 感知 tick 周期（0 表示由取帧速度决定）
    pub tick_period_ms: u64,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            detect_stable_frames: 3,
            pos_stable_frames: 2,
            max_retries: 2,
            lose_sight_timeout_ms: 3500,
            verify_shots: 5,
            verify_gap_ms: 250,
            verify_miss_threshold: 2,
            large_box_height: 80,
            drain_frames: 5,
            drain_gap_ms: 250,
            tick_period_ms: 33,
        }
    }
}

impl PickConfig {
    pub fn lose_sight_timeout(&self) -> Duration {
        Duration::from_millis(self.lose_sight_timeout_ms)
    }

    pub fn verify_gap(&self) -> Duration {
        Duration::from_millis(self.verify_gap_ms)
    }

    pub fn drain_gap(&self) -> Duration {
        Duration::from_millis(self.drain_gap_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.detect_stable_frames == 0 || self.pos_stable_frames == 0 {
            return Err(invalid("pick", "stability thresholds must be >= 1"));
        }
        if self.verify_shots == 0 {
            return Err(invalid("pick.verify_shots", "must be >= 1"));
        }
        if self.verify_miss_threshold == 0 || self.verify_miss_threshold > self.verify_shots {
            return Err(invalid(
                "pick.verify_miss_threshold",
                format!("must be within [1, verify_shots = {}]", self.verify_shots),
            ));
        }
        if self.large_box_height <= 0 {
            return Err(invalid("pick.large_box_height", "must be > 0"));
        }
        Ok(())
    }
}

// ==================== 转弯 ====================

/// 开环定时转弯
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnConfig {
    pub steer_deg: f64,
    pub direction: DriveDirection,
    pub speed: f64,
    pub duration_ms: u64,
}

impl TurnConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// 转弯与定时直行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnsConfig {
    /// 定时直行速度（无传感器场景）
    pub straight_speed: f64,
    /// 开始前回正后的等待
    pub center_settle_ms: u64,
    /// 打方向后的等待
    pub steer_settle_ms: u64,
    /// 停车后的等待
    pub stop_settle_ms: u64,
    /// 左转 90°（倒车入位）
    pub left: TurnConfig,
    /// 回正 90°
    #[serde(rename = "return")]
    pub ret: TurnConfig,
}

impl Default for TurnsConfig {
    fn default() -> Self {
        Self {
            left: TurnConfig {
                steer_deg: 175.0,
                direction: DriveDirection::Backward,
                speed: 0.3,
                duration_ms: 1700,
            },
            ret: TurnConfig {
                steer_deg: 175.0,
                direction: DriveDirection::Forward,
                speed: 0.3,
                duration_ms: 1700,
            },
            straight_speed: 0.18,
            center_settle_ms: 400,
            steer_settle_ms: 200,
            stop_settle_ms: 300,
        }
    }
}

impl TurnsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, turn) in [("turns.left", &self.left), ("turns.return", &self.ret)] {
            if !(0.0..=1.0).contains(&turn.speed) {
                return Err(invalid(field, format!("speed {} outside [0, 1]", turn.speed)));
            }
            if !(0.0..=180.0).contains(&turn.steer_deg) {
                return Err(invalid(field, "steer angle outside [0, 180]"));
            }
        }
        if !(0.0..=1.0).contains(&self.straight_speed) {
            return Err(invalid("turns.straight_speed", "must be within [0, 1]"));
        }
        Ok(())
    }
}

// ==================== 场景 ====================

/// 场景编排参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// 倒车巡线阶段时长（None = 运行到自行结束）
    pub backward_follow_ms: Option<u64>,
    /// 前进巡线阶段时长
    pub forward_follow_ms: Option<u64>,
    /// 超时后 terminate → kill 的宽限期
    pub grace_ms: u64,
    /// 阶段结束后的稳定等待（确保执行器输出已释放）
    pub stage_settle_ms: u64,
    /// 阶段轮询间隔
    pub poll_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            backward_follow_ms: Some(2000),
            forward_follow_ms: Some(2000),
            grace_ms: 2000,
            stage_settle_ms: 500,
            poll_ms: 10,
        }
    }
}

impl ScenarioConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    pub fn stage_settle(&self) -> Duration {
        Duration::from_millis(self.stage_settle_ms)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}
