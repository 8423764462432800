//! # 机械臂动作序列
//!
//! 每个动作都是固定顺序的 `(通道, 角度)` 写入，中间穿插固定等待。
//! 动作不假设机械臂当前姿态，任意姿态下都可以调用。
//!
//! 顺序是有约束的：
//! - 下降前先张开夹爪，避免碰撞
//! - 手腕先到达就绪角度，大臂再下降
//! - 复位时先张开夹爪，避免遮挡相机

use std::time::Duration;

use picar_hal::{Actuators, Clock, HalError};
use tracing::{debug, info};

use crate::config::ArmConfig;
use crate::error::ControlError;
use crate::selector::Zone;

/// 机械臂动作序列器
///
/// 在一次运行期间独占执行器句柄和时钟。
#[derive(Debug)]
pub struct ArmSequencer<A: Actuators, C: Clock> {
    actuators: A,
    clock: C,
    config: ArmConfig,
}

impl<A: Actuators, C: Clock> ArmSequencer<A, C> {
    pub fn new(actuators: A, clock: C, config: ArmConfig) -> Self {
        Self {
            actuators,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_inner(self) -> (A, C) {
        (self.actuators, self.clock)
    }

    fn set(&mut self, channel: u8, degrees: f64) -> Result<(), HalError> {
        debug!(channel, degrees, "arm servo");
        self.actuators.set_servo_angle(channel, degrees)
    }

    fn dwell(&self, ms: u64) {
        self.clock.sleep(Duration::from_millis(ms));
    }

    /// 区域对应的底座角度
    pub fn zone_angle(&self, zone: Zone) -> f64 {
        match zone {
            Zone::Left => self.config.zone_left,
            Zone::Center => self.config.zone_center,
            Zone::Right => self.config.zone_right,
        }
    }

    /// 初始姿态：先张开夹爪，再把 B/C/D 回到中立
    pub fn reset_pose(&mut self) -> Result<(), ControlError> {
        info!("Arm reset");
        let c = self.config.clone();
        self.set(c.gripper_channel, c.grip_open)?;
        self.dwell(c.gripper_dwell_ms);
        self.set(c.base_channel, c.base_neutral)?;
        self.set(c.height_channel, c.height_neutral)?;
        self.set(c.wrist_channel, c.wrist_neutral)?;
        self.dwell(c.move_dwell_ms);
        Ok(())
    }

    pub fn open_gripper(&mut self) -> Result<(), ControlError> {
        let (channel, angle, dwell) = (
            self.config.gripper_channel,
            self.config.grip_open,
            self.config.gripper_dwell_ms,
        );
        self.set(channel, angle)?;
        self.dwell(dwell);
        Ok(())
    }

    /// 闭合夹爪（闭合命令重复 `grip_repeats` 次，每次角度相同）
    pub fn close_gripper(&mut self) -> Result<(), ControlError> {
        let c = self.config.clone();
        for _ in 0..c.grip_repeats {
            self.set(c.gripper_channel, c.grip_close)?;
            self.dwell(c.gripper_dwell_ms);
        }
        self.dwell(c.close_settle_ms);
        Ok(())
    }

    /// 手腕到就绪角度 → 大臂下降到抓取高度
    pub fn lower_to_pick(&mut self) -> Result<(), ControlError> {
        let c = self.config.clone();
        self.set(c.wrist_channel, c.pick_wrist_ready)?;
        self.dwell(c.move_dwell_ms);
        self.set(c.height_channel, c.pick_height_down)?;
        self.dwell(c.move_dwell_ms);
        Ok(())
    }

    /// 抓取：张开 → 下降 → 闭合
    pub fn grab(&mut self) -> Result<(), ControlError> {
        info!("Arm grab");
        self.open_gripper()?;
        self.lower_to_pick()?;
        self.close_gripper()
    }

    pub fn lift_from_pick(&mut self) -> Result<(), ControlError> {
        info!("Arm lift");
        let c = self.config.clone();
        self.set(c.height_channel, c.pick_height_lift)?;
        self.set(c.wrist_channel, c.pick_wrist_lift)?;
        self.dwell(c.move_dwell_ms);
        Ok(())
    }

    /// 底座转向目标所在区域
    pub fn steer_zone(&mut self, zone: Zone) -> Result<(), ControlError> {
        let angle = self.zone_angle(zone);
        info!("Arm steer to {} ({:.1}°)", zone, angle);
        let (channel, dwell) = (self.config.base_channel, self.config.steer_dwell_ms);
        self.set(channel, angle)?;
        self.dwell(dwell);
        Ok(())
    }

    /// 安全高度 → 底座转向箱子 → 手腕到放置角度
    pub fn move_to_box_pose(&mut self) -> Result<(), ControlError> {
        let c = self.config.clone();
        self.set(c.height_channel, c.box_height_safe)?;
        self.dwell(c.box_dwell_ms);
        self.set(c.base_channel, c.box_base)?;
        self.dwell(c.box_dwell_ms);
        self.set(c.wrist_channel, c.box_wrist)?;
        self.dwell(c.box_dwell_ms);
        Ok(())
    }

    /// 放入箱子：到箱子上方 → 下降 → 张开夹爪 → 回到安全高度
    pub fn place_in_box(&mut self) -> Result<(), ControlError> {
        info!("Arm place in box");
        self.move_to_box_pose()?;
        let c = self.config.clone();
        self.set(c.height_channel, c.box_height_down)?;
        self.dwell(c.box_dwell_ms);
        self.set(c.gripper_channel, c.grip_open)?;
        self.dwell(c.box_dwell_ms);
        self.set(c.height_channel, c.box_height_safe)?;
        self.dwell(c.box_dwell_ms);
        Ok(())
    }

    /// 软恢复：张开夹爪 → 大臂回中立高度（保持底座朝向）
    pub fn recover_soft(&mut self) -> Result<(), ControlError> {
        let c = self.config.clone();
        self.set(c.gripper_channel, c.grip_open)?;
        self.dwell(c.recover_dwell_ms);
        self.set(c.height_channel, c.height_neutral)?;
        self.dwell(c.recover_dwell_ms);
        Ok(())
    }

    /// 完全恢复：张开夹爪 → 大臂、底座回中立
    pub fn recover_full(&mut self) -> Result<(), ControlError> {
        let c = self.config.clone();
        self.set(c.gripper_channel, c.grip_open)?;
        self.dwell(c.recover_dwell_ms);
        self.set(c.height_channel, c.height_neutral)?;
        self.set(c.base_channel, c.base_neutral)?;
        self.dwell(c.box_dwell_ms);
        Ok(())
    }

    /// 操作员中断时的安全姿态
    ///
    /// 每个写入都会尝试；返回第一个错误。
    pub fn safe_pose(&mut self) -> Result<(), ControlError> {
        let c = self.config.clone();
        let results = [
            self.set(c.gripper_channel, c.grip_open),
            self.set(c.base_channel, c.base_neutral),
            self.set(c.height_channel, c.height_neutral),
        ];
        self.dwell(c.recover_dwell_ms);
        results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }
}
