//! 核心数据类型
//!
//! 检测框、巡线传感器三元组、图像帧、行驶方向。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// 检测框（帧像素坐标）
///
/// 每帧由检测器新生成，被目标选择器消费后即丢弃。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub class_id: i32,
    pub confidence: f32,
}

impl DetectionBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32, class_id: i32, confidence: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            class_id,
            confidence,
        }
    }

    /// 框中心（整数，向下取整）
    pub fn center(&self) -> (i32, i32) {
        (midpoint(self.x1, self.x2), midpoint(self.y1, self.y2))
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1)
    }
}

/// 两坐标的中点（i64 中求和，结果总在两者之间）
fn midpoint(a: i32, b: i32) -> i32 {
    (i64::from(a) + i64::from(b)).div_euclid(2) as i32
}

/// 巡线传感器读数 (L, M, R)
///
/// `true` = 检测到黑线，`false` = 白色背景。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SensorTriplet {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

impl SensorTriplet {
    pub const fn new(left: bool, middle: bool, right: bool) -> Self {
        Self {
            left,
            middle,
            right,
        }
    }

    /// 从 0/1 位构造（测试和脚本中更易读）
    pub const fn from_bits(l: u8, m: u8, r: u8) -> Self {
        Self::new(l != 0, m != 0, r != 0)
    }

    /// (1,1,1)：十字 / 终点标记
    pub fn is_cross(&self) -> bool {
        self.left && self.middle && self.right
    }

    /// (0,0,0)：丢线
    pub fn is_lost(&self) -> bool {
        !self.left && !self.middle && !self.right
    }

    /// 右侧有线、左侧无线（右直角弯）
    pub fn is_right_corner(&self) -> bool {
        self.right && !self.left
    }

    /// 中间传感器重新看到线且右侧已离线，用于释放右弯锁存
    pub fn releases_corner(&self) -> bool {
        self.middle && !self.right
    }

    /// 左右差值 `R - L`（前进模式误差）
    pub fn right_minus_left(&self) -> i32 {
        self.right as i32 - self.left as i32
    }
}

impl fmt::Display for SensorTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{})",
            self.left as u8, self.middle as u8, self.right as u8
        )
    }
}

/// 巡线传感器 GPIO 引脚（BCM 编号）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorPins {
    pub left: u8,
    pub middle: u8,
    pub right: u8,
}

impl Default for SensorPins {
    fn default() -> Self {
        Self {
            left: 19,
            middle: 16,
            right: 20,
        }
    }
}

/// 相机帧
///
/// 控制核心只使用帧尺寸；像素数据原样交给检测器。
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// 单调递增的帧序号
    pub sequence: u64,
    pub pixels: Arc<[u8]>,
}

impl Frame {
    /// 创建无像素数据的帧（模拟后端使用）
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self {
            width,
            height,
            sequence,
            pixels: Arc::from(Vec::new()),
        }
    }
}

/// 行驶方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveDirection {
    Forward,
    Backward,
}

impl DriveDirection {
    /// 反方向
    pub fn reversed(self) -> Self {
        match self {
            DriveDirection::Forward => DriveDirection::Backward,
            DriveDirection::Backward => DriveDirection::Forward,
        }
    }

    /// 油门符号（前进 +1，后退 -1）
    pub fn sign(self) -> f64 {
        match self {
            DriveDirection::Forward => 1.0,
            DriveDirection::Backward => -1.0,
        }
    }
}

impl fmt::Display for DriveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveDirection::Forward => write!(f, "forward"),
            DriveDirection::Backward => write!(f, "backward"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_center_floor() {
        let b = DetectionBox::new(100, 50, 201, 151, 0, 0.9);
        assert_eq!(b.center(), (150, 100));
        assert_eq!(b.width(), 101);
        assert_eq!(b.height(), 101);

        // 负坐标向下取整
        let b = DetectionBox::new(-3, -3, 0, 0, 0, 0.9);
        assert_eq!(b.center(), (-2, -2));
    }

    #[test]
    fn test_box_center_extreme_coordinates() {
        let b = DetectionBox::new(i32::MAX - 10, i32::MIN, i32::MAX, i32::MIN + 4, 0, 0.5);
        assert_eq!(b.center(), (i32::MAX - 5, i32::MIN + 2));
        assert_eq!(b.width(), 10);

        let wide = DetectionBox::new(i32::MIN, 0, i32::MAX, 0, 0, 0.5);
        assert_eq!(wide.center(), (-1, 0));
        assert_eq!(wide.width(), i32::MAX);
    }

    #[test]
    fn test_triplet_patterns() {
        assert!(SensorTriplet::from_bits(1, 1, 1).is_cross());
        assert!(SensorTriplet::from_bits(0, 0, 0).is_lost());
        assert!(SensorTriplet::from_bits(0, 0, 1).is_right_corner());
        assert!(SensorTriplet::from_bits(0, 1, 1).is_right_corner());
        assert!(!SensorTriplet::from_bits(1, 0, 1).is_right_corner());
        assert!(SensorTriplet::from_bits(0, 1, 0).releases_corner());
        assert_eq!(SensorTriplet::from_bits(1, 0, 0).right_minus_left(), -1);
        assert_eq!(SensorTriplet::from_bits(0, 1, 1).to_string(), "(0,1,1)");
    }

    #[test]
    fn test_drive_direction() {
        assert_eq!(DriveDirection::Forward.reversed(), DriveDirection::Backward);
        assert_eq!(DriveDirection::Backward.sign(), -1.0);
        assert_eq!(DriveDirection::Backward.to_string(), "backward");
    }
}
