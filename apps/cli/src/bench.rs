//! 模拟台架
//!
//! 物理驱动不随本仓库发布，CLI 的每个阶段都跑在 [`SimHardware`] 上，
//! 由下面的演示脚本提供传感器读数和检测结果。

use picar_control::RobotConfig;
use picar_hal::sim::SimHardware;
use picar_hal::{DetectionBox, SensorTriplet};

fn repeat(bits: (u8, u8, u8), n: usize) -> impl Iterator<Item = SensorTriplet> {
    std::iter::repeat_n(SensorTriplet::from_bits(bits.0, bits.1, bits.2), n)
}

/// 一段典型赛道：直行、左偏、右弯、短暂丢线，以十字标记结束
pub fn line_script() -> Vec<SensorTriplet> {
    repeat((0, 1, 0), 10)
        .chain(repeat((1, 1, 0), 3))
        .chain(repeat((0, 1, 0), 5))
        .chain(repeat((0, 0, 1), 2))
        .chain(repeat((0, 1, 1), 1))
        .chain(repeat((0, 1, 0), 4))
        .chain(repeat((0, 0, 0), 4))
        .chain(repeat((0, 1, 0), 5))
        .chain(repeat((1, 1, 1), 1))
        .collect()
}

/// 目标出现在右侧区域，抓起后离开视野
pub fn detection_script() -> Vec<Vec<DetectionBox>> {
    let target = DetectionBox::new(440, 200, 540, 300, 0, 0.9);
    let mut frames = vec![Vec::new(); 3];
    frames.extend(std::iter::repeat_n(vec![target], 8));
    frames.push(Vec::new());
    frames
}

/// 按配置中的引脚创建模拟硬件
pub fn hardware(config: &RobotConfig) -> SimHardware {
    let pins = config.hardware.line_pins;
    SimHardware::new([pins.left, pins.middle, pins.right])
}

/// 巡线阶段使用的台架
pub fn line_bench(config: &RobotConfig) -> SimHardware {
    let hw = hardware(config);
    hw.push_triplets(line_script());
    hw
}

/// 抓取阶段使用的台架
pub fn pick_bench(config: &RobotConfig) -> SimHardware {
    let hw = hardware(config);
    hw.push_detections(detection_script());
    hw
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_script_ends_on_cross() {
        let script = line_script();
        assert!(script.last().unwrap().is_cross());
        assert_eq!(script.iter().filter(|t| t.is_cross()).count(), 1);
        assert!(script.iter().any(|t| t.is_lost()));
        assert!(script.iter().any(|t| t.is_right_corner()));
    }

    #[test]
    fn test_detection_script_has_stable_target() {
        let script = detection_script();
        let visible = script.iter().filter(|f| !f.is_empty()).count();
        assert!(visible >= 8);
        assert!(script.last().unwrap().is_empty());
    }
}
