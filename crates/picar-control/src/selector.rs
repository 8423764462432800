//! # 目标选择
//!
//! 每帧从检测框中选出一个最佳目标，并按水平中心划分区域。
//!
//! 评分：`score = -(框中心到帧中心距离²) + weight * confidence`，取最大值；
//! 并列时保留第一个。

use std::cmp::Ordering;
use std::fmt;

use picar_hal::DetectionBox;

use crate::config::VisionConfig;

/// 目标在画面中的水平区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Left => write!(f, "LEFT"),
            Zone::Center => write!(f, "CENTER"),
            Zone::Right => write!(f, "RIGHT"),
        }
    }
}

/// 本帧选中的目标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub bbox: DetectionBox,
    pub zone: Zone,
    /// 框中心 (cx, cy)
    pub center: (i32, i32),
}

/// 按水平中心划分区域
///
/// 边界为 `floor(width * low)` 与 `floor(width * high)`：
/// `cx < 左边界 → Left`，`cx > 右边界 → Right`，其余 `Center`。
pub fn classify_zone(cx: i32, width: u32, band: (f64, f64)) -> Zone {
    let (low, high) = band;
    let left_edge = (width as f64 * low).floor() as i64;
    let right_edge = (width as f64 * high).floor() as i64;
    let cx = cx as i64;

    if cx < left_edge {
        Zone::Left
    } else if cx > right_edge {
        Zone::Right
    } else {
        Zone::Center
    }
}

/// 目标选择器
#[derive(Debug, Clone, Copy)]
pub struct TargetSelector {
    band: (f64, f64),
    confidence_weight: f64,
}

impl TargetSelector {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            band: config.band(),
            confidence_weight: config.confidence_weight,
        }
    }

    /// 单个检测框的评分
    pub fn score(&self, bbox: &DetectionBox, frame_width: u32, frame_height: u32) -> f64 {
        let (cx, cy) = bbox.center();
        let dx = cx as f64 - (frame_width / 2) as f64;
        let dy = cy as f64 - (frame_height / 2) as f64;
        -(dx * dx + dy * dy) + self.confidence_weight * bbox.confidence as f64
    }

    /// 选出本帧最佳目标；无检测框时返回 `None`
    pub fn select(
        &self,
        boxes: &[DetectionBox],
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Target> {
        let mut best: Option<(&DetectionBox, f64)> = None;
        for bbox in boxes {
            let score = self.score(bbox, frame_width, frame_height);
            let better = match best {
                None => true,
                Some((_, best_score)) => rank(score, best_score) == Ordering::Greater,
            };
            if better {
                best = Some((bbox, score));
            }
        }

        best.map(|(bbox, _)| {
            let center = bbox.center();
            Target {
                bbox: *bbox,
                zone: classify_zone(center.0, frame_width, self.band),
                center,
            }
        })
    }
}

/// 非有限分数排在所有有限分数之后
fn rank(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAND: (f64, f64) = (0.35, 0.65);

    fn selector() -> TargetSelector {
        TargetSelector::new(&VisionConfig::default())
    }

    #[test]
    fn test_classify_zone_examples() {
        assert_eq!(classify_zone(100, 640, BAND), Zone::Left);
        assert_eq!(classify_zone(320, 640, BAND), Zone::Center);
        assert_eq!(classify_zone(500, 640, BAND), Zone::Right);
    }

    #[test]
    fn test_classify_zone_edges() {
        // 640 * 0.35 = 224, 640 * 0.65 = 416
        assert_eq!(classify_zone(223, 640, BAND), Zone::Left);
        assert_eq!(classify_zone(224, 640, BAND), Zone::Center);
        assert_eq!(classify_zone(416, 640, BAND), Zone::Center);
        assert_eq!(classify_zone(417, 640, BAND), Zone::Right);
    }

    #[test]
    fn test_classify_zone_monotonic() {
        let order = |z: Zone| match z {
            Zone::Left => 0,
            Zone::Center => 1,
            Zone::Right => 2,
        };
        let mut prev = 0;
        for cx in -50..700 {
            let z = order(classify_zone(cx, 640, BAND));
            assert!(z >= prev, "cx={} went backwards", cx);
            prev = z;
        }
    }

    #[test]
    fn test_select_empty_is_none() {
        assert_eq!(selector().select(&[], 640, 480), None);
    }

    #[test]
    fn test_select_prefers_centered_box() {
        let off = DetectionBox::new(0, 0, 100, 100, 0, 0.9);
        let centered = DetectionBox::new(300, 220, 340, 260, 0, 0.5);
        let target = selector().select(&[off, centered], 640, 480).unwrap();
        assert_eq!(target.bbox, centered);
        assert_eq!(target.zone, Zone::Center);
        assert_eq!(target.center, (320, 240));
    }

    #[test]
    fn test_confidence_breaks_near_ties() {
        // 两个框到中心距离相同，置信度高者胜出
        let a = DetectionBox::new(310, 230, 330, 250, 0, 0.2);
        let b = DetectionBox::new(310, 230, 330, 250, 1, 0.8);
        let target = selector().select(&[a, b], 640, 480).unwrap();
        assert_eq!(target.bbox.class_id, 1);
    }

    #[test]
    fn test_exact_tie_keeps_first() {
        let a = DetectionBox::new(100, 100, 120, 120, 7, 0.5);
        let b = DetectionBox::new(100, 100, 120, 120, 8, 0.5);
        let target = selector().select(&[a, b], 640, 480).unwrap();
        assert_eq!(target.bbox.class_id, 7);
    }

    #[test]
    fn test_nan_confidence_sorts_last() {
        let nan = DetectionBox::new(310, 230, 330, 250, 0, f32::NAN);
        let far = DetectionBox::new(0, 0, 10, 10, 1, 0.1);
        let target = selector().select(&[nan, far], 640, 480).unwrap();
        assert_eq!(target.bbox.class_id, 1);
    }

    #[test]
    fn test_select_is_idempotent() {
        let boxes = [
            DetectionBox::new(10, 10, 60, 90, 0, 0.4),
            DetectionBox::new(500, 200, 600, 300, 2, 0.95),
            DetectionBox::new(200, 200, 260, 280, 1, 0.6),
        ];
        let s = selector();
        assert_eq!(s.select(&boxes, 640, 480), s.select(&boxes, 640, 480));
    }
}
