//! 模拟硬件后端
//!
//! [`SimHardware`] 同时实现 [`Actuators`]、[`LineSensor`]、[`Camera`]、[`Detector`]，
//! 所有命令按顺序记录到共享事件日志中；传感器读数和检测结果由脚本回放。
//! [`ManualClock`] 是虚拟时钟，`sleep` 立即推进虚拟时间并记录为 [`SimEvent::Dwell`]，
//! 便于断言"命令-等待"的交错顺序。
//!
//! `SimHardware` 的克隆共享同一份内部状态（`Arc`），测试中可以把一份交给控制器，
//! 另一份留作观察。

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::clock::Clock;
use crate::error::HalError;
use crate::traits::{Actuators, Camera, Detector, LineSensor};
use crate::types::{DetectionBox, Frame, SensorTriplet};

/// 事件日志最大长度（超出后丢弃最旧的事件）
const MAX_LOG_LEN: usize = 100_000;

/// 模拟后端记录的事件
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    Servo { channel: u8, degrees: f64 },
    Motor { channel: u8, value: f64 },
    StopAll,
    Dwell(Duration),
}

impl SimEvent {
    /// 是否为执行器命令（非等待）
    pub fn is_command(&self) -> bool {
        !matches!(self, SimEvent::Dwell(_))
    }
}

type EventLog = Arc<Mutex<VecDeque<SimEvent>>>;

fn push_event(log: &EventLog, event: SimEvent) {
    let mut log = log.lock();
    if log.len() >= MAX_LOG_LEN {
        log.pop_front();
    }
    log.push_back(event);
}

#[derive(Debug)]
struct SimState {
    servo_angles: BTreeMap<u8, f64>,
    motor_throttles: BTreeMap<u8, f64>,

    sensor_script: VecDeque<SensorTriplet>,
    current_triplet: Option<SensorTriplet>,
    /// 当前三元组已被读取过的引脚
    pins_read: Vec<u8>,
    /// 按引脚顺序映射到 (L, M, R)
    pin_map: [u8; 3],
    triplets_served: u64,

    detection_script: VecDeque<Vec<DetectionBox>>,
    last_detections: Vec<DetectionBox>,
    detect_calls: u64,

    frame_size: (u32, u32),
    frame_sequence: u64,

    fail_actuator_writes: u32,
    fail_frames: u32,
}

/// 可脚本化的模拟机器人
#[derive(Debug, Clone)]
pub struct SimHardware {
    state: Arc<Mutex<SimState>>,
    log: EventLog,
}

impl SimHardware {
    /// 创建模拟硬件
    ///
    /// `pins` 为巡线传感器引脚 (L, M, R)，用于把 `read_digital(pin)` 映射到脚本中的位。
    pub fn new(pins: [u8; 3]) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                servo_angles: BTreeMap::new(),
                motor_throttles: BTreeMap::new(),
                sensor_script: VecDeque::new(),
                current_triplet: None,
                pins_read: Vec::with_capacity(3),
                pin_map: pins,
                triplets_served: 0,
                detection_script: VecDeque::new(),
                last_detections: Vec::new(),
                detect_calls: 0,
                frame_size: (640, 480),
                frame_sequence: 0,
                fail_actuator_writes: 0,
                fail_frames: 0,
            })),
            log: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// 设置相机帧尺寸
    pub fn with_frame_size(self, width: u32, height: u32) -> Self {
        self.state.lock().frame_size = (width, height);
        self
    }

    /// 创建共享同一事件日志的虚拟时钟
    pub fn manual_clock(&self) -> ManualClock {
        ManualClock {
            now: Arc::new(Mutex::new(Duration::ZERO)),
            log: Some(self.log.clone()),
        }
    }

    /// 追加巡线传感器脚本
    ///
    /// 脚本耗尽后一直重复最后一个读数。
    pub fn push_triplets<I>(&self, triplets: I)
    where
        I: IntoIterator<Item = SensorTriplet>,
    {
        self.state.lock().sensor_script.extend(triplets);
    }

    /// 追加检测脚本（每次 `detect` 消费一项）
    ///
    /// 脚本耗尽后一直重复最后一项。
    pub fn push_detections<I>(&self, frames: I)
    where
        I: IntoIterator<Item = Vec<DetectionBox>>,
    {
        self.state.lock().detection_script.extend(frames);
    }

    /// 让接下来 `n` 次执行器写入失败
    pub fn fail_next_actuator_writes(&self, n: u32) {
        self.state.lock().fail_actuator_writes = n;
    }

    /// 让接下来 `n` 次取帧失败
    pub fn fail_next_frames(&self, n: u32) {
        self.state.lock().fail_frames = n;
    }

    /// 事件日志快照
    pub fn events(&self) -> Vec<SimEvent> {
        self.log.lock().iter().cloned().collect()
    }

    /// 仅执行器命令（去掉等待）
    pub fn commands(&self) -> Vec<SimEvent> {
        self.log
            .lock()
            .iter()
            .filter(|e| e.is_command())
            .cloned()
            .collect()
    }

    pub fn clear_events(&self) {
        self.log.lock().clear();
    }

    /// 某舵机通道最后一次设定的角度
    pub fn servo_angle(&self, channel: u8) -> Option<f64> {
        self.state.lock().servo_angles.get(&channel).copied()
    }

    /// 某电机通道当前油门
    pub fn motor_throttle(&self, channel: u8) -> f64 {
        self.state.lock().motor_throttles.get(&channel).copied().unwrap_or(0.0)
    }

    /// 已提供的传感器三元组数量
    pub fn triplets_served(&self) -> u64 {
        self.state.lock().triplets_served
    }

    /// `detect` 被调用的次数
    pub fn detect_calls(&self) -> u64 {
        self.state.lock().detect_calls
    }

    fn check_write(&self, channel: u8) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.fail_actuator_writes > 0 {
            state.fail_actuator_writes -= 1;
            return Err(HalError::Actuator {
                channel,
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Actuators for SimHardware {
    fn set_servo_angle(&mut self, channel: u8, degrees: f64) -> Result<(), HalError> {
        self.check_write(channel)?;
        debug!(channel, degrees, "sim servo");
        self.state.lock().servo_angles.insert(channel, degrees);
        push_event(&self.log, SimEvent::Servo { channel, degrees });
        Ok(())
    }

    fn set_motor_throttle(&mut self, channel: u8, value: f64) -> Result<(), HalError> {
        if !(-1.0..=1.0).contains(&value) {
            return Err(HalError::InvalidThrottle(value));
        }
        self.check_write(channel)?;
        debug!(channel, value, "sim motor");
        self.state.lock().motor_throttles.insert(channel, value);
        push_event(&self.log, SimEvent::Motor { channel, value });
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), HalError> {
        debug!("sim stop_all");
        for throttle in self.state.lock().motor_throttles.values_mut() {
            *throttle = 0.0;
        }
        push_event(&self.log, SimEvent::StopAll);
        Ok(())
    }
}

impl LineSensor for SimHardware {
    fn read_digital(&mut self, pin: u8) -> Result<bool, HalError> {
        let mut state = self.state.lock();
        let Some(index) = state.pin_map.iter().position(|&p| p == pin) else {
            return Err(HalError::Sensor {
                pin,
                reason: "pin not wired in simulation".to_string(),
            });
        };

        // 同一引脚被再次读取 => 进入下一个 tick 的读数
        if state.current_triplet.is_none() || state.pins_read.contains(&pin) {
            let next = state
                .sensor_script
                .pop_front()
                .or(state.current_triplet)
                .unwrap_or_default();
            state.current_triplet = Some(next);
            state.pins_read.clear();
            state.triplets_served += 1;
        }
        state.pins_read.push(pin);

        let triplet = state.current_triplet.unwrap_or_default();
        Ok(match index {
            0 => triplet.left,
            1 => triplet.middle,
            _ => triplet.right,
        })
    }
}

impl Camera for SimHardware {
    fn get_frame(&mut self) -> Result<Frame, HalError> {
        let mut state = self.state.lock();
        if state.fail_frames > 0 {
            state.fail_frames -= 1;
            return Err(HalError::Camera("injected capture failure".to_string()));
        }
        state.frame_sequence += 1;
        let (width, height) = state.frame_size;
        Ok(Frame::blank(width, height, state.frame_sequence))
    }
}

impl Detector for SimHardware {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectionBox>, HalError> {
        let mut state = self.state.lock();
        state.detect_calls += 1;
        if let Some(next) = state.detection_script.pop_front() {
            state.last_detections = next;
        }
        Ok(state.last_detections.clone())
    }
}

/// 虚拟时钟
///
/// `sleep` 不阻塞，只推进虚拟时间。
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    log: Option<EventLog>,
}

impl ManualClock {
    /// 独立的虚拟时钟（不记录等待事件）
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Duration::ZERO)),
            log: None,
        }
    }

    /// 手动推进时间（不记录事件）
    pub fn advance(&self, duration: Duration) {
        *self.now.lock() += duration;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }

    fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        *self.now.lock() += duration;
        if let Some(log) = &self.log {
            push_event(log, SimEvent::Dwell(duration));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::read_triplet;
    use crate::types::SensorPins;

    const PINS: SensorPins = SensorPins {
        left: 19,
        middle: 16,
        right: 20,
    };

    fn sim() -> SimHardware {
        SimHardware::new([PINS.left, PINS.middle, PINS.right])
    }

    #[test]
    fn test_sensor_script_replays_and_repeats_last() {
        let mut hw = sim();
        hw.push_triplets([
            SensorTriplet::from_bits(0, 1, 0),
            SensorTriplet::from_bits(1, 1, 1),
        ]);

        assert_eq!(
            read_triplet(&mut hw, &PINS).unwrap(),
            SensorTriplet::from_bits(0, 1, 0)
        );
        assert_eq!(
            read_triplet(&mut hw, &PINS).unwrap(),
            SensorTriplet::from_bits(1, 1, 1)
        );
        // 脚本耗尽：重复最后一个
        assert_eq!(
            read_triplet(&mut hw, &PINS).unwrap(),
            SensorTriplet::from_bits(1, 1, 1)
        );
        assert_eq!(hw.triplets_served(), 3);
    }

    #[test]
    fn test_unknown_pin_is_error() {
        let mut hw = sim();
        assert!(matches!(
            hw.read_digital(5),
            Err(HalError::Sensor { pin: 5, .. })
        ));
    }

    #[test]
    fn test_commands_are_logged_in_order() {
        let mut hw = sim();
        let observer = hw.clone();
        let clock = hw.manual_clock();

        hw.set_servo_angle(4, 120.0).unwrap();
        clock.sleep(Duration::from_millis(300));
        hw.set_motor_throttle(14, -0.2).unwrap();
        hw.stop_all().unwrap();

        assert_eq!(
            observer.events(),
            vec![
                SimEvent::Servo {
                    channel: 4,
                    degrees: 120.0
                },
                SimEvent::Dwell(Duration::from_millis(300)),
                SimEvent::Motor {
                    channel: 14,
                    value: -0.2
                },
                SimEvent::StopAll,
            ]
        );
        assert_eq!(observer.commands().len(), 3);
        assert_eq!(observer.motor_throttle(14), 0.0);
        assert_eq!(observer.servo_angle(4), Some(120.0));
        assert_eq!(clock.now(), Duration::from_millis(300));
    }

    #[test]
    fn test_invalid_throttle_rejected() {
        let mut hw = sim();
        assert_eq!(
            hw.set_motor_throttle(0, 1.5),
            Err(HalError::InvalidThrottle(1.5))
        );
        assert!(hw.events().is_empty());
    }

    #[test]
    fn test_injected_failures() {
        let mut hw = sim();
        hw.fail_next_actuator_writes(1);
        assert!(hw.set_servo_angle(1, 90.0).is_err());
        assert!(hw.set_servo_angle(1, 90.0).is_ok());

        hw.fail_next_frames(1);
        assert!(hw.get_frame().is_err());
        let frame = hw.get_frame().unwrap();
        assert_eq!((frame.width, frame.height), (640, 480));
    }

    #[test]
    fn test_detection_script_repeats_last() {
        let mut hw = sim();
        let b = DetectionBox::new(300, 200, 340, 300, 0, 0.8);
        hw.push_detections([vec![b], vec![]]);
        let frame = hw.get_frame().unwrap();

        assert_eq!(hw.detect(&frame).unwrap(), vec![b]);
        assert!(hw.detect(&frame).unwrap().is_empty());
        assert!(hw.detect(&frame).unwrap().is_empty());
        assert_eq!(hw.detect_calls(), 3);
    }
}
