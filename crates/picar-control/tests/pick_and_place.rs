//! 抓取 → 放入箱子的完整流程（模拟硬件）

use std::time::Duration;

use picar_control::{PickOutcome, PickPlace, PickState, RobotConfig, RobotVariant, StopFlag};
use picar_hal::{Clock, DetectionBox};
use picar_hal::sim::{SimEvent, SimHardware};

fn target_box() -> Vec<DetectionBox> {
    // 右侧区域、高 120 像素
    vec![DetectionBox::new(460, 180, 520, 300, 0, 0.8)]
}

#[test]
fn grasp_after_one_failed_verification_then_place() {
    let config = RobotConfig::preset(RobotVariant::Mk2);
    let hw = SimHardware::new([22, 27, 17]);
    let clock = hw.manual_clock();

    // 第一轮：8 个感知 tick + VERIFY 的 1 + 5 帧都能看到目标 => 失败
    // 第二轮：LOCK(2) + STEER + LOWER + LIFT = 5 帧看到目标，之后画面为空 => 成功
    let mut script = vec![target_box(); 8 + 6 + 5];
    script.push(vec![]);
    hw.push_detections(script);

    let mut pp = PickPlace::new(hw.clone(), hw.clone(), hw.clone(), clock.clone(), &config);
    let outcome = pp.run(&StopFlag::new()).unwrap();

    assert_eq!(outcome, PickOutcome::Grasped { attempts: 2 });
    assert_eq!(pp.stats().soft_recoveries, 1);
    assert_eq!(pp.stats().full_recoveries, 0);
    assert_eq!(pp.session().state, PickState::Search);

    // 两次都转向右侧区域
    let right_steers = hw
        .commands()
        .into_iter()
        .filter(|e| {
            *e == SimEvent::Servo {
                channel: 1,
                degrees: config.arm.zone_right,
            }
        })
        .count();
    assert_eq!(right_steers, 2);

    hw.clear_events();
    pp.arm().place_in_box().unwrap();
    let commands = hw.commands();
    assert_eq!(
        commands.first(),
        Some(&SimEvent::Servo {
            channel: 2,
            degrees: config.arm.box_height_safe
        })
    );
    assert_eq!(hw.servo_angle(4), Some(config.arm.grip_open));
    assert_eq!(hw.servo_angle(1), Some(config.arm.box_base));
    assert!(clock.now() > Duration::ZERO);
}

#[test]
fn mk2_watchdog_is_tighter_than_mk1() {
    let mk1 = RobotConfig::preset(RobotVariant::Mk1);
    let mk2 = RobotConfig::preset(RobotVariant::Mk2);
    assert!(mk2.pick.lose_sight_timeout() < mk1.pick.lose_sight_timeout());
}
