//! 巡线控制器的属性测试
//!
//! 使用 proptest 在任意传感器序列上验证控制不变量。

use picar_control::line_follow::slew_limit;
use picar_control::{LineFollower, RobotConfig};
use picar_hal::sim::{ManualClock, SimEvent, SimHardware};
use picar_hal::{DriveDirection, SensorTriplet};
use proptest::prelude::*;

type Follower = LineFollower<SimHardware, SimHardware, ManualClock>;

fn follower(
    config: &RobotConfig,
    direction: DriveDirection,
    script: &[SensorTriplet],
) -> (Follower, SimHardware) {
    let pins = config.hardware.line_pins;
    let hw = SimHardware::new([pins.left, pins.middle, pins.right]);
    hw.push_triplets(script.iter().copied());
    let clock = hw.manual_clock();
    (
        LineFollower::new(hw.clone(), hw.clone(), clock, config, direction),
        hw,
    )
}

fn triplet() -> impl Strategy<Value = SensorTriplet> {
    (0u8..2, 0u8..2, 0u8..2).prop_map(|(l, m, r)| SensorTriplet::from_bits(l, m, r))
}

fn direction() -> impl Strategy<Value = DriveDirection> {
    prop_oneof![Just(DriveDirection::Forward), Just(DriveDirection::Backward)]
}

proptest! {
    /// 任意误差下转向输出都在 [right_max, left_max] 内
    #[test]
    fn steering_always_within_limits(
        script in prop::collection::vec(triplet(), 1..60),
        kp in 0.0..10_000.0f64,
        dir in direction(),
    ) {
        let mut config = RobotConfig::default();
        config.line.kp = kp;
        let (right, left) = (config.steering.right_max_deg, config.steering.left_max_deg);
        let (mut lf, hw) = follower(&config, dir, &script);

        for _ in 0..script.len() {
            lf.tick().unwrap();
            let steer = lf.state().current_steer_deg;
            prop_assert!((right..=left).contains(&steer), "steer {} out of range", steer);
        }
        for event in hw.commands() {
            if let SimEvent::Servo { channel: 0, degrees } = event {
                prop_assert!((right..=left).contains(&degrees));
            }
        }
    }

    /// 斜率限制：任意原始速度序列下，相邻输出之差不超过 slew
    #[test]
    fn slew_limit_bounds_every_step(
        raw in prop::collection::vec(-2.0..2.0f64, 1..100),
        slew in 0.001..0.5f64,
    ) {
        let mut prev = 0.0;
        for r in raw {
            let next = slew_limit(prev, r, slew);
            prop_assert!((next - prev).abs() <= slew + 1e-12);
            prop_assert!((0.0..=1.0).contains(&next));
            prev = next;
        }
    }

    /// 控制器中每个 tick 的速度变化受 slew 限制（不含停车 tick）
    #[test]
    fn controller_speed_is_slew_limited(
        script in prop::collection::vec(
            triplet().prop_filter("no stop patterns", |t| !t.is_cross() && !t.is_lost()),
            1..60,
        ),
        dir in direction(),
    ) {
        let config = RobotConfig::default();
        let (mut lf, _hw) = follower(&config, dir, &script);
        let mut prev = lf.state().prev_pwm;
        for _ in 0..script.len() {
            lf.tick().unwrap();
            let speed = lf.state().prev_pwm;
            prop_assert!((speed - prev).abs() <= config.line.pwm_slew + 1e-12);
            prev = speed;
        }
    }

    /// (1,1,1) 的 tick 中，停车命令先于任何转向 / 驱动命令
    #[test]
    fn cross_stops_first(
        script in prop::collection::vec(triplet(), 1..40),
        dir in direction(),
    ) {
        let config = RobotConfig::default();
        let (mut lf, hw) = follower(&config, dir, &script);
        for t in &script {
            hw.clear_events();
            lf.tick().unwrap();
            if t.is_cross() {
                let cmds = hw.commands();
                prop_assert_eq!(cmds.first(), Some(&SimEvent::StopAll));
            }
        }
    }

    /// 丢线计数：(0,0,0) 严格递增，其他读数清零
    #[test]
    fn lost_count_tracks_consecutive_loss(
        script in prop::collection::vec(triplet(), 1..60),
        dir in direction(),
    ) {
        let config = RobotConfig::default();
        let (mut lf, _hw) = follower(&config, dir, &script);
        let mut prev = 0;
        for t in &script {
            lf.tick().unwrap();
            let lost = lf.state().lost_count;
            if t.is_lost() {
                prop_assert_eq!(lost, prev + 1);
            } else {
                prop_assert_eq!(lost, 0);
            }
            prev = lost;
        }
    }
}
