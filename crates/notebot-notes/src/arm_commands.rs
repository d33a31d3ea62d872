//! Arm 命令

use notebot_command::prelude::*;
use notebot_subsystems::Subsystems;

/// 设置目标角度，立即完成
pub fn seek_to_angle(subsystems: &Subsystems, degrees: f64) -> Action {
    let arm = subsystems.arm.clone();
    run_once(move || arm.set_goal_angle(degrees), [subsystems.arm.resource()])
        .with_name("SeekToAngle")
}

/// 设置目标角度并等待到达
pub fn seek_and_wait_for_angle(subsystems: &Subsystems, degrees: f64) -> Composite {
    let arm = subsystems.arm.clone();
    sequence(vec![
        seek_to_angle(subsystems, degrees).boxed(),
        idle([subsystems.arm.resource()])
            .until(move || arm.at_goal_angle())
            .boxed(),
    ])
    .with_name("SeekAndWaitForAngle")
}

/// 禁用 arm，立即完成
pub fn disable(subsystems: &Subsystems) -> Action {
    let arm = subsystems.arm.clone();
    run_once(move || arm.disable(), [subsystems.arm.resource()])
        .with_name("DisableArm")
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebot_subsystems::sim::{SimAction, SimConfig, SimRobot};
    use std::time::Duration;

    #[test]
    fn test_seek_to_angle_is_instant() {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let mut scheduler = Scheduler::new();

        let handle = scheduler.schedule(seek_to_angle(&robot.subsystems(), 30.0));
        scheduler.run();
        assert!(!scheduler.is_scheduled(handle));
        assert_eq!(robot.arm().goal_angle(), 30.0);
        assert_eq!(robot.journal().actions(), vec![SimAction::ArmSetGoal(30.0)]);
    }

    #[test]
    fn test_seek_and_wait_for_angle() {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let mut scheduler = Scheduler::new();

        let handle = scheduler.schedule(seek_and_wait_for_angle(&robot.subsystems(), 18.0));
        let dt = Duration::from_millis(20);
        for _ in 0..5 {
            clock.advance(dt);
            robot.update(dt);
            scheduler.run();
        }
        // 90°/s，0.2 s 才能到 18°
        assert!(scheduler.is_scheduled(handle));

        for _ in 0..10 {
            clock.advance(dt);
            robot.update(dt);
            scheduler.run();
        }
        assert!(!scheduler.is_scheduled(handle));
        assert!(robot.subsystems().arm.at_goal_angle());
    }

    #[test]
    fn test_disabled_arm_holds_position() {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let mut scheduler = Scheduler::new();

        scheduler.schedule(seek_to_angle(&robot.subsystems(), 40.0));
        scheduler.run();
        robot.arm().force_angle(40.0);
        assert!(robot.subsystems().arm.at_goal_angle());

        let handle = scheduler.schedule(disable(&robot.subsystems()));
        scheduler.run();
        assert!(!scheduler.is_scheduled(handle));
        // 禁用后不再报告到位，模型也不再移动
        assert!(!robot.subsystems().arm.at_goal_angle());
        robot.update(Duration::from_secs(1));
        assert_eq!(robot.arm().angle(), 40.0);
        assert_eq!(
            robot.journal().actions(),
            vec![SimAction::ArmSetGoal(40.0), SimAction::ArmDisable]
        );
    }
}
