//! Shooter 命令

use notebot_command::prelude::*;
use notebot_subsystems::Subsystems;

/// 设置目标转速，立即完成
pub fn set_rpm(subsystems: &Subsystems, rpm: f64) -> Action {
    let shooter = subsystems.shooter.clone();
    run_once(move || shooter.set_rpm(rpm), [subsystems.shooter.resource()])
        .with_name("SetRPM")
}

/// 设置目标转速并等待飞轮到达
///
/// 没有超时：飞轮达不到目标时会一直占有 shooter。
pub fn set_and_wait_for_rpm(subsystems: &Subsystems, rpm: f64) -> Composite {
    let shooter = subsystems.shooter.clone();
    sequence(vec![
        set_rpm(subsystems, rpm).boxed(),
        idle([subsystems.shooter.resource()])
            .until(move || shooter.at_goal_rpm())
            .boxed(),
    ])
    .with_name("SetAndWaitForRPM")
}

/// 禁用 shooter，立即完成
pub fn disable(subsystems: &Subsystems) -> Action {
    let shooter = subsystems.shooter.clone();
    run_once(move || shooter.disable(), [subsystems.shooter.resource()])
        .with_name("DisableShooter")
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebot_subsystems::sim::{SimAction, SimConfig, SimRobot};
    use std::time::Duration;

    #[test]
    fn test_set_and_wait_for_rpm_holds_until_at_goal() {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let mut scheduler = Scheduler::new();

        let handle = scheduler.schedule(set_and_wait_for_rpm(&robot.subsystems(), 3000.0));
        let dt = Duration::from_millis(20);
        let mut cycles = 0;
        while scheduler.is_scheduled(handle) {
            clock.advance(dt);
            robot.update(dt);
            scheduler.run();
            cycles += 1;
            assert!(cycles < 100, "never reached goal rpm");
        }

        assert!(robot.subsystems().shooter.at_goal_rpm());
        // 6000 RPM/s 的仿真飞轮需要 0.5 s
        assert!(cycles >= 25);
        assert_eq!(robot.journal().actions(), vec![SimAction::ShooterSetRpm(3000.0)]);
    }

    #[test]
    fn test_disable_preempts_spin_up() {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let mut scheduler = Scheduler::new();

        let spin_up = scheduler.schedule(set_and_wait_for_rpm(&robot.subsystems(), 3000.0));
        let dt = Duration::from_millis(20);
        for _ in 0..5 {
            clock.advance(dt);
            robot.update(dt);
            scheduler.run();
        }
        assert!(robot.shooter().is_enabled());

        let stop = scheduler.schedule(disable(&robot.subsystems()));
        assert!(!scheduler.is_scheduled(spin_up));
        scheduler.run();
        assert!(!scheduler.is_scheduled(stop));
        assert!(!robot.shooter().is_enabled());
        assert_eq!(
            robot.journal().actions(),
            vec![SimAction::ShooterSetRpm(3000.0), SimAction::ShooterDisable]
        );
    }

    #[test]
    fn test_requirements_are_shooter_only() {
        let robot = SimRobot::new(SimConfig::default(), ManualClock::new().shared());
        let subsystems = robot.subsystems();
        let command = set_and_wait_for_rpm(&subsystems, 1000.0);
        assert_eq!(command.requirements().len(), 1);
        assert!(command.requirements().contains(subsystems.shooter.resource()));
    }
}
