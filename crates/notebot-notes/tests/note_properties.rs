//! Note 处理序列的属性测试

mod common;

use common::Rig;
use notebot_subsystems::sim::SimAction;
use proptest::prelude::*;

proptest! {
    /// 没有 note 时，任意转速的射出都立即完成且不触碰电机
    #[test]
    fn shoot_without_note_never_enables_motors(rpm in 1.0..20000.0f64) {
        let mut rig = Rig::new();
        let handle = rig.scheduler.schedule(rig.notes.shoot(rpm));
        rig.step();

        prop_assert!(!rig.scheduler.is_scheduled(handle));
        prop_assert!(rig.actions().is_empty());
        prop_assert!(!rig.robot.shooter().is_enabled());
    }

    /// 任意时刻中断吸入，intake 恰好关闭一次
    #[test]
    fn intake_until_note_detected_cleans_up_once(
        cycles in 0usize..60,
        disable_indexer in any::<bool>(),
        detect_first in any::<bool>(),
    ) {
        let mut rig = Rig::new();
        let handle = rig
            .scheduler
            .schedule(rig.notes.intake_until_note_detected_with(disable_indexer));
        rig.steps(cycles);
        if detect_first {
            rig.note_detected(true);
            rig.step();
        }
        rig.scheduler.cancel(handle);
        rig.steps(3);

        prop_assert_eq!(rig.count(SimAction::IntakeDisable), 1);
        prop_assert_eq!(rig.count(SimAction::IndexerDisable), usize::from(disable_indexer));
    }

    /// 任意时刻中断射出，shooter 与 indexer 各关闭一次
    #[test]
    fn shoot_interrupted_anywhere_disables_once(cycles in 0usize..80) {
        let mut rig = Rig::new();
        rig.note_detected(true);
        let handle = rig.scheduler.schedule(rig.notes.shoot(3000.0));
        rig.steps(cycles);
        rig.scheduler.cancel(handle);

        prop_assert_eq!(rig.count(SimAction::ShooterDisable), 1);
        prop_assert_eq!(rig.count(SimAction::IndexerDisable), 1);
    }

    /// prepare_to_shoot 结束时 arm 必然到位
    #[test]
    fn prepare_to_shoot_finishes_only_at_goal(angle in 0.0..90.0f64, rpm in 500.0..6000.0f64) {
        let mut rig = Rig::new();
        let handle = rig.scheduler.schedule(rig.notes.prepare_to_shoot(rpm, angle));
        for _ in 0..100 {
            rig.step();
            if !rig.scheduler.is_scheduled(handle) {
                break;
            }
        }
        prop_assert!(!rig.scheduler.is_scheduled(handle));
        prop_assert!(rig.robot.subsystems().arm.at_goal_angle());
    }
}
