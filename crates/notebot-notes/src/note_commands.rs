//! # Note 处理序列
//!
//! 每个方法构建一棵新的命令树，闭包在构建时捕获子系统句柄。树本身不可
//! 复用：需要重新调度时再构建一次。
//!
//! | 序列 | 需求 | 结束方式 |
//! |------|------|----------|
//! | [`intake`](NoteCommands::intake) | intake, indexer | 仅被中断 |
//! | [`intake_until_note_detected`](NoteCommands::intake_until_note_detected) | intake, indexer | 光电门触发 |
//! | [`intake_and_auto_center_note`](NoteCommands::intake_and_auto_center_note) | intake, indexer | 居中完成 |
//! | [`auto_center_note`](NoteCommands::auto_center_note) | indexer | 居中完成 |
//! | [`outtake`](NoteCommands::outtake) | intake, indexer | 仅被中断 |
//! | [`shoot`](NoteCommands::shoot) | shooter, indexer | 射出后 settle 超时 |
//! | [`prepare_to_shoot`](NoteCommands::prepare_to_shoot) | arm, shooter | arm 到位 |
//!
//! 传感器门控的等待没有超时，需要的话由调用方用
//! [`CommandExt::with_timeout`] 包装。

use crate::config::NoteTiming;
use crate::{arm_commands, shooter_commands};
use notebot_command::prelude::*;
use notebot_subsystems::Subsystems;
use std::time::Duration;
use tracing::debug;

/// 接在 intake 之后自动居中时的初始进料时长
pub const AUTO_CENTER_NOTE_CONTINUATION: Duration = Duration::from_millis(200);

/// 单独使用自动居中时的初始进料时长
pub const AUTO_CENTER_NOTE_STANDALONE: Duration = Duration::from_millis(250);

/// 射出后继续保持 shooter/indexer 的时长
pub const FEED_SETTLE: Duration = Duration::from_millis(500);

/// Note 处理命令工厂
#[derive(Clone)]
pub struct NoteCommands {
    subsystems: Subsystems,
    timing: NoteTiming,
}

impl NoteCommands {
    /// 使用默认时序参数
    pub fn new(subsystems: Subsystems) -> Self {
        Self::with_timing(subsystems, NoteTiming::default())
    }

    pub fn with_timing(subsystems: Subsystems, timing: NoteTiming) -> Self {
        Self { subsystems, timing }
    }

    pub fn subsystems(&self) -> &Subsystems {
        &self.subsystems
    }

    pub fn timing(&self) -> &NoteTiming {
        &self.timing
    }

    /// 吸入 note，直到被其它命令中断
    ///
    /// 同时启动 intake 滚轮和 indexer 传送带，然后保持两者的占有权，
    /// 防止默认命令接管。本身不关闭电机。
    pub fn intake(&self) -> BoxedCommand {
        let intake = self.subsystems.intake.clone();
        let indexer = self.subsystems.indexer.clone();
        let intake_id = intake.resource();
        let indexer_id = indexer.resource();

        sequence(vec![
            parallel(vec![
                run_once(move || intake.intake_in(), [intake_id])
                    .with_name("IntakeIn")
                    .boxed(),
                run_once(move || indexer.intake(), [indexer_id])
                    .with_name("IndexerIntake")
                    .boxed(),
            ])
            .boxed(),
            idle([intake_id, indexer_id]).boxed(),
        ])
        .with_name("Intake")
        .boxed()
    }

    /// 吸入直到光电门检测到 note，结束时关闭 intake 和 indexer
    pub fn intake_until_note_detected(&self) -> BoxedCommand {
        self.intake_until_note_detected_with(true)
    }

    /// 吸入直到光电门检测到 note
    ///
    /// 任何退出路径都关闭 intake；`disable_indexer` 为 `false` 时保留
    /// indexer 的运行状态，交给后续的居中序列。
    pub fn intake_until_note_detected_with(&self, disable_indexer: bool) -> BoxedCommand {
        let detector = self.subsystems.indexer.clone();
        let intake = self.subsystems.intake.clone();
        let indexer = self.subsystems.indexer.clone();

        self.intake()
            .until(move || detector.is_note_detected())
            .with_name("IntakeUntilNoteDetected")
            .finally_do(move |interrupted| {
                debug!(
                    "IntakeUntilNoteDetected ended (interrupted: {}, disable_indexer: {})",
                    interrupted, disable_indexer
                );
                intake.disable();
                if disable_indexer {
                    indexer.disable();
                }
            })
            .boxed()
    }

    /// 吸入直到检测到 note，然后自动居中
    pub fn intake_and_auto_center_note(&self) -> BoxedCommand {
        sequence(vec![
            self.intake_until_note_detected_with(false),
            self.auto_center_note_with(self.timing.auto_center_continuation),
        ])
        .with_name("IntakeAndAutoCenterNote")
        .boxed()
    }

    /// 单独使用的自动居中
    pub fn auto_center_note(&self) -> BoxedCommand {
        self.auto_center_note_with(self.timing.auto_center_standalone)
    }

    /// 自动居中
    ///
    /// 先进料 `initial_intake`，再反转直到光电门释放，最后正转直到重新
    /// 检测到 note。任何退出路径都关闭 indexer。
    pub fn auto_center_note_with(&self, initial_intake: Duration) -> BoxedCommand {
        let indexer_id = self.subsystems.indexer.resource();
        let clock = self.subsystems.clock.clone();
        let (forward, reverse, forward_again) = (
            self.subsystems.indexer.clone(),
            self.subsystems.indexer.clone(),
            self.subsystems.indexer.clone(),
        );
        let (cleared, detected) = (
            self.subsystems.indexer.clone(),
            self.subsystems.indexer.clone(),
        );
        let indexer = self.subsystems.indexer.clone();

        sequence(vec![
            run_once(move || forward.intake(), [indexer_id])
                .with_name("IndexerIntake")
                .boxed(),
            idle([indexer_id])
                .with_timeout(initial_intake, clock)
                .boxed(),
            run_once(move || reverse.outtake(), [indexer_id])
                .with_name("IndexerOuttake")
                .boxed(),
            idle([indexer_id])
                .until(move || !cleared.is_note_detected())
                .boxed(),
            run_once(move || forward_again.intake(), [indexer_id])
                .with_name("IndexerIntake")
                .boxed(),
            idle([indexer_id])
                .until(move || detected.is_note_detected())
                .boxed(),
        ])
        .with_name("AutoCenterNote")
        .finally_do(move |_| indexer.disable())
        .boxed()
    }

    /// 吐出 note，直到被其它命令中断；结束时关闭 intake 和 indexer
    pub fn outtake(&self) -> BoxedCommand {
        let (intake, indexer) = (
            self.subsystems.intake.clone(),
            self.subsystems.indexer.clone(),
        );
        let (intake_off, indexer_off) = (
            self.subsystems.intake.clone(),
            self.subsystems.indexer.clone(),
        );
        let intake_id = intake.resource();
        let indexer_id = indexer.resource();

        sequence(vec![
            parallel(vec![
                run_once(move || intake.intake_out(), [intake_id])
                    .with_name("IntakeOut")
                    .boxed(),
                run_once(move || indexer.outtake(), [indexer_id])
                    .with_name("IndexerOuttake")
                    .boxed(),
            ])
            .boxed(),
            idle([intake_id, indexer_id]).boxed(),
        ])
        .with_name("Outtake")
        .finally_do(move |_| {
            intake_off.disable();
            indexer_off.disable();
        })
        .boxed()
    }

    /// 射出 note
    ///
    /// 激活时若光电门没有检测到 note，立即完成，不触碰任何电机。否则：
    /// 飞轮加速到 `rpm`，indexer 送料，等光电门释放后再保持
    /// `feed_settle`。结束时关闭 shooter 和 indexer。
    pub fn shoot(&self, rpm: f64) -> BoxedCommand {
        let shooter_id = self.subsystems.shooter.resource();
        let indexer_id = self.subsystems.indexer.resource();
        let clock = self.subsystems.clock.clone();
        let (feeder, cleared, has_note) = (
            self.subsystems.indexer.clone(),
            self.subsystems.indexer.clone(),
            self.subsystems.indexer.clone(),
        );
        let (shooter, indexer) = (
            self.subsystems.shooter.clone(),
            self.subsystems.indexer.clone(),
        );

        let fire = sequence(vec![
            shooter_commands::set_and_wait_for_rpm(&self.subsystems, rpm).boxed(),
            run_once(move || feeder.feed(), [indexer_id])
                .with_name("IndexerFeed")
                .boxed(),
            idle([shooter_id, indexer_id])
                .until(move || !cleared.is_note_detected())
                .boxed(),
            idle([shooter_id, indexer_id])
                .with_timeout(self.timing.feed_settle, clock)
                .boxed(),
        ])
        .with_name("Fire")
        .finally_do(move |_| {
            shooter.disable();
            indexer.disable();
        });

        either(fire.boxed(), none().boxed(), move || {
            let detected = has_note.is_note_detected();
            if !detected {
                debug!("Shoot: no note detected, skipping");
            }
            detected
        })
        .with_name("Shoot")
        .boxed()
    }

    /// 以 shooter 当前目标转速射出
    ///
    /// 转速在构建时读取，之后目标转速的变化不影响这个命令。
    pub fn shoot_at_current_rpm(&self) -> BoxedCommand {
        self.shoot(self.subsystems.shooter.goal_rpm())
    }

    /// 同时设置 arm 角度与飞轮转速，等待 arm 到位
    ///
    /// 不等待飞轮。
    pub fn prepare_to_shoot(&self, rpm: f64, degrees: f64) -> BoxedCommand {
        let arm = self.subsystems.arm.clone();
        let arm_id = arm.resource();
        let shooter_id = self.subsystems.shooter.resource();

        sequence(vec![
            parallel(vec![
                arm_commands::seek_to_angle(&self.subsystems, degrees).boxed(),
                shooter_commands::set_rpm(&self.subsystems, rpm).boxed(),
            ])
            .boxed(),
            idle([arm_id, shooter_id])
                .until(move || arm.at_goal_angle())
                .boxed(),
        ])
        .with_name("PrepareToShoot")
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebot_subsystems::sim::{SimConfig, SimRobot};

    fn commands() -> NoteCommands {
        let robot = SimRobot::new(SimConfig::default(), ManualClock::new().shared());
        NoteCommands::new(robot.subsystems())
    }

    #[test]
    fn test_names() {
        let notes = commands();
        assert_eq!(notes.intake().name(), "Intake");
        assert_eq!(notes.intake_until_note_detected().name(), "IntakeUntilNoteDetected");
        assert_eq!(notes.intake_and_auto_center_note().name(), "IntakeAndAutoCenterNote");
        assert_eq!(notes.auto_center_note().name(), "AutoCenterNote");
        assert_eq!(notes.outtake().name(), "Outtake");
        assert_eq!(notes.shoot(3000.0).name(), "Shoot");
        assert_eq!(notes.prepare_to_shoot(3000.0, 30.0).name(), "PrepareToShoot");
    }

    #[test]
    fn test_requirements() {
        let notes = commands();
        let s = notes.subsystems().clone();
        let (intake, indexer, shooter, arm) = (
            s.intake.resource(),
            s.indexer.resource(),
            s.shooter.resource(),
            s.arm.resource(),
        );

        let expect = |command: BoxedCommand, expected: &[ResourceId]| {
            let actual: Vec<_> = command.requirements().iter().collect();
            let mut expected = expected.to_vec();
            expected.sort();
            assert_eq!(actual, expected, "{}", command.name());
        };

        expect(notes.intake(), &[intake, indexer]);
        expect(notes.intake_until_note_detected(), &[intake, indexer]);
        expect(notes.intake_and_auto_center_note(), &[intake, indexer]);
        expect(notes.auto_center_note(), &[indexer]);
        expect(notes.outtake(), &[intake, indexer]);
        // 分支需求为两个分支的并集
        expect(notes.shoot(3000.0), &[shooter, indexer]);
        expect(notes.prepare_to_shoot(3000.0, 30.0), &[arm, shooter]);
    }

    #[test]
    fn test_shoot_at_current_rpm_reads_goal_at_build_time() {
        let clock = ManualClock::new();
        let robot = SimRobot::new(SimConfig::default(), clock.shared());
        let notes = NoteCommands::new(robot.subsystems());

        robot.subsystems().shooter.set_rpm(2500.0);
        let command = notes.shoot_at_current_rpm();
        robot.subsystems().shooter.set_rpm(1000.0);
        robot.journal().clear();
        robot.indexer().set_note_detected(true);

        let mut scheduler = Scheduler::new();
        scheduler.schedule(command);
        assert_eq!(robot.subsystems().shooter.goal_rpm(), 2500.0);
    }
}
