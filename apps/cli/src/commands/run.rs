//! run 命令
//!
//! 在仿真机器人上执行一个 note 处理序列，结束后打印动作时间线。

use crate::sim::{SimTime, load_sim_config};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use notebot_command::{
    BoxedCommand, ChannelHook, LifecycleEvent, LoopConfig, Pacing, Scheduler, run_loop,
};
use notebot_notes::{NoteCommands, NoteConfig};
use notebot_subsystems::sim::{NoteEvent, NoteScript, SimRobot};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 可执行的序列
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Intake,
    IntakeUntilNoteDetected,
    IntakeAndAutoCenter,
    AutoCenter,
    Outtake,
    Shoot,
    ShootAtCurrentRpm,
    PrepareToShoot,
}

impl Sequence {
    pub fn description(self) -> &'static str {
        match self {
            Sequence::Intake => "吸入，直到被中断",
            Sequence::IntakeUntilNoteDetected => "吸入，直到光电门检测到 note",
            Sequence::IntakeAndAutoCenter => "吸入后自动居中",
            Sequence::AutoCenter => "单独自动居中",
            Sequence::Outtake => "吐出，直到被中断",
            Sequence::Shoot => "以 --rpm 射出（没有 note 时立即结束）",
            Sequence::ShootAtCurrentRpm => "以 shooter 当前目标转速射出",
            Sequence::PrepareToShoot => "设置 arm 角度与飞轮转速，等待 arm 到位",
        }
    }

    fn build(self, notes: &NoteCommands, rpm: f64, angle: f64) -> BoxedCommand {
        match self {
            Sequence::Intake => notes.intake(),
            Sequence::IntakeUntilNoteDetected => notes.intake_until_note_detected(),
            Sequence::IntakeAndAutoCenter => notes.intake_and_auto_center_note(),
            Sequence::AutoCenter => notes.auto_center_note(),
            Sequence::Outtake => notes.outtake(),
            Sequence::Shoot => notes.shoot(rpm),
            Sequence::ShootAtCurrentRpm => notes.shoot_at_current_rpm(),
            Sequence::PrepareToShoot => notes.prepare_to_shoot(rpm, angle),
        }
    }
}

/// 序列执行参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 序列名称
    #[arg(value_enum)]
    pub sequence: Sequence,

    /// Shooter 转速（RPM）
    #[arg(long, default_value_t = 3000.0)]
    pub rpm: f64,

    /// Arm 目标角度（度）
    #[arg(long, default_value_t = 30.0)]
    pub angle: f64,

    /// 开始时通道内已有 note（光电门触发）
    #[arg(long)]
    pub loaded: bool,

    /// 在该时刻（毫秒）光电门检测到 note，可重复
    #[arg(long = "note-at", value_name = "MS")]
    pub note_at: Vec<u64>,

    /// 在该时刻（毫秒）光电门释放，可重复
    #[arg(long = "clear-at", value_name = "MS")]
    pub clear_at: Vec<u64>,

    /// 在该时刻（毫秒）把 note 放入通道入口，由位置模型决定光电门读数
    #[arg(long = "insert-at", value_name = "MS")]
    pub insert_at: Vec<u64>,

    /// 最长运行时间（毫秒），到时取消序列
    #[arg(long, default_value_t = 5000)]
    pub max_ms: u64,

    /// 调度周期（毫秒）
    #[arg(long, default_value_t = 20)]
    pub period_ms: u64,

    /// 按墙钟节奏运行（默认尽快执行）
    #[arg(long)]
    pub realtime: bool,

    /// 仿真参数文件（TOML）
    #[arg(long)]
    pub sim_config: Option<PathBuf>,
}

impl RunCommand {
    fn script(&self) -> NoteScript {
        let mut script = NoteScript::new();
        if self.loaded {
            script.push(Duration::ZERO, NoteEvent::Detected(true));
        }
        for &ms in &self.note_at {
            script.push(Duration::from_millis(ms), NoteEvent::Detected(true));
        }
        for &ms in &self.clear_at {
            script.push(Duration::from_millis(ms), NoteEvent::Detected(false));
        }
        for &ms in &self.insert_at {
            script.push(Duration::from_millis(ms), NoteEvent::Insert);
        }
        script
    }

    /// 执行序列
    pub fn execute(&self, config: &NoteConfig, stop: &AtomicBool) -> Result<()> {
        let timing = config.timing().context("序列参数无效")?;
        let pacing = if self.realtime {
            Pacing::RealTime
        } else {
            Pacing::Unpaced
        };
        let period = Duration::from_millis(self.period_ms);
        let time = SimTime::new(pacing);
        let robot = SimRobot::new(load_sim_config(self.sim_config.as_deref())?, time.shared());

        let mut script = self.script();
        script.apply(&robot, time.now());

        let notes = NoteCommands::with_timing(robot.subsystems(), timing);
        if self.sequence == Sequence::ShootAtCurrentRpm {
            robot.subsystems().shooter.set_rpm(self.rpm);
        }
        let command = self.sequence.build(&notes, self.rpm, self.angle);

        let mut scheduler = Scheduler::new();
        let (hook, events) = ChannelHook::new(1024);
        scheduler.hooks_mut().add_hook(Arc::new(hook));

        println!("▶ {} - {}", command.name(), self.sequence.description());
        let handle = scheduler.schedule(command);

        let loop_config = LoopConfig {
            period,
            max_iterations: Some(self.max_ms.div_ceil(self.period_ms.max(1))),
            pacing,
        };
        let stats = run_loop(&mut scheduler, &loop_config, |scheduler, _| {
            if stop.load(Ordering::Relaxed) || !scheduler.is_scheduled(handle) {
                return ControlFlow::Break(());
            }
            time.advance(period);
            robot.update(period);
            script.apply(&robot, time.now());
            ControlFlow::Continue(())
        })?;

        let outcome = if scheduler.is_scheduled(handle) {
            let reason = if stop.load(Ordering::Relaxed) {
                "Ctrl+C"
            } else {
                "time limit reached"
            };
            scheduler.cancel_all();
            format!("cancelled ({reason})")
        } else {
            "finished".to_string()
        };
        println!(
            "■ {} after {:.3}s ({} cycles, {} overruns)",
            outcome,
            time.now().as_secs_f64(),
            stats.iterations,
            stats.overruns
        );

        print_timeline(&robot);
        print_lifecycle(events.try_iter());
        Ok(())
    }
}

fn print_timeline(robot: &SimRobot) {
    println!();
    println!("动作时间线:");
    let journal = robot.journal();
    if journal.evicted() > 0 {
        println!("  ... 已丢弃最早的 {} 条", journal.evicted());
    }
    let entries = journal.entries();
    if entries.is_empty() {
        println!("  (无)");
    }
    for entry in entries {
        println!("  {:>8.3}s  {:?}", entry.at.as_secs_f64(), entry.action);
    }
}

fn print_lifecycle(events: impl Iterator<Item = LifecycleEvent>) {
    println!();
    println!("生命周期:");
    for event in events {
        let kind = format!("{:?}", event.kind);
        println!(
            "  cycle {:>4}  {:<12} {} {}",
            event.cycle, kind, event.handle, event.name
        );
    }
}
