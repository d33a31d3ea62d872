//! sysid 命令
//!
//! 在仿真 shooter 上执行系统辨识测试，样本以 CSV 输出。

use crate::sim::{SimTime, load_sim_config};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use notebot_command::{LoopConfig, Pacing, Scheduler, run_loop};
use notebot_notes::{Direction, NoteConfig, SysIdRoutine, SysIdSample, TestKind};
use notebot_subsystems::sim::SimRobot;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// 测试之间让机构停下来的时间
const REST: Duration = Duration::from_secs(2);

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysIdTest {
    All,
    QuasistaticForward,
    QuasistaticReverse,
    DynamicForward,
    DynamicReverse,
}

impl SysIdTest {
    fn selected(self) -> Vec<(TestKind, Direction)> {
        match self {
            SysIdTest::All => vec![
                (TestKind::Quasistatic, Direction::Forward),
                (TestKind::Quasistatic, Direction::Reverse),
                (TestKind::Dynamic, Direction::Forward),
                (TestKind::Dynamic, Direction::Reverse),
            ],
            SysIdTest::QuasistaticForward => vec![(TestKind::Quasistatic, Direction::Forward)],
            SysIdTest::QuasistaticReverse => vec![(TestKind::Quasistatic, Direction::Reverse)],
            SysIdTest::DynamicForward => vec![(TestKind::Dynamic, Direction::Forward)],
            SysIdTest::DynamicReverse => vec![(TestKind::Dynamic, Direction::Reverse)],
        }
    }
}

/// 系统辨识参数
#[derive(Args, Debug)]
pub struct SysIdCommand {
    /// 要执行的测试
    #[arg(long, value_enum, default_value_t = SysIdTest::All)]
    pub test: SysIdTest,

    /// 样本输出文件（默认 stdout）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 覆盖配置中的单次测试时长（毫秒）
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// 调度周期（毫秒）
    #[arg(long, default_value_t = 20)]
    pub period_ms: u64,

    /// 仿真参数文件（TOML）
    #[arg(long)]
    pub sim_config: Option<PathBuf>,
}

impl SysIdCommand {
    pub fn execute(&self, config: &NoteConfig, stop: &AtomicBool) -> Result<()> {
        let mut sysid = config.sysid().context("系统辨识参数无效")?;
        if let Some(ms) = self.timeout_ms {
            sysid.timeout = Duration::from_millis(ms);
        }
        let period = Duration::from_millis(self.period_ms);

        let time = SimTime::new(Pacing::Unpaced);
        let robot = SimRobot::new(load_sim_config(self.sim_config.as_deref())?, time.shared());
        let (routine, samples) =
            SysIdRoutine::with_channel(robot.shooter().clone(), sysid, time.shared(), 65536);

        let mut writer: Box<dyn Write> = match &self.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("创建输出文件失败: {}", path.display()))?;
                Box::new(BufWriter::new(file))
            },
            None => Box::new(io::stdout().lock()),
        };
        writeln!(writer, "test,direction,time_s,voltage,position,velocity")?;

        let mut scheduler = Scheduler::new();
        let cycles_per_test = sysid.timeout.as_nanos() / period.as_nanos().max(1) + 2;
        let loop_config = LoopConfig {
            period,
            max_iterations: Some(u64::try_from(cycles_per_test).unwrap_or(u64::MAX)),
            pacing: Pacing::Unpaced,
        };

        for (test, direction) in self.test.selected() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let label = routine.label(test, direction);
            let command = match test {
                TestKind::Quasistatic => routine.quasistatic(direction),
                TestKind::Dynamic => routine.dynamic(direction),
            };
            let handle = scheduler.schedule(command);

            run_loop(&mut scheduler, &loop_config, |scheduler, _| {
                if stop.load(Ordering::Relaxed) || !scheduler.is_scheduled(handle) {
                    return ControlFlow::Break(());
                }
                time.advance(period);
                robot.update(period);
                ControlFlow::Continue(())
            })?;
            scheduler.cancel(handle);

            let mut count = 0usize;
            for sample in samples.try_iter() {
                write_sample(&mut writer, &sample)?;
                count += 1;
            }
            info!("{}: {} samples", label, count);
            eprintln!("{label}: {count} samples");

            // 静止后再开始下一个测试
            let mut rested = Duration::ZERO;
            while rested < REST {
                time.advance(period);
                robot.update(period);
                rested += period;
            }
        }

        writer.flush()?;
        if routine.dropped_samples() > 0 {
            eprintln!("⚠️  {} samples dropped", routine.dropped_samples());
        }
        Ok(())
    }
}

fn write_sample(writer: &mut dyn Write, sample: &SysIdSample) -> io::Result<()> {
    writeln!(
        writer,
        "{},{},{:.3},{:.4},{:.6},{:.6}",
        sample.test,
        sample.direction,
        sample.time.as_secs_f64(),
        sample.voltage,
        sample.position,
        sample.velocity
    )
}
