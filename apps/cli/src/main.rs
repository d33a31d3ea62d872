//! # Notebot CLI
//!
//! 在仿真机器人上运行 note 处理序列。
//!
//! ```bash
//! # 已装填 note，1 秒后 note 离开光电门
//! notebot-cli run shoot --rpm 3500 --loaded --clear-at 1000
//!
//! # 吸入并自动居中，光电门时序由脚本给出
//! notebot-cli run intake-and-auto-center --note-at 300 --clear-at 700 --note-at 800
//!
//! # 系统辨识样本
//! notebot-cli sysid --test dynamic-forward -o shooter.csv
//!
//! # 序列参数
//! notebot-cli config init notes.toml
//! notebot-cli --config notes.toml run auto-center --loaded
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，例如 `RUST_LOG=notebot_command=debug`。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use notebot_notes::NoteConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod commands;
mod sim;

use commands::{ConfigCommand, RunCommand, Sequence, SysIdCommand};

/// Notebot CLI - note 处理序列运行工具
#[derive(Parser, Debug)]
#[command(name = "notebot-cli")]
#[command(about = "Run note-handling command sequences on a simulated robot", long_about = None)]
#[command(version)]
struct Cli {
    /// 序列参数配置文件（TOML）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 执行一个序列
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 系统辨识（shooter 电压扫描）
    Sysid {
        #[command(flatten)]
        args: SysIdCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 列出可执行的序列
    List,
}

fn load_config(path: Option<&PathBuf>) -> Result<NoteConfig> {
    match path {
        Some(path) => NoteConfig::load_from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display())),
        None => Ok(NoteConfig::default()),
    }
}

/// Ctrl+C 时置位，调度循环在下一个周期退出
fn install_stop_handler() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Stopping...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("设置 Ctrl+C 处理失败")?;
    Ok(stop)
}

fn main() -> Result<()> {
    // 初始化日志（stderr，stdout 留给输出数据）
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("notebot_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Run { args } => {
            let stop = install_stop_handler()?;
            args.execute(&config, &stop)
        },

        Commands::Sysid { args } => {
            let stop = install_stop_handler()?;
            args.execute(&config, &stop)
        },

        Commands::Config(cmd) => cmd.execute(&config),

        Commands::List => {
            for sequence in Sequence::value_variants() {
                if let Some(value) = sequence.to_possible_value() {
                    println!("{:<28} {}", value.get_name(), sequence.description());
                }
            }
            Ok(())
        },
    }
}
