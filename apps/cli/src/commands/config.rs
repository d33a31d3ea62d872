//! 配置管理命令
//!
//! 生成、查看与校验序列参数文件（TOML）

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use notebot_notes::NoteConfig;
use std::path::PathBuf;

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写出默认配置文件
    Init {
        /// 输出路径
        path: PathBuf,

        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },

    /// 显示生效的配置（--config 指定的文件或默认值）
    Show,

    /// 校验配置文件
    Check {
        /// 配置文件路径
        path: PathBuf,
    },
}

impl ConfigCommand {
    pub fn execute(self, effective: &NoteConfig) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(path, force),

            ConfigCommand::Show => Self::show_(effective),

            ConfigCommand::Check { path } => Self::check_(path),
        }
    }

    fn init_(path: PathBuf, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!("{} 已存在（使用 --force 覆盖）", path.display());
        }
        NoteConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(config: &NoteConfig) -> Result<()> {
        let content = toml::to_string_pretty(config).context("序列化配置失败")?;
        print!("{content}");
        Ok(())
    }

    fn check_(path: PathBuf) -> Result<()> {
        let config = NoteConfig::load_from_file(&path)
            .with_context(|| format!("配置文件无效: {}", path.display()))?;
        let timing = config.timing()?;
        let sysid = config.sysid()?;

        println!("✅ 配置文件有效: {}", path.display());
        println!("  auto_center_standalone:   {:?}", timing.auto_center_standalone);
        println!("  auto_center_continuation: {:?}", timing.auto_center_continuation);
        println!("  feed_settle:              {:?}", timing.feed_settle);
        println!(
            "  sysid: ramp {} V/s, step {} V, timeout {:?}",
            sysid.ramp_rate, sysid.step_voltage, sysid.timeout
        );
        Ok(())
    }
}
