//! # 序列参数配置
//!
//! 时长以秒为单位写在 TOML 中：
//!
//! ```toml
//! [timing]
//! auto_center_standalone = 0.25
//! auto_center_continuation = 0.2
//! feed_settle = 0.5
//!
//! [sysid]
//! ramp_rate = 1.0
//! step_voltage = 7.0
//! timeout = 10.0
//! ```
//!
//! 缺失的字段使用默认值。

use crate::note_commands::{
    AUTO_CENTER_NOTE_CONTINUATION, AUTO_CENTER_NOTE_STANDALONE, FEED_SETTLE,
};
use crate::sysid::SysIdConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 数值为负、NaN 或无穷大
    #[error("Invalid value for `{field}`: {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

/// 序列时序参数（已校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteTiming {
    /// 单独使用自动居中时的初始进料时长
    pub auto_center_standalone: Duration,
    /// 接在 intake 之后自动居中时的初始进料时长
    pub auto_center_continuation: Duration,
    /// 射出后保持 shooter/indexer 的时长
    pub feed_settle: Duration,
}

impl Default for NoteTiming {
    fn default() -> Self {
        Self {
            auto_center_standalone: AUTO_CENTER_NOTE_STANDALONE,
            auto_center_continuation: AUTO_CENTER_NOTE_CONTINUATION,
            feed_settle: FEED_SETTLE,
        }
    }
}

/// 配置文件根
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    pub timing: TimingSettings,
    pub sysid: SysIdSettings,
}

/// `[timing]`（秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub auto_center_standalone: f64,
    pub auto_center_continuation: f64,
    pub feed_settle: f64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        let timing = NoteTiming::default();
        Self {
            auto_center_standalone: timing.auto_center_standalone.as_secs_f64(),
            auto_center_continuation: timing.auto_center_continuation.as_secs_f64(),
            feed_settle: timing.feed_settle.as_secs_f64(),
        }
    }
}

/// `[sysid]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysIdSettings {
    /// 准静态斜坡（V/s）
    pub ramp_rate: f64,
    /// 动态阶跃电压（V）
    pub step_voltage: f64,
    /// 单次测试时长（秒）
    pub timeout: f64,
}

impl Default for SysIdSettings {
    fn default() -> Self {
        let sysid = SysIdConfig::default();
        Self {
            ramp_rate: sysid.ramp_rate,
            step_voltage: sysid.step_voltage,
            timeout: sysid.timeout.as_secs_f64(),
        }
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidValue { field, value })
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { field, value })
    }
}

impl NoteConfig {
    /// 从 TOML 文件加载并校验
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存为 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// 检查所有数值
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timing()?;
        self.sysid()?;
        Ok(())
    }

    /// 时序参数
    pub fn timing(&self) -> Result<NoteTiming, ConfigError> {
        let t = &self.timing;
        Ok(NoteTiming {
            auto_center_standalone: seconds(
                "timing.auto_center_standalone",
                t.auto_center_standalone,
            )?,
            auto_center_continuation: seconds(
                "timing.auto_center_continuation",
                t.auto_center_continuation,
            )?,
            feed_settle: seconds("timing.feed_settle", t.feed_settle)?,
        })
    }

    /// 系统辨识参数
    pub fn sysid(&self) -> Result<SysIdConfig, ConfigError> {
        let s = &self.sysid;
        Ok(SysIdConfig {
            ramp_rate: non_negative("sysid.ramp_rate", s.ramp_rate)?,
            step_voltage: non_negative("sysid.step_voltage", s.step_voltage)?,
            timeout: seconds("sysid.timeout", s.timeout)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = NoteConfig::default();
        let timing = config.timing().unwrap();
        assert_eq!(timing, NoteTiming::default());
        assert_eq!(timing.auto_center_standalone, Duration::from_millis(250));
        assert_eq!(timing.auto_center_continuation, Duration::from_millis(200));
        assert_eq!(timing.feed_settle, Duration::from_millis(500));
        assert_eq!(config.sysid().unwrap(), SysIdConfig::default());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = NoteConfig::from_toml("[timing]\nfeed_settle = 0.75\n").unwrap();
        let timing = config.timing().unwrap();
        assert_eq!(timing.feed_settle, Duration::from_millis(750));
        assert_eq!(timing.auto_center_standalone, AUTO_CENTER_NOTE_STANDALONE);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let config = NoteConfig::from_toml("[timing]\nfeed_settle = -0.5\n").unwrap();
        match config.validate() {
            Err(ConfigError::InvalidValue { field, value }) => {
                assert_eq!(field, "timing.feed_settle");
                assert_eq!(value, -0.5);
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_rejected() {
        let mut config = NoteConfig::default();
        config.sysid.ramp_rate = f64::NAN;
        assert!(matches!(
            config.sysid(),
            Err(ConfigError::InvalidValue { field: "sysid.ramp_rate", .. })
        ));

        let mut config = NoteConfig::default();
        config.sysid.timeout = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error() {
        let result = NoteConfig::from_toml("[timing\nfeed_settle = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
