//! 调度层错误类型定义
//!
//! 组合核心本身没有错误分类：失败表现为序列卡住而不是返回错误。
//! 这里只覆盖调度器 API 的误用。

use crate::resource::ResourceId;
use thiserror::Error;

/// 调度层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// 默认命令必须恰好需求它所绑定的资源
    #[error("Default command for {resource} must require exactly that resource, got {actual}")]
    DefaultCommandRequirements {
        resource: ResourceId,
        actual: String,
    },

    /// 循环配置无效
    #[error("Invalid loop config: {0}")]
    InvalidLoopConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_error_display() {
        let resource = ResourceId::new("indexer");
        let err = SchedulerError::DefaultCommandRequirements {
            resource,
            actual: "{}".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("indexer"), "message: {}", msg);

        let err = SchedulerError::InvalidLoopConfig("period must be > 0".to_string());
        assert_eq!(format!("{}", err), "Invalid loop config: period must be > 0");
    }
}
