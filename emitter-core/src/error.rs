//! 事件分发统一错误定义
//!
//! 聚焦调用参数校验、增强（enhance）冲突、未处理事件与延迟调度等最小必要集合，
//! 便于在增强层与基础发射器之间统一为 `EmitterError`。
//!
use thiserror::Error;

/// 统一错误类型（最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EmitterError {
    // --- 调用参数 ---
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // --- 增强 ---
    #[error("double enhancement: target={target}")]
    DoubleEnhancement { target: String },

    // --- 分发 ---
    #[error("no listener attached for event: {event}")]
    UnhandledEvent { event: String },

    // --- 延迟调度 ---
    #[error("scheduler error: {reason}")]
    Scheduler { reason: String },
}

impl EmitterError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn double_enhancement(target: impl Into<String>) -> Self {
        Self::DoubleEnhancement {
            target: target.into(),
        }
    }

    pub fn unhandled_event(event: impl Into<String>) -> Self {
        Self::UnhandledEvent {
            event: event.into(),
        }
    }

    pub fn scheduler(reason: impl Into<String>) -> Self {
        Self::Scheduler {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type EmitterResult<T> = Result<T, EmitterError>;
