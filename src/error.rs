//! Flowdock 通知错误类型
//!
//! - `EnvironmentUnavailable`: 读取构建环境变量或展开模板失败
//! - `NotificationFailure`: HTTP 返回非 2xx，或传输层 I/O 失败（此时没有状态码）
//! - `Configuration`: 配置无效，或 "test connection" 校验失败

use thiserror::Error;

/// Flowdock 通知错误
#[derive(Debug, Error)]
pub enum FlowdockError {
    /// 构建环境不可用
    #[error("{0}")]
    EnvironmentUnavailable(String),

    /// 推送失败
    #[error("{}", describe_failure(.status, .body))]
    NotificationFailure {
        /// HTTP 状态码（传输失败时为 None）
        status: Option<u16>,
        /// 响应内容或底层错误信息
        body: String,
    },

    /// 配置错误
    #[error("{0}")]
    Configuration(String),
}

fn describe_failure(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(code) => format!("Flowdock returned an error response with status {}: {}", code, body),
        None => format!("Flowdock request failed: {}", body),
    }
}

impl FlowdockError {
    /// 传输层失败（没有收到 HTTP 响应）
    pub fn transport<E: std::fmt::Display>(err: E) -> Self {
        FlowdockError::NotificationFailure {
            status: None,
            body: err.to_string(),
        }
    }

    /// HTTP 状态码（仅 `NotificationFailure` 且收到响应时有值）
    pub fn status(&self) -> Option<u16> {
        match self {
            FlowdockError::NotificationFailure { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowdockError>;
