//! 错误类型
//!
//! - `RemoteError`：远端协作方（会话存储、模板目录、沙箱服务、推理）返回的失败
//! - `SessionError`：定位 / 克隆会话时向调用方抛出的致命错误，均带上涉及的会话 ID
//!
//! 模板编排阶段的失败不会以错误形式离开本 crate，见 `provision::ProvisionDiagnostic`。

use thiserror::Error;

/// 远端调用失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),

    /// 对端明确拒绝（非 2xx 或 success=false）
    #[error("rejected by remote: {0}")]
    Rejected(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("remote call timed out after {0}s")]
    Timeout(u64),
}

/// 会话定位与克隆的致命错误
#[derive(Error, Debug)]
pub enum SessionError {
    /// 所有辖区均未找到已初始化的会话
    #[error("session not found in any partition: {session_id}")]
    NotFound { session_id: String },

    #[error("failed to read state of session {session_id}: {source}")]
    StateRead {
        session_id: String,
        #[source]
        source: RemoteError,
    },

    #[error("failed to write state of session {session_id}: {source}")]
    StateWrite {
        session_id: String,
        #[source]
        source: RemoteError,
    },
}

impl SessionError {
    /// 出错的会话 ID
    pub fn session_id(&self) -> &str {
        match self {
            SessionError::NotFound { session_id }
            | SessionError::StateRead { session_id, .. }
            | SessionError::StateWrite { session_id, .. } => session_id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_carries_id() {
        let err = SessionError::StateWrite {
            session_id: "s-1".to_string(),
            source: RemoteError::Transport("connection reset".to_string()),
        };
        assert_eq!(err.session_id(), "s-1");
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("s-1"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_not_found_message() {
        let err = SessionError::NotFound {
            session_id: "missing".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "session not found in any partition: missing");
    }
}
