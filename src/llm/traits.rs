//! LLM 客户端抽象
//!
//! 推理调用的具体实现不在本 crate 内；模板选择器只依赖这个 trait。

use async_trait::async_trait;

use super::Message;
use crate::core::RemoteError;

/// LLM 客户端 trait：非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, RemoteError>;

    /// 模型名，仅用于日志
    fn model_name(&self) -> &str {
        "unknown"
    }
}
