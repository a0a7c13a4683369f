//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 返回预设回复或预设错误，并记录收到的最后一组消息。

use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::RemoteError;
use crate::llm::{LlmClient, Message};

/// Mock 客户端：固定回复
#[derive(Debug)]
pub struct MockLlmClient {
    reply: Result<String, RemoteError>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RemoteError) -> Self {
        Self {
            reply: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 已调用次数
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// 最后一次调用收到的消息
    pub fn last_messages(&self) -> Option<Vec<Message>> {
        self.calls.lock().ok().and_then(|c| c.last().cloned())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, RemoteError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        self.reply.clone()
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
