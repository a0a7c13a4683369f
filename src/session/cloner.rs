//! 会话克隆
//!
//! 把已有会话的完整状态复制到一个全新的会话 ID，并按 `SessionState::fork` 的策略重置运行期字段。
//! 新会话总是创建在默认辖区。任何读写失败都直接上抛，克隆没有「部分成功」。

use std::sync::Arc;

use super::id::{IdGenerator, SessionId};
use super::locator::SessionLocator;
use super::store::SessionHandle;
use crate::core::SessionError;

/// 克隆结果
pub struct ClonedSession {
    pub session_id: SessionId,
    pub handle: Arc<dyn SessionHandle>,
}

impl std::fmt::Debug for ClonedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClonedSession")
            .field("session_id", &self.session_id)
            .field("partition", self.handle.partition())
            .finish()
    }
}

/// 会话克隆器
pub struct SessionCloner {
    locator: SessionLocator,
    ids: Arc<dyn IdGenerator>,
}

impl SessionCloner {
    pub fn new(locator: SessionLocator, ids: Arc<dyn IdGenerator>) -> Self {
        Self { locator, ids }
    }

    /// 克隆 `source_id` 指向的会话
    ///
    /// 源会话在任何辖区都找不到时返回 `NotFound`，此时不会分配新 ID 也不会写入。
    pub async fn clone_session(&self, source_id: &str) -> Result<ClonedSession, SessionError> {
        let source_handle = self
            .locator
            .find(source_id)
            .await
            .ok_or_else(|| SessionError::NotFound {
                session_id: source_id.to_string(),
            })?;

        let new_id = self.ids.generate();
        let target = self.locator.locate(&new_id, false).await;

        let state = source_handle
            .get_full_state()
            .await
            .map_err(|source| SessionError::StateRead {
                session_id: source_id.to_string(),
                source,
            })?;

        let forked = state.fork(new_id.clone());

        target
            .set_state(forked)
            .await
            .map_err(|source| SessionError::StateWrite {
                session_id: new_id.clone(),
                source,
            })?;

        tracing::info!(
            source_id,
            source_partition = %source_handle.partition(),
            new_id = %new_id,
            "session cloned"
        );

        Ok(ClonedSession {
            session_id: new_id,
            handle: target,
        })
    }
}
