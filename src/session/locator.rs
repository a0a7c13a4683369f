//! 会话定位
//!
//! 两条路径：
//! - 快速路径（`search_all = false`）：直接绑定默认辖区，不做初始化检查
//! - 探测路径（`search_all = true`）：按辖区顺序逐个探测，命中第一个已初始化的即返回
//!
//! 探测路径找不到时仍返回默认辖区的 handle 而不是报错，调用方自行检查 `is_initialized()`。
//! 刚创建的会话、跨辖区传播延迟都会造成查找落空，这不是硬错误。

use std::sync::Arc;

use super::partition::{Partition, PartitionOrder};
use super::state::SessionState;
use super::store::{SessionHandle, SessionStore};
use crate::config::SessionsSection;
use crate::core::SessionError;

/// 会话定位器：会话 ID -> handle
#[derive(Clone)]
pub struct SessionLocator {
    store: Arc<dyn SessionStore>,
    order: PartitionOrder,
}

impl SessionLocator {
    pub fn new(store: Arc<dyn SessionStore>, order: PartitionOrder) -> Self {
        Self { store, order }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, section: &SessionsSection) -> Self {
        Self::new(store, PartitionOrder::from_config(section))
    }

    pub fn partitions(&self) -> &PartitionOrder {
        &self.order
    }

    /// 定位会话
    ///
    /// 返回的 handle 可能未初始化（快速路径从不检查；探测路径全部落空时回落到默认辖区）。
    pub async fn locate(&self, session_id: &str, search_all: bool) -> Arc<dyn SessionHandle> {
        if search_all {
            if let Some(handle) = self.find(session_id).await {
                return handle;
            }
        }
        self.store.bind(session_id, &Partition::Default)
    }

    /// 依序探测所有辖区，返回第一个已初始化的 handle
    pub async fn find(&self, session_id: &str) -> Option<Arc<dyn SessionHandle>> {
        for partition in self.order.iter() {
            let candidate = self.store.bind(session_id, partition);
            if candidate.is_initialized().await {
                tracing::debug!(session_id, partition = %partition, "session located");
                return Some(candidate);
            }
            tracing::debug!(session_id, partition = %partition, "session not in partition");
        }
        None
    }

    /// 定位并读取完整状态；未初始化时返回 `NotFound`
    pub async fn read_state(
        &self,
        session_id: &str,
        search_all: bool,
    ) -> Result<SessionState, SessionError> {
        let handle = if search_all {
            self.find(session_id).await
        } else {
            let handle = self.locate(session_id, false).await;
            handle.is_initialized().await.then_some(handle)
        };

        let handle = handle.ok_or_else(|| SessionError::NotFound {
            session_id: session_id.to_string(),
        })?;

        handle
            .get_full_state()
            .await
            .map_err(|source| SessionError::StateRead {
                session_id: session_id.to_string(),
                source,
            })
    }
}
