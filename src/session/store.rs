//! 会话存储抽象层
//!
//! `SessionStore` 按「会话 ID + 辖区」绑定一个 `SessionHandle`。绑定本身不访问远端，
//! 只有 handle 上的探测与读写才是远端调用。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::id::SessionId;
use super::partition::Partition;
use super::state::SessionState;
use crate::core::RemoteError;

/// 指向某个辖区中（可能尚未初始化的）远端会话的引用
///
/// handle 只是一次查找的结果，本身不持有状态。
#[async_trait]
pub trait SessionHandle: Send + Sync {
    fn session_id(&self) -> &str;

    /// 绑定时确定的辖区，之后不再改变
    fn partition(&self) -> &Partition;

    /// 初始化探测（远端调用，可能失败）
    async fn check_initialized(&self) -> Result<bool, RemoteError>;

    /// 不抛错的初始化探测：探测失败视为未初始化
    async fn is_initialized(&self) -> bool {
        match self.check_initialized().await {
            Ok(initialized) => initialized,
            Err(e) => {
                tracing::debug!(
                    session_id = self.session_id(),
                    partition = %self.partition(),
                    error = %e,
                    "initialization check failed, treating as not initialized"
                );
                false
            }
        }
    }

    /// 读取完整快照
    async fn get_full_state(&self) -> Result<SessionState, RemoteError>;

    /// 整体替换快照
    async fn set_state(&self, state: SessionState) -> Result<(), RemoteError>;
}

/// 按辖区寻址的会话存储
pub trait SessionStore: Send + Sync {
    fn bind(&self, session_id: &str, partition: &Partition) -> Arc<dyn SessionHandle>;
}

type PartitionMap = HashMap<Partition, HashMap<SessionId, SessionState>>;

/// 内存会话存储：每个辖区一张表，读写均按值拷贝
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    partitions: Arc<RwLock<PartitionMap>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入一个已初始化的会话（以 state.session_id 为键）
    pub async fn insert(&self, partition: Partition, state: SessionState) {
        self.partitions
            .write()
            .await
            .entry(partition)
            .or_default()
            .insert(state.session_id.clone(), state);
    }

    pub async fn contains(&self, partition: &Partition, session_id: &str) -> bool {
        self.partitions
            .read()
            .await
            .get(partition)
            .is_some_and(|sessions| sessions.contains_key(session_id))
    }

    /// 读取快照副本（测试与诊断用）
    pub async fn snapshot(&self, partition: &Partition, session_id: &str) -> Option<SessionState> {
        self.partitions
            .read()
            .await
            .get(partition)
            .and_then(|sessions| sessions.get(session_id).cloned())
    }

    /// 所有辖区的会话总数
    pub async fn session_count(&self) -> usize {
        self.partitions.read().await.values().map(HashMap::len).sum()
    }
}

impl SessionStore for MemorySessionStore {
    fn bind(&self, session_id: &str, partition: &Partition) -> Arc<dyn SessionHandle> {
        Arc::new(MemorySessionHandle {
            session_id: session_id.to_string(),
            partition: partition.clone(),
            partitions: Arc::clone(&self.partitions),
        })
    }
}

struct MemorySessionHandle {
    session_id: SessionId,
    partition: Partition,
    partitions: Arc<RwLock<PartitionMap>>,
}

#[async_trait]
impl SessionHandle for MemorySessionHandle {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn partition(&self) -> &Partition {
        &self.partition
    }

    async fn check_initialized(&self) -> Result<bool, RemoteError> {
        Ok(self
            .partitions
            .read()
            .await
            .get(&self.partition)
            .is_some_and(|sessions| sessions.contains_key(&self.session_id)))
    }

    async fn get_full_state(&self) -> Result<SessionState, RemoteError> {
        self.partitions
            .read()
            .await
            .get(&self.partition)
            .and_then(|sessions| sessions.get(&self.session_id).cloned())
            .ok_or_else(|| {
                RemoteError::Rejected(format!(
                    "session {} is not initialized in {}",
                    self.session_id, self.partition
                ))
            })
    }

    async fn set_state(&self, state: SessionState) -> Result<(), RemoteError> {
        self.partitions
            .write()
            .await
            .entry(self.partition.clone())
            .or_default()
            .insert(self.session_id.clone(), state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_does_not_initialize() {
        let store = MemorySessionStore::new();
        let handle = store.bind("s1", &Partition::Default);
        assert!(!handle.is_initialized().await);
        assert!(handle.get_full_state().await.is_err());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let store = MemorySessionStore::new();
        let handle = store.bind("s1", &Partition::jurisdiction("eu"));
        handle
            .set_state(SessionState::new("s1", "landing page"))
            .await
            .unwrap();

        assert!(handle.is_initialized().await);
        assert!(store.contains(&Partition::jurisdiction("eu"), "s1").await);
        assert!(!store.contains(&Partition::Default, "s1").await);
        assert_eq!(handle.get_full_state().await.unwrap().query, "landing page");
    }

    #[tokio::test]
    async fn test_reads_are_copies() {
        let store = MemorySessionStore::new();
        store
            .insert(Partition::Default, SessionState::new("s1", "q"))
            .await;
        let handle = store.bind("s1", &Partition::Default);

        let mut state = handle.get_full_state().await.unwrap();
        state.query = "changed".to_string();

        let stored = store.snapshot(&Partition::Default, "s1").await.unwrap();
        assert_eq!(stored.query, "q");
    }
}
