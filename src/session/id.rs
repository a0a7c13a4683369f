//! 会话 ID 生成
//!
//! 会话 ID 与沙箱会话 ID 共用同一个生成器抽象，但彼此独立分配、互不关联。

use std::sync::Arc;

use crate::config::SessionsSection;

/// 会话 ID：不透明字符串，分配后不可变
pub type SessionId = String;

/// 沙箱会话 ID：标识一次沙箱执行上下文，与 SessionId 解耦
pub type SandboxSessionId = String;

/// 全局唯一 ID 生成器（无参数、不会失败）
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 基于 UUID v4 的生成器，可选前缀（如 `agent_`）
#[derive(Debug, Clone, Default)]
pub struct UuidIdGenerator {
    prefix: Option<String>,
}

impl UuidIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    pub fn from_config(section: &SessionsSection) -> Self {
        Self {
            prefix: section.id_prefix.clone(),
        }
    }

    /// 进程级共享实例
    pub fn shared() -> Arc<dyn IdGenerator> {
        Arc::new(Self::new())
    }
}

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        let id = uuid::Uuid::new_v4();
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, id),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids = UuidIdGenerator::new();
        let a = ids.generate();
        let b = ids.generate();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_prefix() {
        let ids = UuidIdGenerator::with_prefix("agent_");
        assert!(ids.generate().starts_with("agent_"));

        let section = SessionsSection {
            id_prefix: Some("sess_".to_string()),
            ..SessionsSection::default()
        };
        assert!(UuidIdGenerator::from_config(&section)
            .generate()
            .starts_with("sess_"));
    }
}
