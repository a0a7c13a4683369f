//! Hive - 智能体会话编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **llm**: 推理消息与 LLM 客户端抽象（供模板选择使用）
//! - **observability**: tracing 初始化
//! - **provision**: 模板目录、AI 模板选择、沙箱分配的降级编排
//! - **session**: 多辖区会话定位、会话状态与克隆

pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod provision;
pub mod session;

pub use crate::core::{RemoteError, SessionError};
pub use provision::{InferenceContext, ProvisionOutcome, TemplateProvisioner};
pub use session::{SessionCloner, SessionLocator, SessionState};
