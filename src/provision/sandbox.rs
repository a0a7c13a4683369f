//! 沙箱服务客户端
//!
//! 每个新的沙箱会话 ID 分配一个客户端；模板详情通过该客户端按名称拉取。

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::RemoteError;
use crate::session::SandboxSessionId;

/// 模板中的单个文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFile {
    pub path: String,
    pub contents: String,
}

/// 模板完整定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<TemplateFile>,
    /// 包名 -> 版本
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// 生成时应优先阅读的文件
    #[serde(default)]
    pub important_files: Vec<String>,
    /// 生成时不应修改的文件
    #[serde(default)]
    pub dont_touch_files: Vec<String>,
}

impl TemplateDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            files: Vec::new(),
            dependencies: BTreeMap::new(),
            important_files: Vec::new(),
            dont_touch_files: Vec::new(),
        }
    }

    pub fn file(&self, path: &str) -> Option<&TemplateFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// 模板详情响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDetailsResponse {
    pub success: bool,
    #[serde(default)]
    pub template_details: Option<TemplateDetails>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TemplateDetailsResponse {
    pub fn ok(details: TemplateDetails) -> Self {
        Self {
            success: true,
            template_details: Some(details),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            template_details: None,
            error: Some(error.into()),
        }
    }
}

/// 绑定到某个沙箱会话的客户端
#[async_trait]
pub trait SandboxClient: Send + Sync {
    fn sandbox_session_id(&self) -> &str;

    async fn get_template_details(
        &self,
        name: &str,
    ) -> Result<TemplateDetailsResponse, RemoteError>;
}

/// 按沙箱会话 ID 分配客户端
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    async fn allocate(&self, sandbox_session_id: SandboxSessionId) -> Arc<dyn SandboxClient>;
}
