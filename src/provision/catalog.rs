//! 模板目录
//!
//! 目录服务只负责列出可用模板的名称与描述；完整模板内容由沙箱服务按名称懒加载。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::RemoteError;

/// 目录中的一个模板条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalogEntry {
    pub name: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub description: TemplateDescription,
}

/// 模板描述：selection 供选择器判断适用场景，usage 供后续生成使用
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TemplateDescription {
    #[serde(default)]
    pub selection: String,
    #[serde(default)]
    pub usage: String,
}

impl TemplateCatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: None,
            frameworks: Vec::new(),
            description: TemplateDescription::default(),
        }
    }

    pub fn with_selection_hint(mut self, hint: impl Into<String>) -> Self {
        self.description.selection = hint.into();
        self
    }

    pub fn with_frameworks<I, S>(mut self, frameworks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frameworks = frameworks.into_iter().map(Into::into).collect();
        self
    }

    /// 单行摘要，拼入选择 prompt
    pub fn summary(&self) -> String {
        let mut line = format!("- {}", self.name);
        if let Some(language) = &self.language {
            line.push_str(&format!(" [{}]", language));
        }
        if !self.frameworks.is_empty() {
            line.push_str(&format!(" ({})", self.frameworks.join(", ")));
        }
        if !self.description.selection.is_empty() {
            line.push_str(&format!(": {}", self.description.selection));
        }
        line
    }
}

/// 目录服务响应；没有模板时返回 success=true 与空列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub success: bool,
    #[serde(default)]
    pub templates: Vec<TemplateCatalogEntry>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CatalogResponse {
    pub fn ok(templates: Vec<TemplateCatalogEntry>) -> Self {
        Self {
            success: true,
            templates,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            templates: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// 模板目录服务
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// 传输层失败返回 Err；「没有模板」不是错误
    async fn list_templates(&self) -> Result<CatalogResponse, RemoteError>;
}

/// 固定列表的目录
#[derive(Debug, Clone, Default)]
pub struct StaticTemplateCatalog {
    templates: Vec<TemplateCatalogEntry>,
}

impl StaticTemplateCatalog {
    pub fn new(templates: Vec<TemplateCatalogEntry>) -> Self {
        Self { templates }
    }
}

#[async_trait]
impl TemplateCatalog for StaticTemplateCatalog {
    async fn list_templates(&self) -> Result<CatalogResponse, RemoteError> {
        Ok(CatalogResponse::ok(self.templates.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let entry = TemplateCatalogEntry::new("react-starter")
            .with_frameworks(["react", "vite"])
            .with_selection_hint("single page apps");
        assert_eq!(
            entry.summary(),
            "- react-starter (react, vite): single page apps"
        );
        assert_eq!(TemplateCatalogEntry::new("bare").summary(), "- bare");
    }

    #[test]
    fn test_catalog_response_defaults() {
        let resp: CatalogResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(resp.success);
        assert!(resp.templates.is_empty());
    }
}
