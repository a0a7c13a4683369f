//! 模板选择器
//!
//! 根据用户需求从目录中挑一个模板；不挑（`selected_template_name = None`）表示从零生成。
//! 选择只是建议，选择器自身永远返回一个 `TemplateSelection`，不向上抛错。

use std::sync::Arc;

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::catalog::TemplateCatalogEntry;
use crate::llm::{LlmClient, Message};

/// 项目复杂度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// 模板选择结果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TemplateSelection {
    /// 选中的模板名；为空表示从零生成
    #[serde(default)]
    pub selected_template_name: Option<String>,
    /// 选择理由
    #[serde(default)]
    pub reasoning: String,
    /// 用例归类，如 "Dashboard"、"E-Commerce"
    #[serde(default)]
    pub use_case: Option<String>,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    /// 视觉风格，如 "Minimalist"
    #[serde(default)]
    pub style_selection: Option<String>,
    /// 建议的项目名（小写，短横线分隔）
    #[serde(default)]
    pub project_name: Option<String>,
}

impl TemplateSelection {
    /// 从零生成
    pub fn from_scratch(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: reasoning.into(),
            ..Default::default()
        }
    }

    pub fn selected(name: impl Into<String>) -> Self {
        Self {
            selected_template_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// 选中的模板名（空白视为未选）
    pub fn template_name(&self) -> Option<&str> {
        self.selected_template_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// 推理上下文：对本 crate 不透明，原样交给选择器
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InferenceContext {
    pub agent_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// 覆盖默认模型
    #[serde(default)]
    pub model: Option<String>,
}

impl InferenceContext {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }
}

/// AI 模板选择
#[async_trait]
pub trait TemplateSelector: Send + Sync {
    async fn select(
        &self,
        query: &str,
        templates: &[TemplateCatalogEntry],
        ctx: &InferenceContext,
    ) -> TemplateSelection;
}

/// 返回 `TemplateSelection` 的 JSON Schema 字符串，拼入 system prompt
pub fn selection_schema_json() -> String {
    let schema = schema_for!(TemplateSelection);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// 基于 LLM 的模板选择器
pub struct LlmTemplateSelector {
    llm: Arc<dyn LlmClient>,
    max_templates: usize,
}

impl LlmTemplateSelector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_templates: 50,
        }
    }

    /// 设置 prompt 中最多列出的模板数
    pub fn with_max_templates(mut self, max: usize) -> Self {
        self.max_templates = max.max(1);
        self
    }

    fn build_messages(&self, query: &str, templates: &[TemplateCatalogEntry]) -> Vec<Message> {
        let template_list = templates
            .iter()
            .take(self.max_templates)
            .map(TemplateCatalogEntry::summary)
            .collect::<Vec<_>>()
            .join("\n");

        let system = format!(
            "You are a project template selector. Given the user's request and the available \
             starter templates, pick the single best template, or none if no template fits.\n\
             Reply with ONLY a JSON object matching this schema. No explanation, no Markdown.\n\n\
             Schema:\n{}\n\nAvailable templates:\n{}",
            selection_schema_json(),
            template_list
        );

        vec![
            Message::system(system),
            Message::user(format!("User request: {}", query)),
        ]
    }
}

#[async_trait]
impl TemplateSelector for LlmTemplateSelector {
    async fn select(
        &self,
        query: &str,
        templates: &[TemplateCatalogEntry],
        ctx: &InferenceContext,
    ) -> TemplateSelection {
        if templates.is_empty() {
            return TemplateSelection::from_scratch("No templates were available to choose from.");
        }

        let messages = self.build_messages(query, templates);
        let reply = match self.llm.complete(&messages).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    agent_id = %ctx.agent_id,
                    model = self.llm.model_name(),
                    error = %e,
                    "template selection inference failed"
                );
                return TemplateSelection::from_scratch(format!(
                    "Template selection failed: {}",
                    e
                ));
            }
        };

        match parse_selection(&reply) {
            Some(mut selection) => {
                selection.selected_template_name = selection.template_name().map(str::to_string);
                tracing::info!(
                    agent_id = %ctx.agent_id,
                    template = selection.template_name().unwrap_or("(none)"),
                    "template selected"
                );
                selection
            }
            None => {
                tracing::warn!(
                    agent_id = %ctx.agent_id,
                    reply_len = reply.len(),
                    "template selection reply is not valid JSON"
                );
                TemplateSelection::from_scratch("Template selection reply could not be parsed.")
            }
        }
    }
}

/// 从模型回复中提取 JSON 对象（容忍 ```json 代码块与前后多余文字）
fn parse_selection(reply: &str) -> Option<TemplateSelection> {
    let trimmed = reply.trim();
    if let Ok(selection) = serde_json::from_str(trimmed) {
        return Some(selection);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RemoteError;
    use crate::llm::MockLlmClient;

    fn catalog() -> Vec<TemplateCatalogEntry> {
        vec![
            TemplateCatalogEntry::new("react-starter").with_selection_hint("web apps"),
            TemplateCatalogEntry::new("worker-api").with_selection_hint("HTTP APIs"),
        ]
    }

    #[tokio::test]
    async fn test_empty_catalog_skips_inference() {
        let llm = Arc::new(MockLlmClient::replying("{}"));
        let selector = LlmTemplateSelector::new(llm.clone());
        let selection = selector
            .select("todo app", &[], &InferenceContext::new("a1"))
            .await;
        assert!(selection.template_name().is_none());
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_parses_fenced_reply() {
        let reply = "```json\n{\"selected_template_name\": \"react-starter\", \"reasoning\": \"SPA\", \"complexity\": \"simple\"}\n```";
        let llm = Arc::new(MockLlmClient::replying(reply));
        let selector = LlmTemplateSelector::new(llm.clone());
        let selection = selector
            .select("todo app", &catalog(), &InferenceContext::new("a1"))
            .await;
        assert_eq!(selection.template_name(), Some("react-starter"));
        assert_eq!(selection.complexity, Some(Complexity::Simple));

        let messages = llm.last_messages().unwrap();
        assert!(messages[0].content.contains("worker-api"));
        assert!(messages[0].content.contains("selected_template_name"));
        assert!(messages[1].content.contains("todo app"));
    }

    #[tokio::test]
    async fn test_blank_name_means_scratch() {
        let llm = Arc::new(MockLlmClient::replying(
            r#"{"selected_template_name": "  ", "reasoning": "nothing fits"}"#,
        ));
        let selection = LlmTemplateSelector::new(llm)
            .select("game engine", &catalog(), &InferenceContext::new("a1"))
            .await;
        assert!(selection.selected_template_name.is_none());
        assert_eq!(selection.reasoning, "nothing fits");
    }

    #[tokio::test]
    async fn test_inference_failure_degrades_to_scratch() {
        let llm = Arc::new(MockLlmClient::failing(RemoteError::Timeout(30)));
        let selection = LlmTemplateSelector::new(llm)
            .select("todo app", &catalog(), &InferenceContext::new("a1"))
            .await;
        assert!(selection.template_name().is_none());
        assert!(selection.reasoning.contains("timed out"));
    }

    #[tokio::test]
    async fn test_garbage_reply_degrades_to_scratch() {
        let llm = Arc::new(MockLlmClient::replying("I think react-starter is best"));
        let selection = LlmTemplateSelector::new(llm)
            .select("todo app", &catalog(), &InferenceContext::new("a1"))
            .await;
        assert!(selection.template_name().is_none());
    }

    #[test]
    fn test_max_templates_bounds_prompt() {
        let selector =
            LlmTemplateSelector::new(Arc::new(MockLlmClient::replying("{}"))).with_max_templates(1);
        let messages = selector.build_messages("q", &catalog());
        assert!(messages[0].content.contains("react-starter"));
        assert!(!messages[0].content.contains("worker-api"));
    }
}
