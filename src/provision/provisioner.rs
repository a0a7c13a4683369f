//! 模板编排
//!
//! 四个阶段，每个远端调用边界各自兜底，整体永不失败：
//! 1. 拉目录：失败或 success=false 时记诊断，按空目录继续
//! 2. 并发：AI 选模板 ‖ 分配沙箱会话（join，两者都完成才继续）
//! 3. 没选中模板或目录为空：直接返回，详情为空（从零生成，不是错误）
//! 4. 拉详情：目录里找不到该名称、调用失败、success=false 时详情为空
//!
//! 所有降级路径返回同样的结构，且都带着已分配的沙箱会话 ID。

use std::fmt;
use std::sync::Arc;

use super::catalog::{TemplateCatalog, TemplateCatalogEntry};
use super::sandbox::{SandboxClient, SandboxProvider, TemplateDetails};
use super::selector::{InferenceContext, TemplateSelection, TemplateSelector};
use crate::session::{IdGenerator, SandboxSessionId};

/// 被兜底吞掉的远端失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionDiagnostic {
    /// 目录服务调用失败
    CatalogUnavailable { error: String },
    /// 目录服务返回 success=false
    CatalogRejected { error: Option<String> },
    /// 选中的模板不在目录中
    TemplateNotInCatalog { template: String },
    /// 详情调用失败
    DetailsUnavailable { template: String, error: String },
    /// 详情返回 success=false 或缺少内容
    DetailsRejected {
        template: String,
        error: Option<String>,
    },
}

impl fmt::Display for ProvisionDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogUnavailable { error } => write!(f, "template catalog unavailable: {}", error),
            Self::CatalogRejected { error } => write!(
                f,
                "template catalog rejected the request: {}",
                error.as_deref().unwrap_or("no reason given")
            ),
            Self::TemplateNotInCatalog { template } => {
                write!(f, "selected template '{}' is not in the catalog", template)
            }
            Self::DetailsUnavailable { template, error } => {
                write!(f, "details for template '{}' unavailable: {}", template, error)
            }
            Self::DetailsRejected { template, error } => write!(
                f,
                "details for template '{}' rejected: {}",
                template,
                error.as_deref().unwrap_or("no reason given")
            ),
        }
    }
}

/// 编排结果：详情可能为空，其余字段总是有效
pub struct ProvisionOutcome {
    pub sandbox_session_id: SandboxSessionId,
    pub sandbox: Arc<dyn SandboxClient>,
    pub template_details: Option<TemplateDetails>,
    pub selection: TemplateSelection,
    pub diagnostics: Vec<ProvisionDiagnostic>,
}

impl ProvisionOutcome {
    /// 是否有远端失败被兜底
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// 最终使用的模板名（仅详情拉取成功时有值）
    pub fn template_name(&self) -> Option<&str> {
        self.template_details.as_ref().map(|d| d.name.as_str())
    }
}

impl fmt::Debug for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionOutcome")
            .field("sandbox_session_id", &self.sandbox_session_id)
            .field("template_details", &self.template_details)
            .field("selection", &self.selection)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// 模板编排器
pub struct TemplateProvisioner {
    catalog: Arc<dyn TemplateCatalog>,
    selector: Arc<dyn TemplateSelector>,
    sandboxes: Arc<dyn SandboxProvider>,
    ids: Arc<dyn IdGenerator>,
}

impl TemplateProvisioner {
    pub fn new(
        catalog: Arc<dyn TemplateCatalog>,
        selector: Arc<dyn TemplateSelector>,
        sandboxes: Arc<dyn SandboxProvider>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            catalog,
            selector,
            sandboxes,
            ids,
        }
    }

    /// 为一次新的生成请求选模板并分配沙箱
    pub async fn provision(&self, query: &str, ctx: &InferenceContext) -> ProvisionOutcome {
        let mut diagnostics = Vec::new();

        let templates = self.fetch_catalog(&mut diagnostics).await;

        let allocation = async {
            let sandbox_session_id = self.ids.generate();
            let sandbox = self.sandboxes.allocate(sandbox_session_id.clone()).await;
            (sandbox_session_id, sandbox)
        };
        let (selection, (sandbox_session_id, sandbox)) =
            tokio::join!(self.selector.select(query, &templates, ctx), allocation);

        let template_details = self
            .resolve_details(&templates, &selection, sandbox.as_ref(), &mut diagnostics)
            .await;

        tracing::info!(
            agent_id = %ctx.agent_id,
            sandbox_session_id = %sandbox_session_id,
            template = template_details.as_ref().map(|d| d.name.as_str()).unwrap_or("(scratch)"),
            degraded = !diagnostics.is_empty(),
            "template provisioning finished"
        );

        ProvisionOutcome {
            sandbox_session_id,
            sandbox,
            template_details,
            selection,
            diagnostics,
        }
    }

    async fn fetch_catalog(
        &self,
        diagnostics: &mut Vec<ProvisionDiagnostic>,
    ) -> Vec<TemplateCatalogEntry> {
        match self.catalog.list_templates().await {
            Ok(resp) if resp.success => resp.templates,
            Ok(resp) => {
                tracing::warn!(
                    error = resp.error.as_deref().unwrap_or(""),
                    "template catalog returned unsuccessful response, continuing without templates"
                );
                diagnostics.push(ProvisionDiagnostic::CatalogRejected { error: resp.error });
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "template catalog unavailable, continuing without templates");
                diagnostics.push(ProvisionDiagnostic::CatalogUnavailable {
                    error: e.to_string(),
                });
                Vec::new()
            }
        }
    }

    async fn resolve_details(
        &self,
        templates: &[TemplateCatalogEntry],
        selection: &TemplateSelection,
        sandbox: &dyn SandboxClient,
        diagnostics: &mut Vec<ProvisionDiagnostic>,
    ) -> Option<TemplateDetails> {
        let name = match selection.template_name() {
            Some(name) if !templates.is_empty() => name,
            _ => {
                tracing::debug!("no template selected, generating from scratch");
                return None;
            }
        };

        let Some(entry) = templates.iter().find(|t| t.name == name) else {
            tracing::warn!(template = name, "selected template not found in catalog");
            diagnostics.push(ProvisionDiagnostic::TemplateNotInCatalog {
                template: name.to_string(),
            });
            return None;
        };

        match sandbox.get_template_details(&entry.name).await {
            Ok(resp) if resp.success => match resp.template_details {
                Some(details) => Some(details),
                None => {
                    tracing::warn!(template = %entry.name, "template details response was empty");
                    diagnostics.push(ProvisionDiagnostic::DetailsRejected {
                        template: entry.name.clone(),
                        error: Some("response carried no template details".to_string()),
                    });
                    None
                }
            },
            Ok(resp) => {
                tracing::warn!(
                    template = %entry.name,
                    sandbox_session_id = sandbox.sandbox_session_id(),
                    error = resp.error.as_deref().unwrap_or(""),
                    "failed to fetch template details"
                );
                diagnostics.push(ProvisionDiagnostic::DetailsRejected {
                    template: entry.name.clone(),
                    error: resp.error,
                });
                None
            }
            Err(e) => {
                tracing::warn!(
                    template = %entry.name,
                    sandbox_session_id = sandbox.sandbox_session_id(),
                    error = %e,
                    "template details unavailable"
                );
                diagnostics.push(ProvisionDiagnostic::DetailsUnavailable {
                    template: entry.name.clone(),
                    error: e.to_string(),
                });
                None
            }
        }
    }
}
