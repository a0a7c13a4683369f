//! HTTP 协作方：目录服务与沙箱服务的 reqwest 实现
//!
//! - 目录：`GET {catalog_url}/templates` -> `CatalogResponse`
//! - 详情：`GET {sandbox_url}/templates/{name}`，请求头带 `x-sandbox-session-id` -> `TemplateDetailsResponse`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::catalog::{CatalogResponse, TemplateCatalog};
use super::provisioner::TemplateProvisioner;
use super::sandbox::{SandboxClient, SandboxProvider, TemplateDetailsResponse};
use super::selector::LlmTemplateSelector;
use crate::config::ProvisionerSection;
use crate::core::RemoteError;
use crate::llm::LlmClient;
use crate::session::{IdGenerator, SandboxSessionId};

/// 沙箱会话 ID 请求头
pub const SANDBOX_SESSION_HEADER: &str = "x-sandbox-session-id";

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RemoteError::Transport(format!("Failed to build HTTP client: {}", e)))
}

fn parse_base_url(base_url: &str) -> Result<reqwest::Url, RemoteError> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| RemoteError::Transport(format!("Invalid base URL {}: {}", base_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(RemoteError::Transport(format!(
            "Base URL cannot carry a path: {}",
            base_url
        )));
    }
    Ok(url)
}

/// 在 base 后逐段追加路径；每段整体转义，`/`、`?`、`#` 不会改变路由
fn endpoint(base: &reqwest::Url, segments: &[&str]) -> Result<reqwest::Url, RemoteError> {
    if let Some(bad) = segments
        .iter()
        .find(|s| s.is_empty() || **s == "." || **s == "..")
    {
        return Err(RemoteError::Rejected(format!(
            "'{}' cannot be used as a path segment",
            bad
        )));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| RemoteError::Transport(format!("Base URL cannot carry a path: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// 发送请求并把响应体解码为 JSON；非 2xx 视为对端拒绝
async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    timeout_secs: u64,
) -> Result<T, RemoteError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            RemoteError::Timeout(timeout_secs)
        } else {
            RemoteError::Transport(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::Rejected(format!("HTTP {}: {}", status, body)));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::Decode(e.to_string()))
}

/// 远端模板目录
pub struct HttpTemplateCatalog {
    client: reqwest::Client,
    base_url: reqwest::Url,
    timeout_secs: u64,
}

impl HttpTemplateCatalog {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            timeout_secs,
        })
    }

    pub fn templates_url(&self) -> Result<reqwest::Url, RemoteError> {
        endpoint(&self.base_url, &["templates"])
    }
}

#[async_trait]
impl TemplateCatalog for HttpTemplateCatalog {
    async fn list_templates(&self) -> Result<CatalogResponse, RemoteError> {
        send_json(self.client.get(self.templates_url()?), self.timeout_secs).await
    }
}

/// 远端沙箱服务
pub struct HttpSandboxProvider {
    client: reqwest::Client,
    base_url: reqwest::Url,
    timeout_secs: u64,
}

impl HttpSandboxProvider {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, RemoteError> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            timeout_secs,
        })
    }
}

#[async_trait]
impl SandboxProvider for HttpSandboxProvider {
    async fn allocate(&self, sandbox_session_id: SandboxSessionId) -> Arc<dyn SandboxClient> {
        Arc::new(HttpSandboxClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
            sandbox_session_id,
        })
    }
}

/// 绑定到单个沙箱会话的 HTTP 客户端
pub struct HttpSandboxClient {
    client: reqwest::Client,
    base_url: reqwest::Url,
    timeout_secs: u64,
    sandbox_session_id: SandboxSessionId,
}

impl HttpSandboxClient {
    /// 模板名来自远端目录，作为单个路径段转义
    pub fn template_url(&self, name: &str) -> Result<reqwest::Url, RemoteError> {
        endpoint(&self.base_url, &["templates", name])
    }
}

#[async_trait]
impl SandboxClient for HttpSandboxClient {
    fn sandbox_session_id(&self) -> &str {
        &self.sandbox_session_id
    }

    async fn get_template_details(
        &self,
        name: &str,
    ) -> Result<TemplateDetailsResponse, RemoteError> {
        let request = self
            .client
            .get(self.template_url(name)?)
            .header(SANDBOX_SESSION_HEADER, &self.sandbox_session_id);
        send_json(request, self.timeout_secs).await
    }
}

/// 按配置组装 HTTP 协作方 + LLM 选择器的编排器
pub fn http_provisioner(
    section: &ProvisionerSection,
    llm: Arc<dyn LlmClient>,
    ids: Arc<dyn IdGenerator>,
) -> Result<TemplateProvisioner, config::ConfigError> {
    let catalog_url = section
        .catalog_url
        .as_deref()
        .ok_or_else(|| config::ConfigError::NotFound("provisioner.catalog_url".to_string()))?;
    let sandbox_url = section
        .sandbox_url
        .as_deref()
        .ok_or_else(|| config::ConfigError::NotFound("provisioner.sandbox_url".to_string()))?;

    let catalog = HttpTemplateCatalog::new(catalog_url, section.request_timeout_secs)
        .map_err(|e| config::ConfigError::Message(e.to_string()))?;
    let sandboxes = HttpSandboxProvider::new(sandbox_url, section.request_timeout_secs)
        .map_err(|e| config::ConfigError::Message(e.to_string()))?;
    let selector = LlmTemplateSelector::new(llm)
        .with_max_templates(section.max_catalog_entries_in_prompt);

    tracing::info!(catalog_url, sandbox_url, "using HTTP template provisioner");

    Ok(TemplateProvisioner::new(
        Arc::new(catalog),
        Arc::new(selector),
        Arc::new(sandboxes),
        ids,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::session::UuidIdGenerator;

    fn sandbox_client(base_url: &str) -> HttpSandboxClient {
        HttpSandboxClient {
            client: reqwest::Client::new(),
            base_url: parse_base_url(base_url).unwrap(),
            timeout_secs: 5,
            sandbox_session_id: "sbx-1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sandbox_client_binds_session() {
        let provider = HttpSandboxProvider::new("http://sandbox.local/api/", 5).unwrap();
        let client = provider.allocate("sbx-1".to_string()).await;
        assert_eq!(client.sandbox_session_id(), "sbx-1");
    }

    #[test]
    fn test_templates_url() {
        for base in ["http://catalog.local", "http://catalog.local/"] {
            let catalog = HttpTemplateCatalog::new(base, 5).unwrap();
            assert_eq!(
                catalog.templates_url().unwrap().as_str(),
                "http://catalog.local/templates"
            );
        }
    }

    #[test]
    fn test_template_name_is_a_single_path_segment() {
        let client = sandbox_client("http://sandbox.local/api/");
        let cases = [
            ("react-starter", "/api/templates/react-starter"),
            ("c#-starter", "/api/templates/c%23-starter"),
            ("x?y=1", "/api/templates/x%3Fy=1"),
            ("a/b", "/api/templates/a%2Fb"),
            ("../admin", "/api/templates/..%2Fadmin"),
        ];
        for (name, path) in cases {
            let url = client.template_url(name).unwrap();
            assert_eq!(url.path(), path, "name {:?}", name);
            assert_eq!(url.query(), None, "name {:?}", name);
            assert_eq!(url.fragment(), None, "name {:?}", name);
            assert_eq!(url.path_segments().unwrap().count(), 3, "name {:?}", name);
        }
    }

    #[tokio::test]
    async fn test_dot_segment_names_are_refused() {
        let client = sandbox_client("http://sandbox.local/api");
        for name in ["", ".", ".."] {
            assert!(matches!(
                client.template_url(name),
                Err(RemoteError::Rejected(_))
            ));
            let err = client.get_template_details(name).await.unwrap_err();
            assert!(matches!(err, RemoteError::Rejected(_)), "name {:?}", name);
        }
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpSandboxProvider::new("not a url", 5),
            Err(RemoteError::Transport(_))
        ));
        assert!(HttpTemplateCatalog::new("mailto:ops@example.com", 5).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_transport_error() {
        // 端口 9 (discard) 在测试环境中通常无人监听
        let catalog = HttpTemplateCatalog::new("http://127.0.0.1:9", 2).unwrap();
        let err = catalog.list_templates().await.unwrap_err();
        assert!(matches!(
            err,
            RemoteError::Transport(_) | RemoteError::Timeout(_)
        ));
    }

    #[test]
    fn test_http_provisioner_requires_urls() {
        let section = ProvisionerSection::default();
        let result = http_provisioner(
            &section,
            Arc::new(MockLlmClient::replying("{}")),
            UuidIdGenerator::shared(),
        );
        assert!(result.is_err());

        let section = ProvisionerSection {
            catalog_url: Some("http://catalog.local".to_string()),
            sandbox_url: Some("http://sandbox.local".to_string()),
            ..ProvisionerSection::default()
        };
        assert!(http_provisioner(
            &section,
            Arc::new(MockLlmClient::replying("{}")),
            UuidIdGenerator::shared(),
        )
        .is_ok());
    }
}
