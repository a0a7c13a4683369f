//! 模板编排：目录 → AI 选择 ‖ 沙箱分配 → 模板详情
//!
//! 任何阶段失败都降级为空详情，生成请求永远不会因为模板不可用而失败。

pub mod catalog;
pub mod http;
pub mod provisioner;
pub mod sandbox;
pub mod selector;

pub use catalog::{
    CatalogResponse, StaticTemplateCatalog, TemplateCatalog, TemplateCatalogEntry,
    TemplateDescription,
};
pub use http::{http_provisioner, HttpSandboxClient, HttpSandboxProvider, HttpTemplateCatalog};
pub use provisioner::{ProvisionDiagnostic, ProvisionOutcome, TemplateProvisioner};
pub use sandbox::{
    SandboxClient, SandboxProvider, TemplateDetails, TemplateDetailsResponse, TemplateFile,
};
pub use selector::{
    selection_schema_json, Complexity, InferenceContext, LlmTemplateSelector, TemplateSelection,
    TemplateSelector,
};
