//! 会话完整状态快照
//!
//! `SessionState` 由所在辖区独占持有，handle 读写时按值拷贝，不在两个 handle 间共享。
//! 未知字段经 `extra` 原样透传，旧版本写入的新字段在克隆时不会丢失。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::id::SessionId;
use crate::llm::Message;

/// 开发阶段（生成中的计数/阶段标记），Idle 为初始值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevState {
    #[default]
    Idle,
    PhaseGenerating,
    PhaseImplementing,
    Reviewing,
    Finalizing,
}

/// 客户端上报的运行时错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientReportedError {
    pub message: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// 已生成的文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub contents: String,
    #[serde(default)]
    pub purpose: Option<String>,
}

/// 会话完整状态
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    /// 克隆来源（仅克隆出的会话有值）
    #[serde(default)]
    pub forked_from: Option<SessionId>,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub conversation: Vec<Message>,
    #[serde(default)]
    pub generated_files: Vec<GeneratedFile>,

    /// 绑定的沙箱实例
    #[serde(default)]
    pub sandbox_instance_id: Option<String>,
    /// 排队中的用户输入
    #[serde(default)]
    pub pending_user_inputs: Vec<String>,
    #[serde(default)]
    pub should_be_generating: bool,
    #[serde(default)]
    pub dev_state: DevState,
    /// 进行中的生成任务句柄
    #[serde(default)]
    pub generation_handle: Option<String>,
    #[serde(default)]
    pub client_reported_errors: Vec<ClientReportedError>,

    /// 未识别的字段，原样透传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionState {
    pub fn new(session_id: impl Into<SessionId>, query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    /// 是否处于生成中
    pub fn is_generating(&self) -> bool {
        self.should_be_generating
            || self.dev_state != DevState::Idle
            || self.generation_handle.is_some()
    }

    /// 按固定重置策略生成新会话的状态
    ///
    /// 解构不使用 `..`：新增字段时必须在这里显式决定「复制」还是「重置」。
    pub fn fork(&self, new_id: impl Into<SessionId>) -> SessionState {
        let SessionState {
            session_id,
            forked_from: _,
            query,
            project_name,
            template_name,
            conversation,
            generated_files,
            sandbox_instance_id: _,
            pending_user_inputs: _,
            should_be_generating: _,
            dev_state: _,
            generation_handle: _,
            client_reported_errors: _,
            extra,
        } = self.clone();

        SessionState {
            session_id: new_id.into(),
            forked_from: Some(session_id),
            query,
            project_name,
            template_name,
            conversation,
            generated_files,
            sandbox_instance_id: None,
            pending_user_inputs: Vec::new(),
            should_be_generating: false,
            dev_state: DevState::Idle,
            generation_handle: None,
            client_reported_errors: Vec::new(),
            extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn busy_state() -> SessionState {
        let mut state = SessionState::new("src", "build a todo app");
        state.project_name = Some("todo".to_string());
        state.template_name = Some("react-starter".to_string());
        state.conversation.push(Message::user("make it blue"));
        state
            .conversation
            .push(Message::assistant("Switched the palette to blue."));
        state.generated_files.push(GeneratedFile {
            path: "src/App.tsx".to_string(),
            contents: "export default 1".to_string(),
            purpose: None,
        });
        state.sandbox_instance_id = Some("sbx-1".to_string());
        state.pending_user_inputs = vec!["also add dark mode".to_string()];
        state.should_be_generating = true;
        state.dev_state = DevState::PhaseImplementing;
        state.generation_handle = Some("gen-42".to_string());
        state.client_reported_errors.push(ClientReportedError {
            message: "TypeError".to_string(),
            stack: None,
            source: Some("browser".to_string()),
        });
        state
            .extra
            .insert("blueprint".to_string(), serde_json::json!({"title": "Todo"}));
        state
    }

    #[test]
    fn test_fork_resets_runtime_fields() {
        let forked = busy_state().fork("dst");
        assert_eq!(forked.session_id, "dst");
        assert_eq!(forked.forked_from.as_deref(), Some("src"));
        assert!(forked.sandbox_instance_id.is_none());
        assert!(forked.pending_user_inputs.is_empty());
        assert!(!forked.should_be_generating);
        assert_eq!(forked.dev_state, DevState::Idle);
        assert!(forked.generation_handle.is_none());
        assert!(forked.client_reported_errors.is_empty());
        assert!(!forked.is_generating());
    }

    #[test]
    fn test_fork_copies_everything_else() {
        let source = busy_state();
        let forked = source.fork("dst");
        assert_eq!(forked.query, source.query);
        assert_eq!(forked.project_name, source.project_name);
        assert_eq!(forked.template_name, source.template_name);
        assert_eq!(forked.conversation, source.conversation);
        assert_eq!(forked.conversation[1].role, crate::llm::Role::Assistant);
        assert_eq!(forked.generated_files, source.generated_files);
        assert_eq!(forked.extra, source.extra);
    }

    #[test]
    fn test_unknown_fields_survive_serde() {
        let raw = serde_json::json!({
            "session_id": "a",
            "query": "q",
            "template_details": {"name": "vite"},
            "agent_mode": "deterministic"
        });
        let state: SessionState = serde_json::from_value(raw).unwrap();
        assert_eq!(state.extra.len(), 2);

        let forked = state.fork("b");
        let back = serde_json::to_value(&forked).unwrap();
        assert_eq!(back["agent_mode"], "deterministic");
        assert_eq!(back["template_details"]["name"], "vite");
        assert_eq!(back["session_id"], "b");
    }
}
