//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HIVE__*` 覆盖（双下划线表示嵌套，如 `HIVE__SESSIONS__ID_PREFIX=agent_`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub sessions: SessionsSection,
    #[serde(default)]
    pub provisioner: ProvisionerSection,
}

/// [sessions] 段：辖区探测顺序与 ID 前缀
#[derive(Debug, Clone, Deserialize)]
pub struct SessionsSection {
    /// 默认辖区之后依次探测的命名辖区
    #[serde(default = "default_jurisdictions")]
    pub jurisdictions: Vec<String>,
    pub id_prefix: Option<String>,
}

fn default_jurisdictions() -> Vec<String> {
    vec!["eu".into()]
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            jurisdictions: default_jurisdictions(),
            id_prefix: None,
        }
    }
}

/// [provisioner] 段：目录 / 沙箱服务地址、请求超时、prompt 中模板数上限
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionerSection {
    pub catalog_url: Option<String>,
    pub sandbox_url: Option<String>,
    /// 单次远端调用超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_catalog_entries_in_prompt")]
    pub max_catalog_entries_in_prompt: usize,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_catalog_entries_in_prompt() -> usize {
    50
}

impl Default for ProvisionerSection {
    fn default() -> Self {
        Self {
            catalog_url: None,
            sandbox_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            max_catalog_entries_in_prompt: default_max_catalog_entries_in_prompt(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 HIVE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 HIVE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    build_config(config_path, env_source())
}

/// `HIVE__*` 环境变量源；`sessions.jurisdictions` 按逗号拆成列表
fn env_source() -> config::Environment {
    config::Environment::with_prefix("HIVE")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("sessions.jurisdictions")
        .try_parsing(true)
}

fn build_config(
    config_path: Option<PathBuf>,
    env: config::Environment,
) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(env);

    let c = builder.build()?;
    c.try_deserialize()
}
