use crate::error::{AppError, AppResult};
use serde::Deserialize;
use std::path::Path;

/// 程序配置
///
/// 优先级：默认值 < TOML 配置文件 < 环境变量 < 命令行参数
#[derive(Clone, Debug)]
pub struct Config {
    /// 最大并发任务数（同时在途的题目数）
    pub max_workers: usize,
    /// 是否按题目自动选择解题策略
    pub use_adaptive: bool,
    /// 整个批次的截止时间（秒），None 表示不设上限
    pub batch_timeout_secs: Option<u64>,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 单次回答的最大 token 数
    pub llm_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: 20,
            use_adaptive: true,
            batch_timeout_secs: None,
            llm_api_key: "cse476".to_string(),
            llm_api_base_url: "http://10.4.58.53:41701/v1".to_string(),
            llm_model_name: "bens_model".to_string(),
            llm_max_tokens: 128,
        }
    }
}

/// TOML 配置文件中的可选字段
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    max_workers: Option<usize>,
    use_adaptive: Option<bool>,
    batch_timeout_secs: Option<u64>,
    api_key: Option<String>,
    api_base: Option<String>,
    model_name: Option<String>,
    max_tokens: Option<u32>,
}

impl Config {
    /// 先读取 TOML 文件，再用环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let base = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            AppError::TomlParse { source, .. } => AppError::TomlParse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();
        let config = Self {
            max_workers: file.max_workers.unwrap_or(default.max_workers),
            use_adaptive: file.use_adaptive.unwrap_or(default.use_adaptive),
            batch_timeout_secs: file.batch_timeout_secs.or(default.batch_timeout_secs),
            llm_api_key: file.api_key.unwrap_or(default.llm_api_key),
            llm_api_base_url: file.api_base.unwrap_or(default.llm_api_base_url),
            llm_model_name: file.model_name.unwrap_or(default.llm_model_name),
            llm_max_tokens: file.max_tokens.unwrap_or(default.llm_max_tokens),
        };
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            max_workers: env_parse("MAX_WORKERS").unwrap_or(self.max_workers),
            use_adaptive: env_parse("USE_ADAPTIVE").unwrap_or(self.use_adaptive),
            batch_timeout_secs: env_parse("BATCH_TIMEOUT_SECS").or(self.batch_timeout_secs),
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("API_BASE").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_max_tokens: env_parse("MAX_TOKENS").unwrap_or(self.llm_max_tokens),
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.max_workers == 0 {
            return Err(AppError::InvalidConfig {
                field: "max_workers".to_string(),
                reason: "并发数必须大于 0".to_string(),
            });
        }
        if self.llm_max_tokens == 0 {
            return Err(AppError::InvalidConfig {
                field: "max_tokens".to_string(),
                reason: "max_tokens 必须大于 0".to_string(),
            });
        }
        Ok(())
    }
}

/// 读取并解析环境变量，缺失或无法解析时返回 None
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
