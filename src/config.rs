use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// 扫描原文目录并生成题目
    Generate,
    /// 导入已导出的题目并批改答卷
    Grade,
}

impl RunMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "generate" => Some(RunMode::Generate),
            "grade" => Some(RunMode::Grade),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 运行模式
    pub mode: RunMode,
    /// 同时处理的原文数量
    pub max_concurrent_files: usize,
    /// 原文存放目录（.txt / .md）
    pub source_folder: String,
    /// 题目导出目录（TOML）
    pub output_folder: String,
    /// 答卷存放目录（TOML）
    pub submissions_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- 分块配置 ---
    pub max_chunk_size: usize,
    pub overlap_size: usize,
    pub min_chunk_size: usize,
    /// 单次发送给生成服务的最大字符数
    pub max_service_chars: usize,
    // --- 重试配置 ---
    /// 首次调用失败后的最多重试次数
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    // --- 请求限制 ---
    pub default_question_count: usize,
    pub max_question_count: usize,
    pub max_text_chars: usize,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: RunMode::Generate,
            max_concurrent_files: 4,
            source_folder: "input_text".to_string(),
            output_folder: "output_toml".to_string(),
            submissions_folder: "submissions".to_string(),
            verbose_logging: false,
            max_chunk_size: 4000,
            overlap_size: 200,
            min_chunk_size: 100,
            max_service_chars: 15_000,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            default_question_count: 10,
            max_question_count: 100,
            max_text_chars: 100_000,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 4096,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().overlay_env()
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值，然后叠加环境变量
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config.overlay_env())
    }

    fn overlay_env(self) -> Self {
        let base = self;
        Self {
            mode: std::env::var("QUIZ_MODE").ok().and_then(|v| RunMode::parse(&v)).unwrap_or(base.mode),
            max_concurrent_files: std::env::var("MAX_CONCURRENT_FILES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_concurrent_files),
            source_folder: std::env::var("SOURCE_FOLDER").unwrap_or(base.source_folder),
            output_folder: std::env::var("OUTPUT_FOLDER").unwrap_or(base.output_folder),
            submissions_folder: std::env::var("SUBMISSIONS_FOLDER").unwrap_or(base.submissions_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(base.verbose_logging),
            max_chunk_size: std::env::var("QUIZ_MAX_CHUNK_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_chunk_size),
            overlap_size: std::env::var("QUIZ_OVERLAP_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.overlap_size),
            min_chunk_size: std::env::var("QUIZ_MIN_CHUNK_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.min_chunk_size),
            max_service_chars: std::env::var("QUIZ_MAX_SERVICE_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_service_chars),
            max_retries: std::env::var("QUIZ_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_retries),
            retry_base_delay_ms: std::env::var("QUIZ_RETRY_BASE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.retry_base_delay_ms),
            default_question_count: std::env::var("QUIZ_DEFAULT_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(base.default_question_count),
            max_question_count: std::env::var("QUIZ_MAX_QUESTION_COUNT").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_question_count),
            max_text_chars: std::env::var("QUIZ_MAX_TEXT_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.max_text_chars),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(base.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(base.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(base.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(base.llm_temperature),
            llm_max_tokens: std::env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()).unwrap_or(base.llm_max_tokens),
        }
    }

    /// 启动时校验配置
    ///
    /// `require_llm` 为 false 时（批改模式）不检查 API 密钥
    pub fn validate(&self, require_llm: bool) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(invalid("max_chunk_size", "必须大于 0"));
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(invalid(
                "overlap_size",
                format!("必须小于 max_chunk_size ({})", self.max_chunk_size),
            ));
        }
        if self.max_service_chars == 0 {
            return Err(invalid("max_service_chars", "必须大于 0"));
        }
        if self.max_concurrent_files == 0 {
            return Err(invalid("max_concurrent_files", "必须大于 0"));
        }
        if self.max_question_count == 0 {
            return Err(invalid("max_question_count", "必须大于 0"));
        }
        if self.default_question_count == 0 || self.default_question_count > self.max_question_count {
            return Err(invalid(
                "default_question_count",
                format!("必须在 1..={} 之间", self.max_question_count),
            ));
        }
        if require_llm && self.llm_api_key.trim().is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "LLM_API_KEY".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}
