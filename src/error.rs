use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 请求参数错误（空文本、题目数量越界等）
    #[error("输入错误: {0}")]
    InvalidInput(String),
    /// 题目生成服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 汇总阶段错误
    #[error("汇总错误: {0}")]
    Aggregation(#[from] AggregationError),
    /// 存储错误
    #[error("存储错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// 答卷不满足评分前置条件
    #[error("评分错误: {0}")]
    ScoringPrecondition(String),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl AppError {
    /// 稳定的机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Llm(LlmError::RateLimited { .. }) => "RATE_LIMIT",
            AppError::Llm(_) => "API_ERROR",
            AppError::Aggregation(_) => "GENERATION_ERROR",
            AppError::Persistence(PersistenceError::TopicNotFound { .. })
            | AppError::Persistence(PersistenceError::NoQuestions { .. }) => "NOT_FOUND",
            AppError::Persistence(_) => "DATABASE_ERROR",
            AppError::ScoringPrecondition(_) => "INVALID_SUBMISSION",
            AppError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// 该错误是否值得重试（仅限生成服务的传输类错误）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Llm(
                LlmError::ApiCallFailed { .. }
                    | LlmError::RateLimited { .. }
                    | LlmError::EmptyResponse { .. }
            )
        )
    }
}

/// 题目生成服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 请求频率限制
    #[error("LLM API请求频率限制 (模型: {model})")]
    RateLimited { model: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 请求构建失败
    #[error("LLM请求构建失败: {0}")]
    RequestBuildFailed(String),
    /// 返回内容无法解析为 JSON 对象
    #[error("无法解析LLM返回的JSON (预览: {preview})")]
    UnparseableResponse { preview: String },
    /// 返回的 JSON 中没有合格题目
    #[error("该分块没有合格题目 (共 {candidates} 个候选)")]
    NoValidQuestions { candidates: usize },
}

/// 汇总阶段错误
#[derive(Debug, Error)]
pub enum AggregationError {
    /// 所有分块都生成失败
    #[error("所有 {chunk_count} 个分块均生成失败，最后一个错误: {last_cause}")]
    AllChunksFailed {
        chunk_count: usize,
        last_cause: String,
    },
    /// 有分块成功，但没有题目通过校验
    #[error("生成服务有返回，但没有任何题目通过校验")]
    NoValidQuestions,
}

/// 存储错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("主题不存在: {topic_id}")]
    TopicNotFound { topic_id: String },
    #[error("该主题下没有可评分的题目: {topic_id}")]
    NoQuestions { topic_id: String },
    #[error("无效的主题ID: {0}")]
    InvalidId(String),
    #[error("存储操作失败: {0}")]
    Backend(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 字段取值非法
    #[error("配置项 {field} 非法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建输入错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// 创建评分前置条件错误
    pub fn scoring_precondition(message: impl Into<String>) -> Self {
        AppError::ScoringPrecondition(message.into())
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            message: message.to_string(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
