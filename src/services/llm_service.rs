//! LLM 服务 - 业务能力层
//!
//! 只负责"按一段原文生成候选题目"这一能力，不关心分块、重试和汇总
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Groq, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, LlmError};

/// 题目生成服务的抽象
///
/// 返回未经校验的原始文本，由清洗模块负责解析。
/// 实现必须可以被多个分块任务并发调用
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// 根据一段原文生成约 `count` 道题目
    async fn generate(&self, chunk_text: &str, count: usize) -> AppResult<String>;

    /// 用于日志的名称
    fn name(&self) -> &str;
}

const SYSTEM_MESSAGE: &str = "You are an expert test paper generator. You must respond with a perfect, \
valid JSON object and nothing else. Do not add any text, comments, or markdown like ```json outside of \
the final JSON object. The JSON output must follow all rules provided by the user.";

/// LLM 服务
///
/// 职责：
/// - 调用 LLM API 生成题目
/// - 只处理单个分块
/// - 不解析、不校验返回内容
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| LlmError::RequestBuildFailed(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| LlmError::RequestBuildFailed(e.to_string()))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| LlmError::RequestBuildFailed(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            classify_api_error(&self.model_name, &e.to_string())
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl QuestionGenerator for LlmService {
    async fn generate(&self, chunk_text: &str, count: usize) -> AppResult<String> {
        let prompt = build_generation_prompt(chunk_text, count);
        self.send_to_llm(&prompt, Some(SYSTEM_MESSAGE)).await
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// 把 API 错误归类为限流或普通调用失败
fn classify_api_error(model: &str, message: &str) -> LlmError {
    let lower = message.to_lowercase();
    if lower.contains("rate limit") || lower.contains("429") {
        LlmError::RateLimited {
            model: model.to_string(),
        }
    } else {
        LlmError::ApiCallFailed {
            model: model.to_string(),
            message: message.to_string(),
        }
    }
}

/// 构建出题提示词
pub fn build_generation_prompt(chunk_text: &str, count: usize) -> String {
    let count = count.max(1);
    format!(
        r#"Based on the text provided below, generate a JSON object.
The JSON object must have two top-level keys: "topic" and "questions".
- The "topic" key's value should be an object with a "title" and a short "description".
- The "questions" key's value should be an array of question objects.

Each question object must have these exact keys: "type", "questionText", "options", "answer", and "explanation".
- "type" must be "mcq".
- "options" must be an array of exactly 4 unique, non-empty strings.
- "answer" must be copied verbatim from one of the "options".
- "answer" and "explanation" MUST NOT be empty strings.

Generate exactly {count} questions.

Here is the text to analyze:
"""
{chunk_text}
"""
"#
    )
}
