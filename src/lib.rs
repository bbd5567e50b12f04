//! # Quiz Forge
//!
//! 从长文本自动生成选择题并批改答卷的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 存储层（Store）
//! - `store/` - 题库存取接口 `QuizStore`，默认进程内实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个分块或单份答卷
//! - `TextSegmenter` - 按自然边界切分原文
//! - `LlmService` - 调用 LLM 生成候选题目
//! - `sanitizer` - 解析、校验、归一化生成结果
//! - `aggregator` / `scoring` - 截断题量 / 批改答卷
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次请求"的完整处理流程
//! - `QuizService` - 出题（分块 → 生成 → 汇总 → 入库）、取题、答题
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/generation` - 分块并发生成，带重试
//! - `orchestrator/batch_processor` - 批量文件处理器，管理资源和并发
//! - `orchestrator/quiz_processor` - 单个文件处理器
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, RunMode};
pub use error::{AppError, AppResult};
pub use models::{GenerationReport, GradedResult, Question, QuizView, SubmittedAnswer};
pub use orchestrator::{App, GenerationOrchestrator};
pub use services::{LlmService, QuestionGenerator};
pub use store::{InMemoryQuizStore, QuizStore};
pub use workflow::{QuizCtx, QuizService};
