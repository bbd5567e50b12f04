//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责并发调度和批量处理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `generation` - 分块生成编排器
//! - 每个分块一个 tokio 任务，并发调用生成服务
//! - 传输类错误指数退避重试
//! - 所有任务结束后按分块顺序合并
//!
//! ### `batch_processor` - 批量文件处理器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载原文或答卷
//! - 控制并发数量（Semaphore）
//! - 输出全局统计信息
//!
//! ### `quiz_processor` - 单个文件处理器
//! - 出题并导出 TOML
//! - 批改答卷并写入 JSON 报告
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<文件>)
//!     ↓
//! quiz_processor (处理单个文件)
//!     ↓
//! workflow::QuizService (出题 / 答题流程)
//!     ↓
//! generation (分块并发) → services (分块 / 清洗 / 汇总 / 评分 / LLM)
//!     ↓
//! store (题库)
//! ```

pub mod batch_processor;
pub mod generation;
pub mod quiz_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use generation::GenerationOrchestrator;
pub use quiz_processor::{grade_submission, process_source_document};
