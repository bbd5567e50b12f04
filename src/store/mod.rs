//! 存储层
//!
//! 只定义题库的存取接口，具体持久化方式由实现决定。
//! 默认提供进程内实现 [`InMemoryQuizStore`]。

pub mod memory;

pub use memory::InMemoryQuizStore;

use crate::error::AppResult;
use crate::models::{Question, StoredQuestion, StoredTopic};
use async_trait::async_trait;
use uuid::Uuid;

/// 题库存储接口
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// 创建主题，返回主题 id
    async fn create_topic(&self, title: &str, description: &str) -> AppResult<Uuid>;

    /// 批量写入某主题下的题目，返回带 id 的存储记录（顺序与输入一致）
    async fn bulk_insert_questions(
        &self,
        topic_id: Uuid,
        questions: Vec<Question>,
    ) -> AppResult<Vec<StoredQuestion>>;

    async fn find_topic(&self, topic_id: Uuid) -> AppResult<Option<StoredTopic>>;

    /// 按写入顺序返回某主题下的所有题目
    async fn find_questions_by_topic(&self, topic_id: Uuid) -> AppResult<Vec<StoredQuestion>>;
}
