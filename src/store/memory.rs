use super::QuizStore;
use crate::error::{AppResult, PersistenceError};
use crate::models::{Question, QuizExport, StoredQuestion, StoredTopic};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    topics: HashMap<Uuid, StoredTopic>,
    questions: HashMap<Uuid, Vec<StoredQuestion>>,
}

/// 进程内题库，进程退出即丢失
#[derive(Default)]
pub struct InMemoryQuizStore {
    inner: RwLock<Inner>,
}

impl InMemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 导入之前导出的整套题，保留原有 id
    pub async fn import(&self, export: QuizExport) -> AppResult<()> {
        let topic_id = export.topic.id;
        if export.questions.iter().any(|q| q.topic_id != topic_id) {
            return Err(PersistenceError::Backend(format!(
                "导入的题目不属于主题 {}",
                topic_id
            ))
            .into());
        }

        let mut inner = self.inner.write().await;
        inner.topics.insert(topic_id, export.topic);
        inner.questions.insert(topic_id, export.questions);
        debug!("导入主题 {}", topic_id);
        Ok(())
    }
}

#[async_trait]
impl QuizStore for InMemoryQuizStore {
    async fn create_topic(&self, title: &str, description: &str) -> AppResult<Uuid> {
        let topic = StoredTopic {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
        };
        let id = topic.id;
        self.inner.write().await.topics.insert(id, topic);
        Ok(id)
    }

    async fn bulk_insert_questions(
        &self,
        topic_id: Uuid,
        questions: Vec<Question>,
    ) -> AppResult<Vec<StoredQuestion>> {
        let mut inner = self.inner.write().await;
        if !inner.topics.contains_key(&topic_id) {
            return Err(PersistenceError::TopicNotFound {
                topic_id: topic_id.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let stored: Vec<StoredQuestion> = questions
            .into_iter()
            .map(|question| StoredQuestion {
                id: Uuid::new_v4(),
                topic_id,
                question,
                created_at: now,
            })
            .collect();

        inner
            .questions
            .entry(topic_id)
            .or_default()
            .extend(stored.iter().cloned());

        Ok(stored)
    }

    async fn find_topic(&self, topic_id: Uuid) -> AppResult<Option<StoredTopic>> {
        Ok(self.inner.read().await.topics.get(&topic_id).cloned())
    }

    async fn find_questions_by_topic(&self, topic_id: Uuid) -> AppResult<Vec<StoredQuestion>> {
        Ok(self
            .inner
            .read()
            .await
            .questions
            .get(&topic_id)
            .cloned()
            .unwrap_or_default())
    }
}
