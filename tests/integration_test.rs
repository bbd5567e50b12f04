use async_trait::async_trait;
use quiz_forge::error::{AggregationError, AppError, LlmError};
use quiz_forge::models::{load_all_quiz_exports, Performance, SubmittedAnswer};
use quiz_forge::services::segmenter;
use quiz_forge::utils::logging;
use quiz_forge::{App, AppResult, Config, InMemoryQuizStore, QuestionGenerator, QuizService, RunMode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const MARKER: &str = "Zebras quick brown fox jumps over lazy dogs. ";

/// 9000 字符的原文，标记句只出现在最后一个分块中
fn long_text() -> String {
    "The quick brown fox jumps over the lazy dog. ".repeat(199) + MARKER
}

/// 脚本化的生成服务：包含标记句的分块始终失败，其余分块返回合格题目
struct ScriptedGenerator {
    calls: AtomicUsize,
    fail_all: bool,
}

impl ScriptedGenerator {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_all: false,
        }
    }

    fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl QuestionGenerator for ScriptedGenerator {
    async fn generate(&self, chunk_text: &str, count: usize) -> AppResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all || chunk_text.contains("Zebras") {
            return Err(LlmError::ApiCallFailed {
                model: "scripted".into(),
                message: "upstream unavailable".into(),
            }
            .into());
        }

        let questions: Vec<_> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "type": "mcq",
                    "questionText": format!("Question {}-{}", call, i),
                    "options": ["Paris", "London", "Rome", "Madrid"],
                    "answer": "Paris",
                    "explanation": "Paris is the capital of France."
                })
            })
            .collect();

        // 模拟模型常见的 markdown 包裹
        Ok(format!(
            "```json\n{}\n```",
            serde_json::json!({
                "topic": {"title": "Foxes", "description": "About a quick fox"},
                "questions": questions
            })
        ))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn test_config() -> Config {
    Config {
        retry_base_delay_ms: 0,
        ..Config::default()
    }
}

#[test]
fn test_long_text_splits_into_three_chunks() {
    let text = long_text();
    assert_eq!(text.chars().count(), 9000);

    let chunks = segmenter::segment(&text, 4000, 200);
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.len <= 4000));
    assert!(chunks[2].text.contains("Zebras"));
    assert!(!chunks[1].text.contains("Zebras"));
}

#[tokio::test]
async fn test_end_to_end_partial_failure_and_grading() {
    logging::init(false);

    let generator = Arc::new(ScriptedGenerator::new());
    let service = QuizService::new(
        generator.clone(),
        Arc::new(InMemoryQuizStore::new()),
        &test_config(),
    );

    let report = assert_ok!(service.generate_from_text(&long_text(), Some(10)).await);
    assert_eq!(report.chunk_count, 3);
    assert_eq!(report.failed_chunks, vec![2]);
    assert_eq!(report.question_count, 8);
    assert_eq!(report.shortfall, 2);
    assert_eq!(report.title, "Foxes");
    // 两个成功分块各一次，失败分块首次调用加 3 次重试
    assert_eq!(generator.calls.load(Ordering::SeqCst), 6);

    let topic_id = report.topic_id.to_string();
    let view = assert_ok!(service.fetch_questions(&topic_id).await);
    assert_eq!(view.questions.len(), 8);

    let answers: Vec<_> = view
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = if i < 5 { "paris" } else { "London" };
            SubmittedAnswer::new(q.id.to_string(), answer)
        })
        .collect();

    let result = assert_ok!(service.submit_answers(&topic_id, &answers).await);
    assert_eq!(result.score, 5);
    assert_eq!(result.total_questions, 8);
    assert_eq!(result.percentage, 62.5);
    assert_eq!(result.performance, Performance::Good);
    assert_eq!(result.performance.to_string(), "Good");
}

#[tokio::test]
async fn test_total_failure_is_fatal() {
    let service = QuizService::new(
        Arc::new(ScriptedGenerator::failing()),
        Arc::new(InMemoryQuizStore::new()),
        &test_config(),
    );

    let err = assert_err!(service.generate_from_text(&long_text(), Some(10)).await);
    assert_eq!(err.code(), "GENERATION_ERROR");
    assert!(matches!(
        err,
        AppError::Aggregation(AggregationError::AllChunksFailed { chunk_count: 3, .. })
    ));
}

#[tokio::test]
async fn test_batch_generate_then_grade() {
    let source = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let submissions = tempfile::tempdir().unwrap();

    std::fs::write(
        source.path().join("geography.txt"),
        "Paris is the capital of France. It lies on the Seine.",
    )
    .unwrap();
    std::fs::write(source.path().join("ignored.pdf"), "binary").unwrap();

    let config = Config {
        source_folder: source.path().to_string_lossy().to_string(),
        output_folder: output.path().to_string_lossy().to_string(),
        submissions_folder: submissions.path().to_string_lossy().to_string(),
        default_question_count: 3,
        ..test_config()
    };

    // 出题模式
    let app = App::with_generator(config.clone(), Arc::new(ScriptedGenerator::new()));
    assert_ok!(app.run().await);

    let exports = load_all_quiz_exports(&config.output_folder).await.unwrap();
    assert_eq!(exports.len(), 1);
    let export = &exports[0];
    assert_eq!(export.questions.len(), 3);
    assert_eq!(export.questions[0].question.answer, "Paris");

    // 批改模式：新的进程内题库从导出文件恢复
    let mut answers = String::new();
    for (i, q) in export.questions.iter().enumerate() {
        let answer = if i == 0 { "Rome" } else { "PARIS" };
        answers.push_str(&format!(
            "\n[[answers]]\nquestionId = \"{}\"\nuserAnswer = \"{}\"\n",
            q.id, answer
        ));
    }
    std::fs::write(
        submissions.path().join("alice.toml"),
        format!("topicId = \"{}\"\n{}", export.topic.id, answers),
    )
    .unwrap();

    let grade_config = Config {
        mode: RunMode::Grade,
        ..config.clone()
    };
    let app = App::with_generator(grade_config, Arc::new(ScriptedGenerator::failing()));
    assert_ok!(app.run().await);

    let report = std::fs::read_to_string(output.path().join("alice.result.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["success"], true);
    assert_eq!(report["data"]["score"], 2);
    assert_eq!(report["data"]["totalQuestions"], 3);
    assert_eq!(report["data"]["results"][0]["userAnswer"], "Rome");
}

#[tokio::test]
async fn test_batch_grade_writes_failure_envelope() {
    let output = tempfile::tempdir().unwrap();
    let submissions = tempfile::tempdir().unwrap();

    std::fs::write(
        submissions.path().join("bob.toml"),
        "topicId = \"3f1c2b8e-9d4a-4c1e-8f00-1a2b3c4d5e6f\"\n\n[[answers]]\nquestionId = \"q1\"\nuserAnswer = \"x\"\n",
    )
    .unwrap();

    let config = Config {
        mode: RunMode::Grade,
        output_folder: output.path().to_string_lossy().to_string(),
        submissions_folder: submissions.path().to_string_lossy().to_string(),
        ..test_config()
    };
    let app = App::with_generator(config, Arc::new(ScriptedGenerator::failing()));
    assert_ok!(app.run().await);

    let report = std::fs::read_to_string(output.path().join("bob.result.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["success"], false);
    assert_eq!(report["error"]["type"], "NOT_FOUND");
}
