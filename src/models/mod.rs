pub mod chunk;
pub mod grading;
pub mod loaders;
pub mod question;
pub mod quiz;
pub mod response;

pub use chunk::{GenerationRequest, TextChunk};
pub use grading::{GradedEntry, GradedResult, Performance, SubmittedAnswer, NOT_ANSWERED};
pub use loaders::{
    load_all_quiz_exports, load_all_source_documents, load_all_submissions, save_quiz_export,
    SourceDocument,
};
pub use question::{Question, QuestionKind, QuestionView, StoredQuestion, StoredTopic, Topic};
pub use quiz::{GenerationReport, MergedGeneration, QuizDraft, QuizExport, QuizView, SubmissionFile};
pub use response::{ApiErrorBody, ApiResponse};
