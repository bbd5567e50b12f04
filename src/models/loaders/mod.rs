pub mod text_loader;
pub mod toml_loader;

pub use text_loader::{load_all_source_documents, load_source_document, SourceDocument};
pub use toml_loader::{
    load_all_quiz_exports, load_all_submissions, load_quiz_export, load_submission,
    save_quiz_export,
};
