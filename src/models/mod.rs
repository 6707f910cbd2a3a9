pub mod generation;
pub mod loaders;
pub mod question;
pub mod response;
pub mod score;
pub mod settings;
pub mod task;

pub use generation::{GeneratedQuestions, QuestionGenerateRequest};
pub use loaders::{load_all_task_files, load_task_file};
pub use question::{ExamQuestion, FixRequest, QuestionType, VerificationResult, VerifyAndFixRequest};
pub use response::StandardResponse;
pub use score::{GradingCriteriaOutput, ScoreJudgmentInput, ScoreJudgmentOutput, ScoredQuestionType};
pub use settings::{ExamSettingsInput, ExamSettingsOutput};
pub use task::{Task, TaskFile};
