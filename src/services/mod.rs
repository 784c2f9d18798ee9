pub mod answer_store;
pub mod image_service;
pub mod matching_service;
pub mod question_store;
pub mod solver_service;

pub use answer_store::{AnswerStore, SolveStats};
pub use image_service::ImageTextService;
pub use matching_service::{MatchStats, MatchingService};
pub use question_store::{QuestionStore, UpsertStats};
pub use solver_service::{LlmSolver, QuestionSolver};
