pub mod answer;
pub mod question;

pub use answer::{Answer, AnswerSheet};
pub use question::{Options, Question, QuestionSet, QuestionType};
