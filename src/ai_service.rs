use async_trait::async_trait;
use log::info;
use thiserror::Error;
use crate::interview::Difficulty;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("AI service error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("AI service returned no usable content")]
    EmptyResponse,
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
}

/// Produces the question for a round.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_question(
        &self,
        difficulty: Difficulty,
        background_text: &str,
    ) -> Result<String, ServiceError>;
}

/// Scores an answer. The returned score is expected in 0-10 but is not
/// range-checked by callers.
#[async_trait]
pub trait AnswerEvaluator: Send + Sync {
    async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        difficulty: Difficulty,
    ) -> Result<i32, ServiceError>;
}

/// Offline question bank and heuristic scorer, used when no AI key is configured.
#[derive(Debug, Default)]
pub struct SampleAiService {
    asked: parking_lot::Mutex<usize>,
}

impl SampleAiService {
    pub fn new() -> Self {
        Self::default()
    }

    fn sample_questions(difficulty: Difficulty) -> &'static [&'static str] {
        match difficulty {
            Difficulty::Easy => &[
                "What is the difference between let, const and var in JavaScript?",
                "Explain what a REST API is and name its common HTTP methods.",
                "What does the box model describe in CSS?",
            ],
            Difficulty::Medium => &[
                "How would you manage shared state across a React application?",
                "Explain how database indexing speeds up queries and what it costs.",
                "Describe how you would secure a Node.js API with token authentication.",
            ],
            Difficulty::Hard => &[
                "Design a rate limiter for a public API serving millions of users.",
                "How would you scale a real-time chat service to multiple regions?",
                "Walk through diagnosing a memory leak in a long-running Node.js service.",
            ],
        }
    }

    fn heuristic_score(answer: &str) -> i32 {
        if answer == crate::interview::NO_ANSWER {
            return 0;
        }
        let words = answer.split_whitespace().count();
        match words {
            0..=4 => 2,
            5..=19 => 5,
            20..=59 => 7,
            _ => 8,
        }
    }
}

#[async_trait]
impl QuestionGenerator for SampleAiService {
    async fn generate_question(
        &self,
        difficulty: Difficulty,
        _background_text: &str,
    ) -> Result<String, ServiceError> {
        let bank = Self::sample_questions(difficulty);
        let index = {
            let mut asked = self.asked.lock();
            let index = *asked % bank.len();
            *asked += 1;
            index
        };
        info!("📚 Using sample {} question #{}", difficulty, index + 1);
        Ok(bank[index].to_string())
    }
}

#[async_trait]
impl AnswerEvaluator for SampleAiService {
    async fn evaluate_answer(
        &self,
        _question: &str,
        answer: &str,
        _difficulty: Difficulty,
    ) -> Result<i32, ServiceError> {
        Ok(Self::heuristic_score(answer))
    }
}
