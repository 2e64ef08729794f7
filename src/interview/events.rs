use serde::{Serialize, Deserialize};
use crate::database::Candidate;
use super::{Difficulty, FinalReport};

/// Notifications pushed to the host while a session runs. Round indices are 0-based.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterviewEvent {
    Welcome { candidate_name: String, total_rounds: usize },
    Processing { active: bool },
    QuestionAsked {
        round: usize,
        total: usize,
        difficulty: Difficulty,
        time_limit: u32,
        text: String,
    },
    QuestionFailed { round: usize, error: String },
    TimerTick { remaining: u32 },
    TimeUp { round: usize },
    AnswerReceived { round: usize, answer: String, is_last: bool },
    RoundScored { round: usize, score: i32, scoring_failed: bool },
    Paused,
    Resumed,
    WelcomeBackRequired,
    WelcomedBack,
    Completed { report: FinalReport },
    CandidateFinalized { candidate: Candidate },
    Reset,
}

impl InterviewEvent {
    /// Line shown by a plain-text host.
    pub fn describe(&self) -> String {
        match self {
            InterviewEvent::Welcome { candidate_name, total_rounds } => format!(
                "Hello {}! Welcome to your interview. There are {} questions with increasing difficulty.",
                candidate_name, total_rounds
            ),
            InterviewEvent::Processing { active: true } => "Thinking...".to_string(),
            InterviewEvent::Processing { active: false } => String::new(),
            InterviewEvent::QuestionAsked { round, total, difficulty, time_limit, text } => format!(
                "Question {}/{} ({}, {}s): {}",
                round + 1,
                total,
                difficulty,
                time_limit,
                text
            ),
            InterviewEvent::QuestionFailed { round, error } => {
                format!("Could not load question {}: {}", round + 1, error)
            }
            InterviewEvent::TimerTick { remaining } => format!("{}s left", remaining),
            InterviewEvent::TimeUp { round } => format!("Time's up for question {}!", round + 1),
            InterviewEvent::AnswerReceived { is_last: true, .. } => {
                "Thank you! That was the last question.".to_string()
            }
            InterviewEvent::AnswerReceived { .. } => "Thank you! Moving to the next question.".to_string(),
            InterviewEvent::RoundScored { round, score, scoring_failed } => {
                if *scoring_failed {
                    format!("Question {} could not be scored and counts as 0", round + 1)
                } else {
                    format!("Question {} scored {}/10", round + 1, score)
                }
            }
            InterviewEvent::Paused => "Interview paused.".to_string(),
            InterviewEvent::Resumed => "Interview resumed.".to_string(),
            InterviewEvent::WelcomeBackRequired => {
                "Welcome back! Type /back to continue where you left off or /reset to start over.".to_string()
            }
            InterviewEvent::WelcomedBack => "Welcome back! Continuing your interview.".to_string(),
            InterviewEvent::Completed { report } => format!(
                "Interview complete! Final score: {}%. {}",
                report.percentage, report.summary
            ),
            InterviewEvent::CandidateFinalized { candidate } => {
                format!("Results saved for {}", candidate.name)
            }
            InterviewEvent::Reset => "Interview reset.".to_string(),
        }
    }
}
