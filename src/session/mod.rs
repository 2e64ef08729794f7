pub mod manager;

pub use manager::*;

use serde::{Serialize, Deserialize};
use std::fmt;
use crate::interview::{PauseState, Question, Round};

/// Top-level lifecycle stage of an interview session.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Idle,
    Ready,
    InProgress,
    Completed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::InProgress => "in-progress",
            Phase::Completed => "completed",
        })
    }
}

/// Where the active round is in its question -> answer -> score cycle.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case", tag = "stage")]
pub enum RoundStage {
    #[default]
    AwaitingQuestion,
    AwaitingAnswer { question: Question },
    AwaitingScore { question: Question, answer: String },
}

/// Read-only copy of the session state for display.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub candidate_id: Option<String>,
    pub phase: Phase,
    pub round_index: usize,
    pub rounds: Vec<Round>,
    pub timer_seconds: u32,
    pub timer_armed: bool,
    pub processing: bool,
    pub stage: RoundStage,
    pub pause: PauseState,
    pub final_score: Option<i32>,
    pub final_summary: Option<String>,
}
