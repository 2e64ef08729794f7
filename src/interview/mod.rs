pub mod questions;
pub mod answers;
pub mod timer;
pub mod guard;
pub mod report;
pub mod engine;
pub mod events;
pub mod controller;

pub use questions::*;
pub use answers::*;
pub use timer::*;
pub use guard::*;
pub use report::*;
pub use engine::*;
pub use events::*;
pub use controller::*;

use thiserror::Error;
use crate::ai_service::ServiceError;
use crate::database::CandidateStatus;
use crate::session::Phase;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    #[error("Round {0} is outside the interview plan")]
    RoundOutOfRange(usize),
    #[error("Round {requested} requested but round {expected} is next")]
    RoundOutOfOrder { requested: usize, expected: usize },
    #[error("Operation not allowed while session is {0}")]
    WrongPhase(Phase),
    #[error("Candidate profile is {0}, not ready")]
    CandidateNotReady(CandidateStatus),
    #[error("Round {0} already has its question")]
    RoundAlreadyActive(usize),
    #[error("No question is awaiting an answer")]
    NotAwaitingAnswer,
    #[error("A question or evaluation request is still in flight")]
    Busy,
    #[error("Interview is not paused")]
    NotPaused,
    #[error("Interview is already paused")]
    AlreadyPaused,
    #[error("Candidate has not been away; nothing to welcome back")]
    NotAway,
    #[error("Only {recorded} of {} rounds are recorded", TOTAL_ROUNDS)]
    RoundsIncomplete { recorded: usize },
    #[error("Question generation failed: {0}")]
    QuestionGeneration(ServiceError),
    #[error("Interview controller has shut down")]
    ControllerClosed,
}

pub type Result<T> = std::result::Result<T, ControllerError>;
