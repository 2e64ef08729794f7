pub mod ai_service;
pub mod config;
pub mod database;
pub mod interview;
pub mod openai;
pub mod session;

pub use ai_service::{AnswerEvaluator, QuestionGenerator, SampleAiService, ServiceError};
pub use config::AppConfig;
pub use database::{Candidate, CandidateProfile, CandidateStatus, CandidateStore};
pub use interview::{spawn_controller, ControllerError, ControllerHandle, FinalReport, InterviewEvent};
pub use session::{Phase, SessionError, SessionManager, SessionSnapshot};
