pub mod models;
pub mod store;

pub use models::{
    Candidate, CandidateProfile, CandidateStatus, CandidateUpdate, DashboardMetrics, StatusFilter,
};
pub use store::CandidateStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Invalid candidate status: {0}")]
    InvalidStatus(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
