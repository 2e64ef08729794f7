use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateStatus {
    Pending,
    Ready,
    InProgress,
    Completed,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::Ready => "ready",
            CandidateStatus::InProgress => "in-progress",
            CandidateStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub summary: String,
    pub resume_text: String,
    pub status: CandidateStatus,
    pub score: Option<i32>,
    pub final_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub individual_scores: Vec<i32>,
}

impl Candidate {
    /// A freshly uploaded candidate; the profile still has to be completed.
    pub fn new(resume_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            summary: String::new(),
            resume_text: resume_text.into(),
            status: CandidateStatus::Pending,
            score: None,
            final_summary: None,
            created_at: Utc::now(),
            completed_at: None,
            questions: Vec::new(),
            answers: Vec::new(),
            individual_scores: Vec::new(),
        }
    }

    /// Validates `profile`, copies it in and marks the candidate ready to interview.
    pub fn complete_profile(&mut self, profile: CandidateProfile) -> super::Result<()> {
        profile
            .validate()
            .map_err(|e| super::DatabaseError::InvalidProfile(e.to_string()))?;

        self.name = profile.name.trim().to_string();
        self.email = profile.email.trim().to_string();
        self.phone = profile.phone.trim().to_string();
        if let Some(summary) = profile.summary {
            self.summary = summary;
        }
        self.status = CandidateStatus::Ready;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.status == CandidateStatus::Ready
    }
}

/// Profile form filled in (or corrected) by the candidate after upload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidateProfile {
    #[validate(length(min = 1, message = "Please enter your name"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please enter your phone number"))]
    pub phone: String,
    pub summary: Option<String>,
}

/// Partial changes to a stored candidate; `None` fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub summary: Option<String>,
    pub status: Option<CandidateStatus>,
    pub score: Option<i32>,
    pub final_summary: Option<String>,
}

impl CandidateUpdate {
    pub fn status(status: CandidateStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub(crate) fn apply_to(self, candidate: &mut Candidate) {
        if let Some(name) = self.name {
            candidate.name = name;
        }
        if let Some(email) = self.email {
            candidate.email = email;
        }
        if let Some(phone) = self.phone {
            candidate.phone = phone;
        }
        if let Some(summary) = self.summary {
            candidate.summary = summary;
        }
        if let Some(status) = self.status {
            candidate.status = status;
        }
        if let Some(score) = self.score {
            candidate.score = Some(score);
        }
        if let Some(final_summary) = self.final_summary {
            candidate.final_summary = Some(final_summary);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CandidateStatus),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DashboardMetrics {
    pub total_candidates: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub pending: usize,
    pub average_score: i32,
    pub high_performers: usize,
    pub completion_rate: i32,
}
