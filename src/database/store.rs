use parking_lot::RwLock;
use log::{info, warn};
use super::{
    Candidate, CandidateStatus, CandidateUpdate, DashboardMetrics, DatabaseError, Result, StatusFilter,
};

/// Score from which a completed candidate counts as a high performer.
pub const HIGH_PERFORMER_SCORE: i32 = 80;

/// In-memory candidate records, in insertion order.
#[derive(Debug, Default)]
pub struct CandidateStore {
    candidates: RwLock<Vec<Candidate>>,
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `candidate` unless one with the same id exists. Returns whether it was added.
    pub fn add_candidate(&self, candidate: Candidate) -> bool {
        let mut candidates = self.candidates.write();
        if candidates.iter().any(|c| c.id == candidate.id) {
            return false;
        }
        info!("👤 Candidate added: {} ({})", candidate.name, candidate.id);
        candidates.push(candidate);
        true
    }

    /// Merges `update` into the stored record and returns the result.
    pub fn update_candidate(&self, id: &str, update: CandidateUpdate) -> Result<Candidate> {
        let mut candidates = self.candidates.write();
        let slot = candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DatabaseError::CandidateNotFound(id.to_string()))?;
        update.apply_to(slot);
        Ok(slot.clone())
    }

    /// Replaces the stored record with the same id.
    pub fn replace_candidate(&self, candidate: Candidate) -> Result<()> {
        let mut candidates = self.candidates.write();
        let slot = candidates
            .iter_mut()
            .find(|c| c.id == candidate.id)
            .ok_or_else(|| DatabaseError::CandidateNotFound(candidate.id.clone()))?;
        *slot = candidate;
        Ok(())
    }

    /// Stores the record exported by a finished interview.
    pub fn apply_finalized(&self, candidate: Candidate) -> Result<()> {
        if candidate.status != CandidateStatus::Completed {
            return Err(DatabaseError::InvalidStatus(candidate.status.to_string()));
        }
        info!(
            "🏆 Candidate {} completed with score {}",
            candidate.id,
            candidate.score.unwrap_or_default()
        );
        if self.replace_candidate(candidate.clone()).is_err() {
            warn!("Finalized candidate {} was not stored yet, adding it", candidate.id);
            self.add_candidate(candidate);
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Candidate> {
        self.candidates.read().iter().find(|c| c.id == id).cloned()
    }

    pub fn list(&self) -> Vec<Candidate> {
        self.candidates.read().clone()
    }

    /// Case-insensitive match on name or email, combined with a status filter.
    pub fn search(&self, text: &str, filter: StatusFilter) -> Vec<Candidate> {
        let needle = text.trim().to_lowercase();
        self.candidates
            .read()
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.name.to_lowercase().contains(&needle)
                    || c.email.to_lowercase().contains(&needle)
            })
            .filter(|c| match filter {
                StatusFilter::All => true,
                StatusFilter::Only(status) => c.status == status,
            })
            .cloned()
            .collect()
    }

    pub fn metrics(&self) -> DashboardMetrics {
        let candidates = self.candidates.read();
        let count = |status: CandidateStatus| candidates.iter().filter(|c| c.status == status).count();

        let completed: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::Completed)
            .collect();
        let scores: Vec<i32> = completed.iter().filter_map(|c| c.score).collect();

        let average_score = if scores.is_empty() {
            0
        } else {
            (scores.iter().sum::<i32>() as f64 / scores.len() as f64).round() as i32
        };
        let completion_rate = if candidates.is_empty() {
            0
        } else {
            (completed.len() as f64 / candidates.len() as f64 * 100.0).round() as i32
        };

        DashboardMetrics {
            total_candidates: candidates.len(),
            completed: completed.len(),
            in_progress: count(CandidateStatus::InProgress),
            pending: count(CandidateStatus::Pending),
            average_score,
            high_performers: scores.iter().filter(|s| **s >= HIGH_PERFORMER_SCORE).count(),
            completion_rate,
        }
    }
}
