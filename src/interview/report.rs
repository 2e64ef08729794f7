use serde::{Serialize, Deserialize};
use super::{Round, MAX_ROUND_SCORE, TOTAL_ROUNDS};

/// Score at or above which a round counts as a strong area.
pub const STRONG_AREA_THRESHOLD: i32 = 7;
/// Score below which a round counts as an area for development.
pub const WEAK_AREA_THRESHOLD: i32 = 5;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FinalReport {
    pub total_score: i32,
    pub percentage: i32,
    pub strong_areas: usize,
    pub weak_areas: usize,
    pub summary: String,
}

impl FinalReport {
    pub fn from_scores(scores: &[i32]) -> Self {
        let total_score: i32 = scores.iter().sum();
        let max_total = (TOTAL_ROUNDS as i32 * MAX_ROUND_SCORE) as f64;
        let percentage = (total_score as f64 / max_total * 100.0).round() as i32;

        let strong_areas = scores.iter().filter(|s| **s >= STRONG_AREA_THRESHOLD).count();
        let weak_areas = scores.iter().filter(|s| **s < WEAK_AREA_THRESHOLD).count();

        let summary = format!(
            "Your performance analysis shows {}% overall proficiency with {} strong areas and {} areas for development.",
            percentage, strong_areas, weak_areas
        );

        FinalReport {
            total_score,
            percentage,
            strong_areas,
            weak_areas,
            summary,
        }
    }

    pub fn from_rounds(rounds: &[Round]) -> Self {
        let scores: Vec<i32> = rounds.iter().map(|r| r.score).collect();
        Self::from_scores(&scores)
    }
}
