use serde::{Serialize, Deserialize};
use std::fmt;

/// Number of rounds in every interview.
pub const TOTAL_ROUNDS: usize = 6;

/// Highest score a single round is expected to receive.
pub const MAX_ROUND_SCORE: i32 = 10;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty tier and time budget for one round index.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSetting {
    pub difficulty: Difficulty,
    pub time_limit: u32, // in seconds
}

/// Fixed schedule, indexed by round index.
pub const ROUND_PLAN: [RoundSetting; TOTAL_ROUNDS] = [
    RoundSetting { difficulty: Difficulty::Easy, time_limit: 20 },
    RoundSetting { difficulty: Difficulty::Easy, time_limit: 20 },
    RoundSetting { difficulty: Difficulty::Medium, time_limit: 60 },
    RoundSetting { difficulty: Difficulty::Medium, time_limit: 60 },
    RoundSetting { difficulty: Difficulty::Hard, time_limit: 120 },
    RoundSetting { difficulty: Difficulty::Hard, time_limit: 120 },
];

/// Looks up the plan entry for `index`, `None` past the last round.
pub fn round_setting(index: usize) -> Option<RoundSetting> {
    ROUND_PLAN.get(index).copied()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub difficulty: Difficulty,
}
