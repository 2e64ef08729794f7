use serde::{Serialize, Deserialize};
use super::Question;

/// Recorded in place of an empty or whitespace-only answer.
pub const NO_ANSWER: &str = "No answer provided";

/// One fully recorded question/answer/score triple.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Round {
    pub question: Question,
    pub answer: String,
    pub score: i32, // expected 0-10, passed through unclamped
}

pub fn normalize_answer(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        NO_ANSWER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_answer_becomes_sentinel() {
        assert_eq!(normalize_answer(""), NO_ANSWER);
        assert_eq!(normalize_answer("   \n\t"), NO_ANSWER);
    }

    #[test]
    fn test_answer_is_trimmed() {
        assert_eq!(normalize_answer("  use a hash map \n"), "use a hash map");
    }
}
