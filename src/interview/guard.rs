use serde::{Serialize, Deserialize};
use super::ControllerError;

/// Pause state of the running round.
///
/// `PausedAway` is only reachable from `PausedHere` through a host-reported
/// visibility signal and can only be left through
/// [`PauseGuard::confirm_welcome_back`] (or a reset).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PauseState {
    #[default]
    Running,
    PausedHere,
    PausedAway,
}

/// What a `resume()` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Clock should be re-armed now.
    Resumed,
    /// The user was away; nothing re-armed until the welcome back is confirmed.
    WelcomeBackRequired,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PauseGuard {
    state: PauseState,
}

impl PauseGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PauseState {
        self.state
    }

    pub fn pause(&mut self) -> Result<(), ControllerError> {
        match self.state {
            PauseState::Running => {
                self.state = PauseState::PausedHere;
                Ok(())
            }
            _ => Err(ControllerError::AlreadyPaused),
        }
    }

    /// Host reported that the user left the screen. Only meaningful while paused here.
    pub fn visibility_lost(&mut self) -> bool {
        if self.state == PauseState::PausedHere {
            self.state = PauseState::PausedAway;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> Result<ResumeOutcome, ControllerError> {
        match self.state {
            PauseState::PausedHere => {
                self.state = PauseState::Running;
                Ok(ResumeOutcome::Resumed)
            }
            PauseState::PausedAway => Ok(ResumeOutcome::WelcomeBackRequired),
            PauseState::Running => Err(ControllerError::NotPaused),
        }
    }

    pub fn confirm_welcome_back(&mut self) -> Result<(), ControllerError> {
        match self.state {
            PauseState::PausedAway => {
                self.state = PauseState::Running;
                Ok(())
            }
            _ => Err(ControllerError::NotAway),
        }
    }

    /// Drops any pause, used when the round ends while paused or on reset.
    pub fn clear(&mut self) {
        self.state = PauseState::Running;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_screen_pause_resumes_directly() {
        let mut guard = PauseGuard::new();
        guard.pause().unwrap();
        assert_eq!(guard.state(), PauseState::PausedHere);
        assert_eq!(guard.resume().unwrap(), ResumeOutcome::Resumed);
        assert_eq!(guard.state(), PauseState::Running);
    }

    #[test]
    fn test_away_requires_welcome_back() {
        let mut guard = PauseGuard::new();
        guard.pause().unwrap();
        assert!(guard.visibility_lost());
        assert_eq!(guard.resume().unwrap(), ResumeOutcome::WelcomeBackRequired);
        assert_eq!(guard.state(), PauseState::PausedAway);
        // a second resume still does not get through
        assert_eq!(guard.resume().unwrap(), ResumeOutcome::WelcomeBackRequired);
        guard.confirm_welcome_back().unwrap();
        assert_eq!(guard.state(), PauseState::Running);
    }

    #[test]
    fn test_visibility_ignored_while_running() {
        let mut guard = PauseGuard::new();
        assert!(!guard.visibility_lost());
        assert_eq!(guard.state(), PauseState::Running);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut guard = PauseGuard::new();
        assert!(matches!(guard.resume(), Err(ControllerError::NotPaused)));
        assert!(matches!(guard.confirm_welcome_back(), Err(ControllerError::NotAway)));
        guard.pause().unwrap();
        assert!(matches!(guard.pause(), Err(ControllerError::AlreadyPaused)));
        assert!(matches!(guard.confirm_welcome_back(), Err(ControllerError::NotAway)));
        assert_eq!(guard.state(), PauseState::PausedHere);
    }
}
