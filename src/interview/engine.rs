use log::{info, warn, debug};
use chrono::Utc;
use crate::ai_service::ServiceError;
use crate::database::{Candidate, CandidateStatus};
use crate::session::{Phase, RoundStage, SessionSnapshot};
use super::{
    normalize_answer, round_setting, ControllerError, Difficulty, FinalReport, PauseGuard,
    PauseState, Question, ResumeOutcome, Result, Round, TickOutcome, TimerState, TOTAL_ROUNDS,
};

/// Identifies the session generation and round an external request was made for.
/// Responses carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    round: usize,
}

impl Ticket {
    pub fn round(&self) -> usize {
        self.round
    }
}

#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub ticket: Ticket,
    pub difficulty: Difficulty,
    pub background_text: String,
}

#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub ticket: Ticket,
    pub question: String,
    pub answer: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuestionOutcome {
    /// Response for a reset session or an already settled round.
    Stale,
    Asked { round: usize, question: Question, time_limit: u32 },
    Failed { round: usize, error: ControllerError },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    Stale,
    Recorded { round: usize, score: i32, scoring_failed: bool, complete: bool },
}

/// Result of finalizing: the report kept in the session and the candidate record exported to the host.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub report: FinalReport,
    pub candidate: Candidate,
}

/// State machine for one interview session.
///
/// Every operation either applies completely or returns an error with the
/// state untouched. External calls are modelled as request values handed to
/// the caller and results fed back in with their [`Ticket`].
#[derive(Debug, Default)]
pub struct InterviewEngine {
    epoch: u64,
    candidate: Option<Candidate>,
    phase: Phase,
    round_index: usize,
    rounds: Vec<Round>,
    timer: TimerState,
    processing: bool,
    stage: RoundStage,
    guard: PauseGuard,
    final_report: Option<FinalReport>,
}

impl InterviewEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_index(&self) -> usize {
        self.round_index
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn timer(&self) -> TimerState {
        self.timer
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn pause_state(&self) -> PauseState {
        self.guard.state()
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.candidate.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            candidate_id: self.candidate.as_ref().map(|c| c.id.clone()),
            phase: self.phase,
            round_index: self.round_index,
            rounds: self.rounds.clone(),
            timer_seconds: self.timer.seconds,
            timer_armed: self.timer.armed,
            processing: self.processing,
            stage: self.stage.clone(),
            pause: self.guard.state(),
            final_score: self.final_report.as_ref().map(|r| r.percentage),
            final_summary: self.final_report.as_ref().map(|r| r.summary.clone()),
        }
    }

    /// Binds a candidate whose profile is complete; `idle -> ready`.
    pub fn mark_ready(&mut self, candidate: Candidate) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        if !candidate.is_ready() {
            return Err(ControllerError::CandidateNotReady(candidate.status));
        }

        info!("📋 Session ready for candidate {} ({})", candidate.name, candidate.id);
        self.candidate = Some(candidate);
        self.phase = Phase::Ready;
        Ok(())
    }

    pub fn begin_round(&mut self, index: usize) -> Result<QuestionRequest> {
        let setting = round_setting(index).ok_or(ControllerError::RoundOutOfRange(index))?;

        if !matches!(self.phase, Phase::Ready | Phase::InProgress) {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        if self.processing {
            return Err(ControllerError::Busy);
        }
        if self.stage != RoundStage::AwaitingQuestion {
            return Err(ControllerError::RoundAlreadyActive(self.round_index));
        }
        if index != self.round_index {
            return Err(ControllerError::RoundOutOfOrder { requested: index, expected: self.round_index });
        }

        if self.phase == Phase::Ready {
            info!("🎬 Interview started");
            self.phase = Phase::InProgress;
            if let Some(candidate) = self.candidate.as_mut() {
                candidate.status = CandidateStatus::InProgress;
            }
        }
        self.processing = true;

        info!("🎯 Requesting {} question for round {}/{}", setting.difficulty, index + 1, TOTAL_ROUNDS);

        Ok(QuestionRequest {
            ticket: Ticket { epoch: self.epoch, round: index },
            difficulty: setting.difficulty,
            background_text: self
                .candidate
                .as_ref()
                .map(|c| c.resume_text.clone())
                .unwrap_or_default(),
        })
    }

    pub fn question_received(&mut self, ticket: Ticket, result: std::result::Result<String, ServiceError>) -> QuestionOutcome {
        if !self.is_current(ticket) || self.stage != RoundStage::AwaitingQuestion {
            debug!("Dropping stale question response for round {}", ticket.round + 1);
            return QuestionOutcome::Stale;
        }

        self.processing = false;
        let round = ticket.round;
        let Some(setting) = round_setting(round) else {
            return QuestionOutcome::Stale;
        };

        match result {
            Ok(text) => {
                let question = Question { text, difficulty: setting.difficulty };
                self.stage = RoundStage::AwaitingAnswer { question: question.clone() };
                self.guard.clear();
                self.timer.start(setting.time_limit);
                info!(
                    "✅ Round {} question ready ({}s): {}",
                    round + 1,
                    setting.time_limit,
                    question.text.chars().take(50).collect::<String>()
                );
                QuestionOutcome::Asked { round, question, time_limit: setting.time_limit }
            }
            Err(err) => {
                warn!("❌ Question generation failed for round {}: {}", round + 1, err);
                QuestionOutcome::Failed { round, error: ControllerError::QuestionGeneration(err) }
            }
        }
    }

    pub fn submit_answer(&mut self, text: &str) -> Result<EvaluationRequest> {
        if self.phase != Phase::InProgress {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        if self.processing {
            return Err(ControllerError::Busy);
        }
        let question = match &self.stage {
            RoundStage::AwaitingAnswer { question } => question.clone(),
            _ => return Err(ControllerError::NotAwaitingAnswer),
        };

        self.timer.clear();
        self.guard.clear();

        let answer = normalize_answer(text);
        info!(
            "📝 Answer submitted for round {}: {}",
            self.round_index + 1,
            answer.chars().take(50).collect::<String>()
        );

        self.stage = RoundStage::AwaitingScore { question: question.clone(), answer: answer.clone() };
        self.processing = true;

        Ok(EvaluationRequest {
            ticket: Ticket { epoch: self.epoch, round: self.round_index },
            question: question.text,
            answer,
            difficulty: question.difficulty,
        })
    }

    pub fn evaluation_received(&mut self, ticket: Ticket, result: std::result::Result<i32, ServiceError>) -> EvaluationOutcome {
        if !self.is_current(ticket) {
            debug!("Dropping stale evaluation response for round {}", ticket.round + 1);
            return EvaluationOutcome::Stale;
        }
        let (question, answer) = match &self.stage {
            RoundStage::AwaitingScore { question, answer } => (question.clone(), answer.clone()),
            _ => return EvaluationOutcome::Stale,
        };

        let (score, scoring_failed) = match result {
            Ok(score) => {
                if !(0..=super::MAX_ROUND_SCORE).contains(&score) {
                    warn!("⚠️ Score {} for round {} is outside 0-10, recording as-is", score, ticket.round + 1);
                }
                (score, false)
            }
            Err(err) => {
                warn!("❌ Evaluation failed for round {}: {} - recording score 0", ticket.round + 1, err);
                (0, true)
            }
        };

        self.rounds.push(Round { question, answer, score });
        self.round_index += 1;
        self.stage = RoundStage::AwaitingQuestion;
        self.processing = false;

        info!("📊 Round {} recorded with score {}/10", ticket.round + 1, score);

        EvaluationOutcome::Recorded {
            round: ticket.round,
            score,
            scoring_failed,
            complete: self.round_index == TOTAL_ROUNDS,
        }
    }

    /// Applies one clock tick to the countdown.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::InProgress {
            return TickOutcome::Ignored;
        }
        let outcome = self.timer.tick();
        if outcome == TickOutcome::Expired {
            info!("⏰ Time elapsed for round {}", self.round_index + 1);
        }
        outcome
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.phase != Phase::InProgress {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        if !matches!(self.stage, RoundStage::AwaitingAnswer { .. }) {
            return Err(ControllerError::NotAwaitingAnswer);
        }
        self.guard.pause()?;
        self.timer.disarm();
        info!("⏸️ Interview paused with {}s left", self.timer.seconds);
        Ok(())
    }

    /// Host-reported visibility loss. Returns whether the session is now "away".
    pub fn visibility_lost(&mut self) -> bool {
        let away = self.guard.visibility_lost();
        if away {
            info!("👋 Candidate left the screen while paused");
        }
        away
    }

    pub fn resume(&mut self) -> Result<ResumeOutcome> {
        let outcome = self.guard.resume()?;
        match outcome {
            ResumeOutcome::Resumed => {
                self.timer.arm();
                info!("▶️ Interview resumed");
            }
            ResumeOutcome::WelcomeBackRequired => {
                info!("🙋 Resume held until welcome back is confirmed");
            }
        }
        Ok(outcome)
    }

    pub fn confirm_welcome_back(&mut self) -> Result<()> {
        self.guard.confirm_welcome_back()?;
        self.timer.arm();
        info!("▶️ Welcome back confirmed, interview resumed");
        Ok(())
    }

    /// Aggregates the six recorded rounds; `in-progress -> completed`.
    pub fn finalize(&mut self) -> Result<Finalized> {
        if self.phase != Phase::InProgress {
            return Err(ControllerError::WrongPhase(self.phase));
        }
        if self.rounds.len() != TOTAL_ROUNDS || self.processing {
            return Err(ControllerError::RoundsIncomplete { recorded: self.rounds.len() });
        }
        let mut candidate = self
            .candidate
            .clone()
            .ok_or(ControllerError::WrongPhase(self.phase))?;

        let report = FinalReport::from_rounds(&self.rounds);

        candidate.status = CandidateStatus::Completed;
        candidate.score = Some(report.percentage);
        candidate.final_summary = Some(report.summary.clone());
        candidate.completed_at = Some(Utc::now());
        candidate.questions = self.rounds.iter().map(|r| r.question.text.clone()).collect();
        candidate.answers = self.rounds.iter().map(|r| r.answer.clone()).collect();
        candidate.individual_scores = self.rounds.iter().map(|r| r.score).collect();

        self.timer.clear();
        self.guard.clear();
        self.phase = Phase::Completed;
        self.final_report = Some(report.clone());
        self.candidate = Some(candidate.clone());

        info!("🏆 Interview completed: {}% ({})", report.percentage, report.summary);

        Ok(Finalized { report, candidate })
    }

    /// Discards all progress and returns to `idle`. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        let epoch = self.epoch + 1;
        *self = Self { epoch, ..Self::default() };
        info!("🔄 Interview session reset");
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        self.processing && ticket.epoch == self.epoch && ticket.round == self.round_index
    }
}
