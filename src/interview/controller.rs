use std::sync::Arc;
use std::time::Duration;
use log::{info, warn, error, debug};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use crate::ai_service::{AnswerEvaluator, QuestionGenerator, ServiceError};
use crate::database::Candidate;
use crate::session::{Phase, SessionSnapshot};
use super::{
    Clock, ClockTick, ControllerError, EvaluationOutcome, EvaluationRequest, InterviewEngine,
    InterviewEvent, QuestionOutcome, QuestionRequest, Result, ResumeOutcome, TickOutcome, Ticket,
    TOTAL_ROUNDS,
};

const COMMAND_BUFFER: usize = 32;

enum Command {
    MarkReady { candidate: Candidate, reply: oneshot::Sender<Result<()>> },
    BeginRound { index: usize, reply: oneshot::Sender<Result<()>> },
    SubmitAnswer { text: String, reply: oneshot::Sender<Result<()>> },
    Pause { reply: oneshot::Sender<Result<()>> },
    VisibilityLost { reply: oneshot::Sender<bool> },
    Resume { reply: oneshot::Sender<Result<ResumeOutcome>> },
    ConfirmWelcomeBack { reply: oneshot::Sender<Result<()>> },
    Reset { reply: oneshot::Sender<()> },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
}

enum ServiceResponse {
    Question { ticket: Ticket, result: std::result::Result<String, ServiceError> },
    Evaluation { ticket: Ticket, result: std::result::Result<i32, ServiceError> },
}

/// Cloneable handle to a running interview controller task.
///
/// The task stops once every handle is dropped.
#[derive(Clone, Debug)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    phase: watch::Receiver<Phase>,
}

/// Handle that does not keep the controller task alive.
#[derive(Clone, Debug)]
pub struct WeakControllerHandle {
    commands: mpsc::WeakSender<Command>,
    phase: watch::Receiver<Phase>,
}

impl WeakControllerHandle {
    pub fn upgrade(&self) -> Option<ControllerHandle> {
        self.commands.upgrade().map(|commands| ControllerHandle {
            commands,
            phase: self.phase.clone(),
        })
    }
}

/// Spawns the controller task for one session and returns its handle and
/// the host event stream. Must be called inside a tokio runtime.
pub fn spawn_controller(
    generator: Arc<dyn QuestionGenerator>,
    evaluator: Arc<dyn AnswerEvaluator>,
    tick_period: Duration,
) -> (ControllerHandle, mpsc::UnboundedReceiver<InterviewEvent>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();
    let (clock, tick_rx) = Clock::new(tick_period);
    let (phase_tx, phase_rx) = watch::channel(Phase::Idle);

    let controller = InterviewController {
        engine: InterviewEngine::new(),
        clock,
        generator,
        evaluator,
        cancel: CancellationToken::new(),
        response_tx,
        events: event_tx,
        phase: phase_tx,
    };
    tokio::spawn(controller.run(command_rx, tick_rx, response_rx));

    (ControllerHandle { commands: command_tx, phase: phase_rx }, event_rx)
}

impl ControllerHandle {
    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| ControllerError::ControllerClosed)?;
        response.await.map_err(|_| ControllerError::ControllerClosed)
    }

    /// Binds a candidate with a completed profile to the session.
    pub async fn mark_ready(&self, candidate: Candidate) -> Result<()> {
        self.request(|reply| Command::MarkReady { candidate, reply }).await?
    }

    /// Begins the first round. Later rounds start on their own.
    pub async fn start(&self) -> Result<()> {
        self.begin_round(0).await
    }

    /// Requests the question for `index`; also the retry path after a failed question.
    pub async fn begin_round(&self, index: usize) -> Result<()> {
        self.request(|reply| Command::BeginRound { index, reply }).await?
    }

    pub async fn submit_answer(&self, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        self.request(|reply| Command::SubmitAnswer { text, reply }).await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    pub async fn visibility_lost(&self) -> Result<bool> {
        self.request(|reply| Command::VisibilityLost { reply }).await
    }

    pub async fn resume(&self) -> Result<ResumeOutcome> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    pub async fn confirm_welcome_back(&self) -> Result<()> {
        self.request(|reply| Command::ConfirmWelcomeBack { reply }).await?
    }

    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Last phase published by the controller.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Whether the session can still make progress: the task runs and the interview is not completed.
    pub fn is_live(&self) -> bool {
        !self.is_closed() && self.phase() != Phase::Completed
    }

    pub fn downgrade(&self) -> WeakControllerHandle {
        WeakControllerHandle {
            commands: self.commands.downgrade(),
            phase: self.phase.clone(),
        }
    }
}

/// Owns the session state, the Clock and the in-flight service calls.
struct InterviewController {
    engine: InterviewEngine,
    clock: Clock,
    generator: Arc<dyn QuestionGenerator>,
    evaluator: Arc<dyn AnswerEvaluator>,
    cancel: CancellationToken,
    response_tx: mpsc::UnboundedSender<ServiceResponse>,
    events: mpsc::UnboundedSender<InterviewEvent>,
    phase: watch::Sender<Phase>,
}

impl InterviewController {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut ticks: mpsc::UnboundedReceiver<ClockTick>,
        mut responses: mpsc::UnboundedReceiver<ServiceResponse>,
    ) {
        info!("🚀 Interview controller started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(tick) = ticks.recv() => self.handle_tick(tick),
                Some(response) = responses.recv() => self.handle_response(response),
            }
            self.publish_phase();
        }

        self.cancel.cancel();
        self.clock.disarm();
        info!("🛑 Interview controller stopped");
    }

    fn publish_phase(&self) {
        let current = self.engine.phase();
        self.phase.send_if_modified(|phase| {
            if *phase == current {
                return false;
            }
            *phase = current;
            true
        });
    }

    fn emit(&self, event: InterviewEvent) {
        self.publish_phase();
        if self.events.send(event).is_err() {
            debug!("No host listening for interview events");
        }
    }

    /// Makes the Clock follow the armed flag of the session timer.
    fn sync_clock(&mut self) {
        if self.engine.timer().armed {
            self.clock.arm();
        } else {
            self.clock.disarm();
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::MarkReady { candidate, reply } => {
                let name = candidate.name.clone();
                let result = self.engine.mark_ready(candidate);
                if result.is_ok() {
                    self.emit(InterviewEvent::Welcome { candidate_name: name, total_rounds: TOTAL_ROUNDS });
                }
                let _ = reply.send(result);
            }
            Command::BeginRound { index, reply } => {
                let result = self.engine.begin_round(index).map(|request| self.dispatch_question(request));
                let _ = reply.send(result);
            }
            Command::SubmitAnswer { text, reply } => {
                let _ = reply.send(self.submit(&text));
            }
            Command::Pause { reply } => {
                let result = self.engine.pause();
                self.sync_clock();
                if result.is_ok() {
                    self.emit(InterviewEvent::Paused);
                }
                let _ = reply.send(result);
            }
            Command::VisibilityLost { reply } => {
                let _ = reply.send(self.engine.visibility_lost());
            }
            Command::Resume { reply } => {
                let result = self.engine.resume();
                self.sync_clock();
                match result {
                    Ok(ResumeOutcome::Resumed) => self.emit(InterviewEvent::Resumed),
                    Ok(ResumeOutcome::WelcomeBackRequired) => self.emit(InterviewEvent::WelcomeBackRequired),
                    Err(_) => {}
                }
                let _ = reply.send(result);
            }
            Command::ConfirmWelcomeBack { reply } => {
                let result = self.engine.confirm_welcome_back();
                self.sync_clock();
                if result.is_ok() {
                    self.emit(InterviewEvent::WelcomedBack);
                }
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                self.reset();
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
        }
    }

    fn handle_tick(&mut self, tick: ClockTick) {
        if !self.clock.accepts(&tick) {
            debug!("Ignoring tick from generation {}", tick.generation);
            return;
        }

        match self.engine.tick() {
            TickOutcome::Ignored => self.sync_clock(),
            TickOutcome::Ticked(remaining) => self.emit(InterviewEvent::TimerTick { remaining }),
            TickOutcome::Expired => {
                self.clock.disarm();
                let round = self.engine.round_index();
                self.emit(InterviewEvent::TimerTick { remaining: 0 });
                self.emit(InterviewEvent::TimeUp { round });
                if let Err(e) = self.submit("") {
                    error!("❌ Forced submission for round {} failed: {}", round + 1, e);
                }
            }
        }
    }

    fn handle_response(&mut self, response: ServiceResponse) {
        match response {
            ServiceResponse::Question { ticket, result } => {
                match self.engine.question_received(ticket, result) {
                    QuestionOutcome::Stale => {}
                    QuestionOutcome::Asked { round, question, time_limit } => {
                        self.sync_clock();
                        self.emit(InterviewEvent::Processing { active: false });
                        self.emit(InterviewEvent::QuestionAsked {
                            round,
                            total: TOTAL_ROUNDS,
                            difficulty: question.difficulty,
                            time_limit,
                            text: question.text,
                        });
                    }
                    QuestionOutcome::Failed { round, error } => {
                        self.emit(InterviewEvent::Processing { active: false });
                        self.emit(InterviewEvent::QuestionFailed { round, error: error.to_string() });
                    }
                }
            }
            ServiceResponse::Evaluation { ticket, result } => {
                match self.engine.evaluation_received(ticket, result) {
                    EvaluationOutcome::Stale => {}
                    EvaluationOutcome::Recorded { round, score, scoring_failed, complete } => {
                        self.emit(InterviewEvent::Processing { active: false });
                        self.emit(InterviewEvent::RoundScored { round, score, scoring_failed });
                        if complete {
                            self.finalize();
                        } else {
                            self.advance();
                        }
                    }
                }
            }
        }
    }

    fn submit(&mut self, text: &str) -> Result<()> {
        let request = self.engine.submit_answer(text)?;
        self.sync_clock();
        self.emit(InterviewEvent::AnswerReceived {
            round: request.ticket.round(),
            answer: request.answer.clone(),
            is_last: request.ticket.round() + 1 == TOTAL_ROUNDS,
        });
        self.dispatch_evaluation(request);
        Ok(())
    }

    fn advance(&mut self) {
        let next = self.engine.round_index();
        match self.engine.begin_round(next) {
            Ok(request) => self.dispatch_question(request),
            Err(e) => error!("❌ Could not begin round {}: {}", next + 1, e),
        }
    }

    fn finalize(&mut self) {
        match self.engine.finalize() {
            Ok(finalized) => {
                self.sync_clock();
                self.emit(InterviewEvent::Completed { report: finalized.report });
                self.emit(InterviewEvent::CandidateFinalized { candidate: finalized.candidate });
            }
            Err(e) => error!("❌ Finalization failed: {}", e),
        }
    }

    fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.engine.reset();
        self.clock.disarm();
        self.emit(InterviewEvent::Reset);
    }

    fn dispatch_question(&self, request: QuestionRequest) {
        self.emit(InterviewEvent::Processing { active: true });

        let generator = Arc::clone(&self.generator);
        let responses = self.response_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let ticket = request.ticket;
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Question request for round {} cancelled", ticket.round() + 1);
                }
                result = generator.generate_question(request.difficulty, &request.background_text) => {
                    let _ = responses.send(ServiceResponse::Question { ticket, result });
                }
            }
        });
    }

    fn dispatch_evaluation(&self, request: EvaluationRequest) {
        self.emit(InterviewEvent::Processing { active: true });

        let evaluator = Arc::clone(&self.evaluator);
        let responses = self.response_tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let ticket = request.ticket;
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Evaluation for round {} cancelled", ticket.round() + 1);
                }
                result = evaluator.evaluate_answer(&request.question, &request.answer, request.difficulty) => {
                    if let Err(e) = &result {
                        warn!("Evaluation request for round {} failed: {}", ticket.round() + 1, e);
                    }
                    let _ = responses.send(ServiceResponse::Evaluation { ticket, result });
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::time::{sleep, timeout, Instant};
    use crate::database::{CandidateProfile, CandidateStatus};
    use crate::interview::{Difficulty, PauseState, NO_ANSWER};
    use crate::session::{Phase, RoundStage};

    struct EchoGenerator {
        delay: Duration,
        failures: Mutex<usize>,
    }

    impl EchoGenerator {
        fn instant() -> Arc<Self> {
            Arc::new(Self { delay: Duration::ZERO, failures: Mutex::new(0) })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self { delay, failures: Mutex::new(0) })
        }

        fn failing_once() -> Arc<Self> {
            Arc::new(Self { delay: Duration::ZERO, failures: Mutex::new(1) })
        }
    }

    #[async_trait]
    impl QuestionGenerator for EchoGenerator {
        async fn generate_question(&self, difficulty: Difficulty, _background_text: &str) -> std::result::Result<String, ServiceError> {
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            {
                let mut failures = self.failures.lock();
                if *failures > 0 {
                    *failures -= 1;
                    return Err(ServiceError::Unavailable("generator offline".to_string()));
                }
            }
            Ok(format!("{} question", difficulty))
        }
    }

    struct ScriptedEvaluator {
        scores: Mutex<VecDeque<std::result::Result<i32, ServiceError>>>,
    }

    impl ScriptedEvaluator {
        fn new(scores: Vec<std::result::Result<i32, ServiceError>>) -> Arc<Self> {
            Arc::new(Self { scores: Mutex::new(scores.into()) })
        }
    }

    #[async_trait]
    impl AnswerEvaluator for ScriptedEvaluator {
        async fn evaluate_answer(&self, _question: &str, _answer: &str, _difficulty: Difficulty) -> std::result::Result<i32, ServiceError> {
            self.scores.lock().pop_front().unwrap_or(Ok(5))
        }
    }

    /// Scores every answer 6 after a fixed delay.
    struct DelayedEvaluator {
        delay: Duration,
    }

    #[async_trait]
    impl AnswerEvaluator for DelayedEvaluator {
        async fn evaluate_answer(&self, _question: &str, _answer: &str, _difficulty: Difficulty) -> std::result::Result<i32, ServiceError> {
            sleep(self.delay).await;
            Ok(6)
        }
    }

    fn ready_candidate() -> Candidate {
        let mut candidate = Candidate::new("Full Stack Developer with React and Node.js");
        candidate
            .complete_profile(CandidateProfile {
                name: "Michael Chen".to_string(),
                email: "michael.chen@email.com".to_string(),
                phone: "+1 (555) 234-5678".to_string(),
                summary: None,
            })
            .unwrap();
        candidate
    }

    async fn wait_for<F>(events: &mut mpsc::UnboundedReceiver<InterviewEvent>, mut matches: F) -> InterviewEvent
    where
        F: FnMut(&InterviewEvent) -> bool,
    {
        timeout(Duration::from_secs(600), async {
            loop {
                let event = events.recv().await.expect("event stream closed");
                if matches(&event) {
                    return event;
                }
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    async fn started(
        generator: Arc<dyn QuestionGenerator>,
        evaluator: Arc<dyn AnswerEvaluator>,
    ) -> (ControllerHandle, mpsc::UnboundedReceiver<InterviewEvent>) {
        let (handle, mut events) = spawn_controller(generator, evaluator, Duration::from_secs(1));
        handle.mark_ready(ready_candidate()).await.unwrap();
        assert!(matches!(
            wait_for(&mut events, |e| matches!(e, InterviewEvent::Welcome { .. })).await,
            InterviewEvent::Welcome { total_rounds: 6, .. }
        ));
        handle.start().await.unwrap();
        (handle, events)
    }

    fn is_question(round: usize) -> impl FnMut(&InterviewEvent) -> bool {
        move |e| matches!(e, InterviewEvent::QuestionAsked { round: r, .. } if *r == round)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_interview_progresses_and_finalizes() {
        let scores = vec![Ok(8), Ok(9), Ok(6), Ok(7), Ok(3), Ok(4)];
        let (handle, mut events) = started(EchoGenerator::instant(), ScriptedEvaluator::new(scores)).await;

        let expected = [
            (Difficulty::Easy, 20),
            (Difficulty::Easy, 20),
            (Difficulty::Medium, 60),
            (Difficulty::Medium, 60),
            (Difficulty::Hard, 120),
            (Difficulty::Hard, 120),
        ];
        for (round, (difficulty, limit)) in expected.into_iter().enumerate() {
            match wait_for(&mut events, is_question(round)).await {
                InterviewEvent::QuestionAsked { difficulty: d, time_limit, total, .. } => {
                    assert_eq!(d, difficulty);
                    assert_eq!(time_limit, limit);
                    assert_eq!(total, TOTAL_ROUNDS);
                }
                other => panic!("unexpected event {:?}", other),
            }
            handle.submit_answer(format!("answer {}", round + 1)).await.unwrap();
        }

        let report = match wait_for(&mut events, |e| matches!(e, InterviewEvent::Completed { .. })).await {
            InterviewEvent::Completed { report } => report,
            other => panic!("unexpected event {:?}", other),
        };
        assert_eq!(report.total_score, 37);
        assert_eq!(report.percentage, 62);
        assert_eq!(report.strong_areas, 3);
        assert_eq!(report.weak_areas, 2);

        let candidate = match wait_for(&mut events, |e| matches!(e, InterviewEvent::CandidateFinalized { .. })).await {
            InterviewEvent::CandidateFinalized { candidate } => candidate,
            other => panic!("unexpected event {:?}", other),
        };
        assert_eq!(candidate.status, CandidateStatus::Completed);
        assert_eq!(candidate.score, Some(62));
        assert_eq!(candidate.answers[5], "answer 6");

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Completed);
        assert_eq!(snapshot.rounds.len(), TOTAL_ROUNDS);
        assert!(!snapshot.timer_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_forces_empty_submission_once() {
        let start = Instant::now();
        let (handle, mut events) = started(EchoGenerator::instant(), ScriptedEvaluator::new(vec![Ok(0)])).await;
        wait_for(&mut events, is_question(0)).await;

        let mut remaining_seen = Vec::new();
        loop {
            match wait_for(&mut events, |e| {
                matches!(e, InterviewEvent::TimerTick { .. } | InterviewEvent::TimeUp { .. })
            })
            .await
            {
                InterviewEvent::TimerTick { remaining } => remaining_seen.push(remaining),
                InterviewEvent::TimeUp { round } => {
                    assert_eq!(round, 0);
                    break;
                }
                _ => unreachable!(),
            }
        }
        assert_eq!(remaining_seen, (0..20).rev().collect::<Vec<u32>>());
        assert_eq!(start.elapsed().as_secs(), 20);

        match wait_for(&mut events, |e| matches!(e, InterviewEvent::AnswerReceived { .. })).await {
            InterviewEvent::AnswerReceived { round, answer, .. } => {
                assert_eq!(round, 0);
                assert_eq!(answer, NO_ANSWER);
            }
            _ => unreachable!(),
        }

        // the round advances rather than being skipped or resubmitted
        wait_for(&mut events, is_question(1)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.rounds.len(), 1);
        assert_eq!(snapshot.rounds[0].answer, NO_ANSWER);
        assert_eq!(snapshot.rounds[0].score, 0);
        assert_eq!(snapshot.round_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_countdown_until_resume() {
        let (handle, mut events) = started(EchoGenerator::instant(), ScriptedEvaluator::new(vec![])).await;
        wait_for(&mut events, is_question(0)).await;
        wait_for(&mut events, |e| matches!(e, InterviewEvent::TimerTick { remaining: 15 })).await;

        handle.pause().await.unwrap();
        sleep(Duration::from_secs(60)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.pause, PauseState::PausedHere);
        assert_eq!(snapshot.timer_seconds, 15);
        assert!(!snapshot.timer_armed);

        assert_eq!(handle.resume().await.unwrap(), ResumeOutcome::Resumed);
        match wait_for(&mut events, |e| matches!(e, InterviewEvent::TimerTick { .. })).await {
            InterviewEvent::TimerTick { remaining } => assert_eq!(remaining, 14),
            _ => unreachable!(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_away_requires_welcome_back() {
        let (handle, mut events) = started(EchoGenerator::instant(), ScriptedEvaluator::new(vec![])).await;
        wait_for(&mut events, is_question(0)).await;

        handle.pause().await.unwrap();
        assert!(handle.visibility_lost().await.unwrap());
        assert_eq!(handle.resume().await.unwrap(), ResumeOutcome::WelcomeBackRequired);
        wait_for(&mut events, |e| matches!(e, InterviewEvent::WelcomeBackRequired)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.pause, PauseState::PausedAway);
        assert!(!snapshot.timer_armed);

        handle.confirm_welcome_back().await.unwrap();
        wait_for(&mut events, |e| matches!(e, InterviewEvent::WelcomedBack)).await;
        assert!(matches!(handle.confirm_welcome_back().await, Err(ControllerError::NotAway)));

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.pause, PauseState::Running);
        assert!(snapshot.timer_armed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluation_failure_scores_zero_and_continues() {
        let scores = vec![Ok(7), Err(ServiceError::Request("connection reset".to_string()))];
        let (handle, mut events) = started(EchoGenerator::instant(), ScriptedEvaluator::new(scores)).await;

        wait_for(&mut events, is_question(0)).await;
        handle.submit_answer("first").await.unwrap();
        wait_for(&mut events, is_question(1)).await;
        handle.submit_answer("second").await.unwrap();

        match wait_for(&mut events, |e| matches!(e, InterviewEvent::RoundScored { round: 1, .. })).await {
            InterviewEvent::RoundScored { score, scoring_failed, .. } => {
                assert_eq!(score, 0);
                assert!(scoring_failed);
            }
            _ => unreachable!(),
        }
        wait_for(&mut events, is_question(2)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.round_index, 2);
        assert_eq!(snapshot.rounds[1].score, 0);
        assert_eq!(snapshot.rounds[1].answer, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_failure_waits_for_retry() {
        let (handle, mut events) = started(EchoGenerator::failing_once(), ScriptedEvaluator::new(vec![])).await;

        match wait_for(&mut events, |e| matches!(e, InterviewEvent::QuestionFailed { .. })).await {
            InterviewEvent::QuestionFailed { round, .. } => assert_eq!(round, 0),
            _ => unreachable!(),
        }
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.round_index, 0);
        assert!(!snapshot.processing);
        assert!(!snapshot.timer_armed);
        assert!(matches!(handle.submit_answer("early").await, Err(ControllerError::NotAwaitingAnswer)));

        handle.begin_round(0).await.unwrap();
        wait_for(&mut events, is_question(0)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_in_flight_question() {
        let (handle, mut events) =
            started(EchoGenerator::slow(Duration::from_secs(5)), ScriptedEvaluator::new(vec![])).await;
        assert!(handle.snapshot().await.unwrap().processing);

        handle.reset().await.unwrap();
        wait_for(&mut events, |e| matches!(e, InterviewEvent::Reset)).await;
        sleep(Duration::from_secs(30)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.round_index, 0);
        assert!(snapshot.rounds.is_empty());
        assert!(!snapshot.processing);
        assert!(!snapshot.timer_armed);
        assert!(snapshot.candidate_id.is_none());
        while let Ok(event) = events.try_recv() {
            assert!(!matches!(event, InterviewEvent::QuestionAsked { .. }), "late question leaked: {:?}", event);
        }

        // the controller is usable again after a reset
        handle.mark_ready(ready_candidate()).await.unwrap();
        handle.start().await.unwrap();
        wait_for(&mut events, is_question(0)).await;
    }

    async fn reset_and_settle(handle: &ControllerHandle, events: &mut mpsc::UnboundedReceiver<InterviewEvent>) -> Vec<InterviewEvent> {
        handle.reset().await.unwrap();
        wait_for(events, |e| matches!(e, InterviewEvent::Reset)).await;
        sleep(Duration::from_secs(30)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.round_index, 0);
        assert!(snapshot.rounds.is_empty());
        assert!(!snapshot.timer_armed);
        assert!(!snapshot.processing);
        assert_eq!(snapshot.final_score, None);
        assert_eq!(handle.phase(), Phase::Idle);

        let mut late = Vec::new();
        while let Ok(event) = events.try_recv() {
            late.push(event);
        }
        late
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_from_every_phase() {
        let evaluator = Arc::new(DelayedEvaluator { delay: Duration::from_secs(5) });
        let (handle, mut events) = started(EchoGenerator::instant(), evaluator).await;

        // mid-countdown
        wait_for(&mut events, is_question(0)).await;
        wait_for(&mut events, |e| matches!(e, InterviewEvent::TimerTick { remaining: 15 })).await;
        assert!(handle.snapshot().await.unwrap().timer_armed);
        let late = reset_and_settle(&handle, &mut events).await;
        assert!(
            !late.iter().any(|e| matches!(
                e,
                InterviewEvent::TimerTick { .. } | InterviewEvent::TimeUp { .. } | InterviewEvent::QuestionAsked { .. }
            )),
            "clock kept running after reset: {:?}",
            late
        );

        // evaluation in flight
        handle.mark_ready(ready_candidate()).await.unwrap();
        handle.start().await.unwrap();
        wait_for(&mut events, is_question(0)).await;
        handle.submit_answer("Closures capture their environment").await.unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.processing);
        assert!(matches!(snapshot.stage, RoundStage::AwaitingScore { .. }));
        let late = reset_and_settle(&handle, &mut events).await;
        assert!(
            !late.iter().any(|e| matches!(
                e,
                InterviewEvent::RoundScored { .. } | InterviewEvent::QuestionAsked { .. } | InterviewEvent::TimerTick { .. }
            )),
            "late evaluation leaked: {:?}",
            late
        );

        // completed
        handle.mark_ready(ready_candidate()).await.unwrap();
        handle.start().await.unwrap();
        for round in 0..TOTAL_ROUNDS {
            wait_for(&mut events, is_question(round)).await;
            handle.submit_answer(format!("answer {}", round + 1)).await.unwrap();
        }
        wait_for(&mut events, |e| matches!(e, InterviewEvent::CandidateFinalized { .. })).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, Phase::Completed);
        assert_eq!(snapshot.final_score, Some(60));
        let late = reset_and_settle(&handle, &mut events).await;
        assert!(late.is_empty(), "unexpected events after reset: {:?}", late);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_commands_are_rejected() {
        let (handle, _events) = spawn_controller(
            EchoGenerator::instant(),
            ScriptedEvaluator::new(vec![]),
            Duration::from_secs(1),
        );
        assert!(matches!(handle.start().await, Err(ControllerError::WrongPhase(Phase::Idle))));
        assert!(matches!(handle.submit_answer("x").await, Err(ControllerError::WrongPhase(Phase::Idle))));
        assert!(matches!(handle.resume().await, Err(ControllerError::NotPaused)));

        handle.mark_ready(ready_candidate()).await.unwrap();
        assert!(matches!(handle.begin_round(6).await, Err(ControllerError::RoundOutOfRange(6))));
        assert!(matches!(
            handle.mark_ready(ready_candidate()).await,
            Err(ControllerError::WrongPhase(Phase::Ready))
        ));
    }
}
